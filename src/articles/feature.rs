use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::request::{ArticleRequest, ARTICLES_CACHE_KEY};
use super::types::Article;
use crate::error::DomainError;
use crate::policy::{fetch_json, CacheFirst, FetchPolicy};
use crate::repository::{EventHandling, Feature, Repository};
use crate::storage::{KeyValueStorage, StorageError};
use crate::transport::{ApiRequest, Transport};
use crate::view_state::ViewState;

/// Article data source.
///
/// The full feed goes through the fetch policy under [`ARTICLES_CACHE_KEY`];
/// searches and pages always hit the network.
#[derive(Clone)]
pub struct ArticlesRepository<P = CacheFirst> {
  transport: Arc<dyn Transport>,
  storage: Arc<dyn KeyValueStorage>,
  policy: P,
}

impl ArticlesRepository<CacheFirst> {
  /// Repository with the cache-first policy over `storage`.
  pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn KeyValueStorage>) -> Self {
    let policy = CacheFirst::new(transport.clone(), storage.clone());
    Self::with_policy(transport, storage, policy)
  }
}

impl<P: FetchPolicy> ArticlesRepository<P> {
  pub fn with_policy(
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KeyValueStorage>,
    policy: P,
  ) -> Self {
    Self {
      transport,
      storage,
      policy,
    }
  }

  /// Drop the stored feed so the next fetch goes to the network.
  pub fn invalidate(&self) -> Result<(), StorageError> {
    self.storage.remove(ARTICLES_CACHE_KEY)
  }
}

#[async_trait]
impl<P: FetchPolicy> Repository for ArticlesRepository<P> {
  type Request = ArticleRequest;
  type Response = Vec<Article>;

  async fn execute(&self, request: ArticleRequest) -> Result<Vec<Article>, DomainError> {
    let endpoint = request.endpoint();

    match request {
      ArticleRequest::All => {
        let fetched = self
          .policy
          .fetch::<Vec<Article>>(ARTICLES_CACHE_KEY, endpoint)
          .await?;
        info!(count = fetched.data.len(), source = ?fetched.source, "articles fetched");
        Ok(fetched.data)
      }
      ArticleRequest::Search(query) if query.trim().is_empty() => Err(DomainError::Validation(
        "Search query must not be empty".to_string(),
      )),
      ArticleRequest::Search(_) | ArticleRequest::Page { .. } => {
        fetch_json(self.transport.as_ref(), &endpoint).await
      }
    }
  }
}

/// Actions understood by [`ArticlesFeature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticlesAction {
  Load,
  Refresh,
  Search(String),
}

/// Article list screen state driven by actions.
pub struct ArticlesFeature<P = CacheFirst> {
  repository: ArticlesRepository<P>,
  state: ViewState<Vec<Article>>,
  updates: watch::Sender<ViewState<Vec<Article>>>,
}

impl<P: FetchPolicy> ArticlesFeature<P> {
  pub fn new(repository: ArticlesRepository<P>) -> Self {
    let (updates, _) = watch::channel(ViewState::Loading);
    Self {
      repository,
      state: ViewState::Loading,
      updates,
    }
  }

  pub fn repository(&self) -> &ArticlesRepository<P> {
    &self.repository
  }

  /// Receive the state after every dispatched action.
  pub fn subscribe(&self) -> watch::Receiver<ViewState<Vec<Article>>> {
    self.updates.subscribe()
  }

  /// Reduce `action` against the current state and commit the result.
  ///
  /// A reducer error becomes `Failed` instead of reaching the caller.
  pub async fn dispatch(&mut self, action: ArticlesAction) -> &ViewState<Vec<Article>> {
    info!(?action, "dispatching");

    let next = match self.reduce(self.state.clone(), action).await {
      Ok(state) => state,
      Err(e) => {
        warn!(error = %e, "action failed");
        ViewState::failed(e)
      }
    };

    self.state = next;
    self.updates.send_replace(self.state.clone());
    &self.state
  }

  /// Drop the stored feed; the next `Load` refetches it.
  pub fn invalidate(&self) -> Result<(), StorageError> {
    self.repository.invalidate()
  }
}

#[async_trait]
impl<P: FetchPolicy> Repository for ArticlesFeature<P> {
  type Request = ArticleRequest;
  type Response = Vec<Article>;

  async fn execute(&self, request: ArticleRequest) -> Result<Vec<Article>, DomainError> {
    self.repository.execute(request).await
  }
}

#[async_trait]
impl<P: FetchPolicy> Feature for ArticlesFeature<P> {
  type State = ViewState<Vec<Article>>;
  type Action = ArticlesAction;

  fn state(&self) -> &ViewState<Vec<Article>> {
    &self.state
  }

  async fn reduce(
    &self,
    _state: ViewState<Vec<Article>>,
    action: ArticlesAction,
  ) -> Result<ViewState<Vec<Article>>, DomainError> {
    match action {
      ArticlesAction::Load => {
        let articles = self.execute(ArticleRequest::All).await?;
        Ok(ViewState::Loaded(articles))
      }
      // Only marks the list as reloading; the caller follows up with Load
      ArticlesAction::Refresh => Ok(ViewState::Loading),
      ArticlesAction::Search(query) => {
        let articles = self.execute(ArticleRequest::Search(query)).await?;
        Ok(ViewState::from_items(articles))
      }
    }
  }
}

/// Signals from the screen showing the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticlesEvent {
  /// Loads the feed unless something is already shown
  Appeared,
  /// Drops the stored feed, then reloads from the network
  PullToRefresh,
  SearchSubmitted(String),
}

#[async_trait]
impl<P: FetchPolicy> EventHandling for ArticlesFeature<P> {
  type Event = ArticlesEvent;

  async fn handle(&mut self, event: ArticlesEvent) {
    match event {
      ArticlesEvent::Appeared => {
        if self.state.is_loading() {
          self.dispatch(ArticlesAction::Load).await;
        }
      }
      ArticlesEvent::PullToRefresh => {
        if let Err(e) = self.invalidate() {
          warn!(error = %e, "could not drop stored articles");
        }
        self.dispatch(ArticlesAction::Refresh).await;
        self.dispatch(ArticlesAction::Load).await;
      }
      ArticlesEvent::SearchSubmitted(query) => {
        self.dispatch(ArticlesAction::Search(query)).await;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::{MemoryStorage, StorageExt};
  use crate::transport::{Endpoint, TransportError};
  use crate::view_state::DEFAULT_EMPTY_MESSAGE;
  use std::collections::HashMap;
  use std::sync::Mutex;

  /// Transport answering by path and recording every endpoint sent.
  #[derive(Default)]
  struct RoutedTransport {
    routes: HashMap<&'static str, Result<String, u16>>,
    sent: Mutex<Vec<Endpoint>>,
  }

  impl RoutedTransport {
    fn route(mut self, path: &'static str, response: Result<String, u16>) -> Self {
      self.routes.insert(path, response);
      self
    }

    fn sent(&self) -> Vec<Endpoint> {
      self.sent.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl Transport for RoutedTransport {
    async fn send(&self, endpoint: &Endpoint) -> Result<Vec<u8>, TransportError> {
      self.sent.lock().unwrap().push(endpoint.clone());
      match self.routes.get(endpoint.path.as_str()) {
        Some(Ok(body)) => Ok(body.clone().into_bytes()),
        Some(Err(code)) => Err(TransportError::from_status(*code)),
        None => Err(TransportError::from_status(404)),
      }
    }
  }

  fn articles_json(articles: &[Article]) -> String {
    serde_json::to_string(articles).unwrap()
  }

  fn feature(
    transport: RoutedTransport,
  ) -> (ArticlesFeature, Arc<RoutedTransport>, Arc<MemoryStorage>) {
    let transport = Arc::new(transport);
    let storage = Arc::new(MemoryStorage::new());
    let repository = ArticlesRepository::new(transport.clone(), storage.clone());
    (ArticlesFeature::new(repository), transport, storage)
  }

  #[tokio::test]
  async fn test_initial_state_is_loading() {
    let (feature, _, _) = feature(RoutedTransport::default());
    assert!(feature.state().is_loading());
  }

  #[tokio::test]
  async fn test_load_fetches_then_serves_from_cache() {
    let articles = vec![Article::new("One", "first", "a"), Article::new("Two", "second", "b")];
    let (mut feature, transport, storage) =
      feature(RoutedTransport::default().route("/news", Ok(articles_json(&articles))));

    let state = feature.dispatch(ArticlesAction::Load).await;
    assert_eq!(state, &ViewState::Loaded(articles.clone()));
    assert!(storage.exists(ARTICLES_CACHE_KEY));

    feature.dispatch(ArticlesAction::Load).await;
    assert_eq!(feature.state(), &ViewState::Loaded(articles));
    assert_eq!(transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn test_load_uses_populated_cache() {
    let cached = vec![Article::new("Cached", "d", "a")];
    let (mut feature, transport, storage) = feature(RoutedTransport::default());
    storage.save(ARTICLES_CACHE_KEY, &cached).unwrap();

    feature.dispatch(ArticlesAction::Load).await;
    assert_eq!(feature.state().value(), Some(&cached));
    assert!(transport.sent().is_empty());
  }

  #[tokio::test]
  async fn test_load_not_found_becomes_failed() {
    let (mut feature, _, _) = feature(RoutedTransport::default().route("/news", Err(404)));

    let err = feature
      .reduce(ViewState::Loading, ArticlesAction::Load)
      .await
      .unwrap_err();
    assert!(matches!(err, DomainError::Transport(TransportError::ClientError(404))));

    let state = feature.dispatch(ArticlesAction::Load).await;
    assert!(state.is_failed());
    assert_eq!(state.error().and_then(|e| e.status_code()), Some(404));
  }

  #[tokio::test]
  async fn test_refresh_goes_to_loading_without_fetching() {
    let articles = vec![Article::new("One", "first", "a")];
    let (mut feature, transport, _) =
      feature(RoutedTransport::default().route("/news", Ok(articles_json(&articles))));

    feature.dispatch(ArticlesAction::Load).await;
    let state = feature.dispatch(ArticlesAction::Refresh).await;
    assert!(state.is_loading());
    assert_eq!(transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn test_search_without_results_is_empty() {
    let (mut feature, transport, _) =
      feature(RoutedTransport::default().route("/articles", Ok("[]".to_string())));

    let state = feature.dispatch(ArticlesAction::Search("xyz".into())).await;
    assert_eq!(state, &ViewState::Empty(DEFAULT_EMPTY_MESSAGE.to_string()));

    let sent = transport.sent();
    assert_eq!(sent[0].query, vec![("q".to_string(), "xyz".to_string())]);
  }

  #[tokio::test]
  async fn test_search_is_never_cached() {
    let found = vec![Article::new("Match", "d", "a")];
    let (mut feature, transport, storage) =
      feature(RoutedTransport::default().route("/articles", Ok(articles_json(&found))));

    feature.dispatch(ArticlesAction::Search("match".into())).await;
    feature.dispatch(ArticlesAction::Search("match".into())).await;

    assert_eq!(feature.state(), &ViewState::Loaded(found));
    assert_eq!(transport.sent().len(), 2);
    assert!(storage.is_empty());
  }

  #[tokio::test]
  async fn test_blank_search_is_rejected() {
    let (mut feature, transport, _) = feature(RoutedTransport::default());

    let state = feature.dispatch(ArticlesAction::Search("   ".into())).await;
    assert!(matches!(state.error(), Some(DomainError::Validation(_))));
    assert!(transport.sent().is_empty());
  }

  #[tokio::test]
  async fn test_invalidate_forces_network() {
    let articles = vec![Article::new("One", "first", "a")];
    let (mut feature, transport, _) =
      feature(RoutedTransport::default().route("/news", Ok(articles_json(&articles))));

    feature.dispatch(ArticlesAction::Load).await;
    feature.invalidate().unwrap();
    feature.dispatch(ArticlesAction::Load).await;

    assert_eq!(transport.sent().len(), 2);
  }

  #[tokio::test]
  async fn test_subscribers_see_committed_state() {
    let (mut feature, _, _) =
      feature(RoutedTransport::default().route("/articles", Ok("[]".to_string())));
    let mut updates = feature.subscribe();

    feature.dispatch(ArticlesAction::Search("nothing".into())).await;

    assert!(updates.has_changed().unwrap());
    assert!(updates.borrow_and_update().is_empty());
  }

  #[tokio::test]
  async fn test_appeared_loads_once() {
    let articles = vec![Article::new("One", "first", "a")];
    let (mut feature, transport, _) =
      feature(RoutedTransport::default().route("/news", Ok(articles_json(&articles))));

    feature.handle(ArticlesEvent::Appeared).await;
    feature.handle(ArticlesEvent::Appeared).await;

    assert_eq!(feature.state(), &ViewState::Loaded(articles));
    assert_eq!(transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn test_pull_to_refresh_bypasses_stored_feed() {
    let stale = vec![Article::new("Old", "d", "a")];
    let fresh = vec![Article::new("New", "d", "a")];
    let (mut feature, transport, storage) =
      feature(RoutedTransport::default().route("/news", Ok(articles_json(&fresh))));
    storage.save(ARTICLES_CACHE_KEY, &stale).unwrap();

    feature.handle(ArticlesEvent::Appeared).await;
    assert_eq!(feature.state(), &ViewState::Loaded(stale));

    feature.handle(ArticlesEvent::PullToRefresh).await;
    assert_eq!(feature.state(), &ViewState::Loaded(fresh.clone()));
    assert_eq!(storage.retrieve::<Vec<Article>>(ARTICLES_CACHE_KEY).unwrap(), fresh);
    assert_eq!(transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn test_search_submitted_dispatches_search() {
    let (mut feature, _, _) =
      feature(RoutedTransport::default().route("/articles", Ok("[]".to_string())));

    feature.handle(ArticlesEvent::SearchSubmitted("xyz".into())).await;
    assert_eq!(feature.state(), &ViewState::empty());
  }
}
