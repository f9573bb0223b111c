//! Incremental list loading driven by a page-aware repository.
//!
//! ```ignore
//! let mut pages = Paginator::new(repo, |page| ArticleRequest::Page { page, page_size: 20 });
//! let mut updates = pages.subscribe();
//!
//! pages.load().await;
//!
//! // Rendering layer, when a row scrolls into view
//! pages.on_item_visible(&row).await;
//! ```
//!
//! There is no total count: a page that comes back empty marks the end of data.
//! A failed first load replaces everything, while a failed later page keeps the
//! items already shown.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{DomainError, SharedError};
use crate::repository::{Entity, Repository};

/// Accumulated list state.
#[derive(Debug, Clone)]
pub struct PaginatedState<T> {
  /// Items in page order
  pub items: Vec<T>,
  /// Index of the last page fetched
  pub current_page: usize,
  /// False once a page came back empty
  pub has_next_page: bool,
  pub error: Option<SharedError>,
  pub is_loading: bool,
}

impl<T> Default for PaginatedState<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      current_page: 0,
      has_next_page: true,
      error: None,
      is_loading: false,
    }
  }
}

impl<T> PaginatedState<T> {
  /// State after a successful first page.
  pub fn first_page(items: Vec<T>) -> Self {
    Self {
      has_next_page: !items.is_empty(),
      items,
      ..Default::default()
    }
  }

  /// State after a failed first page; earlier items are dropped.
  pub fn failed(error: DomainError) -> Self {
    Self {
      error: Some(Arc::new(error)),
      ..Default::default()
    }
  }

  /// Whether a next-page fetch is allowed right now.
  pub fn can_load_next(&self) -> bool {
    !self.is_loading && self.has_next_page && self.error.is_none()
  }
}

/// Errors compare by message.
impl<T: PartialEq> PartialEq for PaginatedState<T> {
  fn eq(&self, other: &Self) -> bool {
    self.items == other.items
      && self.current_page == other.current_page
      && self.has_next_page == other.has_next_page
      && self.is_loading == other.is_loading
      && self.error.as_ref().map(|e| e.to_string()) == other.error.as_ref().map(|e| e.to_string())
  }
}

/// Builds the request for a page index.
type RequestFn<Req> = Box<dyn Fn(usize) -> Req + Send + Sync>;

/// Drives a [`PaginatedState`] from a repository returning one page per call.
///
/// Every operation takes `&mut self`, so one instance never has two mutating
/// fetches in flight. Each transition is published to subscribers.
pub struct Paginator<R, T>
where
  R: Repository<Response = Vec<T>>,
{
  source: R,
  request_for: RequestFn<R::Request>,
  state: PaginatedState<T>,
  updates: watch::Sender<PaginatedState<T>>,
}

impl<R, T> Paginator<R, T>
where
  R: Repository<Response = Vec<T>>,
  T: Clone + Send + Sync,
{
  pub fn new<F>(source: R, request_for: F) -> Self
  where
    F: Fn(usize) -> R::Request + Send + Sync + 'static,
  {
    Self::with_state(source, request_for, PaginatedState::default())
  }

  /// Resume from a previously captured state.
  pub fn with_state<F>(source: R, request_for: F, state: PaginatedState<T>) -> Self
  where
    F: Fn(usize) -> R::Request + Send + Sync + 'static,
  {
    let (updates, _) = watch::channel(state.clone());
    Self {
      source,
      request_for: Box::new(request_for),
      state,
      updates,
    }
  }

  pub fn state(&self) -> &PaginatedState<T> {
    &self.state
  }

  pub fn source(&self) -> &R {
    &self.source
  }

  /// Receive a snapshot after every transition.
  pub fn subscribe(&self) -> watch::Receiver<PaginatedState<T>> {
    self.updates.subscribe()
  }

  /// Fetch page 0 and replace the whole state with the outcome.
  pub async fn load(&mut self) -> &PaginatedState<T> {
    self.update(|s| s.is_loading = true);

    let next = match self.source.execute((self.request_for)(0)).await {
      Ok(items) => {
        info!(count = items.len(), "first page loaded");
        PaginatedState::first_page(items)
      }
      Err(e) => {
        warn!(error = %e, "first page failed");
        PaginatedState::failed(e)
      }
    };

    self.replace(next);
    &self.state
  }

  /// Reload from page 0.
  pub async fn refresh(&mut self) -> &PaginatedState<T> {
    self.load().await
  }

  /// Fetch and append the next page.
  ///
  /// No-op while loading, after the end of data, or while an error is shown.
  /// Returns whether a fetch was made.
  pub async fn load_next_page(&mut self) -> bool {
    if !self.state.can_load_next() {
      debug!(
        is_loading = self.state.is_loading,
        has_next_page = self.state.has_next_page,
        has_error = self.state.error.is_some(),
        "next page skipped"
      );
      return false;
    }

    let next_page = self.state.current_page + 1;
    self.update(|s| s.is_loading = true);

    match self.source.execute((self.request_for)(next_page)).await {
      Ok(items) => {
        info!(page = next_page, count = items.len(), "page loaded");
        self.update(|s| {
          s.has_next_page = !items.is_empty();
          s.items.extend(items);
          s.current_page = next_page;
          s.is_loading = false;
        });
      }
      Err(e) => {
        warn!(page = next_page, error = %e, "page failed");
        self.update(|s| {
          s.error = Some(Arc::new(e));
          s.is_loading = false;
        });
      }
    }

    true
  }

  /// Clear a next-page error and try that page again.
  pub async fn retry_next_page(&mut self) -> bool {
    if self.state.items.is_empty() {
      // Nothing was ever shown, so the failure was the first page
      self.load().await;
      return true;
    }
    self.update(|s| s.error = None);
    self.load_next_page().await
  }

  fn update(&mut self, f: impl FnOnce(&mut PaginatedState<T>)) {
    f(&mut self.state);
    self.updates.send_replace(self.state.clone());
  }

  fn replace(&mut self, state: PaginatedState<T>) {
    self.update(|s| *s = state);
  }
}

impl<R, T> Paginator<R, T>
where
  R: Repository<Response = Vec<T>>,
  T: Entity + Clone + Send + Sync,
{
  /// Scroll trigger: loads the next page when `item` is the last one shown.
  ///
  /// Call once per item appearance. Returns whether a fetch was made.
  pub async fn on_item_visible(&mut self, item: &T) -> bool {
    let is_last = self
      .state
      .items
      .last()
      .map(|last| last.id() == item.id())
      .unwrap_or(false);

    if !is_last {
      return false;
    }
    self.load_next_page().await
  }
}
