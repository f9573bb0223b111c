mod common;

use common::{articles, client, MockBackend};
use loadstate::articles::{ArticlesAction, ArticlesFeature, ArticlesRepository, ARTICLES_CACHE_KEY};
use loadstate::storage::{FileStorage, MemoryStorage, SqliteStorage};
use loadstate::transport::{HttpMethod, TransportError};
use loadstate::{DomainError, Feature, KeyValueStorage, NetworkFirst, ViewState};
use std::sync::Arc;

#[tokio::test]
async fn test_feed_survives_restart_with_sqlite() {
  let dir = tempfile::tempdir().unwrap();
  let db = dir.path().join("cache.db");
  let feed = articles("Story", 3);

  let backend = MockBackend::new();
  backend.route_articles("/api/news", &feed);

  {
    let storage = Arc::new(SqliteStorage::open(&db).unwrap());
    let mut feature = ArticlesFeature::new(ArticlesRepository::new(client(backend.clone()), storage));
    assert_eq!(feature.dispatch(ArticlesAction::Load).await, &ViewState::Loaded(feed.clone()));
  }

  // New process: same database, network gone
  backend.set_offline(true);
  let storage = Arc::new(SqliteStorage::open(&db).unwrap());
  let mut feature = ArticlesFeature::new(ArticlesRepository::new(client(backend.clone()), storage));

  assert_eq!(feature.dispatch(ArticlesAction::Load).await, &ViewState::Loaded(feed));
  assert_eq!(backend.request_count(), 1);
}

#[tokio::test]
async fn test_requests_carry_default_headers() {
  let backend = MockBackend::new();
  backend.route_articles("/api/news", &articles("Story", 1));
  let mut feature = ArticlesFeature::new(ArticlesRepository::new(
    client(backend.clone()),
    Arc::new(MemoryStorage::new()),
  ));

  feature.dispatch(ArticlesAction::Load).await;

  let requests = backend.requests();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].method, HttpMethod::Get);
  assert_eq!(requests[0].url.as_str(), "https://test.com/api/news");
  assert_eq!(
    requests[0].headers.get("Accept").map(String::as_str),
    Some("application/json")
  );
}

#[tokio::test]
async fn test_unauthorized_keeps_status_code() {
  let backend = MockBackend::new();
  backend.route("/api/news", 401, Vec::new());
  let storage = Arc::new(MemoryStorage::new());
  let mut feature =
    ArticlesFeature::new(ArticlesRepository::new(client(backend), storage.clone()));

  let state = feature.dispatch(ArticlesAction::Load).await;

  assert!(matches!(
    state.error(),
    Some(DomainError::Transport(TransportError::ClientError(401)))
  ));
  assert!(!storage.exists(ARTICLES_CACHE_KEY));
}

#[tokio::test]
async fn test_offline_failure_message() {
  let backend = MockBackend::new();
  backend.set_offline(true);
  let mut feature = ArticlesFeature::new(ArticlesRepository::new(
    client(backend),
    Arc::new(MemoryStorage::new()),
  ));

  let state = feature.dispatch(ArticlesAction::Load).await;
  assert_eq!(
    state.error().map(|e| e.to_string()),
    Some("Network error: connection refused".to_string())
  );
  assert_eq!(state.error().and_then(|e| e.status_code()), None);
}

#[tokio::test]
async fn test_search_then_load_with_file_storage() {
  let dir = tempfile::tempdir().unwrap();
  let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
  let feed = articles("Story", 2);
  let found = articles("Match", 1);

  let backend = MockBackend::new();
  backend.route_articles("/api/news", &feed);
  backend.route_articles("/api/articles?q=match", &found);
  backend.route("/api/articles?q=xyz", 200, "[]");

  let mut feature =
    ArticlesFeature::new(ArticlesRepository::new(client(backend.clone()), storage.clone()));

  assert_eq!(
    feature.dispatch(ArticlesAction::Search("match".into())).await,
    &ViewState::Loaded(found)
  );
  assert_eq!(
    feature.dispatch(ArticlesAction::Search("xyz".into())).await,
    &ViewState::empty()
  );
  assert!(!storage.exists(ARTICLES_CACHE_KEY));

  assert!(feature.dispatch(ArticlesAction::Refresh).await.is_loading());
  assert_eq!(feature.dispatch(ArticlesAction::Load).await, &ViewState::Loaded(feed));
  assert!(storage.exists(ARTICLES_CACHE_KEY));
  assert_eq!(backend.request_count(), 3);
}

#[tokio::test]
async fn test_network_first_feature_serves_offline_copy() {
  let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
  let feed = articles("Story", 2);
  let backend = MockBackend::new();
  backend.route_articles("/api/news", &feed);

  let transport = client(backend.clone());
  let policy = NetworkFirst::new(transport.clone(), storage.clone());
  let mut feature =
    ArticlesFeature::new(ArticlesRepository::with_policy(transport, storage, policy));

  feature.dispatch(ArticlesAction::Load).await;
  feature.dispatch(ArticlesAction::Load).await;
  assert_eq!(backend.request_count(), 2);

  backend.set_offline(true);
  feature.dispatch(ArticlesAction::Load).await;
  assert_eq!(feature.state(), &ViewState::Loaded(feed));
  assert_eq!(backend.request_count(), 3);
}
