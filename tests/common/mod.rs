//! Shared test doubles: an HTTP backend with canned routes.

#![allow(dead_code)]

use async_trait::async_trait;
use loadstate::articles::Article;
use loadstate::transport::{
  ApiClient, ApiConfig, HttpBackend, TransportError, WireRequest, WireResponse,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Backend answering by `path?query`; unrouted requests get a 404.
///
/// `offline()` makes every request fail before a response arrives.
#[derive(Default)]
pub struct MockBackend {
  routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
  offline: Mutex<bool>,
  requests: Mutex<Vec<WireRequest>>,
}

impl MockBackend {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn route(&self, target: &str, status: u16, body: impl Into<Vec<u8>>) {
    self
      .routes
      .lock()
      .unwrap()
      .insert(target.to_string(), (status, body.into()));
  }

  pub fn route_articles(&self, target: &str, articles: &[Article]) {
    self.route(target, 200, serde_json::to_vec(articles).unwrap());
  }

  pub fn set_offline(&self, offline: bool) {
    *self.offline.lock().unwrap() = offline;
  }

  pub fn requests(&self) -> Vec<WireRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn request_count(&self) -> usize {
    self.requests.lock().unwrap().len()
  }
}

fn target(url: &Url) -> String {
  match url.query() {
    Some(query) => format!("{}?{}", url.path(), query),
    None => url.path().to_string(),
  }
}

#[async_trait]
impl HttpBackend for MockBackend {
  async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
    let target = target(&request.url);
    self.requests.lock().unwrap().push(request);

    if *self.offline.lock().unwrap() {
      return Err(TransportError::NetworkFailed("connection refused".into()));
    }

    let (status, body) = self
      .routes
      .lock()
      .unwrap()
      .get(&target)
      .cloned()
      .unwrap_or((404, Vec::new()));

    Ok(WireResponse { status, body })
  }
}

/// Client rooted at `https://test.com/api` over `backend`.
pub fn client(backend: Arc<MockBackend>) -> Arc<ApiClient> {
  let config = ApiConfig::new(Url::parse("https://test.com/api").unwrap())
    .with_header("Accept", "application/json");
  Arc::new(ApiClient::new(config, backend))
}

pub fn articles(prefix: &str, count: usize) -> Vec<Article> {
  (0..count)
    .map(|i| Article::new(format!("{} {}", prefix, i), "description", "author"))
    .collect()
}
