use crate::transport::{ApiRequest, Endpoint};

/// Storage key for the full article list.
pub const ARTICLES_CACHE_KEY: &str = "articles";

/// What to fetch from the articles API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleRequest {
  /// The whole feed
  All,
  /// Free-text search
  Search(String),
  /// One page of the feed
  Page { page: usize, page_size: usize },
}

impl ApiRequest for ArticleRequest {
  fn endpoint(&self) -> Endpoint {
    match self {
      ArticleRequest::All => Endpoint::get("/news"),
      ArticleRequest::Search(query) => Endpoint::get("/articles").query("q", query),
      ArticleRequest::Page { page, page_size } => Endpoint::get("/news")
        .query("page", page)
        .query("limit", page_size),
    }
  }
}
