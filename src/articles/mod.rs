//! Reference domain: a cached article feed with search and paging.

mod feature;
mod request;
mod types;

pub use feature::{ArticlesAction, ArticlesEvent, ArticlesFeature, ArticlesRepository};
pub use request::{ArticleRequest, ARTICLES_CACHE_KEY};
pub use types::Article;
