use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::Entity;

/// A published article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
  pub id: Uuid,
  pub title: String,
  pub description: String,
  pub author: String,
  pub publish_date: DateTime<Utc>,
  #[serde(default, rename = "imageURL")]
  pub image_url: Option<String>,
}

impl Article {
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>,
    author: impl Into<String>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      title: title.into(),
      description: description.into(),
      author: author.into(),
      publish_date: Utc::now(),
      image_url: None,
    }
  }
}

impl Entity for Article {
  type Id = Uuid;

  fn id(&self) -> Uuid {
    self.id
  }
}
