//! Presentation state for a single asynchronous fetch.

use std::sync::Arc;

use crate::error::{DomainError, SharedError};

/// Message used by [`ViewState::empty`].
pub const DEFAULT_EMPTY_MESSAGE: &str = "No data available";

/// The state of one fetch, as seen by a rendering layer.
#[derive(Debug, Clone)]
pub enum ViewState<T> {
  /// Initial or loading state
  Loading,
  /// Successfully loaded data
  Loaded(T),
  /// Completed with nothing to show
  Empty(String),
  /// Completed with an error
  Failed(SharedError),
}

impl<T> Default for ViewState<T> {
  fn default() -> Self {
    ViewState::Loading
  }
}

impl<T> ViewState<T> {
  /// `Empty` with the default message.
  pub fn empty() -> Self {
    ViewState::Empty(DEFAULT_EMPTY_MESSAGE.to_string())
  }

  pub fn failed(error: impl Into<DomainError>) -> Self {
    ViewState::Failed(Arc::new(error.into()))
  }

  pub fn from_result(result: Result<T, DomainError>) -> Self {
    match result {
      Ok(value) => ViewState::Loaded(value),
      Err(e) => ViewState::failed(e),
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, ViewState::Loading)
  }

  pub fn is_loaded(&self) -> bool {
    matches!(self, ViewState::Loaded(_))
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, ViewState::Empty(_))
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, ViewState::Failed(_))
  }

  /// The loaded value, if any.
  pub fn value(&self) -> Option<&T> {
    match self {
      ViewState::Loaded(value) => Some(value),
      _ => None,
    }
  }

  pub fn into_value(self) -> Option<T> {
    match self {
      ViewState::Loaded(value) => Some(value),
      _ => None,
    }
  }

  /// The error, if the state is `Failed`.
  pub fn error(&self) -> Option<&DomainError> {
    match self {
      ViewState::Failed(e) => Some(e.as_ref()),
      _ => None,
    }
  }

  /// Transform the loaded value; every other variant passes through as is.
  pub fn map<U>(self, transform: impl FnOnce(T) -> U) -> ViewState<U> {
    match self {
      ViewState::Loading => ViewState::Loading,
      ViewState::Loaded(value) => ViewState::Loaded(transform(value)),
      ViewState::Empty(message) => ViewState::Empty(message),
      ViewState::Failed(e) => ViewState::Failed(e),
    }
  }

  pub fn as_ref(&self) -> ViewState<&T> {
    match self {
      ViewState::Loading => ViewState::Loading,
      ViewState::Loaded(value) => ViewState::Loaded(value),
      ViewState::Empty(message) => ViewState::Empty(message.clone()),
      ViewState::Failed(e) => ViewState::Failed(Arc::clone(e)),
    }
  }
}

impl<T> ViewState<Vec<T>> {
  /// `Empty` for no items, `Loaded` otherwise.
  pub fn from_items(items: Vec<T>) -> Self {
    if items.is_empty() {
      ViewState::empty()
    } else {
      ViewState::Loaded(items)
    }
  }
}

/// Structural equality; `Failed` states compare by message only.
impl<T: PartialEq> PartialEq for ViewState<T> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (ViewState::Loading, ViewState::Loading) => true,
      (ViewState::Loaded(a), ViewState::Loaded(b)) => a == b,
      (ViewState::Empty(a), ViewState::Empty(b)) => a == b,
      (ViewState::Failed(a), ViewState::Failed(b)) => a.to_string() == b.to_string(),
      _ => false,
    }
  }
}
