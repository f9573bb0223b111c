//! Domain-level error type shared by repositories, features and state machines.

use std::sync::Arc;
use thiserror::Error;

use crate::storage::StorageError;
use crate::transport::TransportError;

/// Boxed error used where the concrete cause type is owned by a backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced to feature reducers and pagination operations.
#[derive(Debug, Error)]
pub enum DomainError {
  /// Input rejected before any I/O was attempted
  #[error("{0}")]
  Validation(String),

  /// A named item does not exist
  #[error("{0} not found")]
  NotFound(String),

  #[error("Unauthorized access")]
  Unauthorized,

  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error(transparent)]
  Storage(#[from] StorageError),

  #[error("{0}")]
  Unknown(#[source] BoxError),
}

impl DomainError {
  /// HTTP status code carried by the underlying transport error, if any.
  pub fn status_code(&self) -> Option<u16> {
    match self {
      DomainError::Transport(e) => e.status_code(),
      _ => None,
    }
  }
}

/// Error handle stored inside state values so they remain cheap to clone.
pub type SharedError = Arc<DomainError>;
