use thiserror::Error;

use crate::error::BoxError;

/// Errors raised while sending a request or interpreting its response.
#[derive(Debug, Error)]
pub enum TransportError {
  /// Base address and endpoint path could not be combined
  #[error("Invalid URL: {0}")]
  InvalidUrl(String),

  /// A response arrived but could not be read
  #[error("Invalid server response: {0}")]
  InvalidResponse(String),

  #[error("Client error occurred. Status code: {0}")]
  ClientError(u16),

  #[error("Server error occurred. Status code: {0}")]
  ServerError(u16),

  /// Redirects and anything outside the known classes
  #[error("An unknown error occurred. Status code: {0}")]
  UnknownStatus(u16),

  /// No response was received at all
  #[error("Network error: {0}")]
  NetworkFailed(#[source] BoxError),

  #[error("Failed to encode the request body: {0}")]
  EncodingFailed(#[source] serde_json::Error),

  /// The payload was received but is not the expected shape
  #[error("Failed to decode the response data: {0}")]
  DecodingFailed(#[source] serde_json::Error),
}

impl TransportError {
  /// Classify a non-success status code.
  ///
  /// Callers only reach this after the 2xx check failed.
  pub fn from_status(status: u16) -> Self {
    match status {
      400..=499 => TransportError::ClientError(status),
      500..=599 => TransportError::ServerError(status),
      _ => TransportError::UnknownStatus(status),
    }
  }

  /// The status code preserved for diagnostics, if this error came from one.
  pub fn status_code(&self) -> Option<u16> {
    match self {
      TransportError::ClientError(code)
      | TransportError::ServerError(code)
      | TransportError::UnknownStatus(code) => Some(*code),
      _ => None,
    }
  }
}
