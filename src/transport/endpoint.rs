//! Wire-level description of a request, derived from a caller's request value.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
  #[default]
  Get,
  Post,
  Put,
  Patch,
  Delete,
}

impl HttpMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
      HttpMethod::Patch => "PATCH",
      HttpMethod::Delete => "DELETE",
    }
  }
}

impl fmt::Display for HttpMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Endpoint descriptor: path, method, ordered query, headers and optional body.
///
/// Built fresh for every call and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
  pub path: String,
  pub method: HttpMethod,
  pub query: Vec<(String, String)>,
  pub headers: BTreeMap<String, String>,
  pub body: Option<Vec<u8>>,
}

impl Endpoint {
  pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      method,
      ..Default::default()
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(HttpMethod::Get, path)
  }

  pub fn post(path: impl Into<String>) -> Self {
    Self::new(HttpMethod::Post, path)
  }

  /// Append a query parameter, keeping insertion order.
  pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
    self.query.push((name.into(), value.to_string()));
    self
  }

  /// Set a header. Names compare case-insensitively, so `accept` replaces `Accept`.
  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    set_header(&mut self.headers, name.into(), value.into());
    self
  }

  pub fn body(mut self, body: Vec<u8>) -> Self {
    self.body = Some(body);
    self
  }

  /// Serialize `value` as the JSON body and mark the content type.
  pub fn json_body<T: Serialize>(self, value: &T) -> Result<Self, TransportError> {
    let bytes = serde_json::to_vec(value).map_err(TransportError::EncodingFailed)?;
    Ok(self.header("Content-Type", "application/json").body(bytes))
  }
}

/// Insert `name`, dropping any entry whose name differs from it only in case.
pub(crate) fn set_header(headers: &mut BTreeMap<String, String>, name: String, value: String) {
  headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
  headers.insert(name, value);
}

/// A caller-defined request value that knows its wire translation.
pub trait ApiRequest {
  /// Pure translation to an endpoint descriptor.
  fn endpoint(&self) -> Endpoint;
}
