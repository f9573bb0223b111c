//! reqwest-backed HTTP stack.

use async_trait::async_trait;
use reqwest::{Client, Method};

use super::client::{HttpBackend, WireRequest, WireResponse};
use super::endpoint::HttpMethod;
use super::error::TransportError;

pub struct ReqwestBackend {
  client: Client,
}

impl ReqwestBackend {
  pub fn new() -> Result<Self, TransportError> {
    let client = Client::builder()
      .build()
      .map_err(|e| TransportError::NetworkFailed(Box::new(e)))?;

    Ok(Self { client })
  }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
  async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
    let method = match request.method {
      HttpMethod::Get => Method::GET,
      HttpMethod::Post => Method::POST,
      HttpMethod::Put => Method::PUT,
      HttpMethod::Patch => Method::PATCH,
      HttpMethod::Delete => Method::DELETE,
    };

    let mut builder = self
      .client
      .request(method, request.url)
      .timeout(request.timeout);

    for (name, value) in &request.headers {
      builder = builder.header(name.as_str(), value.as_str());
    }

    if let Some(body) = request.body {
      builder = builder.body(body);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| TransportError::NetworkFailed(Box::new(e)))?;
    let status = response.status().as_u16();

    // A status was received, so a read failure here is a bad response
    let body = response
      .bytes()
      .await
      .map_err(|e| TransportError::InvalidResponse(format!("status {}: {}", status, e)))?
      .to_vec();

    Ok(WireResponse { status, body })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;
  use std::time::Duration;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use url::Url;

  fn request(url: &str) -> WireRequest {
    WireRequest {
      method: HttpMethod::Get,
      url: Url::parse(url).unwrap(),
      headers: BTreeMap::new(),
      body: None,
      timeout: Duration::from_secs(5),
    }
  }

  /// Serve one connection with `reply`, then close it.
  async fn serve_once(reply: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 1024];
      let _ = socket.read(&mut buf).await;
      socket.write_all(reply).await.unwrap();
    });

    format!("http://{}/news", addr)
  }

  #[tokio::test]
  async fn test_reads_status_and_body() {
    let url = serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\nConnection: close\r\n\r\nnope").await;
    let backend = ReqwestBackend::new().unwrap();

    let response = backend.execute(request(&url)).await.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, b"nope".to_vec());
  }

  #[tokio::test]
  async fn test_truncated_body_is_invalid_response() {
    let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort").await;
    let backend = ReqwestBackend::new().unwrap();

    let err = backend.execute(request(&url)).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidResponse(_)));
  }

  #[tokio::test]
  async fn test_refused_connection_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = ReqwestBackend::new().unwrap();

    let err = backend
      .execute(request(&format!("http://{}/news", addr)))
      .await
      .unwrap_err();
    assert!(matches!(err, TransportError::NetworkFailed(_)));
  }
}
