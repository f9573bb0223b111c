//! Outbound HTTP: endpoint descriptors, the transport contract and its client.

mod client;
mod endpoint;
mod error;
mod reqwest_backend;

pub use client::{ApiClient, ApiConfig, HttpBackend, Transport, WireRequest, WireResponse};
pub use endpoint::{ApiRequest, Endpoint, HttpMethod};
pub use error::TransportError;
pub use reqwest_backend::ReqwestBackend;
