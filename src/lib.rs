//! Cache-first data loading and pagination state for list-driven clients.
//!
//! The layers, bottom up:
//!
//! - [`transport`]: turns an [`Endpoint`] into response bytes over HTTP.
//! - [`storage`]: byte-level key-value persistence with typed JSON helpers.
//! - [`policy`]: how storage and transport combine for one read.
//! - [`repository`]: request/response sources, state-owning features and the
//!   other domain contracts; [`entity_store`] persists entities through them.
//! - [`view_state`] and [`pagination`]: what a rendering layer observes.
//!
//! [`articles`] wires all of them together for an article feed.

pub mod articles;
pub mod config;
pub mod entity_store;
pub mod error;
pub mod pagination;
pub mod policy;
pub mod repository;
pub mod storage;
pub mod transport;
pub mod view_state;

pub use entity_store::EntityStore;
pub use error::{DomainError, SharedError};
pub use pagination::{PaginatedState, Paginator};
pub use policy::{CacheFirst, FetchPolicy, FetchSource, Fetched, NetworkFirst, NetworkOnly};
pub use repository::{
  CrudRepository, CrudRequest, CrudResponse, Entity, EventDrivenFeature, EventHandling, Feature,
  IdentityMapper, Mapper, Repository, SimpleRepository, UseCase,
};
pub use storage::{KeyValueStorage, StorageError, StorageExt};
pub use transport::{ApiClient, ApiConfig, ApiRequest, Endpoint, Transport, TransportError};
pub use view_state::ViewState;
