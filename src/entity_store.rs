//! Entity collection kept as one JSON list in key-value storage.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::error::DomainError;
use crate::repository::{CrudRequest, CrudResponse, Entity, Repository};
use crate::storage::{KeyValueStorage, StorageError, StorageExt};

/// [`CrudRepository`](crate::repository::CrudRepository) over any storage backend.
///
/// The whole collection lives under one key, in insertion order. Operations on
/// one store are serialized; separate stores sharing a key are not.
pub struct EntityStore<T> {
  storage: Arc<dyn KeyValueStorage>,
  key: String,
  write_lock: Mutex<()>,
  _entity: PhantomData<fn() -> T>,
}

impl<T> EntityStore<T>
where
  T: Entity + Serialize + DeserializeOwned + Clone,
{
  pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
    Self {
      storage,
      key: key.into(),
      write_lock: Mutex::new(()),
      _entity: PhantomData,
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  fn load(&self) -> Result<Vec<T>, DomainError> {
    match self.storage.retrieve::<Vec<T>>(&self.key) {
      Ok(items) => Ok(items),
      Err(StorageError::NotFound(_)) => Ok(Vec::new()),
      Err(e) => Err(e.into()),
    }
  }

  fn store(&self, items: &[T]) -> Result<(), DomainError> {
    self.storage.save(&self.key, items)?;
    Ok(())
  }

  fn not_found(&self, id: &T::Id) -> DomainError {
    DomainError::NotFound(format!("{} {:?}", self.key, id))
  }

  fn apply(&self, request: CrudRequest<T>) -> Result<CrudResponse<T>, DomainError> {
    let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
    let mut items = self.load()?;

    match request {
      CrudRequest::Create(entity) => {
        let id = entity.id();
        if items.iter().any(|item| item.id() == id) {
          return Err(DomainError::Validation(format!(
            "{} {:?} already exists",
            self.key, id
          )));
        }
        items.push(entity.clone());
        self.store(&items)?;
        debug!(key = %self.key, ?id, "entity created");
        Ok(CrudResponse::One(entity))
      }
      CrudRequest::Read(id) => items
        .into_iter()
        .find(|item| item.id() == id)
        .map(CrudResponse::One)
        .ok_or_else(|| self.not_found(&id)),
      CrudRequest::Update(entity) => {
        let id = entity.id();
        let slot = items
          .iter_mut()
          .find(|item| item.id() == id)
          .ok_or_else(|| self.not_found(&id))?;
        *slot = entity.clone();
        self.store(&items)?;
        debug!(key = %self.key, ?id, "entity updated");
        Ok(CrudResponse::One(entity))
      }
      CrudRequest::Delete(id) => {
        let before = items.len();
        items.retain(|item| item.id() != id);
        if items.len() == before {
          return Err(self.not_found(&id));
        }
        self.store(&items)?;
        debug!(key = %self.key, ?id, "entity deleted");
        Ok(CrudResponse::Deleted)
      }
      CrudRequest::List => Ok(CrudResponse::Many(items)),
    }
  }
}

#[async_trait]
impl<T> Repository for EntityStore<T>
where
  T: Entity + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
  type Request = CrudRequest<T>;
  type Response = CrudResponse<T>;

  async fn execute(&self, request: CrudRequest<T>) -> Result<CrudResponse<T>, DomainError> {
    self.apply(request)
  }
}
