//! Domain contracts: request/response sources, features layered on top, use
//! cases, mappers, CRUD requests and event handling.

use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::DomainError;

/// A one-shot data source: `execute(request) -> response`.
#[async_trait]
pub trait Repository: Send + Sync {
  type Request: Send;
  type Response: Send;

  async fn execute(&self, request: Self::Request) -> Result<Self::Response, DomainError>;
}

/// A repository that also owns presentation state and a reducer over it.
///
/// `reduce` returns the next state without touching `state()`. It may perform
/// I/O through `execute`, and its errors propagate to the caller unchanged;
/// deciding how a failure is presented is left to whoever commits the result.
#[async_trait]
pub trait Feature: Repository {
  type State: Send;
  type Action: Send;

  /// The current state.
  fn state(&self) -> &Self::State;

  async fn reduce(
    &self,
    state: Self::State,
    action: Self::Action,
  ) -> Result<Self::State, DomainError>;
}

/// A repository that needs no request value.
#[async_trait]
pub trait SimpleRepository: Repository<Request = ()> {
  async fn fetch(&self) -> Result<Self::Response, DomainError> {
    self.execute(()).await
  }
}

impl<R: Repository<Request = ()>> SimpleRepository for R {}

/// Domain entity with a stable identity.
pub trait Entity {
  type Id: Eq + Hash + Clone + Debug + Send + Sync;

  fn id(&self) -> Self::Id;
}

/// Standard operations over a collection of entities.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudRequest<T: Entity> {
  Create(T),
  Read(T::Id),
  Update(T),
  Delete(T::Id),
  List,
}

/// What a [`CrudRequest`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudResponse<T> {
  /// The created, read or updated entity
  One(T),
  Many(Vec<T>),
  Deleted,
}

/// Repository over [`CrudRequest`]s, with typed shortcuts for each operation.
///
/// A response variant that does not fit the request is reported as
/// [`DomainError::Unknown`].
#[async_trait]
pub trait CrudRepository<T>: Repository<Request = CrudRequest<T>, Response = CrudResponse<T>>
where
  T: Entity + Send + 'static,
  T::Id: 'static,
{
  async fn create(&self, entity: T) -> Result<T, DomainError> {
    expect_one(self.execute(CrudRequest::Create(entity)).await?)
  }

  async fn read(&self, id: T::Id) -> Result<T, DomainError> {
    expect_one(self.execute(CrudRequest::Read(id)).await?)
  }

  async fn update(&self, entity: T) -> Result<T, DomainError> {
    expect_one(self.execute(CrudRequest::Update(entity)).await?)
  }

  async fn delete(&self, id: T::Id) -> Result<(), DomainError> {
    match self.execute(CrudRequest::Delete(id)).await? {
      CrudResponse::Deleted => Ok(()),
      _ => Err(mismatched("Deleted")),
    }
  }

  async fn list(&self) -> Result<Vec<T>, DomainError> {
    match self.execute(CrudRequest::List).await? {
      CrudResponse::Many(items) => Ok(items),
      _ => Err(mismatched("Many")),
    }
  }
}

impl<T, R> CrudRepository<T> for R
where
  T: Entity + Send + 'static,
  T::Id: 'static,
  R: Repository<Request = CrudRequest<T>, Response = CrudResponse<T>>,
{
}

fn expect_one<T>(response: CrudResponse<T>) -> Result<T, DomainError> {
  match response {
    CrudResponse::One(entity) => Ok(entity),
    _ => Err(mismatched("One")),
  }
}

fn mismatched(expected: &str) -> DomainError {
  DomainError::Unknown(format!("repository returned a response other than {}", expected).into())
}

/// A single application operation, independent of where its data lives.
#[async_trait]
pub trait UseCase: Send + Sync {
  type Input: Send;
  type Output: Send;

  async fn execute(&self, input: Self::Input) -> Result<Self::Output, DomainError>;
}

/// Conversion between two representations, e.g. a wire type and an entity.
pub trait Mapper<Input, Output> {
  fn map(&self, input: Input) -> Result<Output, DomainError>;
}

/// Mapper that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMapper;

impl<T> Mapper<T, T> for IdentityMapper {
  fn map(&self, input: T) -> Result<T, DomainError> {
    Ok(input)
  }
}

/// Reaction to events that are not reducer actions, such as lifecycle signals.
#[async_trait]
pub trait EventHandling: Send {
  type Event: Send;

  async fn handle(&mut self, event: Self::Event);
}

/// A feature that also reacts to events.
pub trait EventDrivenFeature: Feature + EventHandling {}

impl<F: Feature + EventHandling> EventDrivenFeature for F {}
