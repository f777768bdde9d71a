//! Entity use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD/query entry points for application callers.
//! - Delegate persistence to an injected `Repository` implementation.
//!
//! # Invariants
//! - Service APIs never bypass the repository contract.
//! - Every failure passes through `execute_with_logging` exactly once.

use crate::model::entity::Entity;
use crate::model::predicate::Predicate;
use crate::repo::error::{ConstructionError, RepoResult};
use crate::repo::generic_repo::Repository;
use crate::service::execute::{execute_with_logging, OpArgs};
use async_trait::async_trait;
use std::marker::PhantomData;

/// Application-facing contract; a domain-verb mirror of `Repository`.
#[async_trait]
pub trait EntityService<T: Entity>: Send + Sync {
    async fn get_all(&self) -> RepoResult<Vec<T>>;

    /// Entities satisfying `predicate` (the former `find`/`query` pair).
    async fn find(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>>;

    async fn get_by_id(&self, id: &T::Id) -> RepoResult<Option<T>>;

    async fn create(&self, entity: &T) -> RepoResult<()>;

    async fn update(&self, entity: &T) -> RepoResult<()>;

    async fn delete(&self, id: &T::Id) -> RepoResult<()>;

    async fn query_single(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>>;
}

/// Service over any repository of `T`.
///
/// Swapping backends means injecting another `R`; nothing here changes.
pub struct GenericService<T, R> {
    repo: R,
    _entity: PhantomData<fn() -> T>,
}

/// Builder that rejects a missing repository at construction time.
pub struct GenericServiceBuilder<T, R> {
    repo: Option<R>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R> GenericService<T, R>
where
    T: Entity,
    R: Repository<T>,
{
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    pub fn builder() -> GenericServiceBuilder<T, R> {
        GenericServiceBuilder {
            repo: None,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

impl<T, R> GenericServiceBuilder<T, R>
where
    T: Entity,
    R: Repository<T>,
{
    pub fn repository(mut self, repo: R) -> Self {
        self.repo = Some(repo);
        self
    }

    /// # Errors
    /// - `ConstructionError::MissingRepository` when no repository was set.
    pub fn build(self) -> Result<GenericService<T, R>, ConstructionError> {
        self.repo
            .map(GenericService::new)
            .ok_or(ConstructionError::MissingRepository)
    }
}

#[async_trait]
impl<T, R> EntityService<T> for GenericService<T, R>
where
    T: Entity,
    R: Repository<T>,
{
    async fn get_all(&self) -> RepoResult<Vec<T>> {
        execute_with_logging("get_all", || None, self.repo.get_all()).await
    }

    async fn find(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>> {
        execute_with_logging(
            "find",
            || Some(OpArgs::predicate(predicate)),
            self.repo.find(predicate),
        )
        .await
    }

    async fn get_by_id(&self, id: &T::Id) -> RepoResult<Option<T>> {
        execute_with_logging(
            "get_by_id",
            || Some(OpArgs::id(id)),
            self.repo.get_by_id(id),
        )
        .await
    }

    async fn create(&self, entity: &T) -> RepoResult<()> {
        execute_with_logging(
            "create",
            || Some(OpArgs::entity(entity)),
            self.repo.add(entity),
        )
        .await
    }

    async fn update(&self, entity: &T) -> RepoResult<()> {
        execute_with_logging(
            "update",
            || Some(OpArgs::entity(entity)),
            self.repo.update(entity),
        )
        .await
    }

    async fn delete(&self, id: &T::Id) -> RepoResult<()> {
        execute_with_logging("delete", || Some(OpArgs::id(id)), self.repo.remove(id)).await
    }

    async fn query_single(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>> {
        execute_with_logging(
            "query_single",
            || Some(OpArgs::predicate(predicate)),
            self.repo.query_single(predicate),
        )
        .await
    }
}
