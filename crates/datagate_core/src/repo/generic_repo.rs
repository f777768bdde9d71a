//! Repository contract and its single generic implementation.
//!
//! # Responsibility
//! - Expose identity lookup, full scan, predicate filtering, single-entity
//!   mutation and deletion over any `StoreBackend`.
//! - Observe backend failures at the adapter boundary.
//!
//! # Invariants
//! - `remove` of an absent id is a no-op on every backend.
//! - `update` resolves the identity with `Entity::id`, never from the caller.
//! - After `update` succeeds, `get_by_id` returns a value equal to the
//!   supplied entity.

use crate::model::entity::Entity;
use crate::model::predicate::Predicate;
use crate::repo::backend::StoreBackend;
use crate::repo::error::RepoResult;
use async_trait::async_trait;
use log::debug;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) const REPO_LOG_TARGET: &str = "datagate::repo";

/// Uniform CRUD and predicate-query contract over entity type `T`.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Returns the entity addressed by `id`, or `None`.
    async fn get_by_id(&self, id: &T::Id) -> RepoResult<Option<T>>;

    /// Returns every entity in backend-native order.
    async fn get_all(&self) -> RepoResult<Vec<T>>;

    /// Returns every entity satisfying `predicate`.
    ///
    /// Also serves the historical `query` name; both always had the same
    /// meaning.
    async fn find(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>>;

    /// Returns the first entity satisfying `predicate`, if any. Multiple
    /// matches silently yield one.
    async fn query_single(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>>;

    /// Persists a new entity.
    async fn add(&self, entity: &T) -> RepoResult<()>;

    /// Fully replaces the stored record matching `entity.id()`.
    async fn update(&self, entity: &T) -> RepoResult<()>;

    /// Deletes the entity addressed by `id` if present.
    async fn remove(&self, id: &T::Id) -> RepoResult<()>;
}

#[async_trait]
impl<T, R> Repository<T> for Arc<R>
where
    T: Entity,
    R: Repository<T> + ?Sized,
{
    async fn get_by_id(&self, id: &T::Id) -> RepoResult<Option<T>> {
        (**self).get_by_id(id).await
    }

    async fn get_all(&self) -> RepoResult<Vec<T>> {
        (**self).get_all().await
    }

    async fn find(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>> {
        (**self).find(predicate).await
    }

    async fn query_single(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>> {
        (**self).query_single(predicate).await
    }

    async fn add(&self, entity: &T) -> RepoResult<()> {
        (**self).add(entity).await
    }

    async fn update(&self, entity: &T) -> RepoResult<()> {
        (**self).update(entity).await
    }

    async fn remove(&self, id: &T::Id) -> RepoResult<()> {
        (**self).remove(id).await
    }
}

/// Repository written once against the `StoreBackend` capability.
pub struct GenericRepository<T, B> {
    backend: B,
    _entity: PhantomData<fn() -> T>,
}

impl<T, B> GenericRepository<T, B>
where
    T: Entity,
    B: StoreBackend<T>,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn observe<V>(
        &self,
        op: &'static str,
        key: impl FnOnce() -> String,
        result: RepoResult<V>,
    ) -> RepoResult<V> {
        result.inspect_err(|err| {
            debug!(
                target: REPO_LOG_TARGET,
                "event=backend_call module=repo backend={} collection={} op={} status=error {} error={}",
                self.backend.name(),
                T::COLLECTION,
                op,
                key(),
                err
            );
        })
    }
}

#[async_trait]
impl<T, B> Repository<T> for GenericRepository<T, B>
where
    T: Entity,
    B: StoreBackend<T>,
{
    async fn get_by_id(&self, id: &T::Id) -> RepoResult<Option<T>> {
        let result = self.backend.find_by_id(id).await;
        self.observe("get_by_id", || format!("id={id}"), result)
    }

    async fn get_all(&self) -> RepoResult<Vec<T>> {
        let result = self.backend.find_all().await;
        self.observe("get_all", || "scan=all".to_string(), result)
    }

    async fn find(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>> {
        let result = self.backend.find_where(predicate).await;
        self.observe(
            "find",
            || format!("predicate={}", predicate.description()),
            result,
        )
    }

    async fn query_single(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>> {
        let result = self.backend.find_first(predicate).await;
        self.observe(
            "query_single",
            || format!("predicate={}", predicate.description()),
            result,
        )
    }

    async fn add(&self, entity: &T) -> RepoResult<()> {
        let result = self.backend.insert(entity).await;
        self.observe("add", || format!("id={}", entity.id()), result)
    }

    async fn update(&self, entity: &T) -> RepoResult<()> {
        let result = self.backend.replace(entity).await;
        self.observe("update", || format!("id={}", entity.id()), result)
    }

    async fn remove(&self, id: &T::Id) -> RepoResult<()> {
        let result = if self.backend.reads_before_delete() {
            match self.backend.find_by_id(id).await {
                Ok(Some(_)) => self.backend.delete(id).await,
                Ok(None) => Ok(()),
                Err(err) => Err(err),
            }
        } else {
            self.backend.delete(id).await
        };
        self.observe("remove", || format!("id={id}"), result)
    }
}
