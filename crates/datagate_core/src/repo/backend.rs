//! Backend capability consumed by the generic repository.

use crate::model::entity::Entity;
use crate::model::predicate::Predicate;
use crate::repo::error::{RepoError, RepoResult};
use async_trait::async_trait;
use serde_json::Value;

/// Minimal set of storage primitives a backend must offer.
///
/// Implementations address records by `EntityId::to_key` inside the
/// `Entity::COLLECTION` namespace. Enumeration order is backend-native.
#[async_trait]
pub trait StoreBackend<T: Entity>: Send + Sync {
    /// Short backend label used in log records.
    fn name(&self) -> &'static str;

    /// Whether `remove` must materialize the record before deleting it.
    fn reads_before_delete(&self) -> bool {
        false
    }

    async fn find_by_id(&self, id: &T::Id) -> RepoResult<Option<T>>;

    async fn find_all(&self) -> RepoResult<Vec<T>>;

    async fn find_where(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>>;

    /// First match in enumeration order.
    async fn find_first(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>> {
        Ok(self.find_where(predicate).await?.into_iter().next())
    }

    /// Inserts a new record. Existing identity is a backend failure.
    async fn insert(&self, entity: &T) -> RepoResult<()>;

    /// Replaces the record addressed by `entity.id()`.
    async fn replace(&self, entity: &T) -> RepoResult<()>;

    /// Deletes the record addressed by `id`; absent ids are a no-op.
    async fn delete(&self, id: &T::Id) -> RepoResult<()>;
}

pub(crate) fn encode<T: Entity>(entity: &T) -> RepoResult<Value> {
    serde_json::to_value(entity).map_err(serialization_error::<T>)
}

pub(crate) fn serialization_error<T: Entity>(source: serde_json::Error) -> RepoError {
    RepoError::Serialization {
        collection: T::COLLECTION,
        source,
    }
}
