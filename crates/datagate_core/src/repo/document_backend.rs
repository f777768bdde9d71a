//! Document-store backend.
//!
//! # Responsibility
//! - Define the `DocumentContext` accessor keyed by entity type.
//! - Provide an in-process document store addressed by collection name.
//! - Adapt one collection to the `StoreBackend` capability.
//!
//! # Invariants
//! - Documents are whole JSON values keyed by identity; there is no
//!   field-level update path.
//! - `delete` addresses the document by identity without reading it first.
//! - Enumeration order is identity-key order.

use crate::model::entity::{is_valid_collection_name, Entity, EntityId};
use crate::model::predicate::Predicate;
use crate::repo::backend::{encode, serialization_error, StoreBackend};
use crate::repo::error::{ConstructionError, RepoError, RepoResult};
use crate::repo::generic_repo::GenericRepository;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;

type Documents = Arc<RwLock<BTreeMap<String, Value>>>;

/// In-process document database.
///
/// Cloning is cheap; clones share every collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<Mutex<HashMap<&'static str, Documents>>>,
}

/// Accessor handing out the document collection of an entity type.
///
/// The document repository is built from any context; `MemoryDocumentStore`
/// is the in-process implementation.
pub trait DocumentContext: Send + Sync {
    /// Returns the collection keyed by `T::COLLECTION`.
    ///
    /// # Errors
    /// - `ConstructionError` when the collection cannot be provided.
    fn collection<T: Entity>(&self) -> Result<DocumentCollection<T>, ConstructionError>;
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every collection created so far, sorted.
    pub fn collection_names(&self) -> Vec<&'static str> {
        let collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = collections.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl DocumentContext for MemoryDocumentStore {
    /// Creates the collection on first use; later calls share it.
    fn collection<T: Entity>(&self) -> Result<DocumentCollection<T>, ConstructionError> {
        if !is_valid_collection_name(T::COLLECTION) {
            return Err(ConstructionError::InvalidCollectionName(T::COLLECTION));
        }

        // Registry mutations cannot leave the map half-written, so a poisoned
        // lock still guards consistent data.
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let documents = collections.entry(T::COLLECTION).or_default().clone();

        Ok(DocumentCollection {
            documents,
            _entity: PhantomData,
        })
    }
}

/// Typed handle to one document collection; the `StoreBackend` of the
/// document repository.
pub struct DocumentCollection<T> {
    documents: Documents,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentCollection<T> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> DocumentCollection<T> {
    /// Empty collection owned by the caller, for contexts that manage their
    /// own storage.
    pub fn new() -> Self {
        Self {
            documents: Documents::default(),
            _entity: PhantomData,
        }
    }

    /// Number of stored documents.
    pub async fn count(&self) -> usize {
        self.documents.read().await.len()
    }
}

impl<T: Entity> Default for DocumentCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> GenericRepository<T, DocumentCollection<T>> {
    /// Builds a repository over the `T` collection of `context`.
    pub fn document(context: &impl DocumentContext) -> Result<Self, ConstructionError> {
        Ok(Self::new(context.collection::<T>()?))
    }
}

/// Repository backed by the document store.
pub type DocumentRepository<T> = GenericRepository<T, DocumentCollection<T>>;

#[async_trait]
impl<T: Entity> StoreBackend<T> for DocumentCollection<T> {
    fn name(&self) -> &'static str {
        "document"
    }

    async fn find_by_id(&self, id: &T::Id) -> RepoResult<Option<T>> {
        let documents = self.documents.read().await;
        documents.get(&id.to_key()).map(decode::<T>).transpose()
    }

    async fn find_all(&self) -> RepoResult<Vec<T>> {
        let documents = self.documents.read().await;
        documents.values().map(decode::<T>).collect()
    }

    async fn find_where(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>> {
        let documents = self.documents.read().await;
        let mut matches = Vec::new();
        for document in documents.values() {
            let entity = decode::<T>(document)?;
            if predicate.matches(&entity) {
                matches.push(entity);
            }
        }
        Ok(matches)
    }

    async fn find_first(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>> {
        let documents = self.documents.read().await;
        for document in documents.values() {
            let entity = decode::<T>(document)?;
            if predicate.matches(&entity) {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }

    async fn insert(&self, entity: &T) -> RepoResult<()> {
        let key = entity.id().to_key();
        let document = encode(entity)?;
        let mut documents = self.documents.write().await;
        if documents.contains_key(&key) {
            return Err(RepoError::DuplicateKey {
                collection: T::COLLECTION,
                id: key,
            });
        }
        documents.insert(key, document);
        Ok(())
    }

    async fn replace(&self, entity: &T) -> RepoResult<()> {
        let key = entity.id().to_key();
        let document = encode(entity)?;
        let mut documents = self.documents.write().await;
        match documents.get_mut(&key) {
            Some(stored) => {
                *stored = document;
                Ok(())
            }
            None => Err(RepoError::Stale {
                collection: T::COLLECTION,
                id: key,
            }),
        }
    }

    async fn delete(&self, id: &T::Id) -> RepoResult<()> {
        self.documents.write().await.remove(&id.to_key());
        Ok(())
    }
}

fn decode<T: Entity>(document: &Value) -> RepoResult<T> {
    <T as Deserialize<'_>>::deserialize(document).map_err(serialization_error::<T>)
}
