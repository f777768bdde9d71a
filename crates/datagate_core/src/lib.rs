//! Storage-agnostic data-access layer.
//!
//! Application code talks to an [`EntityService`], which delegates to a
//! [`Repository`]. The repository is written once against the
//! [`StoreBackend`] capability and ships with two backends: a transactional
//! SQLite store ([`SqliteContext`]) and an in-process document store
//! ([`MemoryDocumentStore`]).

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{Entity, EntityId};
pub use model::predicate::Predicate;
pub use repo::backend::StoreBackend;
pub use repo::document_backend::{
    DocumentCollection, DocumentContext, DocumentRepository, MemoryDocumentStore,
};
pub use repo::error::{ConstructionError, RepoError, RepoResult};
pub use repo::generic_repo::{GenericRepository, Repository};
pub use repo::sqlite_backend::{SqliteBackend, SqliteContext, SqliteRepository};
pub use service::entity_service::{EntityService, GenericService, GenericServiceBuilder};
pub use service::execute::{execute_with_logging, OpArgs, SERVICE_LOG_TARGET};
