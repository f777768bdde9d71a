//! Repository and construction error types.

use crate::db::DbError;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Backend failure raised by a repository operation.
///
/// Values of this type travel from the backend to the caller untouched; the
/// service layer logs them but never rewraps them.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("failed to encode or decode `{collection}` entity: {source}")]
    Serialization {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate key `{id}` in collection `{collection}`")]
    DuplicateKey { collection: &'static str, id: String },
    /// The record addressed by an update no longer exists.
    #[error("entity `{id}` in collection `{collection}` does not exist")]
    Stale { collection: &'static str, id: String },
    #[error("sqlite backend requires a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("backend task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("backend connection lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Missing or unusable dependency detected while building a repository,
/// backend or service.
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("service requires a repository but none was supplied")]
    MissingRepository,
    #[error("invalid collection name `{0}`")]
    InvalidCollectionName(&'static str),
    #[error(
        "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error(transparent)]
    Db(#[from] DbError),
}
