//! Transactional SQLite backend.
//!
//! # Responsibility
//! - Hold the shared connection (`SqliteContext`) that acts as unit of work.
//! - Store each entity as a JSON body in the `entities` table, namespaced by
//!   `Entity::COLLECTION`.
//!
//! # Invariants
//! - Every mutation runs in its own transaction and commits before returning.
//! - `replace` compares stored and new top-level fields and skips the write
//!   when nothing changed.
//! - The connection lock is held for exactly one backend call and never
//!   while caller code (predicates) runs.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use crate::model::entity::{is_valid_collection_name, Entity, EntityId};
use crate::model::predicate::Predicate;
use crate::repo::backend::{encode, serialization_error, StoreBackend};
use crate::repo::error::{ConstructionError, RepoError, RepoResult};
use crate::repo::generic_repo::{GenericRepository, REPO_LOG_TARGET};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;

const SELECT_BODY_BY_ID_SQL: &str =
    "SELECT body FROM entities WHERE collection = ?1 AND id = ?2;";
const SELECT_BODIES_SQL: &str = "SELECT body FROM entities WHERE collection = ?1 ORDER BY seq;";

/// Shared handle to a migrated SQLite connection.
///
/// Cloning is cheap; clones share the same connection. Backend calls run the
/// blocking rusqlite work on the Tokio blocking pool, so they must be awaited
/// inside a Tokio runtime; elsewhere they fail with `RepoError::NoRuntime`.
#[derive(Debug, Clone)]
pub struct SqliteContext {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContext {
    /// Wraps a connection whose schema is at the latest migration version.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    pub fn try_new(conn: Connection) -> Result<Self, ConstructionError> {
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(ConstructionError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConstructionError> {
        Self::try_new(open_db(path)?)
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> Result<Self, ConstructionError> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Typed view over the records of `T`.
    pub fn set<T: Entity>(&self) -> Result<SqliteBackend<T>, ConstructionError> {
        if !is_valid_collection_name(T::COLLECTION) {
            return Err(ConstructionError::InvalidCollectionName(T::COLLECTION));
        }

        Ok(SqliteBackend {
            context: self.clone(),
            _entity: PhantomData,
        })
    }

    async fn run<R, F>(&self, work: F) -> RepoResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Connection) -> RepoResult<R> + Send + 'static,
    {
        let runtime = Handle::try_current()?;
        let conn = Arc::clone(&self.conn);
        runtime
            .spawn_blocking(move || {
                let mut guard = conn.lock().map_err(|_| RepoError::Poisoned)?;
                work(&mut guard)
            })
            .await?
    }
}

/// `StoreBackend` over one collection of a `SqliteContext`.
pub struct SqliteBackend<T> {
    context: SqliteContext,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for SqliteBackend<T> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> GenericRepository<T, SqliteBackend<T>> {
    /// Builds a repository over the `T` records of `context`.
    pub fn sqlite(context: &SqliteContext) -> Result<Self, ConstructionError> {
        Ok(Self::new(context.set::<T>()?))
    }
}

/// Repository backed by the transactional SQLite store.
pub type SqliteRepository<T> = GenericRepository<T, SqliteBackend<T>>;

#[async_trait]
impl<T: Entity> StoreBackend<T> for SqliteBackend<T> {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn reads_before_delete(&self) -> bool {
        true
    }

    async fn find_by_id(&self, id: &T::Id) -> RepoResult<Option<T>> {
        let key = id.to_key();
        self.context
            .run(move |conn| {
                let body: Option<String> = conn
                    .query_row(SELECT_BODY_BY_ID_SQL, params![T::COLLECTION, key], |row| {
                        row.get(0)
                    })
                    .optional()?;
                body.map(|body| decode::<T>(&body)).transpose()
            })
            .await
    }

    async fn find_all(&self) -> RepoResult<Vec<T>> {
        self.scan(Predicate::always(), None).await
    }

    async fn find_where(&self, predicate: &Predicate<T>) -> RepoResult<Vec<T>> {
        self.scan(predicate.clone(), None).await
    }

    async fn find_first(&self, predicate: &Predicate<T>) -> RepoResult<Option<T>> {
        let mut found = self.scan(predicate.clone(), Some(1)).await?;
        Ok(found.pop())
    }

    async fn insert(&self, entity: &T) -> RepoResult<()> {
        let key = entity.id().to_key();
        let body = encode(entity)?.to_string();
        self.context
            .run(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO entities (collection, id, body) VALUES (?1, ?2, ?3);",
                    params![T::COLLECTION, key, body],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
    }

    async fn replace(&self, entity: &T) -> RepoResult<()> {
        let key = entity.id().to_key();
        let next = encode(entity)?;
        self.context
            .run(move |conn| {
                let tx = conn.transaction()?;
                let stored: Option<String> = tx
                    .query_row(SELECT_BODY_BY_ID_SQL, params![T::COLLECTION, key], |row| {
                        row.get(0)
                    })
                    .optional()?;
                let Some(stored) = stored else {
                    return Err(RepoError::Stale {
                        collection: T::COLLECTION,
                        id: key,
                    });
                };
                let stored: Value =
                    serde_json::from_str(&stored).map_err(serialization_error::<T>)?;

                let changed = changed_fields(&stored, &next);
                if changed.is_empty() {
                    debug!(
                        target: REPO_LOG_TARGET,
                        "event=entity_replace module=repo backend=sqlite collection={} id={} status=unchanged",
                        T::COLLECTION,
                        key
                    );
                    return Ok(());
                }

                tx.execute(
                    "UPDATE entities
                     SET
                        body = ?3,
                        version = version + 1,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE collection = ?1 AND id = ?2;",
                    params![T::COLLECTION, key, next.to_string()],
                )?;
                tx.commit()?;

                debug!(
                    target: REPO_LOG_TARGET,
                    "event=entity_replace module=repo backend=sqlite collection={} id={} status=ok changed_fields={}",
                    T::COLLECTION,
                    key,
                    changed.join(",")
                );
                Ok(())
            })
            .await
    }

    async fn delete(&self, id: &T::Id) -> RepoResult<()> {
        let key = id.to_key();
        self.context
            .run(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM entities WHERE collection = ?1 AND id = ?2;",
                    params![T::COLLECTION, key],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
    }
}

impl<T: Entity> SqliteBackend<T> {
    /// Reads the collection bodies under the connection lock, then decodes and
    /// filters them after the lock is released. Caller predicates never run
    /// while the connection is held.
    async fn scan(&self, predicate: Predicate<T>, limit: Option<usize>) -> RepoResult<Vec<T>> {
        let bodies = self
            .context
            .run(|conn| {
                let mut stmt = conn.prepare(SELECT_BODIES_SQL)?;
                let bodies = stmt
                    .query_map(params![T::COLLECTION], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(bodies)
            })
            .await?;

        let mut matches = Vec::new();
        for body in bodies {
            let entity = decode::<T>(&body)?;
            if predicate.matches(&entity) {
                matches.push(entity);
                if limit.is_some_and(|limit| matches.len() >= limit) {
                    break;
                }
            }
        }
        Ok(matches)
    }
}

fn decode<T: Entity>(body: &str) -> RepoResult<T> {
    serde_json::from_str(body).map_err(serialization_error::<T>)
}

/// Names of top-level fields whose values differ between two documents.
///
/// Non-object documents are compared whole and reported as `$`.
fn changed_fields(stored: &Value, next: &Value) -> Vec<String> {
    match (stored, next) {
        (Value::Object(stored), Value::Object(next)) => {
            let mut changed: Vec<String> = next
                .iter()
                .filter(|(field, value)| stored.get(*field) != Some(*value))
                .map(|(field, _)| field.clone())
                .collect();
            changed.extend(
                stored
                    .keys()
                    .filter(|field| !next.contains_key(*field))
                    .cloned(),
            );
            changed.sort();
            changed
        }
        _ if stored == next => Vec::new(),
        _ => vec!["$".to_string()],
    }
}
