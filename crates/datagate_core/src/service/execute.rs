//! Shared log-on-failure execution wrapper.
//!
//! # Invariants
//! - The wrapped result is returned exactly as produced.
//! - One `error` record per failure, none per success.
//! - Argument text is rendered only when a failure is recorded.

use crate::logging::sanitize_message;
use crate::model::entity::EntityId;
use crate::model::predicate::Predicate;
use crate::repo::error::RepoResult;
use log::error;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Instant;

/// Log target of service failure records.
pub const SERVICE_LOG_TARGET: &str = "datagate::service";

const MAX_ARGS_CHARS: usize = 512;
const MAX_ERROR_CHARS: usize = 512;

/// Key arguments recorded alongside a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpArgs {
    /// Identity addressed by a read or delete.
    Id(String),
    /// JSON snapshot of an entity handed to a mutation.
    Entity(String),
    /// Description of a filtering predicate.
    Predicate(String),
}

impl OpArgs {
    pub fn id(id: &impl EntityId) -> Self {
        Self::Id(id.to_key())
    }

    pub fn entity(entity: &impl Serialize) -> Self {
        let snapshot = serde_json::to_string(entity)
            .unwrap_or_else(|err| format!("<unserializable entity: {err}>"));
        Self::Entity(snapshot)
    }

    pub fn predicate<T>(predicate: &Predicate<T>) -> Self {
        Self::Predicate(predicate.description().to_string())
    }
}

impl Display for OpArgs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Entity(snapshot) => write!(f, "entity={snapshot}"),
            Self::Predicate(description) => write!(f, "predicate={description}"),
        }
    }
}

/// Awaits `operation`; on failure records `(op_name, args)` with the
/// failure, then returns the failure unchanged.
///
/// `args` is evaluated lazily, only on the failure path.
pub async fn execute_with_logging<V, F, A>(op_name: &str, args: A, operation: F) -> RepoResult<V>
where
    F: Future<Output = RepoResult<V>>,
    A: FnOnce() -> Option<OpArgs>,
{
    let started_at = Instant::now();
    operation.await.inspect_err(|err| {
        let args = args()
            .map(|args| sanitize_message(&args.to_string(), MAX_ARGS_CHARS))
            .unwrap_or_else(|| "none".to_string());
        error!(
            target: SERVICE_LOG_TARGET,
            "event=entity_op module=service op={} status=error duration_ms={} args={} error={}",
            op_name,
            started_at.elapsed().as_millis(),
            args,
            sanitize_message(&err.to_string(), MAX_ERROR_CHARS)
        );
    })
}
