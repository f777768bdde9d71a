//! Entity contract.
//!
//! # Responsibility
//! - Describe the identity and collection of a storable record type.
//! - Provide a stable string key for every identity type.
//!
//! # Invariants
//! - `Entity::id` is pure: the same in-memory state yields the same key.
//! - `COLLECTION` must be a plain identifier (see `is_valid_collection_name`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use uuid::Uuid;

static COLLECTION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid collection name regex")
});

/// Identity value addressing exactly one entity.
///
/// Backends store identities by their string key, so two identities with the
/// same key address the same record.
pub trait EntityId: Clone + Debug + Display + Send + Sync + 'static {
    /// Returns the backend storage key for this identity.
    fn to_key(&self) -> String {
        self.to_string()
    }
}

impl EntityId for String {}
impl EntityId for Uuid {}
impl EntityId for i32 {}
impl EntityId for i64 {}
impl EntityId for u32 {}
impl EntityId for u64 {}

/// A record type persisted through the data-access layer.
///
/// # Example
///
/// ```
/// use datagate_core::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Invoice {
///     id: String,
///     total_cents: i64,
/// }
///
/// impl Entity for Invoice {
///     type Id = String;
///     const COLLECTION: &'static str = "invoices";
///
///     fn id(&self) -> String {
///         self.id.clone()
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identity type of this entity.
    type Id: EntityId;

    /// Collection (document store) or logical table (SQLite) name.
    const COLLECTION: &'static str;

    /// Identity extractor used wherever the identity must be derived from
    /// the entity itself (update paths, inserts).
    fn id(&self) -> Self::Id;
}

/// Returns `true` when `name` is usable as a collection name.
pub fn is_valid_collection_name(name: &str) -> bool {
    COLLECTION_NAME_RE.is_match(name)
}
