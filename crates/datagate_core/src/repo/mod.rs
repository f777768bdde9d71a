//! Repository layer abstractions and backend adapters.
//!
//! # Responsibility
//! - Define the uniform CRUD/predicate contract (`Repository`).
//! - Define the backend capability (`StoreBackend`) the generic repository
//!   is written against.
//! - Provide the SQLite (transactional) and document backend adapters.
//!
//! # Invariants
//! - "Not found" is `Ok(None)` or a no-op, never an error.
//! - Backend failures are observed at the adapter boundary and returned
//!   unchanged. No retries.

pub mod backend;
pub mod document_backend;
pub mod error;
pub mod generic_repo;
pub mod sqlite_backend;
