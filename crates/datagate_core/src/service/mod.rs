//! Backend-agnostic entity services.
//!
//! # Responsibility
//! - Expose domain verbs (`create`, `delete`, ...) over any `Repository`.
//! - Record every failed operation once, then hand the failure back.
//!
//! # Invariants
//! - Services depend on the `Repository` contract, never on a backend type.
//! - Successful calls emit no log record.

pub mod entity_service;
pub mod execute;
