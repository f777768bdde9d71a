//! Entity and predicate model shared by every backend.
//!
//! # Responsibility
//! - Define what a storable entity must provide to the data-access layer.
//! - Define the caller-supplied predicate used by filtering operations.
//!
//! # Invariants
//! - Every entity resolves exactly one identity value through `Entity::id`.
//! - The core never inspects entity fields other than the identity.

pub mod entity;
pub mod predicate;
