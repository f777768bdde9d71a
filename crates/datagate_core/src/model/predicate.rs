//! Caller-supplied entity predicates.
//!
//! Backends evaluate predicates directly against deserialized entities; there
//! is no query-expression translation layer.

use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type TestFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// Pure boolean test over an entity, with a description used in log records.
pub struct Predicate<T> {
    description: Cow<'static, str>,
    test: Arc<TestFn<T>>,
}

impl<T> Predicate<T> {
    /// Builds a predicate from a description and a side-effect-free test.
    pub fn new<F>(description: impl Into<Cow<'static, str>>, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            test: Arc::new(test),
        }
    }

    /// Predicate matching every entity.
    pub fn always() -> Self
    where
        T: 'static,
    {
        Self::new("true", |_| true)
    }

    /// Evaluates the predicate against one entity.
    pub fn matches(&self, entity: &T) -> bool {
        (self.test)(entity)
    }

    /// Human-readable form used in log records.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Both predicates must hold.
    pub fn and(self, other: Predicate<T>) -> Self
    where
        T: 'static,
    {
        let description = format!("({}) && ({})", self.description, other.description);
        let (left, right) = (self.test, other.test);
        Self::new(description, move |entity| left(entity) && right(entity))
    }

    /// Either predicate must hold.
    pub fn or(self, other: Predicate<T>) -> Self
    where
        T: 'static,
    {
        let description = format!("({}) || ({})", self.description, other.description);
        let (left, right) = (self.test, other.test);
        Self::new(description, move |entity| left(entity) || right(entity))
    }

    /// Inverts the predicate.
    pub fn negate(self) -> Self
    where
        T: 'static,
    {
        let description = format!("!({})", self.description);
        let inner = self.test;
        Self::new(description, move |entity| !inner(entity))
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> Debug for Predicate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
