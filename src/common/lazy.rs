//! Per-instance, resolve-on-demand attribute slots.
//!
//! Entities load only their own columns. Anything that needs another table
//! (a parent area, the label behind a lookup id) lives in a [`Lazy`] slot on
//! a view wrapper and is resolved the first time an accessor asks for it.
//! A slot resolves at most once until it is invalidated; a freshly loaded
//! instance always starts empty.

use std::future::Future;

use tokio::sync::OnceCell;

use crate::common::error::{AppError, IntegrityError};

/// Shown in place of a label whose lookup row no longer exists.
pub const PLACEHOLDER: &str = "—";

/// What to do when a resolver finds a dangling foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Substitute a fixed display value.
    Placeholder(&'static str),
    /// Abort with [`IntegrityError::MissingReference`].
    Fail,
}

impl MissingPolicy {
    pub fn apply(
        self,
        attribute: &'static str,
        id: i32,
        found: Option<String>,
    ) -> Result<String, AppError> {
        match (found, self) {
            (Some(value), _) => Ok(value),
            (None, MissingPolicy::Placeholder(placeholder)) => Ok(placeholder.to_owned()),
            (None, MissingPolicy::Fail) => {
                Err(IntegrityError::MissingReference { attribute, id }.into())
            }
        }
    }
}

/// A named lazily resolved attribute of some entity.
pub trait LazyAttribute: Copy + std::fmt::Debug {
    fn name(self) -> &'static str;

    fn missing_policy(self) -> MissingPolicy {
        MissingPolicy::Fail
    }
}

/// A memoizing slot holding one resolved value.
#[derive(Debug, Clone)]
pub struct Lazy<T> {
    cell: OnceCell<T>,
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Lazy<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.initialized()
    }

    /// Returns the cached value, running `resolve` only if the slot is empty.
    /// A failed resolution leaves the slot empty.
    pub async fn get_or_resolve<F, Fut>(&self, resolve: F) -> Result<&T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        self.cell.get_or_try_init(resolve).await
    }

    /// Drops the cached value so the next read resolves again.
    pub fn invalidate(&mut self) -> Option<T> {
        self.cell.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(calls: &AtomicUsize, value: &str) -> Result<String, AppError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value.to_owned())
    }

    #[tokio::test]
    async fn resolver_runs_once_per_instance() {
        let calls = AtomicUsize::new(0);
        let slot: Lazy<String> = Lazy::new();

        let first = slot.get_or_resolve(|| counted(&calls, "oak")).await.unwrap().clone();
        let second = slot.get_or_resolve(|| counted(&calls, "pine")).await.unwrap().clone();

        assert_eq!(first, "oak");
        assert_eq!(second, "oak");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_a_new_resolution() {
        let calls = AtomicUsize::new(0);
        let mut slot: Lazy<String> = Lazy::new();

        slot.get_or_resolve(|| counted(&calls, "oak")).await.unwrap();
        assert_eq!(slot.invalidate().as_deref(), Some("oak"));
        assert!(!slot.is_resolved());

        let value = slot.get_or_resolve(|| counted(&calls, "pine")).await.unwrap();
        assert_eq!(value, "pine");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_resolution_is_not_cached() {
        let slot: Lazy<String> = Lazy::new();
        let err = slot
            .get_or_resolve(|| async { Err(AppError::NotFound("material")) })
            .await;
        assert!(err.is_err());
        assert!(slot.get().is_none());
    }

    #[test]
    fn missing_policy_is_per_attribute() {
        let placeholder = MissingPolicy::Placeholder(PLACEHOLDER).apply("paint", 4, None);
        assert_eq!(placeholder.unwrap(), PLACEHOLDER);

        let fail = MissingPolicy::Fail.apply("material", 4, None).unwrap_err();
        assert!(fail.is_integrity());

        let found = MissingPolicy::Fail.apply("material", 4, Some("oak".into()));
        assert_eq!(found.unwrap(), "oak");
    }
}
