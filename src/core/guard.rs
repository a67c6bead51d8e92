//! Guard predicates for conditional edges.
//!
//! A guard decides whether an edge of the dispatch graph may be followed,
//! given the record the last node produced. Guards are pure: no I/O, no
//! mutation.

use std::fmt;
use std::sync::Arc;

/// Pure predicate over a value of type `T`.
///
/// Guards are cheap to clone so the same predicate can be shared between
/// graph definitions.
///
/// # Example
///
/// ```rust
/// use hearth::core::Guard;
///
/// let too_many = Guard::new(|failures: &u32| *failures >= 3);
///
/// assert!(!too_many.check(&2));
/// assert!(too_many.check(&3));
/// ```
pub struct Guard<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Guard<T> {
    /// Create a guard from a predicate.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check whether the guard lets `value` through.
    pub fn check(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    /// Guard that holds when `self` does not.
    pub fn negate(&self) -> Self
    where
        T: 'static,
    {
        let inner = Arc::clone(&self.predicate);
        Guard {
            predicate: Arc::new(move |value: &T| !inner(value)),
        }
    }
}

impl<T> Clone for Guard<T> {
    fn clone(&self) -> Self {
        Guard {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
