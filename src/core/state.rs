//! The `State` trait implemented by dispatch statuses.
//!
//! A status is a plain value describing where a conversation turn currently
//! is. Inspecting it never has side effects.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for statuses a dispatch machine moves through.
///
/// # Required Traits
///
/// - `Clone` + `PartialEq`: statuses are copied into the trace and compared
///   by routing guards
/// - `Debug`: statuses show up in diagnostics
/// - `Serialize` + `Deserialize`: statuses are written into the history log
///
/// # Example
///
/// ```rust
/// use hearth::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Lamp {
///     Idle,
///     Lit,
///     Burnt,
/// }
///
/// impl State for Lamp {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "idle",
///             Self::Lit => "lit",
///             Self::Burnt => "burnt",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Burnt)
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Burnt)
///     }
/// }
///
/// assert_eq!(Lamp::Lit.name(), "lit");
/// assert!(Lamp::Burnt.is_final());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Wire name of the status, as written to logs and history records.
    fn name(&self) -> &str;

    /// Whether the conversation stops once this status is reached.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Whether the status records a failure inside the turn.
    ///
    /// Error statuses are not necessarily final: a failed parse still runs
    /// through history update and the end-of-turn check.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
