//! State-machine kernel shared by the dispatch pipeline.
//!
//! - `State`: statuses a machine moves through
//! - `Guard`: pure predicates deciding which edge to follow
//! - `StateHistory`: immutable trace of status changes
//! - `state_enum!`: declares a status enum with its `State` impl
//!
//! Nothing in this module performs I/O.

mod guard;
mod macros;
mod state;
mod trace;

pub use guard::Guard;
pub use state::State;
pub use trace::{StateHistory, StateTransition};
