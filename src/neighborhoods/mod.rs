//! Neighborhood explorers: Change, Swap, and Clopen (§4.D–F).
//!
//! Each submodule owns a move descriptor, a `feasible`/`random_move`/
//! `first_move`/`next_move` quartet, an `apply` that mutates a
//! [`crate::state::SolutionState`], and delta-cost functions that avoid
//! recomputing the full objective.

pub mod change;
pub mod clopen;
pub mod swap;

pub use change::Change;
pub use clopen::Clopen;
pub use swap::Swap;
