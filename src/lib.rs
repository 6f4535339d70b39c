//! # cflp2si
//!
//! A local-search solver for the Capacitated Facility Location Problem with
//! two-source supply and store incompatibilities (CFLP-2S-I): warehouses
//! have capacity and a fixed opening cost, stores have an integer demand
//! (≥ 2) that must be covered by one or two distinct, compatible
//! warehouses, and the objective is the sum of fixed costs of open
//! warehouses plus unit supply costs.
//!
//! ## Modules
//!
//! - [`instance`] — the immutable problem instance and its derived indices
//!   (preferred suppliers/clients, neighbor-warehouse pairs).
//! - [`state`] — the incremental solution state and its mutation primitives.
//! - [`neighborhoods`] — the Change, Swap, and Clopen move explorers.
//! - [`builders`] — random and randomized-greedy initial-state construction.
//! - [`search`] — the metaheuristic drivers (hill-climbing, steepest
//!   descent, simulated annealing) composed on top of the neighborhoods.
//! - [`io`] — solution dump/pretty-print (de)serialization.
//! - [`report`] — the single-line JSON run report.
//!
//! ## Quick start
//!
//! ```rust
//! use cflp2si::instance::{Instance, PreferenceParams};
//! use cflp2si::builders;
//! use rand::SeedableRng;
//!
//! let inst = Instance::new(
//!     vec![10, 10],
//!     vec![100, 50],
//!     vec![5],
//!     vec![vec![7, 3]],
//!     vec![],
//!     PreferenceParams::default(),
//! ).unwrap();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let state = builders::random_state(&inst, &mut rng);
//! println!("initial cost: {}", state.total_cost(&inst));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod builders;
pub mod instance;
pub mod io;
pub mod neighborhoods;
pub mod report;
pub mod search;
pub mod state;

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;

/// Common imports for building and driving a search over a `cflp2si`
/// instance.
pub mod prelude {
    pub use crate::builders;
    pub use crate::instance::{Instance, PreferenceParams};
    pub use crate::io;
    pub use crate::neighborhoods::{change, clopen, swap, Change, Clopen, Swap};
    pub use crate::report::{GreedyFailureReport, RunReport};
    pub use crate::search::{self, CombinedMove, CoolingSchedule, Neighborhoods, RunOutcome, TimeoutMode};
    pub use crate::state::{Position, SolutionState};
    pub use crate::Error;
    pub use crate::Result;
}
