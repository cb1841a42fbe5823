//! # Crafting Search
//!
//! Finds how a target item can be produced from base items, exploring from
//! the target down, from the base items up, or from both ends at once.
//!
//! ## Architecture
//!
//! ```text
//! Solver::solve(target, config)
//!     │
//!     ├──> validate config, resolve target (fails before any task starts)
//!     │
//!     ├──> SearchState (per request: admissions, chosen recipes, quota)
//!     │
//!     ├──> TopDown ─────────────┐
//!     │      multi/single recipe │ shared DoneSignal
//!     │      DFS/BFS work-list   │ (bidirectional mode)
//!     │                          │
//!     ├──> BottomUp ────────────┘
//!     │      tiered worker pool / depth-first walk
//!     │
//!     └──> export(catalog, snapshot, root) -> ExportElement tree
//! ```

mod bidirectional;
mod bottom_up;
mod config;
mod error;
mod export;
mod limits;
mod progress;
mod quota;
mod signal;
mod solver;
mod state;
mod top_down;

#[cfg(test)]
mod fixtures;

pub use bidirectional::{run_bidirectional, BidirectionalOutcome};
pub use bottom_up::BottomUpEngine;
pub use config::{
    parse_recipe_limit, BottomUpStrategy, Execution, RawSearchConfig, SearchConfig, SearchMode,
    TopDownStrategy, Traversal, DRAIN_IDLE_ENV,
};
pub use error::{Result, SearchError};
pub use export::{export, ExportElement, ExportRecipe, ELEMENT, RECIPE};
pub use limits::{
    default_in_flight, ExpansionPermit, ExpansionSlots, ExpansionSnapshot, MAX_IN_FLIGHT,
    MAX_IN_FLIGHT_ENV,
};
pub use progress::{ProgressEvent, ProgressSink};
pub use quota::{QuotaLedger, QuotaRejection};
pub use signal::{DoneSignal, Termination};
pub use solver::{RunOutcome, Snapshot, Solution, Solver};
pub use state::{Choice, Discovered, SearchState, SearchStats, Side};
pub use top_down::TopDownEngine;
