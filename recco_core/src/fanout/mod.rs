//! Concurrent multi-vertical search.
//!
//! This module provides:
//! - `VerticalRegistry`: the startup-validated vertical → handler map
//! - `SearchBranch`: one timed search against a single vertical
//! - `FanOutSearchCoordinator`: runs and joins all branches for a request

mod branch;
mod coordinator;
mod registry;

pub use branch::{BranchOutcome, BranchReport, SearchBranch};
pub use coordinator::{FanOutSearchCoordinator, SearchOutcome};
pub use registry::{VerticalRegistry, VerticalRegistryBuilder};

/// Default per-branch timeout in milliseconds
pub const DEFAULT_BRANCH_TIMEOUT_MS: u64 = 5000;
