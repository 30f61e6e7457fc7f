//! Fan-out search execution.
//!
//! Runs one branch per requested vertical concurrently and joins all of them.
//! Branch failures are folded into the outcome, never raised.

use super::{SearchBranch, VerticalRegistry, DEFAULT_BRANCH_TIMEOUT_MS};
use crate::types::{RunStatus, Vertical, VerticalSearchResult};
use crate::utils::elapsed_ms;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Aggregated result of one fan-out, keyed by vertical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: BTreeMap<Vertical, VerticalSearchResult>,

    /// `partial` iff any branch errored or timed out
    pub status: RunStatus,

    /// Wall time of the whole fan-out (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl SearchOutcome {
    pub fn from_results(results: BTreeMap<Vertical, VerticalSearchResult>) -> Self {
        let status = if results.values().any(VerticalSearchResult::is_error) {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        };
        Self {
            results,
            status,
            duration_ms: None,
        }
    }

    /// Error text per failed vertical.
    pub fn errors(&self) -> BTreeMap<Vertical, String> {
        self.results
            .iter()
            .filter_map(|(vertical, result)| result.error.clone().map(|e| (*vertical, e)))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.status == RunStatus::Partial
    }

    /// Every branch failed.
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(VerticalSearchResult::is_error)
    }

    /// Candidates across all verticals before composition.
    pub fn candidate_count(&self) -> usize {
        self.results.values().map(|r| r.results.len()).sum()
    }
}

/// Launches and joins per-vertical search branches.
#[derive(Debug, Clone)]
pub struct FanOutSearchCoordinator {
    registry: VerticalRegistry,
    branch_timeout_ms: u64,
}

impl FanOutSearchCoordinator {
    pub fn new(registry: VerticalRegistry) -> Self {
        Self {
            registry,
            branch_timeout_ms: DEFAULT_BRANCH_TIMEOUT_MS,
        }
    }

    pub fn with_branch_timeout_ms(mut self, branch_timeout_ms: u64) -> Self {
        self.branch_timeout_ms = branch_timeout_ms;
        self
    }

    pub fn branch_timeout_ms(&self) -> u64 {
        self.branch_timeout_ms
    }

    /// Search every vertical concurrently and wait for all branches.
    ///
    /// Siblings are never cancelled when one branch fails. Dropping the
    /// returned future cancels every branch still in flight.
    pub async fn search(
        &self,
        query: &str,
        verticals: &BTreeSet<Vertical>,
        k: usize,
        tenant: Option<&str>,
    ) -> SearchOutcome {
        let start = Instant::now();
        trace!(target: "recco.fanout", %query, "fanning out search");

        let branches: Vec<_> = verticals
            .iter()
            .map(|vertical| {
                let handler = self.registry.handler(*vertical).as_ref();
                SearchBranch::new(*vertical, handler, self.branch_timeout_ms).run(query, k, tenant)
            })
            .collect();

        let reports = futures::future::join_all(branches).await;

        let results: BTreeMap<Vertical, VerticalSearchResult> = reports
            .into_iter()
            .map(|report| (report.vertical, report.into_result()))
            .collect();

        let mut outcome = SearchOutcome::from_results(results);
        outcome.duration_ms = Some(elapsed_ms(start));

        if outcome.has_errors() {
            info!(
                target: "recco.fanout",
                branches = verticals.len(),
                failed = outcome.errors().len(),
                duration_ms = outcome.duration_ms,
                "fan-out finished with partial results"
            );
        } else {
            debug!(
                target: "recco.fanout",
                branches = verticals.len(),
                candidates = outcome.candidate_count(),
                duration_ms = outcome.duration_ms,
                "fan-out complete"
            );
        }

        outcome
    }
}
