//! A single-vertical search invocation with its own timeout.

use crate::error::{BackendError, BranchError};
use crate::types::{ProductResult, Vertical, VerticalSearchResult};
use crate::utils::elapsed_ms;
use crate::VerticalSearch;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// How a branch ended. Timeouts and backend errors are kept apart.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    Succeeded(Vec<ProductResult>),
    Errored(BackendError),
    TimedOut { after_ms: u64 },
}

/// What a finished branch hands to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchReport {
    pub vertical: Vertical,
    pub outcome: BranchOutcome,
    pub duration_ms: u64,
}

impl BranchReport {
    pub fn error(&self) -> Option<BranchError> {
        match &self.outcome {
            BranchOutcome::Succeeded(_) => None,
            BranchOutcome::Errored(source) => Some(BranchError::Backend {
                vertical: self.vertical,
                source: source.clone(),
            }),
            BranchOutcome::TimedOut { after_ms } => Some(BranchError::TimedOut {
                vertical: self.vertical,
                after_ms: *after_ms,
            }),
        }
    }

    pub fn into_result(self) -> VerticalSearchResult {
        let vertical = self.vertical;
        let result = match self.outcome {
            BranchOutcome::Succeeded(rows) => VerticalSearchResult::succeeded(vertical, rows),
            BranchOutcome::Errored(source) => {
                VerticalSearchResult::failed(&BranchError::Backend { vertical, source })
            }
            BranchOutcome::TimedOut { after_ms } => {
                VerticalSearchResult::failed(&BranchError::TimedOut { vertical, after_ms })
            }
        };
        result.with_duration_ms(self.duration_ms)
    }
}

/// One search task scoped to a single vertical.
pub struct SearchBranch<'a> {
    vertical: Vertical,
    handler: &'a dyn VerticalSearch,
    timeout_ms: u64,
}

impl<'a> SearchBranch<'a> {
    pub fn new(vertical: Vertical, handler: &'a dyn VerticalSearch, timeout_ms: u64) -> Self {
        Self {
            vertical,
            handler,
            timeout_ms,
        }
    }

    /// Run the search. Never fails: every problem becomes a [`BranchOutcome`].
    ///
    /// A timeout drops only this branch's outstanding call.
    pub async fn run(self, query: &str, k: usize, tenant: Option<&str>) -> BranchReport {
        let start = Instant::now();
        let call = self.handler.search_vertical(self.vertical, query, k, tenant);

        let outcome = match timeout(Duration::from_millis(self.timeout_ms), call).await {
            Ok(Ok(rows)) => BranchOutcome::Succeeded(self.keep_own_rows(rows)),
            Ok(Err(err)) => BranchOutcome::Errored(err),
            Err(_) => BranchOutcome::TimedOut {
                after_ms: self.timeout_ms,
            },
        };

        let duration_ms = elapsed_ms(start);
        match &outcome {
            BranchOutcome::Succeeded(rows) => debug!(
                target: "recco.fanout",
                vertical = %self.vertical,
                count = rows.len(),
                duration_ms,
                "branch returned results"
            ),
            BranchOutcome::Errored(err) => warn!(
                target: "recco.fanout",
                vertical = %self.vertical,
                error = %err,
                duration_ms,
                "branch failed"
            ),
            BranchOutcome::TimedOut { after_ms } => warn!(
                target: "recco.fanout",
                vertical = %self.vertical,
                after_ms,
                "branch timed out"
            ),
        }

        BranchReport {
            vertical: self.vertical,
            outcome,
            duration_ms,
        }
    }

    fn keep_own_rows(&self, rows: Vec<ProductResult>) -> Vec<ProductResult> {
        let before = rows.len();
        let kept: Vec<ProductResult> = rows
            .into_iter()
            .filter(|row| row.vertical() == self.vertical)
            .collect();
        if kept.len() != before {
            warn!(
                target: "recco.fanout",
                vertical = %self.vertical,
                dropped = before - kept.len(),
                "dropped rows tagged with another vertical"
            );
        }
        kept
    }
}
