//! Workflow stages and the accumulating per-run record.
//!
//! Stage artifacts are appended to the record once and never overwritten.
//! Every slot is guarded by the stage that may fill it, so running stages out
//! of order surfaces as [`WorkflowError::WorkflowState`].

use crate::compose::Composition;
use crate::error::WorkflowError;
use crate::fanout::SearchOutcome;
use crate::types::{AgentInput, AgentOutput, IntentResult, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Intent,
    Search,
    Compose,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Intent => "intent",
            Stage::Search => "search",
            Stage::Compose => "compose",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// The only stage that may follow this one on the success path.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Init => Some(Stage::Intent),
            Stage::Intent => Some(Stage::Search),
            Stage::Search => Some(Stage::Compose),
            Stage::Compose => Some(Stage::Done),
            Stage::Done | Stage::Failed => None,
        }
    }

    pub fn can_advance_to(&self, to: Stage) -> bool {
        match to {
            Stage::Failed => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage change, kept for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
    pub at: DateTime<Utc>,
}

/// Everything one workflow execution produced, in stage order.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRecord {
    run_id: String,
    input: AgentInput,
    stage: Stage,
    history: Vec<Transition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intent: Option<IntentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<SearchOutcome>,
    #[serde(skip)]
    composition: Option<Composition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<AgentOutput>,
}

impl WorkflowRecord {
    pub fn new(run_id: impl Into<String>, input: AgentInput) -> Self {
        Self {
            run_id: run_id.into(),
            input,
            stage: Stage::Init,
            history: Vec::new(),
            intent: None,
            query: None,
            search: None,
            composition: None,
            output: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn input(&self) -> &AgentInput {
        &self.input
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn intent(&self) -> Option<&IntentResult> {
        self.intent.as_ref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn search(&self) -> Option<&SearchOutcome> {
        self.search.as_ref()
    }

    pub fn composition(&self) -> Option<&Composition> {
        self.composition.as_ref()
    }

    pub fn output(&self) -> Option<&AgentOutput> {
        self.output.as_ref()
    }

    /// Move to `to`, enforcing the strict stage sequence.
    pub fn advance(&mut self, to: Stage) -> Result<(), WorkflowError> {
        if !self.stage.can_advance_to(to) {
            return Err(WorkflowError::state(
                to,
                format!("cannot move from {} to {}", self.stage, to),
            ));
        }
        self.history.push(Transition {
            from: self.stage,
            to,
            at: Utc::now(),
        });
        self.stage = to;
        Ok(())
    }

    /// Mark the run as failed. No-op once terminal.
    pub fn fail(&mut self) {
        if !self.stage.is_terminal() {
            // Failed is reachable from every non-terminal stage.
            let _ = self.advance(Stage::Failed);
        }
    }

    pub fn record_intent(&mut self, intent: IntentResult) -> Result<(), WorkflowError> {
        self.expect_stage(Stage::Intent)?;
        if self.intent.is_some() {
            return Err(WorkflowError::state(Stage::Intent, "intent already recorded"));
        }
        self.intent = Some(intent);
        Ok(())
    }

    /// The intent the SEARCH stage builds on.
    pub fn require_intent(&self) -> Result<&IntentResult, WorkflowError> {
        self.intent
            .as_ref()
            .ok_or_else(|| WorkflowError::state(Stage::Search, "no intent has been recorded"))
    }

    pub fn record_query(&mut self, query: String) -> Result<(), WorkflowError> {
        self.expect_stage(Stage::Search)?;
        self.require_intent()?;
        if self.query.is_some() {
            return Err(WorkflowError::state(Stage::Search, "query already recorded"));
        }
        self.query = Some(query);
        Ok(())
    }

    pub fn require_query(&self) -> Result<&str, WorkflowError> {
        self.query
            .as_deref()
            .ok_or_else(|| WorkflowError::state(Stage::Search, "no query has been recorded"))
    }

    pub fn record_search(&mut self, outcome: SearchOutcome) -> Result<(), WorkflowError> {
        self.expect_stage(Stage::Search)?;
        self.require_query()?;
        if self.search.is_some() {
            return Err(WorkflowError::state(
                Stage::Search,
                "search results already recorded",
            ));
        }
        self.search = Some(outcome);
        Ok(())
    }

    /// The search results the COMPOSE stage ranks.
    pub fn require_search(&self) -> Result<&SearchOutcome, WorkflowError> {
        self.search.as_ref().ok_or_else(|| {
            WorkflowError::state(Stage::Compose, "no search results have been recorded")
        })
    }

    pub fn record_composition(&mut self, composition: Composition) -> Result<(), WorkflowError> {
        self.expect_stage(Stage::Compose)?;
        self.require_search()?;
        if self.composition.is_some() {
            return Err(WorkflowError::state(
                Stage::Compose,
                "composition already recorded",
            ));
        }
        self.composition = Some(composition);
        Ok(())
    }

    /// Move to DONE and assemble the final output from the recorded artifacts.
    pub fn finish(&mut self) -> Result<&AgentOutput, WorkflowError> {
        let intent = self.require_intent()?.as_str().to_string();
        let search = self.require_search()?;
        let composition = self.composition.as_ref().ok_or_else(|| {
            WorkflowError::state(Stage::Done, "no composition has been recorded")
        })?;

        let errors = search.errors();
        let output = AgentOutput {
            grouped_results: composition.grouped_results.clone(),
            total_products: composition.total_products,
            status: RunStatus::from_errors(&errors),
            errors,
            intent,
        };

        self.advance(Stage::Done)?;
        Ok(self.output.insert(output))
    }

    /// Hand over the final output. Only valid once the run is DONE.
    pub fn into_output(self) -> Result<AgentOutput, WorkflowError> {
        if self.stage != Stage::Done {
            return Err(WorkflowError::state(
                self.stage,
                "output requested before the workflow finished",
            ));
        }
        self.output
            .ok_or_else(|| WorkflowError::state(Stage::Done, "no output has been recorded"))
    }

    fn expect_stage(&self, stage: Stage) -> Result<(), WorkflowError> {
        if self.stage != stage {
            return Err(WorkflowError::state(
                stage,
                format!("workflow is in {}", self.stage),
            ));
        }
        Ok(())
    }
}
