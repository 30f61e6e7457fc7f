// src/error.rs
use crate::types::Vertical;
use crate::workflow::Stage;
use serde_json::json;
use std::fmt;

/// Failure reported by an injected collaborator (model client, search backend, prompt loader).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl BackendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}

/// Why the intent stage could not produce a usable intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentFailure {
    /// The model call exceeded its deadline.
    Timeout,
    /// The model call failed for any other backend reason.
    Transport,
    /// The call returned, but the content is unusable.
    Validation,
}

impl fmt::Display for IntentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntentFailure::Timeout => "timeout",
            IntentFailure::Transport => "transport",
            IntentFailure::Validation => "validation",
        };
        f.write_str(s)
    }
}

impl From<&BackendError> for IntentFailure {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Timeout(_) => IntentFailure::Timeout,
            BackendError::Transport(_) => IntentFailure::Transport,
        }
    }
}

/// A single search branch failed. Always recovered by the fan-out coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BranchError {
    #[error("{vertical} search timed out after {after_ms}ms")]
    TimedOut { vertical: Vertical, after_ms: u64 },

    #[error("{vertical} search failed: {source}")]
    Backend {
        vertical: Vertical,
        #[source]
        source: BackendError,
    },
}

impl BranchError {
    pub fn vertical(&self) -> Vertical {
        match self {
            BranchError::TimedOut { vertical, .. } | BranchError::Backend { vertical, .. } => {
                *vertical
            }
        }
    }

    /// Backend-reported timeouts count as timeouts too.
    pub fn is_timeout(&self) -> bool {
        match self {
            BranchError::TimedOut { .. } => true,
            BranchError::Backend { source, .. } => source.is_timeout(),
        }
    }
}

/// Errors that escape [`WorkflowEngine::run`](crate::WorkflowEngine::run).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Intent extraction failed ({kind}): {message}")]
    IntentExtraction { kind: IntentFailure, message: String },

    #[error("Workflow exceeded its {budget_ms}ms budget during {stage}")]
    WorkflowTimeout { stage: Stage, budget_ms: u64 },

    #[error("Workflow stage {stage} ran out of order: {reason}")]
    WorkflowState { stage: Stage, reason: String },
}

impl WorkflowError {
    pub(crate) fn intent(kind: IntentFailure, message: impl Into<String>) -> Self {
        WorkflowError::IntentExtraction {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn state(stage: Stage, reason: impl Into<String>) -> Self {
        WorkflowError::WorkflowState {
            stage,
            reason: reason.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            WorkflowError::InputValidation(_) => "invalid_input",
            WorkflowError::IntentExtraction {
                kind: IntentFailure::Timeout,
                ..
            } => "intent_timeout",
            WorkflowError::IntentExtraction {
                kind: IntentFailure::Transport,
                ..
            } => "intent_upstream_error",
            WorkflowError::IntentExtraction {
                kind: IntentFailure::Validation,
                ..
            } => "intent_invalid",
            WorkflowError::WorkflowTimeout { .. } => "workflow_timeout",
            WorkflowError::WorkflowState { .. } => "internal_error",
        }
    }

    /// Stage the failure is attributed to, when there is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            WorkflowError::InputValidation(_) => None,
            WorkflowError::IntentExtraction { .. } => Some(Stage::Intent),
            WorkflowError::WorkflowTimeout { stage, .. }
            | WorkflowError::WorkflowState { stage, .. } => Some(*stage),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "code": self.code_str(),
            "stage": self.stage().map(|s| s.as_str()),
            "message": self.to_string(),
        })
    }
}

/// Configuration could not be loaded or is inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("No search handler registered for: {}", join_verticals(.0))]
    IncompleteRegistry(Vec<Vertical>),
}

fn join_verticals(verticals: &[Vertical]) -> String {
    verticals
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
