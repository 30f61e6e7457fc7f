// src/lib.rs
//! Recommendation orchestration core.
//!
//! A request flows through a fixed pipeline: one language-model call extracts
//! the reader's intent, a deterministic query is built from it, every requested
//! vertical is searched concurrently, and the candidates are ranked and trimmed
//! per vertical. Individual vertical failures degrade the result to `partial`
//! instead of failing the request.
//!
//! # Example
//!
//! ```ignore
//! use recco_core::{AgentInput, Vertical, VerticalRegistry, WorkflowConfig, WorkflowEngine};
//!
//! let registry = VerticalRegistry::uniform(search_client.clone());
//! let engine = WorkflowEngine::new(model, registry, prompts, WorkflowConfig::default())?;
//! let input = AgentInput::new(article, "What can I do outdoors?", 3, [Vertical::Activities]);
//! let output = engine.run(&input).await?;
//! ```
pub mod compose;
pub mod config;
pub mod error;
pub mod fanout;
pub mod intent;
pub mod prompts;
pub mod query;
pub mod types;
pub mod utils;
pub mod workflow;

use async_trait::async_trait;

pub use crate::compose::{Composition, ResponseComposer};
pub use crate::config::WorkflowConfig;
pub use crate::error::{BackendError, BranchError, ConfigError, IntentFailure, WorkflowError};
pub use crate::fanout::{BranchOutcome, FanOutSearchCoordinator, SearchOutcome, VerticalRegistry};
pub use crate::intent::IntentExtractor;
pub use crate::prompts::{PromptDir, StaticPrompts};
pub use crate::query::QueryBuilder;
pub use crate::types::{
    AgentInput, AgentOutput, IntentResult, ProductError, ProductResult, RunStatus, Vertical,
    VerticalSearchResult,
};
pub use crate::workflow::{Stage, WorkflowEngine, WorkflowRecord};

/// Language-model endpoint used for intent extraction.
///
/// Implementations are long-lived and pooled; the engine holds one shared
/// instance for every request.
#[async_trait]
pub trait IntentModel: Send + Sync {
    async fn extract_intent(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, BackendError>;
}

/// Search backend for one or more verticals.
#[async_trait]
pub trait VerticalSearch: Send + Sync {
    async fn search_vertical(
        &self,
        vertical: Vertical,
        query: &str,
        k: usize,
        tenant: Option<&str>,
    ) -> Result<Vec<ProductResult>, BackendError>;
}

/// Source of named prompt templates.
#[async_trait]
pub trait PromptLoader: Send + Sync {
    async fn load_prompt(&self, name: &str) -> Result<String, BackendError>;
}
