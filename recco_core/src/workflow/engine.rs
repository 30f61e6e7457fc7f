//! Workflow execution engine.
//!
//! Sequences INIT → INTENT → SEARCH → COMPOSE → DONE under one overall
//! timeout and assembles the final [`AgentOutput`].

use super::{Stage, WorkflowRecord};
use crate::compose::ResponseComposer;
use crate::config::WorkflowConfig;
use crate::error::{ConfigError, IntentFailure, WorkflowError};
use crate::fanout::{FanOutSearchCoordinator, VerticalRegistry};
use crate::intent::IntentExtractor;
use crate::query::QueryBuilder;
use crate::types::{AgentInput, AgentOutput};
use crate::utils::{elapsed_ms, new_run_id};
use crate::{IntentModel, PromptLoader};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs the recommendation pipeline.
///
/// Collaborators are injected once and shared by every run; the engine never
/// creates clients of its own.
pub struct WorkflowEngine {
    prompts: Arc<dyn PromptLoader>,
    extractor: IntentExtractor,
    query_builder: QueryBuilder,
    coordinator: FanOutSearchCoordinator,
    composer: ResponseComposer,
    config: WorkflowConfig,
}

impl WorkflowEngine {
    pub fn new(
        model: Arc<dyn IntentModel>,
        registry: VerticalRegistry,
        prompts: Arc<dyn PromptLoader>,
        config: WorkflowConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            prompts,
            extractor: IntentExtractor::new(model).with_timeout_ms(config.intent_timeout_ms),
            query_builder: QueryBuilder::new(),
            coordinator: FanOutSearchCoordinator::new(registry)
                .with_branch_timeout_ms(config.branch_timeout_ms),
            composer: ResponseComposer::new(),
            config,
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run the pipeline and return the (possibly partial) output.
    ///
    /// # Errors
    ///
    /// Input validation, intent extraction, overall timeout and stage-order
    /// failures. Per-vertical search failures are reported in
    /// [`AgentOutput::errors`] instead.
    pub async fn run(&self, input: &AgentInput) -> Result<AgentOutput, WorkflowError> {
        self.run_traced(input).await?.into_output()
    }

    /// Like [`Self::run`], but hands back the whole record of the run.
    pub async fn run_traced(&self, input: &AgentInput) -> Result<WorkflowRecord, WorkflowError> {
        input.validate(self.config.max_k)?;

        let run_id = new_run_id("run");
        let span = info_span!(
            target: "recco.workflow",
            "workflow",
            run_id = %run_id,
            k = input.k,
            verticals = input.verticals.len(),
            tenant = input.tenant.as_deref().unwrap_or("-")
        );

        async move {
            let mut record = WorkflowRecord::new(run_id, input.clone());
            let budget_ms = self.config.global_timeout_ms;
            let start = Instant::now();

            // On expiry the pipeline future is dropped, cancelling the model
            // call or every in-flight branch with it.
            let result = timeout(Duration::from_millis(budget_ms), self.drive(&mut record)).await;

            match result {
                Ok(Ok(())) => {
                    if let Some(output) = record.output() {
                        info!(
                            target: "recco.workflow",
                            duration_ms = elapsed_ms(start),
                            status = %output.status,
                            total_products = output.total_products,
                            "workflow complete"
                        );
                    }
                    Ok(record)
                }
                Ok(Err(err)) => {
                    let stage = record.stage();
                    record.fail();
                    warn!(
                        target: "recco.workflow",
                        stage = %stage,
                        code = err.code_str(),
                        error = %err,
                        "workflow failed"
                    );
                    Err(err)
                }
                Err(_) => {
                    let stage = record.stage();
                    record.fail();
                    warn!(
                        target: "recco.workflow",
                        stage = %stage,
                        budget_ms,
                        "workflow timed out"
                    );
                    Err(WorkflowError::WorkflowTimeout { stage, budget_ms })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, record: &mut WorkflowRecord) -> Result<(), WorkflowError> {
        self.intent_stage(record).await?;
        self.search_stage(record).await?;
        self.compose_stage(record)?;
        record.finish()?;
        Ok(())
    }

    async fn intent_stage(&self, record: &mut WorkflowRecord) -> Result<(), WorkflowError> {
        record.advance(Stage::Intent)?;

        let prompt_name = &self.config.intent_prompt;
        let system_prompt = self.prompts.load_prompt(prompt_name).await.map_err(|err| {
            WorkflowError::intent(
                IntentFailure::from(&err),
                format!("failed to load prompt '{}': {}", prompt_name, err),
            )
        })?;

        let input = record.input();
        let intent = self
            .extractor
            .extract(&system_prompt, &input.article, &input.question)
            .await?;
        debug!(target: "recco.workflow", intent = %intent, "intent stage done");

        record.record_intent(intent)
    }

    async fn search_stage(&self, record: &mut WorkflowRecord) -> Result<(), WorkflowError> {
        record.advance(Stage::Search)?;

        let query = {
            let intent = record.require_intent()?;
            let input = record.input();
            self.query_builder
                .build(&input.article, &input.question, Some(intent.as_str()))
        };
        record.record_query(query)?;

        let outcome = {
            let query = record.require_query()?;
            let input = record.input();
            self.coordinator
                .search(query, &input.verticals, input.k, input.tenant.as_deref())
                .await
        };
        record.record_search(outcome)
    }

    fn compose_stage(&self, record: &mut WorkflowRecord) -> Result<(), WorkflowError> {
        record.advance(Stage::Compose)?;

        let composition = {
            let search = record.require_search()?;
            self.composer.compose(&search.results, record.input().k)
        };
        record.record_composition(composition)
    }
}
