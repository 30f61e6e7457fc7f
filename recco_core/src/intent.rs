//! Intent extraction: the pipeline's single language-model call.

use crate::error::{IntentFailure, WorkflowError};
use crate::types::{IntentResult, MIN_INTENT_CHARS};
use crate::utils::{elapsed_ms, truncate_chars};
use crate::IntentModel;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

/// Characters of article text sent to the model.
pub const INTENT_ARTICLE_BUDGET: usize = 1000;

/// Default deadline for the model call in milliseconds
pub const DEFAULT_INTENT_TIMEOUT_MS: u64 = 30000;

/// Turns (article, question) into a short intent summary.
pub struct IntentExtractor {
    model: Arc<dyn IntentModel>,
    timeout_ms: u64,
}

impl IntentExtractor {
    pub fn new(model: Arc<dyn IntentModel>) -> Self {
        Self {
            model,
            timeout_ms: DEFAULT_INTENT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Build the user-facing message sent alongside the system prompt.
    pub fn user_message(article: &str, question: &str) -> String {
        format!(
            "Question: {}\n\nArticle:\n{}",
            question.trim(),
            truncate_chars(article.trim(), INTENT_ARTICLE_BUDGET)
        )
    }

    /// Make exactly one model call and validate its output.
    ///
    /// Every failure is fatal to the workflow: the intent is required to
    /// build the search query.
    pub async fn extract(
        &self,
        system_prompt: &str,
        article: &str,
        question: &str,
    ) -> Result<IntentResult, WorkflowError> {
        let message = Self::user_message(article, question);
        trace!(target: "recco.intent", %message, "sending intent request");

        let start = Instant::now();
        let call = self.model.extract_intent(system_prompt, &message);
        let raw = match timeout(Duration::from_millis(self.timeout_ms), call).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(target: "recco.intent", error = %err, "intent model call failed");
                return Err(WorkflowError::intent(IntentFailure::from(&err), err.to_string()));
            }
            Err(_) => {
                warn!(
                    target: "recco.intent",
                    timeout_ms = self.timeout_ms,
                    "intent model call timed out"
                );
                return Err(WorkflowError::intent(
                    IntentFailure::Timeout,
                    format!("model call timed out after {}ms", self.timeout_ms),
                ));
            }
        };

        let latency_ms = elapsed_ms(start);
        match IntentResult::parse(&raw) {
            Some(intent) => {
                debug!(
                    target: "recco.intent",
                    latency_ms,
                    chars = intent.as_str().chars().count(),
                    "intent extracted"
                );
                Ok(intent)
            }
            None => {
                warn!(
                    target: "recco.intent",
                    latency_ms,
                    raw_chars = raw.trim().chars().count(),
                    "intent output rejected"
                );
                Err(WorkflowError::intent(
                    IntentFailure::Validation,
                    format!(
                        "model returned {} characters, at least {} required",
                        raw.trim().chars().count(),
                        MIN_INTENT_CHARS
                    ),
                ))
            }
        }
    }
}
