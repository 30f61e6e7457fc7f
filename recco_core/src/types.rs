//! Core types flowing through the recommendation pipeline.

use crate::error::{BranchError, WorkflowError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Default upper bound for `k`.
pub const DEFAULT_MAX_K: usize = 10;

/// Minimum length of a usable intent summary, in characters.
pub const MIN_INTENT_CHARS: usize = 10;

// ============================================================================
// Vertical
// ============================================================================

/// A content catalog searched independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Activities,
    Books,
    Articles,
}

impl Vertical {
    /// Every vertical, in canonical order.
    pub const ALL: [Vertical; 3] = [Vertical::Activities, Vertical::Books, Vertical::Articles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vertical::Activities => "activities",
            Vertical::Books => "books",
            Vertical::Articles => "articles",
        }
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vertical {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "activities" => Ok(Vertical::Activities),
            "books" => Ok(Vertical::Books),
            "articles" => Ok(Vertical::Articles),
            other => Err(WorkflowError::InputValidation(format!(
                "unknown vertical '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// AgentInput
// ============================================================================

/// A single recommendation request. Built once at the boundary and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInput {
    /// Article body; may be empty.
    #[serde(default)]
    pub article: String,

    /// Guiding question; must not be blank.
    pub question: String,

    /// Results per vertical.
    pub k: usize,

    /// Verticals to search.
    pub verticals: BTreeSet<Vertical>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl AgentInput {
    pub fn new(
        article: impl Into<String>,
        question: impl Into<String>,
        k: usize,
        verticals: impl IntoIterator<Item = Vertical>,
    ) -> Self {
        Self {
            article: article.into(),
            question: question.into(),
            k,
            verticals: verticals.into_iter().collect(),
            tenant: None,
        }
    }

    /// Parse vertical names at the boundary, rejecting unknown members.
    pub fn from_names<S: AsRef<str>>(
        article: impl Into<String>,
        question: impl Into<String>,
        k: usize,
        vertical_names: &[S],
    ) -> Result<Self, WorkflowError> {
        let verticals = vertical_names
            .iter()
            .map(|name| name.as_ref().parse::<Vertical>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            article: article.into(),
            question: question.into(),
            k,
            verticals,
            tenant: None,
        })
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Check the request against the allowed bounds.
    pub fn validate(&self, max_k: usize) -> Result<(), WorkflowError> {
        if self.question.trim().is_empty() {
            return Err(WorkflowError::InputValidation(
                "question must not be empty".into(),
            ));
        }
        if self.k == 0 || self.k > max_k {
            return Err(WorkflowError::InputValidation(format!(
                "k must be between 1 and {}, got {}",
                max_k, self.k
            )));
        }
        if self.verticals.is_empty() {
            return Err(WorkflowError::InputValidation(
                "at least one vertical must be requested".into(),
            ));
        }
        if let Some(tenant) = &self.tenant {
            if tenant.trim().is_empty() {
                return Err(WorkflowError::InputValidation(
                    "tenant must not be blank when provided".into(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// ProductResult
// ============================================================================

/// A product row could not be constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProductError {
    #[error("product id must not be empty")]
    EmptyId,

    #[error("product title must not be empty")]
    EmptyTitle,

    #[error("relevance score {0} is outside [0.0, 1.0]")]
    ScoreOutOfRange(f64),
}

/// A single recommendable item returned by the search layer.
///
/// Fields are private so the score and non-empty invariants hold for every
/// value in circulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProduct")]
pub struct ProductResult {
    id: String,
    vertical: Vertical,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    relevance_score: f64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawProduct {
    id: String,
    vertical: Vertical,
    title: String,
    #[serde(default)]
    description: Option<String>,
    relevance_score: f64,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl TryFrom<RawProduct> for ProductResult {
    type Error = ProductError;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        Ok(ProductResult::new(raw.id, raw.vertical, raw.title, raw.relevance_score)?
            .with_metadata(raw.metadata)
            .with_optional_description(raw.description))
    }
}

impl ProductResult {
    pub fn new(
        id: impl Into<String>,
        vertical: Vertical,
        title: impl Into<String>,
        relevance_score: f64,
    ) -> Result<Self, ProductError> {
        let id = id.into();
        let title = title.into();
        if id.trim().is_empty() {
            return Err(ProductError::EmptyId);
        }
        if title.trim().is_empty() {
            return Err(ProductError::EmptyTitle);
        }
        // NaN fails the range check as well.
        if !(0.0..=1.0).contains(&relevance_score) {
            return Err(ProductError::ScoreOutOfRange(relevance_score));
        }
        Ok(Self {
            id,
            vertical,
            title,
            description: None,
            relevance_score,
            metadata: Map::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn with_optional_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vertical(&self) -> Vertical {
        self.vertical
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn relevance_score(&self) -> f64 {
        self.relevance_score
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

// ============================================================================
// Per-branch results
// ============================================================================

/// Outcome of one search branch, keyed by vertical in the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalSearchResult {
    pub vertical: Vertical,

    /// Candidates in backend arrival order.
    pub results: Vec<ProductResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the error was a timeout
    #[serde(default)]
    pub timed_out: bool,

    /// Time taken by the branch (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl VerticalSearchResult {
    pub fn succeeded(vertical: Vertical, results: Vec<ProductResult>) -> Self {
        Self {
            vertical,
            results,
            error: None,
            timed_out: false,
            duration_ms: None,
        }
    }

    pub fn failed(err: &BranchError) -> Self {
        Self {
            vertical: err.vertical(),
            results: Vec::new(),
            error: Some(err.to_string()),
            timed_out: err.is_timeout(),
            duration_ms: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ============================================================================
// IntentResult
// ============================================================================

/// A validated, trimmed intent summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IntentResult(String);

impl IntentResult {
    /// Returns `None` when the trimmed text is shorter than [`MIN_INTENT_CHARS`].
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_INTENT_CHARS {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for IntentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// AgentOutput
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every requested vertical was searched without error.
    Complete,
    /// At least one vertical failed or timed out.
    Partial,
}

impl RunStatus {
    pub fn from_errors<K, V>(errors: &BTreeMap<K, V>) -> Self {
        if errors.is_empty() {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Complete => f.write_str("complete"),
            RunStatus::Partial => f.write_str("partial"),
        }
    }
}

/// Final, possibly partial, recommendation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Ranked products per vertical, at most `k` each
    pub grouped_results: BTreeMap<Vertical, Vec<ProductResult>>,

    /// Sum of all list lengths in `grouped_results`
    pub total_products: usize,

    pub status: RunStatus,

    /// Failed verticals; empty when `status` is complete
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<Vertical, String>,

    pub intent: String,
}

impl AgentOutput {
    pub fn is_partial(&self) -> bool {
        self.status == RunStatus::Partial
    }

    /// All products flattened in vertical order.
    pub fn all_results(&self) -> Vec<&ProductResult> {
        self.grouped_results.values().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vertical_parse() {
        assert_eq!("books".parse::<Vertical>().unwrap(), Vertical::Books);
        assert_eq!(" Activities ".parse::<Vertical>().unwrap(), Vertical::Activities);
        let err = "podcasts".parse::<Vertical>().unwrap_err();
        assert!(err.to_string().contains("unknown vertical 'podcasts'"));
    }

    #[test]
    fn test_input_validation() {
        let input = AgentInput::new("", "What can I do outdoors?", 3, [Vertical::Books]);
        assert!(input.validate(DEFAULT_MAX_K).is_ok());

        let blank = AgentInput::new("", "   ", 3, [Vertical::Books]);
        assert!(blank.validate(DEFAULT_MAX_K).is_err());

        let zero_k = AgentInput::new("", "Q?", 0, [Vertical::Books]);
        assert!(zero_k.validate(DEFAULT_MAX_K).is_err());

        let big_k = AgentInput::new("", "Q?", 11, [Vertical::Books]);
        let err = big_k.validate(DEFAULT_MAX_K).unwrap_err();
        assert!(err.to_string().contains("between 1 and 10"));

        let none = AgentInput::new("", "Q?", 3, Vec::<Vertical>::new());
        assert!(none.validate(DEFAULT_MAX_K).is_err());

        let tenant = AgentInput::new("", "Q?", 3, [Vertical::Books]).with_tenant(" ");
        assert!(tenant.validate(DEFAULT_MAX_K).is_err());
    }

    #[test]
    fn test_input_from_names() {
        let input = AgentInput::from_names("a", "q", 2, &["books", "activities", "books"]).unwrap();
        assert_eq!(input.verticals.len(), 2);
        assert!(AgentInput::from_names("a", "q", 2, &["books", "movies"]).is_err());
    }

    #[test]
    fn test_input_deserialize_rejects_unknown_vertical() {
        let ok: AgentInput = serde_json::from_value(json!({
            "question": "q",
            "k": 2,
            "verticals": ["articles"]
        }))
        .unwrap();
        assert_eq!(ok.article, "");
        assert!(ok.tenant.is_none());

        let bad = serde_json::from_value::<AgentInput>(json!({
            "question": "q",
            "k": 2,
            "verticals": ["movies"]
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_product_invariants() {
        assert_eq!(
            ProductResult::new("", Vertical::Books, "T", 0.5).unwrap_err(),
            ProductError::EmptyId
        );
        assert_eq!(
            ProductResult::new("b1", Vertical::Books, " ", 0.5).unwrap_err(),
            ProductError::EmptyTitle
        );
        assert!(ProductResult::new("b1", Vertical::Books, "T", 1.01).is_err());
        assert!(ProductResult::new("b1", Vertical::Books, "T", -0.1).is_err());
        assert!(ProductResult::new("b1", Vertical::Books, "T", f64::NAN).is_err());
        assert!(ProductResult::new("b1", Vertical::Books, "T", 0.0).is_ok());
        assert!(ProductResult::new("b1", Vertical::Books, "T", 1.0).is_ok());
    }

    #[test]
    fn test_product_deserialize_validates() {
        let product: ProductResult = serde_json::from_value(json!({
            "id": "a1",
            "vertical": "activities",
            "title": "Kayaking",
            "description": "On the lake",
            "relevance_score": 0.8,
            "metadata": {"duration_minutes": 90}
        }))
        .unwrap();
        assert_eq!(product.description(), Some("On the lake"));
        assert_eq!(product.metadata()["duration_minutes"], 90);

        let bad = serde_json::from_value::<ProductResult>(json!({
            "id": "a1",
            "vertical": "activities",
            "title": "Kayaking",
            "relevance_score": 3.0
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_intent_result_guard() {
        assert!(IntentResult::parse("").is_none());
        assert!(IntentResult::parse("   short  ").is_none());
        let intent = IntentResult::parse("  outdoor family activities \n").unwrap();
        assert_eq!(intent.as_str(), "outdoor family activities");
    }

    #[test]
    fn test_output_serialization() {
        let mut grouped = BTreeMap::new();
        grouped.insert(
            Vertical::Books,
            vec![ProductResult::new("b1", Vertical::Books, "Walden", 0.9).unwrap()],
        );
        let output = AgentOutput {
            grouped_results: grouped,
            total_products: 1,
            status: RunStatus::Complete,
            errors: BTreeMap::new(),
            intent: "reading about nature".into(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["grouped_results"]["books"][0]["id"], "b1");
        assert!(json.get("errors").is_none());
        assert_eq!(output.all_results().len(), 1);
    }
}
