//! Deterministic search query synthesis.
//!
//! The query places the intent first, then the question, then a short slice of
//! the article. Downstream relevance depends on that order.

use crate::utils::truncate_chars;

/// Characters of article context carried into the search query.
pub const QUERY_ARTICLE_BUDGET: usize = 300;

/// Builds search queries from intent, question and article context.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    article_budget: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            article_budget: QUERY_ARTICLE_BUDGET,
        }
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the article budget.
    pub fn with_article_budget(mut self, article_budget: usize) -> Self {
        self.article_budget = article_budget;
        self
    }

    /// Combine the inputs into one query string.
    ///
    /// Pure: identical arguments always produce byte-identical output.
    /// Blank intent and blank article sections are omitted.
    pub fn build(&self, article: &str, question: &str, intent: Option<&str>) -> String {
        let mut sections: Vec<String> = Vec::with_capacity(3);

        if let Some(intent) = intent.map(str::trim).filter(|i| !i.is_empty()) {
            sections.push(format!("Intent: {}", intent));
        }

        sections.push(format!("Question: {}", question.trim()));

        let article = article.trim();
        if !article.is_empty() {
            sections.push(format!(
                "Context: {}",
                truncate_chars(article, self.article_budget)
            ));
        }

        sections.join("\n\n")
    }
}
