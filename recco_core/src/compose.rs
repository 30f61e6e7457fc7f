//! Ranked composition of per-vertical candidates.

use crate::types::{ProductResult, Vertical, VerticalSearchResult};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Ranked, truncated products per vertical.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub grouped_results: BTreeMap<Vertical, Vec<ProductResult>>,
    pub total_products: usize,
}

/// Sorts each vertical by relevance and keeps the top `k`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    /// Rank every vertical present in `results_by_vertical`.
    ///
    /// Sorting is stable, so equal scores keep backend arrival order.
    /// The input is borrowed and left untouched.
    pub fn compose(
        &self,
        results_by_vertical: &BTreeMap<Vertical, VerticalSearchResult>,
        k: usize,
    ) -> Composition {
        let grouped_results: BTreeMap<Vertical, Vec<ProductResult>> = results_by_vertical
            .iter()
            .map(|(vertical, result)| (*vertical, rank(&result.results, k)))
            .collect();

        let total_products = grouped_results.values().map(Vec::len).sum();

        debug!(
            target: "recco.compose",
            verticals = grouped_results.len(),
            total_products,
            k,
            "composed results"
        );

        Composition {
            grouped_results,
            total_products,
        }
    }
}

fn rank(candidates: &[ProductResult], k: usize) -> Vec<ProductResult> {
    let mut ranked: Vec<&ProductResult> = candidates.iter().collect();
    ranked.sort_by(|a, b| by_score_desc(a, b));
    ranked.into_iter().take(k).cloned().collect()
}

fn by_score_desc(a: &ProductResult, b: &ProductResult) -> Ordering {
    b.relevance_score()
        .partial_cmp(&a.relevance_score())
        .unwrap_or(Ordering::Equal)
}
