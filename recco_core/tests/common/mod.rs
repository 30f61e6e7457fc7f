//! Shared fixtures: scripted collaborators and tracing setup.
#![allow(dead_code)]

use async_trait::async_trait;
use recco_core::{
    BackendError, IntentModel, ProductResult, StaticPrompts, Vertical, VerticalRegistry,
    VerticalSearch, WorkflowConfig, WorkflowEngine,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// `count` products for `vertical`, scored by `scores` in arrival order.
pub fn products(vertical: Vertical, scores: &[f64]) -> Vec<ProductResult> {
    scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            ProductResult::new(
                format!("{vertical}-{i}"),
                vertical,
                format!("{vertical} item {i}"),
                *score,
            )
            .unwrap()
        })
        .collect()
}

// ============================================================================
// Model
// ============================================================================

pub struct MockModel {
    reply: Result<String, BackendError>,
    delay: Duration,
    pub calls: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub prompts_seen: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    pub fn with_reply(reply: Result<String, BackendError>) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            prompts_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentModel for MockModel {
    async fn extract_intent(
        &self,
        system_prompt: &str,
        _user_message: &str,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts_seen
            .lock()
            .unwrap()
            .push(system_prompt.to_string());
        let mut guard = InFlight::new(&self.cancelled);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        guard.finish();
        self.reply.clone()
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Clone)]
pub enum Behavior {
    Rows(Vec<ProductResult>),
    Fail(BackendError),
    Delayed(Duration, Vec<ProductResult>),
}

/// One backend serving every vertical with a scripted behaviour each.
pub struct MockCatalog {
    behaviors: BTreeMap<Vertical, Behavior>,
    pub calls: AtomicUsize,
    pub cancelled: AtomicUsize,
    pub tenants_seen: Mutex<Vec<Option<String>>>,
    pub queries_seen: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            behaviors: BTreeMap::new(),
            calls: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            tenants_seen: Mutex::new(Vec::new()),
            queries_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, vertical: Vertical, behavior: Behavior) -> Self {
        self.behaviors.insert(vertical, behavior);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerticalSearch for MockCatalog {
    async fn search_vertical(
        &self,
        vertical: Vertical,
        query: &str,
        _k: usize,
        tenant: Option<&str>,
    ) -> Result<Vec<ProductResult>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tenants_seen
            .lock()
            .unwrap()
            .push(tenant.map(str::to_string));
        self.queries_seen.lock().unwrap().push(query.to_string());

        let mut guard = InFlight::new(&self.cancelled);
        let result = match self.behaviors.get(&vertical).cloned() {
            None => Ok(Vec::new()),
            Some(Behavior::Rows(rows)) => Ok(rows),
            Some(Behavior::Fail(err)) => Err(err),
            Some(Behavior::Delayed(delay, rows)) => {
                tokio::time::sleep(delay).await;
                Ok(rows)
            }
        };
        guard.finish();
        result
    }
}

/// Counts calls that were dropped before completing.
struct InFlight<'a> {
    cancelled: &'a AtomicUsize,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn new(cancelled: &'a AtomicUsize) -> Self {
        Self {
            cancelled,
            done: false,
        }
    }

    fn finish(&mut self) {
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub fn engine(
    model: Arc<MockModel>,
    catalog: Arc<MockCatalog>,
    config: WorkflowConfig,
) -> WorkflowEngine {
    init_tracing();
    WorkflowEngine::new(
        model,
        VerticalRegistry::uniform(catalog),
        Arc::new(StaticPrompts::builtin()),
        config,
    )
    .unwrap()
}
