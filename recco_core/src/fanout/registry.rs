//! Vertical → search handler registry.
//!
//! Resolved once at startup and checked for completeness, so dispatch at
//! request time cannot miss a vertical.

use crate::error::ConfigError;
use crate::types::Vertical;
use crate::VerticalSearch;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One search handler per [`Vertical`], complete by construction.
#[derive(Clone)]
pub struct VerticalRegistry {
    // Indexed by position in `Vertical::ALL`.
    handlers: Vec<Arc<dyn VerticalSearch>>,
}

impl VerticalRegistry {
    pub fn builder() -> VerticalRegistryBuilder {
        VerticalRegistryBuilder::default()
    }

    /// Route every vertical to the same backend client.
    pub fn uniform(handler: Arc<dyn VerticalSearch>) -> Self {
        Self {
            handlers: Vertical::ALL.iter().map(|_| Arc::clone(&handler)).collect(),
        }
    }

    pub fn handler(&self, vertical: Vertical) -> &Arc<dyn VerticalSearch> {
        &self.handlers[slot(vertical)]
    }
}

impl std::fmt::Debug for VerticalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerticalRegistry")
            .field("verticals", &Vertical::ALL)
            .finish()
    }
}

/// Collects handlers before validation.
#[derive(Default)]
pub struct VerticalRegistryBuilder {
    handlers: BTreeMap<Vertical, Arc<dyn VerticalSearch>>,
}

impl VerticalRegistryBuilder {
    /// Register a handler, replacing any earlier one for the same vertical.
    pub fn register(mut self, vertical: Vertical, handler: Arc<dyn VerticalSearch>) -> Self {
        self.handlers.insert(vertical, handler);
        self
    }

    /// Fail with every vertical that still lacks a handler.
    pub fn build(mut self) -> Result<VerticalRegistry, ConfigError> {
        let missing: Vec<Vertical> = Vertical::ALL
            .iter()
            .copied()
            .filter(|v| !self.handlers.contains_key(v))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::IncompleteRegistry(missing));
        }

        let handlers = Vertical::ALL
            .iter()
            .filter_map(|v| self.handlers.remove(v))
            .collect();
        Ok(VerticalRegistry { handlers })
    }
}

fn slot(vertical: Vertical) -> usize {
    match vertical {
        Vertical::Activities => 0,
        Vertical::Books => 1,
        Vertical::Articles => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::types::ProductResult;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl VerticalSearch for Named {
        async fn search_vertical(
            &self,
            vertical: Vertical,
            _query: &str,
            _k: usize,
            _tenant: Option<&str>,
        ) -> Result<Vec<ProductResult>, BackendError> {
            Ok(vec![ProductResult::new(self.0, vertical, self.0, 0.5).unwrap()])
        }
    }

    #[test]
    fn test_slots_follow_canonical_order() {
        for (idx, vertical) in Vertical::ALL.iter().enumerate() {
            assert_eq!(slot(*vertical), idx);
        }
    }

    #[test]
    fn test_incomplete_registry_rejected() {
        let err = VerticalRegistry::builder()
            .register(Vertical::Books, Arc::new(Named("books")))
            .build()
            .unwrap_err();
        match err {
            ConfigError::IncompleteRegistry(missing) => {
                assert_eq!(missing, vec![Vertical::Activities, Vertical::Articles]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_vertical() {
        let registry = VerticalRegistry::builder()
            .register(Vertical::Activities, Arc::new(Named("act")))
            .register(Vertical::Books, Arc::new(Named("book")))
            .register(Vertical::Articles, Arc::new(Named("art")))
            .build()
            .unwrap();

        let rows = registry
            .handler(Vertical::Books)
            .search_vertical(Vertical::Books, "q", 1, None)
            .await
            .unwrap();
        assert_eq!(rows[0].id(), "book");

        let rows = registry
            .handler(Vertical::Articles)
            .search_vertical(Vertical::Articles, "q", 1, None)
            .await
            .unwrap();
        assert_eq!(rows[0].id(), "art");
    }

    #[tokio::test]
    async fn test_uniform_registry_shares_client() {
        let client: Arc<dyn VerticalSearch> = Arc::new(Named("shared"));
        let registry = VerticalRegistry::uniform(Arc::clone(&client));
        assert_eq!(Arc::strong_count(&client), 1 + Vertical::ALL.len());
        for vertical in Vertical::ALL {
            let rows = registry
                .handler(vertical)
                .search_vertical(vertical, "q", 1, None)
                .await
                .unwrap();
            assert_eq!(rows[0].vertical(), vertical);
        }
    }
}
