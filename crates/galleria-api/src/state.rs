//! Shared handler state.

use std::sync::Arc;

use galleria_core::ImageStore;
use galleria_search::{RankedRetriever, SearchConfig, SuggestionAggregator};

/// Built once at startup and cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub retriever: RankedRetriever,
    pub suggestions: SuggestionAggregator,
    /// Store backend name, reported by `/health`.
    pub backend: &'static str,
}

impl AppState {
    pub fn new(store: Arc<dyn ImageStore>, config: SearchConfig) -> Self {
        Self {
            backend: store.backend(),
            retriever: RankedRetriever::new(store.clone(), config.clone()),
            suggestions: SuggestionAggregator::new(store, config),
        }
    }
}
