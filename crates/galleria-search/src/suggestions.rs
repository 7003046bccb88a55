//! Typeahead suggestions.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, instrument};

use galleria_core::{ImageStore, Result, SuggestionPipeline};

use crate::config::SearchConfig;
use crate::deadline::bounded;

/// Produces up to `suggestion_limit` distinct terms containing a partial
/// query, drawn from the searchable fields of matching images.
///
/// Matching is case-insensitive substring containment, not fuzzy. The order
/// of suggestions is whatever the store's aggregation yields.
#[derive(Clone)]
pub struct SuggestionAggregator {
    store: Arc<dyn ImageStore>,
    config: SearchConfig,
}

impl SuggestionAggregator {
    pub fn new(store: Arc<dyn ImageStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Suggest completions for `partial_query`.
    ///
    /// A blank query returns an empty list without contacting the store.
    /// The result is de-duplicated and capped here as well, whatever the
    /// store returned.
    #[instrument(skip(self), fields(subsystem = "search", component = "suggestions", op = "suggest"))]
    pub async fn suggest(&self, partial_query: &str) -> Result<Vec<String>> {
        let needle = partial_query.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let limit = self.config.suggestion_limit;
        let pipeline = SuggestionPipeline::new(needle, limit);
        let backend = self.store.backend();

        let terms = bounded(
            backend,
            "aggregate_terms",
            self.config.store_timeout,
            self.config.slow_query_threshold,
            self.store.aggregate_terms(&pipeline),
        )
        .await
        .inspect_err(|e| {
            error!(backend, error = %e, "Suggestion aggregation failed");
        })?;

        let mut seen = HashSet::with_capacity(terms.len());
        let mut suggestions: Vec<String> = terms
            .into_iter()
            .filter(|term| seen.insert(term.clone()))
            .collect();
        suggestions.truncate(limit);

        debug!(
            backend,
            result_count = suggestions.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Suggestions complete"
        );
        Ok(suggestions)
    }
}
