//! Ranked, paginated image retrieval.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, instrument};

use galleria_core::{ImageStore, QueryPlan, Result, RetrievalPage};

use crate::compiler::{QueryCompiler, RetrievalParams};
use crate::config::SearchConfig;
use crate::deadline::bounded;

/// Executes query plans against an [`ImageStore`].
///
/// Stateless apart from the shared store handle; any number of calls may run
/// concurrently. Dropping a returned future abandons the in-flight store
/// calls.
#[derive(Clone)]
pub struct RankedRetriever {
    store: Arc<dyn ImageStore>,
    compiler: QueryCompiler,
}

impl RankedRetriever {
    pub fn new(store: Arc<dyn ImageStore>, config: SearchConfig) -> Self {
        Self {
            store,
            compiler: QueryCompiler::new(config),
        }
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.compiler
    }

    /// Execute a compiled plan.
    ///
    /// The total count and the page are fetched concurrently as two store
    /// round trips, so under concurrent writes `total_count` may disagree
    /// with the page by a few documents. A page past the end yields no items
    /// with the total intact.
    ///
    /// # Errors
    ///
    /// [`galleria_core::Error::RetrievalFailure`] when either store call
    /// fails or exceeds the configured timeout. No partial results.
    #[instrument(skip(self, plan), fields(subsystem = "search", component = "retriever", op = "execute"))]
    pub async fn execute(&self, plan: &QueryPlan) -> Result<RetrievalPage> {
        let start = Instant::now();
        let config = self.compiler.config();
        let backend = self.store.backend();

        let count = bounded(
            backend,
            "count",
            config.store_timeout,
            config.slow_query_threshold,
            self.store.count(plan.text_match()),
        );
        let find = bounded(
            backend,
            "find",
            config.store_timeout,
            config.slow_query_threshold,
            self.store.find(plan),
        );

        let (total_count, items) = match tokio::try_join!(count, find) {
            Ok(pair) => pair,
            Err(e) => {
                error!(
                    backend,
                    term_count = plan.text_match().map_or(0, |m| m.clause.terms().len()),
                    sort = ?plan.sort(),
                    limit = plan.limit(),
                    page = plan.pagination().page(),
                    error = %e,
                    "Retrieval failed"
                );
                return Err(e);
            }
        };

        debug!(
            backend,
            result_count = items.len(),
            total_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Retrieval complete"
        );

        Ok(RetrievalPage {
            items,
            total_count,
            limit: plan.limit(),
            page: plan.pagination().page(),
        })
    }

    /// Compile raw HTTP parameters and execute the resulting plan.
    ///
    /// Invalid parameters are rejected before the store is contacted.
    pub async fn retrieve(&self, params: &RetrievalParams) -> Result<RetrievalPage> {
        let plan = self.compiler.compile_params(params)?;
        self.execute(&plan).await
    }
}
