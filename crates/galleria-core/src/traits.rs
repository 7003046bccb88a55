//! Core traits for galleria abstractions.
//!
//! The search layer does not own persistence. It talks to an externally
//! managed image collection through [`ImageStore`], which the PostgreSQL and
//! in-memory backends in `galleria-db` implement.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Image;
use crate::query::{QueryPlan, TextMatch};
use crate::suggestion::SuggestionPipeline;

/// Read-only access to the image collection.
///
/// Every method is a single bounded round trip. Implementations must not
/// retry internally; retries belong to whoever owns the connection.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Short backend name for logs ("postgres", "memory").
    fn backend(&self) -> &'static str;

    /// Count images satisfying the text match (all images when `None`).
    async fn count(&self, text_match: Option<&TextMatch>) -> Result<u64>;

    /// Run a full plan: match, sort, skip, limit.
    async fn find(&self, plan: &QueryPlan) -> Result<Vec<Image>>;

    /// Run a suggestion aggregation and return the surviving terms.
    async fn aggregate_terms(&self, pipeline: &SuggestionPipeline) -> Result<Vec<String>>;
}
