//! Test stores wrapping or replacing the in-memory backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use galleria_core::{
    Error, Image, ImageStore, QueryPlan, Result, SuggestionPipeline, TextMatch,
};
use galleria_db::MemoryImageStore;

/// Memory store that counts every call it receives.
pub struct CountingStore {
    inner: MemoryImageStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(images: Vec<Image>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryImageStore::with_images(images),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStore for CountingStore {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn count(&self, text_match: Option<&TextMatch>) -> Result<u64> {
        self.record();
        self.inner.count(text_match).await
    }

    async fn find(&self, plan: &QueryPlan) -> Result<Vec<Image>> {
        self.record();
        self.inner.find(plan).await
    }

    async fn aggregate_terms(&self, pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        self.record();
        self.inner.aggregate_terms(pipeline).await
    }
}

/// Store whose every call fails as an unreachable backend would.
pub struct FailingStore;

#[async_trait]
impl ImageStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn count(&self, _text_match: Option<&TextMatch>) -> Result<u64> {
        Err(Error::Serialization("connection reset by peer".to_string()))
    }

    async fn find(&self, _plan: &QueryPlan) -> Result<Vec<Image>> {
        Err(Error::Serialization("connection reset by peer".to_string()))
    }

    async fn aggregate_terms(&self, _pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        Err(Error::Serialization("connection reset by peer".to_string()))
    }
}

/// Store that answers only after `delay`.
pub struct SlowStore {
    pub delay: Duration,
}

#[async_trait]
impl ImageStore for SlowStore {
    fn backend(&self) -> &'static str {
        "slow"
    }

    async fn count(&self, _text_match: Option<&TextMatch>) -> Result<u64> {
        tokio::time::sleep(self.delay).await;
        Ok(0)
    }

    async fn find(&self, _plan: &QueryPlan) -> Result<Vec<Image>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn aggregate_terms(&self, _pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }
}

/// Store that ignores the pipeline's distinct and limit stages.
pub struct UncappedTermStore {
    pub terms: Vec<String>,
}

#[async_trait]
impl ImageStore for UncappedTermStore {
    fn backend(&self) -> &'static str {
        "uncapped"
    }

    async fn count(&self, _text_match: Option<&TextMatch>) -> Result<u64> {
        Ok(0)
    }

    async fn find(&self, _plan: &QueryPlan) -> Result<Vec<Image>> {
        Ok(Vec::new())
    }

    async fn aggregate_terms(&self, _pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        Ok(self.terms.clone())
    }
}

/// Ids of a page of images, as integers.
pub fn ids(images: &[Image]) -> Vec<u128> {
    images.iter().map(|i| i.id.as_u128()).collect()
}
