//! In-memory image store.
//!
//! Evaluates query plans and suggestion pipelines in process over a
//! `Vec<Image>` kept in insertion order. Used when no `DATABASE_URL` is
//! configured and as the reference backend in tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use galleria_core::{
    contains_ignore_case, Error, Image, ImageStore, QueryPlan, Result, SearchTerm,
    SuggestionPipeline, SuggestionStage, TextMatch,
};

use crate::analysis::analyze_image;
use crate::fuzzy::TermExpander;

/// Image collection held in memory.
///
/// Cloning is cheap and clones share the same collection.
#[derive(Clone, Default)]
pub struct MemoryImageStore {
    images: Arc<RwLock<Vec<Image>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `images`, in the given order.
    pub fn with_images(images: Vec<Image>) -> Self {
        Self {
            images: Arc::new(RwLock::new(images)),
        }
    }

    /// Load a JSON array of images from disk.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("cannot read seed file {}: {}", path.display(), e))
        })?;
        let images: Vec<Image> = serde_json::from_str(&raw)?;
        debug!(
            subsystem = "db",
            component = "memory_store",
            op = "load",
            path = %path.display(),
            image_count = images.len(),
            "Loaded seed images"
        );
        Ok(Self::with_images(images))
    }

    /// Append one image.
    pub async fn insert(&self, image: Image) {
        self.images.write().await.push(image);
    }

    /// Append several images, preserving their order.
    pub async fn insert_many(&self, images: impl IntoIterator<Item = Image>) {
        self.images.write().await.extend(images);
    }

    /// Bump the view counter of one image.
    pub async fn increment_views(&self, id: Uuid) -> Result<i64> {
        let mut images = self.images.write().await;
        let image = images
            .iter_mut()
            .find(|image| image.id == id)
            .ok_or_else(|| Error::NotFound(format!("image {}", id)))?;
        image.views += 1;
        Ok(image.views)
    }

    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.images.read().await.is_empty()
    }
}

/// Images satisfying the text match, in collection order.
fn matching<'a>(images: &'a [Image], text_match: Option<&TextMatch>) -> Vec<&'a Image> {
    let Some(text_match) = text_match else {
        return images.iter().collect();
    };

    let index: Vec<HashSet<String>> = images.iter().map(analyze_image).collect();
    let vocabulary: BTreeSet<String> = index.iter().flatten().cloned().collect();
    let expander = TermExpander::new(&vocabulary, text_match.fuzzy);

    let expansions: HashMap<&SearchTerm, Vec<String>> = text_match
        .clause
        .terms()
        .iter()
        .map(|term| (term, expander.expand(term.as_str())))
        .collect();
    trace!(
        subsystem = "db",
        component = "memory_store",
        expansions = ?expansions,
        "Expanded query terms"
    );

    images
        .iter()
        .zip(index.iter())
        .filter(|(_, terms)| {
            text_match.clause.evaluate(|term| {
                expansions
                    .get(term)
                    .is_some_and(|variants| variants.iter().any(|v| terms.contains(v)))
            })
        })
        .map(|(image, _)| image)
        .collect()
}

enum Working<'a> {
    Images(Vec<&'a Image>),
    Terms(Vec<&'a str>),
}

fn run_pipeline<'a>(images: &'a [Image], pipeline: &SuggestionPipeline) -> Result<Vec<&'a str>> {
    let mut working = Working::Images(images.iter().collect());

    for stage in pipeline.stages() {
        working = match (stage, working) {
            (SuggestionStage::MatchSubstring { fields, needle }, Working::Images(images)) => {
                Working::Images(
                    images
                        .into_iter()
                        .filter(|image| {
                            fields.iter().any(|field| {
                                image
                                    .field_values(*field)
                                    .iter()
                                    .any(|value| contains_ignore_case(value, needle))
                            })
                        })
                        .collect(),
                )
            }
            (SuggestionStage::Flatten { fields }, Working::Images(images)) => Working::Terms(
                images
                    .into_iter()
                    .flat_map(|image| {
                        fields.iter().flat_map(move |field| {
                            image.field_values(*field).iter().map(String::as_str)
                        })
                    })
                    .collect(),
            ),
            (SuggestionStage::FilterTerms { needle }, Working::Terms(terms)) => Working::Terms(
                terms
                    .into_iter()
                    .filter(|term| contains_ignore_case(term, needle))
                    .collect(),
            ),
            (SuggestionStage::Distinct, Working::Terms(terms)) => {
                let mut seen = HashSet::new();
                Working::Terms(terms.into_iter().filter(|term| seen.insert(*term)).collect())
            }
            (SuggestionStage::Limit { count }, Working::Terms(mut terms)) => {
                terms.truncate(*count);
                Working::Terms(terms)
            }
            (stage, _) => {
                return Err(Error::RetrievalFailure(format!(
                    "suggestion stage {:?} is out of order",
                    stage
                )))
            }
        };
    }

    match working {
        Working::Terms(terms) => Ok(terms),
        Working::Images(_) => Err(Error::RetrievalFailure(
            "suggestion pipeline never flattened images into terms".to_string(),
        )),
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn count(&self, text_match: Option<&TextMatch>) -> Result<u64> {
        let images = self.images.read().await;
        Ok(matching(&images, text_match).len() as u64)
    }

    async fn find(&self, plan: &QueryPlan) -> Result<Vec<Image>> {
        let images = self.images.read().await;
        let mut matches = matching(&images, plan.text_match());

        if let Some(sort) = plan.sort() {
            matches.sort_by(|a, b| sort.compare(a, b));
        }

        let skip = usize::try_from(plan.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(plan.limit()).unwrap_or(usize::MAX);
        Ok(matches.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn aggregate_terms(&self, pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        let images = self.images.read().await;
        let terms = run_pipeline(&images, pipeline)?;
        Ok(terms.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use galleria_core::{CombinationMode, FuzzyOptions, MatchClause, Pagination, SortMode};

    fn text_match(mode: CombinationMode, query: &str) -> TextMatch {
        let clause = MatchClause::new(mode, SearchTerm::tokenize(query)).unwrap();
        TextMatch::new(clause, FuzzyOptions::default())
    }

    fn plan(tm: Option<TextMatch>, sort: Option<SortMode>, limit: i64, page: i64) -> QueryPlan {
        QueryPlan::new(
            tm,
            sort.map(|s| s.sort_spec()),
            Pagination::new(limit, page).unwrap(),
        )
    }

    fn animals() -> MemoryImageStore {
        MemoryImageStore::with_images(vec![
            Image::new(Uuid::from_u128(1)).with_auto_tags(["cat"]),
            Image::new(Uuid::from_u128(2)).with_auto_tags(["dog"]),
            Image::new(Uuid::from_u128(3)).with_auto_tags(["cat", "dog"]),
            Image::new(Uuid::from_u128(4)).with_description("an empty beach"),
        ])
    }

    fn ids(images: &[Image]) -> Vec<u128> {
        images.iter().map(|i| i.id.as_u128()).collect()
    }

    #[tokio::test]
    async fn test_count_without_match_counts_everything() {
        let store = animals();
        assert_eq!(store.count(None).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_combination_modes() {
        let store = animals();

        let or = store
            .find(&plan(Some(text_match(CombinationMode::Or, "cat dog")), None, 10, 1))
            .await
            .unwrap();
        assert_eq!(ids(&or), vec![1, 2, 3]);

        let and = store
            .find(&plan(Some(text_match(CombinationMode::And, "cat dog")), None, 10, 1))
            .await
            .unwrap();
        assert_eq!(ids(&and), vec![3]);

        let nor = store
            .find(&plan(Some(text_match(CombinationMode::Nor, "cat dog")), None, 10, 1))
            .await
            .unwrap();
        assert_eq!(ids(&nor), vec![4]);
    }

    #[tokio::test]
    async fn test_fuzzy_match_tolerates_one_edit() {
        let store = MemoryImageStore::with_images(vec![
            Image::new(Uuid::from_u128(1)).with_description("Snowy mountain ridge"),
            Image::new(Uuid::from_u128(2)).with_description("city lights"),
        ]);
        let tm = text_match(CombinationMode::Or, "mountian");
        assert_eq!(store.count(Some(&tm)).await.unwrap(), 0);

        let tm = text_match(CombinationMode::Or, "montain");
        assert_eq!(store.count(Some(&tm)).await.unwrap(), 0, "prefix mismatch");

        let tm = text_match(CombinationMode::Or, "mountan");
        assert_eq!(store.count(Some(&tm)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sort_by_views_breaks_ties_by_id() {
        let store = MemoryImageStore::with_images(vec![
            Image::new(Uuid::from_u128(3)).with_views(5),
            Image::new(Uuid::from_u128(1)).with_views(5),
            Image::new(Uuid::from_u128(2)).with_views(9),
        ]);

        let most = store
            .find(&plan(None, Some(SortMode::MostPopular), 10, 1))
            .await
            .unwrap();
        assert_eq!(ids(&most), vec![2, 3, 1]);

        let least = store
            .find(&plan(None, Some(SortMode::LeastPopular), 10, 1))
            .await
            .unwrap();
        assert_eq!(ids(&least), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn test_sort_by_date_puts_undated_last_when_descending() {
        let store = MemoryImageStore::with_images(vec![
            Image::new(Uuid::from_u128(1)),
            Image::new(Uuid::from_u128(2))
                .with_taken_at(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()),
            Image::new(Uuid::from_u128(3))
                .with_taken_at(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
        ]);

        let desc = store.find(&plan(None, Some(SortMode::Desc), 10, 1)).await.unwrap();
        assert_eq!(ids(&desc), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_unsorted_keeps_insertion_order_and_paginates() {
        let store = MemoryImageStore::with_images(
            (1..=7).map(|n| Image::new(Uuid::from_u128(n))).collect(),
        );
        let page2 = store.find(&plan(None, None, 3, 2)).await.unwrap();
        assert_eq!(ids(&page2), vec![4, 5, 6]);

        let page3 = store.find(&plan(None, None, 3, 3)).await.unwrap();
        assert_eq!(ids(&page3), vec![7]);

        let page9 = store.find(&plan(None, None, 3, 9)).await.unwrap();
        assert!(page9.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_terms_filters_and_dedupes() {
        let store = MemoryImageStore::with_images(vec![
            Image::new(Uuid::from_u128(1))
                .with_description("Mountain lake")
                .with_auto_tags(["mountains", "lake"]),
            Image::new(Uuid::from_u128(2)).with_user_tags(["mountains", "snow"]),
            Image::new(Uuid::from_u128(3)).with_description("beach"),
        ]);

        let terms = store
            .aggregate_terms(&SuggestionPipeline::new("moun", 10))
            .await
            .unwrap();
        assert_eq!(terms, vec!["Mountain lake", "mountains"]);
    }

    #[tokio::test]
    async fn test_aggregate_terms_limit() {
        let store = MemoryImageStore::with_images(
            (0..20)
                .map(|n| Image::new(Uuid::from_u128(n)).with_auto_tags([format!("tag{}", n)]))
                .collect(),
        );
        let terms = store
            .aggregate_terms(&SuggestionPipeline::new("tag", 10))
            .await
            .unwrap();
        assert_eq!(terms.len(), 10);
        assert_eq!(terms[0], "tag0");
    }

    #[tokio::test]
    async fn test_increment_views() {
        let store = animals();
        assert_eq!(store.increment_views(Uuid::from_u128(2)).await.unwrap(), 1);
        assert!(matches!(
            store.increment_views(Uuid::from_u128(99)).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clones_share_collection() {
        let store = MemoryImageStore::new();
        let clone = store.clone();
        clone.insert(Image::new(Uuid::from_u128(1))).await;
        assert_eq!(store.len().await, 1);
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_many_keeps_order() {
        let store = MemoryImageStore::new();
        store.insert(Image::new(Uuid::from_u128(7))).await;
        store
            .insert_many((1..=3).map(|n| Image::new(Uuid::from_u128(n))))
            .await;

        let page = store.find(&plan(None, None, 10, 1)).await.unwrap();
        assert_eq!(ids(&page), vec![7, 1, 2, 3]);
    }
}
