//! Typeahead suggestion pipeline.
//!
//! The pipeline mirrors an aggregation: keep images whose searchable fields
//! contain the needle, flatten every searchable value of those images into
//! one pool, keep the values that themselves contain the needle, drop
//! duplicates, and cap the result.
//!
//! Both containment checks use case-insensitive substring matching. They
//! are deliberately kept as two stages: the first selects images, the
//! second selects individual terms of those images.

use serde::Serialize;

use crate::models::SearchField;

/// One aggregation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SuggestionStage {
    /// Keep images where any value of `fields` contains `needle`.
    MatchSubstring {
        fields: Vec<SearchField>,
        needle: String,
    },
    /// Replace each image by the values of `fields`.
    Flatten { fields: Vec<SearchField> },
    /// Keep values containing `needle`.
    FilterTerms { needle: String },
    /// Drop duplicate values (exact comparison).
    Distinct,
    /// Keep at most `count` values.
    Limit { count: usize },
}

/// Ordered suggestion pipeline for one partial query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionPipeline {
    needle: String,
    limit: usize,
    stages: Vec<SuggestionStage>,
}

impl SuggestionPipeline {
    /// Build the standard five-stage pipeline over every searchable field.
    pub fn new(needle: impl Into<String>, limit: usize) -> Self {
        let needle = needle.into();
        let fields = SearchField::ALL.to_vec();
        let stages = vec![
            SuggestionStage::MatchSubstring {
                fields: fields.clone(),
                needle: needle.clone(),
            },
            SuggestionStage::Flatten { fields },
            SuggestionStage::FilterTerms {
                needle: needle.clone(),
            },
            SuggestionStage::Distinct,
            SuggestionStage::Limit { count: limit },
        ];
        Self {
            needle,
            limit,
            stages,
        }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn stages(&self) -> &[SuggestionStage] {
        &self.stages
    }
}

/// Case-insensitive substring containment.
///
/// Shared by store implementations that evaluate the pipeline in process.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
