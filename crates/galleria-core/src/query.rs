//! Query plan types for ranked image retrieval.
//!
//! A [`QueryPlan`] is an ordered list of [`Stage`]s built once per request:
//! an optional text match, an optional sort, then skip and limit. The match
//! stage always precedes pagination so that the total count and the page
//! are computed over the same filtered set.
//!
//! The text match is a strongly typed [`MatchClause`]; translating it into a
//! store's native query language happens only inside the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::Image;

// =============================================================================
// SEARCH TERMS
// =============================================================================

/// One whitespace-delimited token of a raw query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Split a raw query on whitespace, discarding empty tokens.
    ///
    /// An empty or whitespace-only query yields no terms.
    pub fn tokenize(raw: &str) -> Vec<SearchTerm> {
        raw.split_whitespace()
            .map(|token| SearchTerm(token.to_string()))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// COMBINATION MODE
// =============================================================================

/// Boolean policy for merging per-token predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombinationMode {
    /// Any token may match.
    #[default]
    Or,
    /// Every token must match.
    And,
    /// No token may match.
    Nor,
}

impl CombinationMode {
    /// Case-insensitive parse. Returns `None` for unrecognized values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OR" => Some(CombinationMode::Or),
            "AND" => Some(CombinationMode::And),
            "NOR" => Some(CombinationMode::Nor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CombinationMode::Or => "OR",
            CombinationMode::And => "AND",
            CombinationMode::Nor => "NOR",
        }
    }
}

impl FromStr for CombinationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
            .ok_or_else(|| Error::invalid_parameter(format!("unknown searchMode '{}'", s)))
    }
}

impl fmt::Display for CombinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SORTING
// =============================================================================

/// Caller-facing sort mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    /// Newest first, ties broken by id descending.
    #[serde(rename = "desc")]
    Desc,
    /// Oldest first, ties broken by id ascending.
    #[serde(rename = "asc")]
    Asc,
    /// Most viewed first.
    #[serde(rename = "mostPopular")]
    MostPopular,
    /// Least viewed first.
    #[serde(rename = "leastPopular")]
    LeastPopular,
}

impl SortMode {
    /// Exact-match parse of the wire value. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "desc" => Some(SortMode::Desc),
            "asc" => Some(SortMode::Asc),
            "mostPopular" => Some(SortMode::MostPopular),
            "leastPopular" => Some(SortMode::LeastPopular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Desc => "desc",
            SortMode::Asc => "asc",
            SortMode::MostPopular => "mostPopular",
            SortMode::LeastPopular => "leastPopular",
        }
    }

    /// The field and direction this mode sorts by.
    pub fn sort_spec(&self) -> SortSpec {
        match self {
            SortMode::Desc => SortSpec::new(SortKey::TakenAt, SortDirection::Desc),
            SortMode::Asc => SortSpec::new(SortKey::TakenAt, SortDirection::Asc),
            SortMode::MostPopular => SortSpec::new(SortKey::Views, SortDirection::Desc),
            SortMode::LeastPopular => SortSpec::new(SortKey::Views, SortDirection::Asc),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field a sort stage orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// `metadata.DateTime`; images without a timestamp sort as oldest.
    TakenAt,
    /// View counter.
    Views,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sort stage: primary key plus direction. Ties are always broken by image
/// id in the same direction, which makes sorted pagination deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Total order over images under this sort.
    pub fn compare(&self, a: &Image, b: &Image) -> std::cmp::Ordering {
        let primary = match self.key {
            // None < Some, so undated images are the oldest.
            SortKey::TakenAt => a.taken_at().cmp(&b.taken_at()),
            SortKey::Views => a.views.cmp(&b.views),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

// =============================================================================
// TEXT MATCH
// =============================================================================

/// Tolerance settings for fuzzy term matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyOptions {
    /// Maximum edit distance between query token and indexed term.
    pub max_edits: u8,
    /// Leading characters that must match exactly. Tokens no longer than
    /// this are matched exactly.
    pub prefix_length: usize,
    /// Cap on indexed terms considered as variants of one token.
    pub max_expansions: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            max_edits: defaults::FUZZY_MAX_EDITS,
            prefix_length: defaults::FUZZY_PREFIX_LENGTH,
            max_expansions: defaults::FUZZY_MAX_EXPANSIONS,
        }
    }
}

/// Per-token predicates combined under one boolean policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "terms", rename_all = "snake_case")]
pub enum MatchClause {
    /// At least one term matches.
    AnyOf(Vec<SearchTerm>),
    /// Every term matches.
    AllOf(Vec<SearchTerm>),
    /// No term matches.
    NoneOf(Vec<SearchTerm>),
}

impl MatchClause {
    /// Build a clause, or `None` when there are no terms (match-all).
    pub fn new(mode: CombinationMode, terms: Vec<SearchTerm>) -> Option<Self> {
        if terms.is_empty() {
            return None;
        }
        Some(match mode {
            CombinationMode::Or => MatchClause::AnyOf(terms),
            CombinationMode::And => MatchClause::AllOf(terms),
            CombinationMode::Nor => MatchClause::NoneOf(terms),
        })
    }

    pub fn terms(&self) -> &[SearchTerm] {
        match self {
            MatchClause::AnyOf(terms) | MatchClause::AllOf(terms) | MatchClause::NoneOf(terms) => {
                terms
            }
        }
    }

    pub fn mode(&self) -> CombinationMode {
        match self {
            MatchClause::AnyOf(_) => CombinationMode::Or,
            MatchClause::AllOf(_) => CombinationMode::And,
            MatchClause::NoneOf(_) => CombinationMode::Nor,
        }
    }

    /// Combine per-term outcomes according to the clause's policy.
    pub fn evaluate<F>(&self, mut term_matches: F) -> bool
    where
        F: FnMut(&SearchTerm) -> bool,
    {
        match self {
            MatchClause::AnyOf(terms) => terms.iter().any(&mut term_matches),
            MatchClause::AllOf(terms) => terms.iter().all(&mut term_matches),
            MatchClause::NoneOf(terms) => !terms.iter().any(&mut term_matches),
        }
    }
}

/// The match stage: a fuzzy text clause over every searchable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub clause: MatchClause,
    pub fuzzy: FuzzyOptions,
}

impl TextMatch {
    pub fn new(clause: MatchClause, fuzzy: FuzzyOptions) -> Self {
        Self { clause, fuzzy }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Validated page request. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    limit: u64,
    page: u64,
}

impl Pagination {
    /// Validate caller-supplied values; both must be positive.
    pub fn new(limit: i64, page: i64) -> Result<Self> {
        if limit <= 0 {
            return Err(Error::invalid_parameter("limit must be >= 1"));
        }
        if page <= 0 {
            return Err(Error::invalid_parameter("page must be >= 1"));
        }
        Ok(Self {
            limit: limit as u64,
            page: page as u64,
        })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    /// Number of matches to skip: `limit * (page - 1)`.
    pub fn skip(&self) -> u64 {
        self.limit.saturating_mul(self.page - 1)
    }
}

// =============================================================================
// QUERY PLAN
// =============================================================================

/// One stage of a retrieval plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Match(TextMatch),
    Sort(SortSpec),
    Skip { count: u64 },
    Limit { count: u64 },
}

/// Ordered retrieval plan: match → sort → skip → limit.
///
/// Without a sort stage the result order is whatever the store returns and
/// is not guaranteed to be stable across calls, so unsorted pagination is
/// best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    stages: Vec<Stage>,
    pagination: Pagination,
}

impl QueryPlan {
    /// Assemble a plan. Stage order is fixed here and cannot be changed
    /// afterwards.
    pub fn new(
        text_match: Option<TextMatch>,
        sort: Option<SortSpec>,
        pagination: Pagination,
    ) -> Self {
        let mut stages = Vec::with_capacity(4);
        if let Some(text_match) = text_match {
            stages.push(Stage::Match(text_match));
        }
        if let Some(sort) = sort {
            stages.push(Stage::Sort(sort));
        }
        stages.push(Stage::Skip {
            count: pagination.skip(),
        });
        stages.push(Stage::Limit {
            count: pagination.limit(),
        });
        Self { stages, pagination }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn text_match(&self) -> Option<&TextMatch> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Match(text_match) => Some(text_match),
            _ => None,
        })
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.stages.iter().find_map(|stage| match stage {
            Stage::Sort(sort) => Some(*sort),
            _ => None,
        })
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn skip(&self) -> u64 {
        self.pagination.skip()
    }

    pub fn limit(&self) -> u64 {
        self.pagination.limit()
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// One page of retrieval results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalPage {
    pub items: Vec<Image>,
    /// Matches before pagination. May be off by one under concurrent writes.
    pub total_count: u64,
    pub limit: u64,
    pub page: u64,
}

impl RetrievalPage {
    /// Number of pages for the current total (at least 1).
    pub fn page_count(&self) -> u64 {
        if self.total_count == 0 || self.limit == 0 {
            return 1;
        }
        self.total_count.div_ceil(self.limit)
    }

    /// Whether pages exist after this one.
    pub fn has_more(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
