//! Query compilation.
//!
//! Turns caller-supplied search parameters into a [`QueryPlan`]. All request
//! validation happens here so that invalid requests never reach a store.

use serde::Deserialize;
use tracing::debug;

use galleria_core::{
    CombinationMode, Error, MatchClause, Pagination, QueryPlan, Result, SearchTerm, SortMode,
    SortSpec, TextMatch,
};

use crate::config::SearchConfig;

/// Raw retrieval parameters as received over HTTP.
///
/// Numeric values stay strings until [`RetrievalParams::parse`] so that
/// malformed input surfaces as [`Error::InvalidParameter`] instead of a
/// transport-level rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalParams {
    pub query: Option<String>,
    pub sort: Option<String>,
    pub search_mode: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

impl RetrievalParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_search_mode(mut self, mode: impl Into<String>) -> Self {
        self.search_mode = Some(mode.into());
        self
    }

    pub fn with_limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn with_page(mut self, page: impl ToString) -> Self {
        self.page = Some(page.to_string());
        self
    }

    /// Numeric `(limit, page)`. Absent or blank values take the defaults;
    /// anything non-numeric is an [`Error::InvalidParameter`].
    pub fn parse(&self, default_limit: i64) -> Result<(i64, i64)> {
        let limit = parse_integer("limit", self.limit.as_deref(), default_limit)?;
        let page = parse_integer("page", self.page.as_deref(), galleria_core::defaults::PAGE)?;
        Ok((limit, page))
    }
}

fn parse_integer(name: &str, raw: Option<&str>, default: i64) -> Result<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<i64>().map_err(|_| {
            Error::invalid_parameter(format!("{} must be an integer, got '{}'", name, value))
        }),
    }
}

/// Compiles search parameters into query plans.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: SearchConfig,
}

impl QueryCompiler {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Compile a retrieval request into a plan.
    ///
    /// # Arguments
    ///
    /// * `raw_query` - Free text; `None`, empty or whitespace means no filter
    /// * `sort` - `desc`, `asc`, `mostPopular` or `leastPopular`; anything else
    ///   leaves the result in store order
    /// * `search_mode` - `OR`, `AND` or `NOR` (case-insensitive), default `OR`
    /// * `limit` - Page size, at least 1 and at most the configured maximum
    /// * `page` - 1-indexed page number
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for out-of-range pagination or too many
    /// query tokens.
    pub fn compile(
        &self,
        raw_query: Option<&str>,
        sort: Option<&str>,
        search_mode: Option<&str>,
        limit: i64,
        page: i64,
    ) -> Result<QueryPlan> {
        let pagination = Pagination::new(limit, page)?;
        if limit > self.config.max_page_limit {
            return Err(Error::invalid_parameter(format!(
                "limit must be <= {}",
                self.config.max_page_limit
            )));
        }

        let text_match = self.text_match(raw_query, search_mode)?;
        let sort = self.sort_spec(sort);

        debug!(
            subsystem = "search",
            component = "compiler",
            op = "compile",
            term_count = text_match.as_ref().map_or(0, |m| m.clause.terms().len()),
            search_mode = text_match.as_ref().map(|m| m.clause.mode().as_str()),
            sort = ?sort,
            limit,
            page,
            "Compiled query plan"
        );

        Ok(QueryPlan::new(text_match, sort, pagination))
    }

    /// Parse raw HTTP parameters and compile them.
    pub fn compile_params(&self, params: &RetrievalParams) -> Result<QueryPlan> {
        let (limit, page) = params.parse(self.config.default_limit)?;
        self.compile(
            params.query.as_deref(),
            params.sort.as_deref(),
            params.search_mode.as_deref(),
            limit,
            page,
        )
    }

    /// The match stage for a raw query, or `None` when it has no tokens.
    pub fn text_match(
        &self,
        raw_query: Option<&str>,
        search_mode: Option<&str>,
    ) -> Result<Option<TextMatch>> {
        let terms = SearchTerm::tokenize(raw_query.unwrap_or_default());
        if terms.len() > self.config.max_query_terms {
            return Err(Error::invalid_parameter(format!(
                "query has {} terms, at most {} allowed",
                terms.len(),
                self.config.max_query_terms
            )));
        }

        let mode = combination_mode(search_mode);
        Ok(MatchClause::new(mode, terms).map(|clause| TextMatch::new(clause, self.config.fuzzy)))
    }

    /// The sort stage for a raw sort value. Unknown values yield `None`.
    pub fn sort_spec(&self, sort: Option<&str>) -> Option<SortSpec> {
        let raw = sort.filter(|s| !s.is_empty())?;
        match SortMode::parse(raw) {
            Some(mode) => Some(mode.sort_spec()),
            None => {
                debug!(
                    subsystem = "search",
                    component = "compiler",
                    sort = raw,
                    "Unknown sort mode, leaving store order"
                );
                None
            }
        }
    }
}

fn combination_mode(raw: Option<&str>) -> CombinationMode {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return CombinationMode::default();
    };
    CombinationMode::parse(raw).unwrap_or_else(|| {
        debug!(
            subsystem = "search",
            component = "compiler",
            search_mode = raw,
            "Unknown search mode, defaulting to OR"
        );
        CombinationMode::default()
    })
}
