//! Search configuration.
//!
//! Built once at startup (usually with [`SearchConfig::from_env`]) and handed
//! to the compiler, retriever and aggregator. Every value has a default in
//! `galleria_core::defaults`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use galleria_core::{defaults, FuzzyOptions};

/// Tunables for query compilation and store access.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Fuzzy matching tolerance applied to every query token.
    pub fuzzy: FuzzyOptions,
    /// Page size used when the caller sends none.
    pub default_limit: i64,
    /// Largest accepted page size.
    pub max_page_limit: i64,
    /// Largest accepted number of query tokens.
    pub max_query_terms: usize,
    /// Cap on typeahead suggestions.
    pub suggestion_limit: usize,
    /// Upper bound on a single store call.
    pub store_timeout: Duration,
    /// Store calls slower than this are logged at WARN.
    pub slow_query_threshold: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy: FuzzyOptions::default(),
            default_limit: defaults::PAGE_LIMIT,
            max_page_limit: defaults::MAX_PAGE_LIMIT,
            max_query_terms: defaults::MAX_QUERY_TERMS,
            suggestion_limit: defaults::SUGGESTION_LIMIT,
            store_timeout: Duration::from_secs(defaults::STORE_TIMEOUT_SECS),
            slow_query_threshold: Duration::from_millis(defaults::SLOW_QUERY_MS),
        }
    }
}

impl SearchConfig {
    /// Constructs the configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SEARCH_FUZZY_MAX_EDITS` (default: 1)
    /// - `SEARCH_FUZZY_PREFIX_LENGTH` (default: 3)
    /// - `SEARCH_FUZZY_MAX_EXPANSIONS` (default: 50)
    /// - `SEARCH_MAX_PAGE_LIMIT` (default: 100)
    /// - `SEARCH_MAX_QUERY_TERMS` (default: 32)
    /// - `SEARCH_SUGGESTION_LIMIT` (default: 10, clamped to 1..=10)
    /// - `SEARCH_STORE_TIMEOUT_SECS` (default: 10)
    ///
    /// Unparsable values fall back to the default and log a warning.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            fuzzy: FuzzyOptions {
                max_edits: parse_env("SEARCH_FUZZY_MAX_EDITS", base.fuzzy.max_edits),
                prefix_length: parse_env("SEARCH_FUZZY_PREFIX_LENGTH", base.fuzzy.prefix_length),
                max_expansions: parse_env(
                    "SEARCH_FUZZY_MAX_EXPANSIONS",
                    base.fuzzy.max_expansions,
                )
                .max(1),
            },
            max_page_limit: parse_env("SEARCH_MAX_PAGE_LIMIT", base.max_page_limit).max(1),
            max_query_terms: parse_env("SEARCH_MAX_QUERY_TERMS", base.max_query_terms).max(1),
            suggestion_limit: clamp_suggestion_limit(parse_env(
                "SEARCH_SUGGESTION_LIMIT",
                base.suggestion_limit,
            )),
            store_timeout: Duration::from_secs(
                parse_env("SEARCH_STORE_TIMEOUT_SECS", defaults::STORE_TIMEOUT_SECS).max(1),
            ),
            ..base
        }
    }

    pub fn with_max_page_limit(mut self, limit: i64) -> Self {
        self.max_page_limit = limit;
        self
    }

    pub fn with_max_query_terms(mut self, terms: usize) -> Self {
        self.max_query_terms = terms;
        self
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = clamp_suggestion_limit(limit);
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

/// Suggestions are never disabled and never exceed the documented cap.
fn clamp_suggestion_limit(limit: usize) -> usize {
    let clamped = limit.clamp(1, defaults::SUGGESTION_LIMIT);
    if clamped != limit {
        warn!(
            subsystem = "search",
            component = "config",
            variable = "SEARCH_SUGGESTION_LIMIT",
            value = limit,
            clamped,
            "Suggestion limit out of range, clamping"
        );
    }
    clamped
}

/// Parse an environment variable, keeping `default` when absent or invalid.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    subsystem = "search",
                    component = "config",
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Invalid environment value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
