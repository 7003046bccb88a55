//! Centralized default constants for galleria.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates and the API server reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for the image listing endpoint.
pub const PAGE_LIMIT: i64 = 20;

/// Default (first) page. Pages are 1-indexed.
pub const PAGE: i64 = 1;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

// =============================================================================
// FUZZY MATCHING
// =============================================================================

/// Maximum edit distance between a query token and an indexed term.
pub const FUZZY_MAX_EDITS: u8 = 1;

/// Number of leading characters that must match exactly.
pub const FUZZY_PREFIX_LENGTH: usize = 3;

/// Maximum number of indexed terms considered as variants of one token.
pub const FUZZY_MAX_EXPANSIONS: usize = 50;

/// Maximum number of whitespace-delimited tokens in one query.
pub const MAX_QUERY_TERMS: usize = 32;

// =============================================================================
// SUGGESTIONS
// =============================================================================

/// Maximum number of typeahead suggestions returned.
pub const SUGGESTION_LIMIT: usize = 10;

// =============================================================================
// STORE
// =============================================================================

/// Upper bound for a single store round trip, in seconds.
pub const STORE_TIMEOUT_SECS: u64 = 10;

/// Store calls slower than this are logged at WARN.
pub const SLOW_QUERY_MS: u64 = 500;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";
