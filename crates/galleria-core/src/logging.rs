//! Structured logging schema and field name constants for galleria.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query by the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store failure surfaced to a caller |
//! | WARN  | Recoverable issue, fallback applied (bad env value, slow query) |
//! | INFO  | Lifecycle events (startup, shutdown) |
//! | DEBUG | Compiler decisions, operation completions |
//! | TRACE | Per-item iteration (expanded terms, rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "search", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "compiler", "retriever", "suggestions", "pg_store", "memory_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "compile", "execute", "suggest", "count", "find"
pub const OPERATION: &str = "op";

// ─── Request fields ────────────────────────────────────────────────────────

/// Raw search query text.
pub const QUERY: &str = "query";

/// Sort mode requested by the caller.
pub const SORT: &str = "sort";

/// Combination mode (OR/AND/NOR).
pub const SEARCH_MODE: &str = "search_mode";

/// Page size.
pub const LIMIT: &str = "limit";

/// 1-indexed page number.
pub const PAGE: &str = "page";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned.
pub const RESULT_COUNT: &str = "result_count";

/// Total matches before pagination.
pub const TOTAL_COUNT: &str = "total_count";

/// Number of query tokens after tokenization.
pub const TERM_COUNT: &str = "term_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
