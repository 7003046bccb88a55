//! # galleria-core
//!
//! Core types, traits, and abstractions for the galleria image search layer.
//!
//! This crate provides the foundational data structures (images, query plans,
//! suggestion pipelines) and the [`ImageStore`] trait that the store
//! implementations in `galleria-db` satisfy and the search engine in
//! `galleria-search` consumes.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod suggestion;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use query::*;
pub use suggestion::{contains_ignore_case, SuggestionPipeline, SuggestionStage};
pub use traits::*;
