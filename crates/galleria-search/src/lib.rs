//! # galleria-search
//!
//! Search and ranking layer for the galleria image gallery.
//!
//! This crate provides:
//! - [`QueryCompiler`]: validates request parameters and builds query plans
//! - [`RankedRetriever`]: executes plans, returning a page plus the total
//! - [`SuggestionAggregator`]: typeahead terms for a partial query
//!
//! Storage is abstracted behind [`galleria_core::ImageStore`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use galleria_db::MemoryImageStore;
//! use galleria_search::{RankedRetriever, RetrievalParams, SearchConfig};
//!
//! let store = Arc::new(MemoryImageStore::new());
//! let retriever = RankedRetriever::new(store, SearchConfig::default());
//!
//! let page = retriever
//!     .retrieve(&RetrievalParams::new().with_query("sunset").with_sort("desc"))
//!     .await?;
//! println!("{} of {}", page.items.len(), page.total_count);
//! ```

pub mod compiler;
pub mod config;
mod deadline;
pub mod retriever;
pub mod suggestions;

// Re-export core types
pub use galleria_core::*;

pub use compiler::{QueryCompiler, RetrievalParams};
pub use config::SearchConfig;
pub use retriever::RankedRetriever;
pub use suggestions::SuggestionAggregator;
