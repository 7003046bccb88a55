//! # galleria-db
//!
//! Storage backends for the galleria image search layer.
//!
//! This crate provides:
//! - [`PgImageStore`]: PostgreSQL store with fuzzy matching via `fuzzystrmatch`
//! - [`MemoryImageStore`]: in-process store evaluating plans directly
//! - Connection pool management
//! - Term analysis and fuzzy expansion shared by both backends
//!
//! ## Example
//!
//! ```rust,ignore
//! use galleria_db::{Database, ImageStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/galleria").await?;
//!     let total = db.images.count(None).await?;
//!     println!("{} images", total);
//!     Ok(())
//! }
//! ```
pub mod analysis;
pub mod fuzzy;
pub mod images;
pub mod match_filter;
pub mod memory;
pub mod pool;

// Always compiled so integration tests in other crates can use the fixtures
pub mod test_fixtures;

// Re-export core types
pub use galleria_core::*;

pub use fuzzy::TermExpander;
pub use images::PgImageStore;
pub use match_filter::{QueryParam, TextMatchQueryBuilder};
pub use memory::MemoryImageStore;
pub use pool::{create_pool, log_pool_metrics, PoolConfig};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// PostgreSQL connection plus the image store built on it.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub images: PgImageStore,
}

impl Database {
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            images: PgImageStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect with pool settings from the environment.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with(url, PoolConfig::from_env()).await
    }

    pub async fn connect_with(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}
