//! Server configuration from the environment.

use std::net::SocketAddr;

use galleria_core::{defaults, Error, Result};

/// Process-level settings read once in `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// PostgreSQL URL. Absent means the in-memory store.
    pub database_url: Option<String>,
    /// JSON array of images loaded into the in-memory store.
    pub seed_file: Option<String>,
    /// Apply bundled migrations at startup (PostgreSQL only).
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            database_url: None,
            seed_file: None,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `DATABASE_URL`, `SEED_FILE` and `RUN_MIGRATIONS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(base.host),
            port: non_empty("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(base.port),
            database_url: non_empty("DATABASE_URL"),
            seed_file: non_empty("SEED_FILE"),
            run_migrations: non_empty("RUN_MIGRATIONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(base.run_migrations),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            Error::Config(format!(
                "invalid bind address {}:{}: {}",
                self.host, self.port, e
            ))
        })
    }
}
