//! # galleria-api
//!
//! HTTP surface of the galleria image search layer.
//!
//! Routes:
//! - `GET /api/images` - ranked, paginated search
//! - `GET /api/images/suggestions` - typeahead terms
//! - `GET /health` - liveness

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/images", get(handlers::images::list_images))
        .route(
            "/api/images/suggestions",
            get(handlers::images::suggest_images),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
