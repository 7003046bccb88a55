//! Image search HTTP handlers.
//!
//! Thin adapters from query strings to the search layer. Validation and
//! error classification live in `galleria-search`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use galleria_search::RetrievalParams;

use crate::{ApiError, AppState};

/// Total matches before pagination.
pub const X_TOTAL_COUNT: &str = "x-total-count";

/// Number of pages at the requested limit.
pub const X_PAGE_COUNT: &str = "x-page-count";

/// Query parameters for typeahead suggestions.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestionQuery {
    /// Partial query text
    pub query: Option<String>,
}

/// Search, sort and paginate images.
///
/// # Query Parameters
/// - `query`: free text, fuzzy-matched per whitespace token (optional)
/// - `searchMode`: `OR` (default), `AND` or `NOR`
/// - `sort`: `desc`, `asc`, `mostPopular` or `leastPopular` (optional)
/// - `limit`: page size, default 20
/// - `page`: 1-indexed page, default 1
///
/// # Returns
/// - 200 OK with a JSON array of images, plus `X-Total-Count` and
///   `X-Page-Count` headers
/// - 400 Bad Request for invalid `limit`/`page`
/// - 500 Internal Server Error if the store call fails
pub async fn list_images(
    State(state): State<AppState>,
    params: Result<Query<RetrievalParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let page = state.retriever.retrieve(&params).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(X_TOTAL_COUNT),
        HeaderValue::from(page.total_count),
    );
    headers.insert(
        HeaderName::from_static(X_PAGE_COUNT),
        HeaderValue::from(page.page_count()),
    );

    Ok((StatusCode::OK, headers, Json(page.items)))
}

/// Typeahead suggestions for a partial query.
///
/// # Query Parameters
/// - `query`: partial text; missing or blank yields `[]`
///
/// # Returns
/// - 200 OK with a JSON array of at most 10 distinct strings
/// - 500 Internal Server Error if the store call fails
pub async fn suggest_images(
    State(state): State<AppState>,
    params: Result<Query<SuggestionQuery>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let Query(params) = params?;
    let suggestions = state
        .suggestions
        .suggest(params.query.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(suggestions))
}
