//! HTTP surface tests against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use galleria_api::{
    handlers::images::{X_PAGE_COUNT, X_TOTAL_COUNT},
    router, AppState,
};
use galleria_core::{
    Error, Image, ImageStore, QueryPlan, Result, SuggestionPipeline, TextMatch,
};
use galleria_db::{test_fixtures::gallery_images, MemoryImageStore};
use galleria_search::SearchConfig;

struct BrokenStore;

#[async_trait]
impl ImageStore for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn count(&self, _text_match: Option<&TextMatch>) -> Result<u64> {
        Err(Error::RetrievalFailure("connection reset".into()))
    }

    async fn find(&self, _plan: &QueryPlan) -> Result<Vec<Image>> {
        Err(Error::RetrievalFailure("connection reset".into()))
    }

    async fn aggregate_terms(&self, _pipeline: &SuggestionPipeline) -> Result<Vec<String>> {
        Err(Error::RetrievalFailure("connection reset".into()))
    }
}

fn app() -> Router {
    let store = MemoryImageStore::with_images(gallery_images());
    router(AppState::new(Arc::new(store), SearchConfig::default()))
}

fn broken_app() -> Router {
    router(AppState::new(Arc::new(BrokenStore), SearchConfig::default()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, headers, body)
}

fn ids(body: &Value) -> Vec<Uuid> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|image| image["_id"].as_str().unwrap().parse().unwrap())
        .collect()
}

fn header(headers: &axum::http::HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_backend() {
    let (status, _, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_list_images_defaults() {
    let (status, headers, body) = get(app(), "/api/images").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
    assert_eq!(header(&headers, X_TOTAL_COUNT), 5);
    assert_eq!(header(&headers, X_PAGE_COUNT), 1);
}

#[tokio::test]
async fn test_list_images_query_sort_and_page() {
    let (status, headers, body) =
        get(app(), "/api/images?query=cat&sort=mostPopular&limit=1&page=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![Uuid::from_u128(5)]);
    assert_eq!(header(&headers, X_TOTAL_COUNT), 2);
    assert_eq!(header(&headers, X_PAGE_COUNT), 2);

    let (_, _, body) = get(app(), "/api/images?query=cat&sort=mostPopular&limit=1&page=2").await;
    assert_eq!(ids(&body), vec![Uuid::from_u128(3)]);
}

#[tokio::test]
async fn test_list_images_and_mode() {
    let (status, headers, body) = get(app(), "/api/images?query=cat%20dog&searchMode=AND").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![Uuid::from_u128(5)]);
    assert_eq!(header(&headers, X_TOTAL_COUNT), 1);
}

#[tokio::test]
async fn test_page_past_end_keeps_total() {
    let (status, headers, body) = get(app(), "/api/images?limit=2&page=9").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
    assert_eq!(header(&headers, X_TOTAL_COUNT), 5);
}

#[tokio::test]
async fn test_invalid_pagination_is_bad_request() {
    for uri in [
        "/api/images?limit=0",
        "/api/images?limit=abc",
        "/api/images?page=0",
        "/api/images?limit=101",
    ] {
        let (status, _, body) = get(app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let (status, _, body) = get(broken_app(), "/api/images").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, _, body) = get(broken_app(), "/api/images/suggestions?query=sun").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_suggestions() {
    let (status, _, body) = get(app(), "/api/images/suggestions?query=SUN").await;
    assert_eq!(status, StatusCode::OK);
    let suggestions: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert!(suggestions.contains(&"sunset"));
    assert!(suggestions.len() <= 10);
}

#[tokio::test]
async fn test_blank_suggestions_skip_store() {
    // The broken store would fail if it were contacted.
    for uri in [
        "/api/images/suggestions",
        "/api/images/suggestions?query=",
        "/api/images/suggestions?query=%20%20",
    ] {
        let (status, _, body) = get(broken_app(), uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body, serde_json::json!([]));
    }
}
