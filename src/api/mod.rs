//! Thin `axum` request layer exposing the core's operations as JSON over
//! HTTP. Performs no authentication and no business logic beyond translating
//! verbs/paths/status codes to and from `UrlRegistry`/`TaskQueue` calls.

pub mod dto;
pub mod error;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::analyzer::Analyzer;
use crate::model::{UrlId, UrlRecord, UrlState};
use crate::queue::TaskQueue;
use crate::registry::UrlRegistry;

use dto::{
    AddUrlsRequest, AddUrlsResponse, AddedUrl, RootResponse, StartResponse, StopResponse,
    TargetRequest,
};
use error::ApiError;

/// Shared state handed to every handler: an `Arc` to the registry and one to
/// the queue, matching the "no lock held across both" rule those types
/// already enforce internally.
pub struct AppState<A: Analyzer + 'static> {
    pub registry: Arc<UrlRegistry>,
    pub queue: Arc<TaskQueue<A>>,
}

impl<A: Analyzer + 'static> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            queue: self.queue.clone(),
        }
    }
}

pub fn router<A: Analyzer + 'static>(state: AppState<A>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/urls", post(add_urls).get(list_urls))
        .route("/api/urls/{id}", get(get_url))
        .route("/api/start", post(start))
        .route("/api/stop", post(stop))
        .with_state(state)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: "url-inspector",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn add_urls<A: Analyzer + 'static>(
    State(state): State<AppState<A>>,
    Json(req): Json<AddUrlsRequest>,
) -> Json<AddUrlsResponse> {
    let results = req
        .urls
        .into_iter()
        .map(|url| {
            let record = state.registry.add(url);
            // `record.id` was just allocated, so no task for it can already
            // exist: `submit` always takes the "create new" branch here.
            // This always-false conflict is the observed behavior of the
            // source's Add-then-Submit flow, not a limitation of this layer.
            state.queue.submit(record.id, &record.url);
            AddedUrl {
                id: record.id,
                url: record.url,
                state: state_str(record.state).to_string(),
                conflict: false,
            }
        })
        .collect();
    Json(AddUrlsResponse { results })
}

async fn list_urls<A: Analyzer + 'static>(
    State(state): State<AppState<A>>,
) -> Json<Vec<UrlRecord>> {
    Json(state.registry.list())
}

async fn get_url<A: Analyzer + 'static>(
    State(state): State<AppState<A>>,
    Path(id): Path<UrlId>,
) -> Result<Json<UrlRecord>, ApiError> {
    state.registry.get(id).map(Json).ok_or(ApiError::NotFound)
}

async fn start<A: Analyzer + 'static>(
    State(state): State<AppState<A>>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let record = state.registry.get(req.id).ok_or(ApiError::NotFound)?;
    match record.state {
        UrlState::Processing | UrlState::Pending => Err(ApiError::Conflict(record.state)),
        UrlState::Completed | UrlState::Stopped | UrlState::Failed => {
            state.queue.submit(record.id, &record.url);
            Ok(Json(StartResponse {
                id: record.id,
                state: "pending",
            }))
        }
    }
}

async fn stop<A: Analyzer + 'static>(
    State(state): State<AppState<A>>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<StopResponse>, ApiError> {
    let record = state.registry.get(req.id).ok_or(ApiError::NotFound)?;
    match record.state {
        UrlState::Completed | UrlState::Stopped | UrlState::Failed => {
            Err(ApiError::Conflict(record.state))
        }
        UrlState::Pending | UrlState::Processing => {
            state.queue.stop(req.id).map_err(|_| ApiError::NotFound)?;
            Ok(Json(StopResponse {
                id: req.id,
                state: "stopped",
                message: "stop requested; the analyzer will observe it at its next checkpoint"
                    .to_string(),
            }))
        }
    }
}

fn state_str(state: UrlState) -> &'static str {
    match state {
        UrlState::Pending => "pending",
        UrlState::Processing => "processing",
        UrlState::Stopped => "stopped",
        UrlState::Completed => "completed",
        UrlState::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::analyzer::FakeAnalyzer;

    fn test_state() -> AppState<FakeAnalyzer> {
        let registry = Arc::new(UrlRegistry::new());
        let analyzer = Arc::new(FakeAnalyzer::new(Duration::from_millis(300)));
        let queue = Arc::new(TaskQueue::new(2, registry.clone(), analyzer).unwrap());
        AppState { registry, queue }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn s8_start_on_processing_is_conflict() {
        let state = test_state();
        let record = state.registry.add("https://example.com");
        state.queue.submit(record.id, &record.url);
        state.registry.set_state(record.id, UrlState::Processing);

        let app = router(state);
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/api/start")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(&serde_json::json!({ "id": record.id })).unwrap(),
            ))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn s8_stop_on_completed_is_conflict() {
        let state = test_state();
        let record = state.registry.add("https://example.com");
        state.registry.publish_result(
            record.id,
            crate::model::PageMetrics {
                html_version: "HTML5".into(),
                page_title: "T".into(),
                heading_tags_count: Default::default(),
                internal_links: 0,
                external_links: 0,
                inaccessible_links: 0,
                has_login_form: false,
                processing_finished: chrono::Utc::now(),
            },
        );

        let app = router(state);
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/api/stop")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(&serde_json::json!({ "id": record.id })).unwrap(),
            ))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn s8_get_unknown_id_is_not_found() {
        let state = test_state();
        let app = router(state);
        let req = axum::http::Request::builder()
            .method("GET")
            .uri("/api/urls/9999")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_urls_creates_pending_records() {
        let state = test_state();
        let app = router(state);
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/api/urls")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                serde_json::to_vec(&serde_json::json!({ "urls": ["https://a.example"] }))
                    .unwrap(),
            ))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["results"][0]["state"], "pending");
        assert_eq!(body["results"][0]["conflict"], false);
    }
}
