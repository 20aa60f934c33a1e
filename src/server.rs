//! HTTP server for predicate recommendation

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::{CandidateDevice, PredicateEngine, RecommendationResult, SubjectDeviceProfile};

/// Engine plus the pool preloaded from a candidate source
pub struct AppState {
    pub engine: PredicateEngine,
    pub pool: Vec<CandidateDevice>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequestHttp {
    pub subject: SubjectDeviceProfile,
    /// Overrides the preloaded pool when present
    pub candidates: Option<Vec<CandidateDevice>>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub pool_size: usize,
}

async fn recommend_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecommendRequestHttp>,
) -> Result<Json<RecommendationResult>, (StatusCode, Json<ErrorResponse>)> {
    let pool = req.candidates.as_deref().unwrap_or(&state.pool);
    let top_n = req.top_n.unwrap_or(state.engine.config().top_n);

    info!(
        "Received recommend request: code='{}', pool={}, top_n={}",
        req.subject.classification_code,
        pool.len(),
        top_n
    );

    match state
        .engine
        .recommend_as_of(&req.subject, pool, top_n, Local::now().date_naive())
    {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!("Recommendation rejected: {}", e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Invalid configuration".to_string(),
                    details: Some(e.to_string()),
                }),
            ))
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "predicate-ranker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pool_size: state.pool.len(),
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/recommend", post(recommend_handler))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting predicate-ranker server on {}", addr);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Acceptability, EngineConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Datelike;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        let last_year = Local::now().date_naive().year() - 1;
        Arc::new(AppState {
            engine: PredicateEngine::new(EngineConfig::default()).unwrap(),
            pool: vec![CandidateDevice {
                k_number: "K230001".to_string(),
                classification_code: "DQY".to_string(),
                decision_description: "coronary balloon dilatation catheter".to_string(),
                decision_date: format!("{last_year}-03-01"),
                acceptability: Acceptability::Acceptable,
                passed_validation: true,
                ..Default::default()
            }],
        })
    }

    async fn post_json(app: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/recommend")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn recommend_uses_preloaded_pool() {
        let app = create_router(state());
        let (status, body) = post_json(
            app,
            serde_json::json!({
                "subject": {
                    "classification_code": "DQY",
                    "intended_use": "coronary balloon dilatation catheter"
                }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_searched"], 1);
        assert_eq!(body["recommendations"][0]["candidate"]["k_number"], "K230001");
        assert!(body["disclaimer"].as_str().unwrap().contains("not a substantial equivalence"));
    }

    #[tokio::test]
    async fn inline_candidates_override_pool() {
        let app = create_router(state());
        let (status, body) = post_json(
            app,
            serde_json::json!({
                "subject": { "classification_code": "DQY", "intended_use": "catheter" },
                "candidates": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_searched"], 0);
        assert!(body["reason"].as_str().is_some());
    }

    #[tokio::test]
    async fn zero_top_n_is_a_bad_request() {
        let app = create_router(state());
        let (status, body) = post_json(
            app,
            serde_json::json!({
                "subject": { "classification_code": "DQY" },
                "top_n": 0
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid configuration");
    }

    #[tokio::test]
    async fn health_reports_pool_size() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["pool_size"], 1);
    }
}
