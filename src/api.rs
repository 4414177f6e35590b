//! REST API for the intent router
//!
//! Thin HTTP binding over `Router::handle_message` and
//! `Router::reset_session`. No routing logic lives here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::models::Utterance;
use crate::router::Router as IntentRouter;
use crate::Result;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omitted on the first message; the reply carries the new id.
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub utterance: Utterance,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub router: Arc<IntentRouter>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.utterance.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Message text is empty")),
        );
    }
    if let Some(confidence) = req.utterance.voice_confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("voice_confidence must be between 0 and 1")),
            );
        }
    }

    let session_id = match req.session_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => Uuid::new_v4().to_string(),
    };
    info!(session_id = %session_id, modality = ?req.utterance.modality, "Chat request");

    let reply = state.router.handle_message(&session_id, req.utterance).await;
    (StatusCode::OK, Json(ApiResponse::success(reply)))
}

/// =============================
/// Session Endpoint
/// =============================

async fn reset_handler(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> (StatusCode, Json<ApiResponse>) {
    if state.router.reset_session(&session_id).await {
        (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "session_id": session_id,
                "reset": true,
            }))),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!("Unknown session: {}", session_id))),
        )
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(router: Arc<IntentRouter>) -> Router {
    let state = ApiState { router };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/sessions/:id/reset", post(reset_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(router: Arc<IntentRouter>, port: u16) -> Result<()> {
    let app = create_router(router);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::RouterConfig;
    use crate::test_support::SpyLedger;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        let router = IntentRouter::new(
            RouterConfig::default(),
            Arc::new(SpyLedger::new()),
            Arc::new(SystemClock),
        )
        .unwrap();
        create_router(Arc::new(router))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chat_returns_router_reply() {
        let response = app()
            .oneshot(chat(serde_json::json!({
                "session_id": "s1",
                "text": "add 500 expense food"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["intent"], "ADD_TRANSACTION");
        assert_eq!(body["data"]["session_id"], "s1");
    }

    #[tokio::test]
    async fn test_chat_assigns_session_id() {
        let response = app()
            .oneshot(chat(serde_json::json!({ "text": "hello" })))
            .await
            .unwrap();
        let body = body_json(response).await;
        let session_id = body["data"]["session_id"].as_str().unwrap();
        assert!(Uuid::parse_str(session_id).is_ok());
    }

    #[tokio::test]
    async fn test_chat_rejects_bad_input() {
        let empty = app()
            .oneshot(chat(serde_json::json!({ "text": "  " })))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let voice = app()
            .oneshot(chat(serde_json::json!({
                "text": "add 500 expense food",
                "modality": "voice",
                "voice_confidence": 1.5
            })))
            .await
            .unwrap();
        assert_eq!(voice.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reset_session() {
        let app = app();
        app.clone()
            .oneshot(chat(serde_json::json!({ "session_id": "s1", "text": "set a budget" })))
            .await
            .unwrap();

        let reset = |id: &str| {
            Request::builder()
                .method("POST")
                .uri(format!("/api/sessions/{}/reset", id))
                .body(Body::empty())
                .unwrap()
        };

        let known = app.clone().oneshot(reset("s1")).await.unwrap();
        assert_eq!(known.status(), StatusCode::OK);

        let unknown = app.oneshot(reset("s1")).await.unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
