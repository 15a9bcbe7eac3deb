//! HTTP transport for the email mentor
//!
//! Exposes the render state and the four write transitions as JSON endpoints
//! so a browser front-end can drive the [`Controller`]. Bearer authentication
//! applies to everything except `/health` and CORS preflight requests.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, header},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::brief::{BriefField, FieldValue};
use crate::config::Config;
use crate::controller::Controller;
use crate::error::{MentorError, Result};
use crate::state::AppState;

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub controller: Arc<Controller>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldBody {
    pub field: BriefField,
    pub value: FieldValue,
}

#[derive(Debug, Deserialize)]
pub struct ChatInputBody {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendChatBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

pub async fn state_handler(State(state): State<HttpState>) -> Json<AppState> {
    Json(state.controller.snapshot().as_ref().clone())
}

pub async fn update_field_handler(
    State(state): State<HttpState>,
    Json(body): Json<UpdateFieldBody>,
) -> Result<Json<AppState>> {
    let next = state
        .controller
        .update_brief_field(body.field, body.value)
        .await
        .map_err(|e| MentorError::Validation {
            message: e.to_string(),
        })?;
    Ok(Json(next.as_ref().clone()))
}

pub async fn submit_handler(State(state): State<HttpState>) -> Json<AppState> {
    let next = state.controller.submit_brief().await;
    Json(next.as_ref().clone())
}

pub async fn chat_input_handler(
    State(state): State<HttpState>,
    Json(body): Json<ChatInputBody>,
) -> Json<AppState> {
    let next = state.controller.update_chat_input(body.text).await;
    Json(next.as_ref().clone())
}

/// Sends `message` when given, otherwise the current chat input draft
pub async fn send_chat_handler(
    State(state): State<HttpState>,
    body: Bytes,
) -> Result<Json<AppState>> {
    let body: SendChatBody = if body.is_empty() {
        SendChatBody::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let message = match body.message {
        Some(m) => m,
        None => state.controller.snapshot().chat_input.clone(),
    };
    let next = state.controller.send_chat_message(&message).await;
    Ok(Json(next.as_ref().clone()))
}

/// Build the router without binding; used by the server and by tests
pub fn router(controller: Arc<Controller>, bearer_token: Option<String>) -> Router {
    let state = HttpState { controller };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/state", get(state_handler))
        .route("/api/brief", patch(update_field_handler))
        .route("/api/brief/submit", post(submit_handler))
        .route("/api/chat/input", put(chat_input_handler))
        .route("/api/chat", post(send_chat_handler))
        .layer(middleware::from_fn_with_state(
            bearer_token,
            |State(token): State<Option<String>>,
             req: axum::http::Request<Body>,
             next: axum::middleware::Next| async move {
                if req.uri().path() == "/health" {
                    return next.run(req).await;
                }
                if !bearer_ok(req.headers(), token.as_deref()) {
                    return MentorError::Unauthorized.into_response();
                }
                next.run(req).await
            },
        ))
        // Outermost so preflight requests are answered before the token check
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// No configured token means the API is open
fn bearer_ok(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v == expected)
        .unwrap_or(false)
}

/// Start the HTTP server
pub async fn start_http_server(config: &Config, controller: Arc<Controller>) -> Result<()> {
    if config.server.bearer_token.is_none() {
        tracing::warn!("No bearer token configured; the HTTP API accepts unauthenticated requests");
    }

    let app = router(controller, config.server.bearer_token.clone());

    let listener = tokio::net::TcpListener::bind(config.server.http_bind)
        .await
        .map_err(|e| MentorError::Http {
            message: format!("Failed to bind HTTP listener: {}", e),
        })?;

    tracing::info!("Starting HTTP server on {}", config.server.http_bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| MentorError::Http {
            message: format!("HTTP server error: {}", e),
        })?;

    Ok(())
}
