//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the chat adapter endpoints under a single Axum router.
//! A chat-platform connector (or curl) posts each chat line to `/api/chat`
//! and relays the reply text back to the channel.

pub mod chat;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Chat adapter routes plus health check.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat::post_chat))
        .route("/api/inputs", get(chat::list_inputs))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
