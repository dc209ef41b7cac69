//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use hiroba_shared::time::timestamp_to_rfc3339;
use serde::Serialize;

use crate::ui::state::AppState;

/// Body of `GET /`
pub const WELCOME_MESSAGE: &str = "Welcome to the WebSocket server!";

/// Participant entry returned by `GET /api/participants`
#[derive(Debug, Serialize)]
pub struct ParticipantDto {
    pub username: String,
    /// RFC 3339 (UTC)
    pub connected_at: String,
}

/// Static welcome page
pub async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// List connected participants, sorted by username
pub async fn get_participants(State(state): State<Arc<AppState>>) -> Json<Vec<ParticipantDto>> {
    let participants = state.list_participants_usecase.execute().await;

    // Domain Model から DTO への変換
    let dtos = participants
        .into_iter()
        .map(|p| ParticipantDto {
            username: p.username.as_str().to_string(),
            connected_at: timestamp_to_rfc3339(p.connected_at),
        })
        .collect();

    Json(dtos)
}
