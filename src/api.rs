//! HTTP API endpoints.
//!
//! Read-only views of the question bank and the live game for any client, plus
//! character registration for the host.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::bank::BankError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{Character, CharacterSummary, Role};

/// List all characters.
///
/// GET /api/characters
pub async fn list_characters(State(state): State<Arc<AppState>>) -> Json<Vec<CharacterSummary>> {
    Json(state.bank.read().await.list())
}

/// A single character's metadata. Questions are not included.
///
/// GET /api/characters/{id}
pub async fn get_character(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.bank.read().await.character(&id) {
        Some(character) => Json(CharacterSummary::from(character)).into_response(),
        None => (StatusCode::NOT_FOUND, format!("Unknown character: {}", id)).into_response(),
    }
}

/// Current screen and round state, as a display screen sees it.
///
/// GET /api/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<ServerMessage> {
    Json(state.state_message(&Role::Display).await)
}

/// Add a character with its questions.
///
/// POST /api/host/characters (host auth)
pub async fn register_character(
    State(state): State<Arc<AppState>>,
    Json(character): Json<Character>,
) -> Response {
    let id = character.id.clone();
    match state.register_character(character).await {
        Ok(()) => {
            state.broadcast_state().await;
            (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response()
        }
        Err(e) => {
            tracing::warn!("Character registration failed: {}", e);
            let status = match e {
                BankError::DuplicateCharacter(_) | BankError::DuplicateGlobalId { .. } => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::BAD_REQUEST,
            };
            (status, format!("Registration failed: {}", e)).into_response()
        }
    }
}
