//! Host-only command handlers
//!
//! All handlers in this module require the Host role.
//! Authorization is checked in the main dispatch layer before calling these.
//! Successful commands answer with nothing: every screen gets the new state
//! through the broadcast channels instead.

use crate::game::{Event, GameError};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

fn error_response(action: &str, err: GameError) -> Option<ServerMessage> {
    tracing::warn!("Host could not {}: {}", action, err);
    Some(ServerMessage::error(err.code(), err.to_string()))
}

pub async fn handle_open_player_select(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.open_player_select().await {
        Ok(()) => None,
        Err(e) => error_response("open player select", e),
    }
}

pub async fn handle_back_to_menu(state: &Arc<AppState>) -> Option<ServerMessage> {
    tracing::info!("Host returning to menu");
    state.back_to_menu().await;
    None
}

pub async fn handle_select_character(
    state: &Arc<AppState>,
    character_id: String,
) -> Option<ServerMessage> {
    tracing::info!("Host selected character {}", character_id);
    match state.select_character(&character_id).await {
        Ok(_) => None,
        Err(e) => error_response("select character", e),
    }
}

pub async fn handle_game_event(state: &Arc<AppState>, event: Event) -> Option<ServerMessage> {
    tracing::debug!("Host event: {:?}", event);
    match state.apply_event(event).await {
        Ok(()) => None,
        Err(e) => error_response("apply event", e),
    }
}

pub async fn handle_end_game(state: &Arc<AppState>) -> Option<ServerMessage> {
    if state.session_id().await.is_none() {
        return error_response("end game", GameError::NoSession);
    }
    tracing::info!("Host ended the game");
    state.end_game().await;
    None
}
