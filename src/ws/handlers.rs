//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Authorization is checked here, then dispatched to the host handler module.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::host;

/// Macro to check host authorization and return early if unauthorized
macro_rules! check_host {
    ($role:expr, $action:expr) => {
        if *$role != Role::Host {
            tracing::warn!("{} client tried to {}", $role, $action);
            return Some(ServerMessage::error(
                "UNAUTHORIZED",
                format!("Only host can {}", $action),
            ));
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    if let Some(event) = msg.game_event() {
        check_host!(role, "control the game");
        return host::handle_game_event(state, event).await;
    }

    match msg {
        ClientMessage::RequestState => Some(state.state_message(role).await),

        ClientMessage::OpenPlayerSelect => {
            check_host!(role, "open player select");
            host::handle_open_player_select(state).await
        }

        ClientMessage::BackToMenu => {
            check_host!(role, "return to the menu");
            host::handle_back_to_menu(state).await
        }

        ClientMessage::SelectCharacter { character_id } => {
            check_host!(role, "select characters");
            host::handle_select_character(state, character_id).await
        }

        ClientMessage::EndGame => {
            check_host!(role, "end the game");
            host::handle_end_game(state).await
        }

        // Game events were dispatched above
        _ => None,
    }
}
