use crate::audio::CuePayload;
use crate::game::{Event, GameSnapshot};
use crate::screen::Screen;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh `state` message (any role)
    RequestState,

    // Operator-only messages
    OpenPlayerSelect,
    BackToMenu,
    SelectCharacter {
        character_id: CharacterId,
    },
    SetStepLabel {
        step: Position,
        label: String,
    },
    ChooseStart {
        step: Position,
    },
    StartGame,
    PlayerAnswer {
        index: usize,
    },
    ChaserAnswer {
        index: usize,
    },
    PlayerNoAnswer,
    ChaserNoAnswer,
    ShowAnswer,
    NextQuestion,
    AdvancePlayer,
    RetreatPlayer,
    AdvanceChaser,
    RetreatChaser,
    EndGame,
}

impl ClientMessage {
    /// The game event this message drives, for messages that map onto one
    pub fn game_event(&self) -> Option<Event> {
        let event = match self {
            ClientMessage::SetStepLabel { step, label } => Event::SetStepLabel {
                step: *step,
                label: label.clone(),
            },
            ClientMessage::ChooseStart { step } => Event::ChooseStart { step: *step },
            ClientMessage::StartGame => Event::Start,
            ClientMessage::PlayerAnswer { index } => Event::PlayerAnswer { index: *index },
            ClientMessage::ChaserAnswer { index } => Event::ChaserAnswer { index: *index },
            ClientMessage::PlayerNoAnswer => Event::PlayerNoAnswer,
            ClientMessage::ChaserNoAnswer => Event::ChaserNoAnswer,
            ClientMessage::ShowAnswer => Event::ShowAnswer,
            ClientMessage::NextQuestion => Event::NextQuestion,
            ClientMessage::AdvancePlayer => Event::AdvancePlayer,
            ClientMessage::RetreatPlayer => Event::RetreatPlayer,
            ClientMessage::AdvanceChaser => Event::AdvanceChaser,
            ClientMessage::RetreatChaser => Event::RetreatChaser,
            ClientMessage::RequestState
            | ClientMessage::OpenPlayerSelect
            | ClientMessage::BackToMenu
            | ClientMessage::SelectCharacter { .. }
            | ClientMessage::EndGame => return None,
        };
        Some(event)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        server_now: String,
        session_id: Option<SessionId>,
        screen: Screen,
        game: Option<GameSnapshot>,
    },
    /// Full screen plus round state, sent after every change
    State {
        session_id: Option<SessionId>,
        screen: Screen,
        game: Option<GameSnapshot>,
    },
    PlayCue {
        cue: CuePayload,
    },
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}
