//! Screen view models.
//!
//! Everything here is a pure function of a [`GameSnapshot`] (or the bank, for
//! the lobby screens). Browsers render these directly and never derive game
//! rules themselves.

use crate::bank::QuestionBank;
use crate::game::{self, GameSnapshot, GameStats, QuestionView};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Where the lobby is when no game is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lobby {
    #[default]
    Menu,
    PlayerSelect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Menu {
        title: String,
        how_to_play: Vec<String>,
    },
    PlayerSelect {
        characters: Vec<CharacterSummary>,
    },
    Setup {
        character: CharacterSummary,
        board: Vec<BoardStep>,
        start_step: Option<Position>,
        ready: bool,
        hint: Option<String>,
        controls: Controls,
    },
    Playing {
        character: CharacterSummary,
        board: Vec<BoardStep>,
        progress: Progress,
        round_no: u32,
        question: Option<QuestionView>,
        timer: TimerView,
        player_answer: Option<Answer>,
        chaser_answer: Option<Answer>,
        answer_shown: bool,
        controls: Controls,
    },
    Result {
        outcome: Outcome,
        title: String,
        message: String,
        button: String,
        stats: GameStats,
    },
}

/// How a board step should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Finish,
    /// Player and chaser on the same step
    Both,
    Player,
    Chaser,
    /// Below the chaser
    CaughtZone,
    Passed,
    ChaserPassed,
    /// Setup step holding the chosen start position
    SetupSelected,
    SetupOpen,
    Open,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardStep {
    pub step: Position,
    pub kind: StepKind,
    pub label: Option<String>,
    /// Setup steps still waiting for a label get a text field instead of a button
    pub editable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Calm,
    Warning,
    Danger,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub remaining: u32,
    pub urgency: Urgency,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub player_name: String,
    pub player_position: Position,
    pub chaser_position: Position,
    pub steps_to_go: Position,
    pub lead: Position,
}

/// Which operator controls are enabled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub can_start: bool,
    pub can_player_answer: bool,
    pub can_chaser_answer: bool,
    pub can_show_answer: bool,
    pub can_next_question: bool,
    pub can_player_no_answer: bool,
    pub can_chaser_no_answer: bool,
    pub can_move_tokens: bool,
}

pub fn menu() -> Screen {
    Screen::Menu {
        title: "The Chase".to_string(),
        how_to_play: vec![
            "Pick a chaser and label the three starting steps.".to_string(),
            "Answer before the timer runs out to climb one step.".to_string(),
            "Reach the top before the chaser catches you.".to_string(),
        ],
    }
}

pub fn player_select(bank: &QuestionBank) -> Screen {
    Screen::PlayerSelect {
        characters: bank.list(),
    }
}

/// Screen for a lobby state
pub fn lobby(lobby: Lobby, bank: &QuestionBank) -> Screen {
    match lobby {
        Lobby::Menu => menu(),
        Lobby::PlayerSelect => player_select(bank),
    }
}

/// Screen for a running game
pub fn project(snapshot: &GameSnapshot) -> Screen {
    let controls = controls(snapshot);
    match snapshot.phase {
        Phase::Setup => Screen::Setup {
            character: snapshot.character.clone(),
            board: board(snapshot),
            start_step: snapshot.start_step,
            ready: snapshot.ready,
            hint: setup_hint(snapshot),
            controls,
        },
        Phase::AwaitingPlayerAnswer | Phase::AwaitingChaserAnswer | Phase::Revealed => {
            Screen::Playing {
                character: snapshot.character.clone(),
                board: board(snapshot),
                progress: progress(snapshot),
                round_no: snapshot.round_no,
                question: snapshot.question.clone(),
                timer: timer_view(snapshot.time_remaining),
                player_answer: snapshot.player_answer,
                chaser_answer: snapshot.chaser_answer,
                answer_shown: snapshot.answer_shown,
                controls,
            }
        }
        Phase::Won | Phase::Caught => {
            let outcome = snapshot.outcome.unwrap_or(Outcome::Caught);
            let (title, message, button) = result_text(outcome, &snapshot.player_name);
            Screen::Result {
                outcome,
                title,
                message,
                button,
                stats: snapshot.stats.clone(),
            }
        }
    }
}

pub fn result_text(outcome: Outcome, player_name: &str) -> (String, String, String) {
    match outcome {
        Outcome::Won => (
            "🎉 YOU WON! 🎉".to_string(),
            format!(
                "You escaped! {} DRINKS FOR EVERYONE (except you)",
                player_name
            ),
            "Play Again".to_string(),
        ),
        Outcome::Caught => (
            "💀 CAUGHT! 💀".to_string(),
            format!("The Chasers got you! {} DRINKS FOR YOU", player_name),
            "Try Again".to_string(),
        ),
    }
}

fn setup_hint(snapshot: &GameSnapshot) -> Option<String> {
    if !game::setup::all_labels_filled(&snapshot.step_labels) {
        Some("Please fill in all three text fields first".to_string())
    } else if snapshot.start_step.is_none() {
        Some("Now select a starting position by clicking one of the steps".to_string())
    } else {
        None
    }
}

pub fn timer_view(remaining: u32) -> TimerView {
    let urgency = match remaining {
        0 => Urgency::Expired,
        1..=3 => Urgency::Danger,
        4..=5 => Urgency::Warning,
        _ => Urgency::Calm,
    };
    let text = if remaining == 0 {
        "⏰ TIMES UP ⏰".to_string()
    } else {
        remaining.to_string()
    };
    TimerView {
        remaining,
        urgency,
        text,
    }
}

fn progress(snapshot: &GameSnapshot) -> Progress {
    Progress {
        player_name: snapshot.player_name.clone(),
        player_position: snapshot.player_position,
        chaser_position: snapshot.chaser_position,
        steps_to_go: game::steps_remaining(snapshot.player_position, snapshot.finish_line),
        lead: game::distance(snapshot.player_position, snapshot.chaser_position),
    }
}

/// Steps from the finish line down to 0, in display order
pub fn board(snapshot: &GameSnapshot) -> Vec<BoardStep> {
    let in_setup = snapshot.phase == Phase::Setup;
    (0..=snapshot.finish_line)
        .rev()
        .map(|step| {
            let label = snapshot
                .step_labels
                .get(&step)
                .filter(|l| !l.trim().is_empty())
                .cloned();
            let setup_step = in_setup && game::setup::is_setup_step(step);
            BoardStep {
                step,
                kind: step_kind(step, snapshot),
                editable: setup_step && label.is_none(),
                label,
            }
        })
        .collect()
}

pub fn step_kind(step: Position, snapshot: &GameSnapshot) -> StepKind {
    let player = snapshot.player_position;
    let chaser = snapshot.chaser_position;
    let in_setup = snapshot.phase == Phase::Setup;

    if in_setup && game::setup::is_setup_step(step) {
        return if player == step {
            StepKind::SetupSelected
        } else {
            StepKind::SetupOpen
        };
    }

    if step == snapshot.finish_line {
        StepKind::Finish
    } else if player == step && chaser == step {
        StepKind::Both
    } else if player == step {
        StepKind::Player
    } else if chaser == step {
        StepKind::Chaser
    } else if step < chaser {
        StepKind::CaughtZone
    } else if in_setup {
        StepKind::Open
    } else if player > step {
        StepKind::Passed
    } else if chaser > step {
        StepKind::ChaserPassed
    } else {
        StepKind::Open
    }
}

pub fn controls(snapshot: &GameSnapshot) -> Controls {
    let phase = snapshot.phase;
    let playing = phase.is_playing();
    Controls {
        can_start: phase == Phase::Setup && snapshot.ready,
        can_player_answer: phase == Phase::AwaitingPlayerAnswer && snapshot.player_answer.is_none(),
        can_chaser_answer: phase == Phase::AwaitingChaserAnswer,
        can_show_answer: phase == Phase::Revealed && !snapshot.answer_shown,
        can_next_question: phase == Phase::Revealed && snapshot.answer_shown,
        can_player_no_answer: playing && snapshot.player_answer.is_none(),
        can_chaser_no_answer: playing && snapshot.chaser_answer.is_none(),
        can_move_tokens: playing,
    }
}
