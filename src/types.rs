use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque ID types
pub type CharacterId = String;
pub type QuestionId = u32;
pub type SessionId = String;

/// Board position. The player sits at -1 until a start step is chosen.
pub type Position = i32;

/// Default finish line distance (the top step of the board)
pub const DEFAULT_FINISH_LINE: Position = 9;

/// Steps the operator labels during setup; the player starts on one of them
pub const SETUP_STEPS: [Position; 3] = [3, 4, 5];

/// Player position before a start step has been chosen
pub const UNPLACED: Position = -1;

/// Chaser starting position
pub const CHASER_START: Position = 0;

/// Wire value for "did not answer in time"
pub const NO_ANSWER: i32 = -1;

pub const MIN_OPTIONS: usize = 3;
pub const MAX_OPTIONS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    pub fn is_correct(&self, answer: Option<Answer>) -> bool {
        matches!(answer, Some(Answer::Choice(i)) if i == self.correct_index)
    }
}

/// A chaser persona with its own question pool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub questions: Vec<Question>,
}

/// Character metadata without the question pool (safe to send to any screen)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterSummary {
    pub id: CharacterId,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub question_count: usize,
}

impl From<&Character> for CharacterSummary {
    fn from(c: &Character) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            emoji: c.emoji.clone(),
            description: c.description.clone(),
            question_count: c.questions.len(),
        }
    }
}

/// A recorded answer. Serialized as the option index, or -1 for no answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "i32", try_from = "i32")]
pub enum Answer {
    Choice(usize),
    NoAnswer,
}

impl From<Answer> for i32 {
    fn from(a: Answer) -> Self {
        match a {
            Answer::Choice(i) => i as i32,
            Answer::NoAnswer => NO_ANSWER,
        }
    }
}

impl TryFrom<i32> for Answer {
    type Error = String;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            NO_ANSWER => Ok(Answer::NoAnswer),
            i if i >= 0 => Ok(Answer::Choice(i as usize)),
            other => Err(format!("invalid answer value {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Setup,
    AwaitingPlayerAnswer,
    AwaitingChaserAnswer,
    Revealed,
    Won,
    Caught,
}

impl Phase {
    /// True for the sub-phases of an active round
    pub fn is_playing(&self) -> bool {
        matches!(
            self,
            Phase::AwaitingPlayerAnswer | Phase::AwaitingChaserAnswer | Phase::Revealed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Won | Phase::Caught)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Phase::Won => Some(Outcome::Won),
            Phase::Caught => Some(Outcome::Caught),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Caught,
}

impl Outcome {
    pub fn phase(&self) -> Phase {
        match self {
            Outcome::Won => Phase::Won,
            Outcome::Caught => Phase::Caught,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Game master running the session (all controls)
    Host,
    /// Read-only board display
    Display,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Display => write!(f, "display"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Seconds the player gets per question
    pub round_seconds: u32,
    /// Warning cues fire while remaining time is at or below this
    pub warning_seconds: u32,
    pub finish_line: Position,
    /// Master volume applied on top of each cue's own level
    pub volume: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_seconds: 10,
            warning_seconds: 3,
            finish_line: DEFAULT_FINISH_LINE,
            volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: 1,
            prompt: "2+2?".to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            correct_index: 1,
        }
    }

    #[test]
    fn test_answer_wire_format() {
        assert_eq!(serde_json::to_string(&Answer::Choice(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&Answer::NoAnswer).unwrap(), "-1");
        assert_eq!(
            serde_json::from_str::<Answer>("-1").unwrap(),
            Answer::NoAnswer
        );
        assert!(serde_json::from_str::<Answer>("-2").is_err());
    }

    #[test]
    fn test_is_correct() {
        let q = question();
        assert!(q.is_correct(Some(Answer::Choice(1))));
        assert!(!q.is_correct(Some(Answer::Choice(0))));
        assert!(!q.is_correct(Some(Answer::NoAnswer)));
        assert!(!q.is_correct(None));
    }

    #[test]
    fn test_phase_helpers() {
        assert!(Phase::Revealed.is_playing());
        assert!(!Phase::Setup.is_playing());
        assert!(Phase::Caught.is_terminal());
        assert_eq!(Phase::Won.outcome(), Some(Outcome::Won));
        assert_eq!(Outcome::Caught.phase(), Phase::Caught);
        assert_eq!(
            serde_json::to_string(&Phase::AwaitingPlayerAnswer).unwrap(),
            "\"AWAITING_PLAYER_ANSWER\""
        );
    }
}
