//! Round sequencer for a single chase.
//!
//! [`ChaseGame`] owns all round state and changes only through
//! [`ChaseGame::apply`], which takes one [`Event`] and returns the audio cues
//! the transition produced. Events are validated before anything is mutated,
//! so a rejected event leaves the game exactly as it was.

pub mod countdown;
pub mod picker;
pub mod setup;

use crate::audio::AudioCue;
use crate::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use countdown::{Countdown, TickOutcome};
pub use picker::QuestionPicker;

/// Errors for rejected game commands
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Unknown character: {0}")]
    UnknownCharacter(CharacterId),

    #[error("Character {0} has no questions")]
    NoQuestions(CharacterId),

    #[error("No game in progress")]
    NoSession,

    #[error("A game is already in progress")]
    SessionActive,

    #[error("Cannot {action} during {phase:?}")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error("Step {0} cannot be used here")]
    InvalidStep(Position),

    #[error("Option {index} does not exist (question has {options} options)")]
    InvalidOption { index: usize, options: usize },

    #[error("The {0} answer has already been recorded")]
    AnswerRecorded(&'static str),

    #[error("Label all three setup steps and choose a starting position first")]
    NotReady,

    #[error("The game is over ({0:?})")]
    GameOver(Outcome),
}

impl GameError {
    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            GameError::UnknownCharacter(_) => "UNKNOWN_CHARACTER",
            GameError::NoQuestions(_) => "NO_QUESTIONS",
            GameError::NoSession => "NO_SESSION",
            GameError::SessionActive => "SESSION_ACTIVE",
            GameError::InvalidPhase { .. } => "INVALID_PHASE",
            GameError::InvalidStep(_) => "INVALID_STEP",
            GameError::InvalidOption { .. } => "INVALID_OPTION",
            GameError::AnswerRecorded(_) => "ANSWER_RECORDED",
            GameError::NotReady => "NOT_READY",
            GameError::GameOver(_) => "GAME_OVER",
        }
    }
}

/// Everything that can happen to a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    SetStepLabel { step: Position, label: String },
    ChooseStart { step: Position },
    Start,
    PlayerAnswer { index: usize },
    ChaserAnswer { index: usize },
    PlayerNoAnswer,
    ChaserNoAnswer,
    Tick,
    ShowAnswer,
    NextQuestion,
    AdvancePlayer,
    RetreatPlayer,
    AdvanceChaser,
    RetreatChaser,
}

/// Running tally across the rounds of one game
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameStats {
    pub questions_asked: u32,
    pub player_correct: u32,
    pub chaser_correct: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl GameStats {
    fn record(&mut self, player_correct: bool, chaser_correct: bool) {
        self.questions_asked += 1;
        if player_correct {
            self.player_correct += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
        if chaser_correct {
            self.chaser_correct += 1;
        }
    }
}

/// Question as shown on screen. `correct_index` is withheld until revealed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: Option<usize>,
}

/// Read-only copy of the round state for presentation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub character: CharacterSummary,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
    pub round_no: u32,
    pub player_position: Position,
    pub chaser_position: Position,
    pub finish_line: Position,
    pub player_name: String,
    pub step_labels: BTreeMap<Position, String>,
    pub start_step: Option<Position>,
    pub ready: bool,
    pub question: Option<QuestionView>,
    pub time_remaining: u32,
    pub timer_running: bool,
    pub player_answer: Option<Answer>,
    pub chaser_answer: Option<Answer>,
    pub answer_shown: bool,
    pub stats: GameStats,
}

/// Outcome implied by a pair of positions, if any
pub fn determine_outcome(
    player: Position,
    chaser: Position,
    finish_line: Position,
) -> Option<Outcome> {
    if player >= finish_line {
        Some(Outcome::Won)
    } else if chaser >= player {
        Some(Outcome::Caught)
    } else {
        None
    }
}

/// How far the player is ahead of the chaser (negative when behind)
pub fn distance(player: Position, chaser: Position) -> Position {
    player - chaser
}

pub fn steps_remaining(player: Position, finish_line: Position) -> Position {
    (finish_line - player).max(0)
}

#[derive(Debug, Clone)]
pub struct ChaseGame {
    character: Character,
    config: GameConfig,
    phase: Phase,
    player_position: Position,
    chaser_position: Position,
    step_labels: BTreeMap<Position, String>,
    start_step: Option<Position>,
    current_question: Option<Question>,
    picker: QuestionPicker,
    countdown: Countdown,
    player_answer: Option<Answer>,
    chaser_answer: Option<Answer>,
    answer_shown: bool,
    round_no: u32,
    stats: GameStats,
}

impl ChaseGame {
    /// Set up a new game against `character`. Fails for an empty question pool.
    pub fn new(character: Character, config: GameConfig) -> Result<Self, GameError> {
        if character.questions.is_empty() {
            tracing::error!("Character {} has no questions", character.id);
            return Err(GameError::NoQuestions(character.id));
        }

        let countdown = Countdown::new(config.round_seconds, config.warning_seconds);
        Ok(Self {
            character,
            config,
            phase: Phase::Setup,
            player_position: UNPLACED,
            chaser_position: CHASER_START,
            step_labels: BTreeMap::new(),
            start_step: None,
            current_question: None,
            picker: QuestionPicker::new(),
            countdown,
            player_answer: None,
            chaser_answer: None,
            answer_shown: false,
            round_no: 0,
            stats: GameStats::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player_position(&self) -> Position {
        self.player_position
    }

    pub fn chaser_position(&self) -> Position {
        self.chaser_position
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn player_answer(&self) -> Option<Answer> {
        self.player_answer
    }

    pub fn chaser_answer(&self) -> Option<Answer> {
        self.chaser_answer
    }

    pub fn answer_shown(&self) -> bool {
        self.answer_shown
    }

    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn timer_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn round_no(&self) -> u32 {
        self.round_no
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn picker(&self) -> &QuestionPicker {
        &self.picker
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.phase.outcome()
    }

    pub fn step_labels(&self) -> &BTreeMap<Position, String> {
        &self.step_labels
    }

    pub fn is_ready(&self) -> bool {
        setup::ready(&self.step_labels, self.start_step.is_some())
    }

    /// Label of the chosen start step, or the step number when unlabeled
    pub fn player_name(&self) -> String {
        match self.start_step {
            Some(step) => self
                .step_labels
                .get(&step)
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| step.to_string()),
            None => String::new(),
        }
    }

    /// Apply one event. Returns the audio cues the transition produced.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        event: Event,
        rng: &mut R,
    ) -> Result<Vec<AudioCue>, GameError> {
        match event {
            Event::SetStepLabel { step, label } => self.set_step_label(step, label),
            Event::ChooseStart { step } => self.choose_start(step),
            Event::Start => self.start(rng),
            Event::PlayerAnswer { index } => self.player_answers(index),
            Event::ChaserAnswer { index } => self.chaser_answers(index),
            Event::PlayerNoAnswer => self.player_no_answer(),
            Event::ChaserNoAnswer => self.chaser_no_answer(),
            Event::Tick => Ok(self.tick()),
            Event::ShowAnswer => self.show_answer(),
            Event::NextQuestion => self.next_question(rng),
            Event::AdvancePlayer => self.advance_player(),
            Event::RetreatPlayer => self.retreat_player(),
            Event::AdvanceChaser => self.advance_chaser(),
            Event::RetreatChaser => self.retreat_chaser(),
        }
    }

    pub fn snapshot(&self, reveal_correct: bool) -> GameSnapshot {
        let show_correct = reveal_correct || self.answer_shown;
        GameSnapshot {
            character: CharacterSummary::from(&self.character),
            phase: self.phase,
            outcome: self.outcome(),
            round_no: self.round_no,
            player_position: self.player_position,
            chaser_position: self.chaser_position,
            finish_line: self.config.finish_line,
            player_name: self.player_name(),
            step_labels: self.step_labels.clone(),
            start_step: self.start_step,
            ready: self.is_ready(),
            question: self.current_question.as_ref().map(|q| QuestionView {
                id: q.id,
                prompt: q.prompt.clone(),
                options: q.options.clone(),
                correct_index: show_correct.then_some(q.correct_index),
            }),
            time_remaining: self.countdown.remaining(),
            timer_running: self.countdown.is_running(),
            player_answer: self.player_answer,
            chaser_answer: self.chaser_answer,
            answer_shown: self.answer_shown,
            stats: self.stats.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    fn require_setup(&self, action: &'static str) -> Result<(), GameError> {
        match self.phase {
            Phase::Setup => Ok(()),
            phase => Err(self.phase_error(action, phase)),
        }
    }

    fn require_playing(&self, action: &'static str) -> Result<(), GameError> {
        if self.phase.is_playing() {
            Ok(())
        } else {
            Err(self.phase_error(action, self.phase))
        }
    }

    fn phase_error(&self, action: &'static str, phase: Phase) -> GameError {
        match phase.outcome() {
            Some(outcome) => GameError::GameOver(outcome),
            None => GameError::InvalidPhase { action, phase },
        }
    }

    fn validate_option(&self, index: usize) -> Result<(), GameError> {
        let options = self
            .current_question
            .as_ref()
            .map(|q| q.options.len())
            .unwrap_or(0);
        if index < options {
            Ok(())
        } else {
            Err(GameError::InvalidOption { index, options })
        }
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    fn set_step_label(&mut self, step: Position, label: String) -> Result<Vec<AudioCue>, GameError> {
        self.require_setup("relabel steps")?;
        if !(0..=self.config.finish_line).contains(&step) {
            return Err(GameError::InvalidStep(step));
        }
        self.step_labels.insert(step, label.trim().to_string());
        Ok(vec![])
    }

    fn choose_start(&mut self, step: Position) -> Result<Vec<AudioCue>, GameError> {
        self.require_setup("choose a starting position")?;
        if !setup::is_setup_step(step) || step >= self.config.finish_line {
            return Err(GameError::InvalidStep(step));
        }
        self.player_position = step;
        self.start_step = Some(step);
        Ok(vec![])
    }

    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<AudioCue>, GameError> {
        self.require_setup("start the game")?;
        if !self.is_ready() {
            return Err(GameError::NotReady);
        }
        tracing::info!(
            "Starting chase against {} from step {}",
            self.character.id,
            self.player_position
        );
        self.begin_round(rng)?;
        Ok(vec![])
    }

    // ------------------------------------------------------------------
    // Rounds
    // ------------------------------------------------------------------

    fn begin_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let question = self
            .picker
            .draw(&self.character.questions, rng)
            .cloned()
            .ok_or_else(|| GameError::NoQuestions(self.character.id.clone()))?;

        self.round_no += 1;
        tracing::debug!("Round {}: question {}", self.round_no, question.id);
        self.current_question = Some(question);
        self.player_answer = None;
        self.chaser_answer = None;
        self.answer_shown = false;
        self.countdown.restart();
        self.phase = Phase::AwaitingPlayerAnswer;
        Ok(())
    }

    /// Derive the sub-phase from which answer slots are filled
    fn sync_answer_phase(&mut self) {
        self.phase = match (self.player_answer, self.chaser_answer) {
            (None, _) => Phase::AwaitingPlayerAnswer,
            (Some(_), None) => Phase::AwaitingChaserAnswer,
            (Some(_), Some(_)) => Phase::Revealed,
        };
    }

    fn record_player(&mut self, answer: Answer) {
        self.player_answer = Some(answer);
        self.countdown.stop();
        self.sync_answer_phase();
    }

    fn player_answers(&mut self, index: usize) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("record the player's answer")?;
        if self.player_answer.is_some() {
            return Err(GameError::AnswerRecorded("player"));
        }
        self.validate_option(index)?;
        self.record_player(Answer::Choice(index));
        Ok(vec![])
    }

    fn chaser_answers(&mut self, index: usize) -> Result<Vec<AudioCue>, GameError> {
        if self.phase != Phase::AwaitingChaserAnswer {
            return Err(self.phase_error("record the chaser's answer", self.phase));
        }
        self.validate_option(index)?;
        self.chaser_answer = Some(Answer::Choice(index));
        self.sync_answer_phase();
        Ok(vec![])
    }

    fn player_no_answer(&mut self) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("skip the player's answer")?;
        if self.player_answer.is_some() {
            return Err(GameError::AnswerRecorded("player"));
        }
        self.record_player(Answer::NoAnswer);
        Ok(vec![])
    }

    fn chaser_no_answer(&mut self) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("skip the chaser's answer")?;
        if self.chaser_answer.is_some() {
            return Err(GameError::AnswerRecorded("chaser"));
        }
        self.chaser_answer = Some(Answer::NoAnswer);
        self.sync_answer_phase();
        Ok(vec![])
    }

    /// One second of countdown. A no-op outside AwaitingPlayerAnswer.
    fn tick(&mut self) -> Vec<AudioCue> {
        if self.phase != Phase::AwaitingPlayerAnswer {
            self.countdown.stop();
            return vec![];
        }

        match self.countdown.tick() {
            TickOutcome::Idle | TickOutcome::Running { .. } => vec![],
            TickOutcome::Warning { remaining } => {
                tracing::debug!("{} seconds left", remaining);
                vec![AudioCue::Warning]
            }
            TickOutcome::Expired => {
                tracing::info!("Time expired in round {}", self.round_no);
                self.record_player(Answer::NoAnswer);
                vec![AudioCue::Expired]
            }
        }
    }

    fn show_answer(&mut self) -> Result<Vec<AudioCue>, GameError> {
        if self.phase != Phase::Revealed {
            return Err(self.phase_error("show the answer", self.phase));
        }
        if self.answer_shown {
            return Err(GameError::InvalidPhase {
                action: "show the answer twice",
                phase: self.phase,
            });
        }
        let Some(question) = self.current_question.as_ref() else {
            return Err(GameError::InvalidPhase {
                action: "show the answer without a question",
                phase: self.phase,
            });
        };

        let player_correct = question.is_correct(self.player_answer);
        let chaser_correct = question.is_correct(self.chaser_answer);
        self.answer_shown = true;
        self.stats.record(player_correct, chaser_correct);

        let mut outcome = None;

        if player_correct {
            self.player_position += 1;
            if self.player_position >= self.config.finish_line {
                outcome = Some(Outcome::Won);
            }
        }

        // Compared against the player's position after this reveal's advance
        if chaser_correct {
            self.chaser_position += 1;
            if outcome.is_none() && self.chaser_position >= self.player_position {
                outcome = Some(Outcome::Caught);
            }
        }

        tracing::info!(
            "Round {} revealed: player {} ({}), chaser {} ({})",
            self.round_no,
            self.player_position,
            if player_correct { "correct" } else { "wrong" },
            self.chaser_position,
            if chaser_correct { "correct" } else { "wrong" },
        );

        Ok(outcome.map(|o| self.finish(o)).into_iter().collect())
    }

    fn next_question<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<AudioCue>, GameError> {
        if self.phase != Phase::Revealed || !self.answer_shown {
            return Err(self.phase_error("move to the next question", self.phase));
        }
        self.begin_round(rng)?;
        Ok(vec![])
    }

    fn finish(&mut self, outcome: Outcome) -> AudioCue {
        tracing::info!(
            "Game over: {:?} (player {}, chaser {})",
            outcome,
            self.player_position,
            self.chaser_position
        );
        self.phase = outcome.phase();
        self.countdown.stop();
        match outcome {
            Outcome::Won => AudioCue::Victory,
            Outcome::Caught => AudioCue::Defeat,
        }
    }

    // ------------------------------------------------------------------
    // Manual overrides
    // ------------------------------------------------------------------

    fn advance_player(&mut self) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("advance the player")?;
        self.player_position += 1;
        Ok(match determine_outcome(self.player_position, self.chaser_position, self.config.finish_line) {
            Some(Outcome::Won) => vec![self.finish(Outcome::Won)],
            _ => vec![],
        })
    }

    fn retreat_player(&mut self) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("move the player back")?;
        self.player_position = (self.player_position - 1).max(0);
        Ok(vec![])
    }

    fn advance_chaser(&mut self) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("advance the chaser")?;
        self.chaser_position += 1;
        Ok(match determine_outcome(self.player_position, self.chaser_position, self.config.finish_line) {
            Some(Outcome::Caught) => vec![self.finish(Outcome::Caught)],
            _ => vec![],
        })
    }

    fn retreat_chaser(&mut self) -> Result<Vec<AudioCue>, GameError> {
        self.require_playing("move the chaser back")?;
        self.chaser_position = (self.chaser_position - 1).max(0);
        Ok(vec![])
    }
}
