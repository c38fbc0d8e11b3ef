use super::AppState;
use crate::audio::AudioCue;
use crate::game::{ChaseGame, Event, GameError, GameSnapshot};
use crate::protocol::{ServerMessage, PROTOCOL_VERSION};
use crate::screen::{self, Lobby, Screen};
use crate::timer;
use crate::types::*;
use chrono::{DateTime, Utc};

/// One game against one character, from setup to result
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub game: ChaseGame,
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn is_finished(&self) -> bool {
        self.game.phase().is_terminal()
    }
}

impl AppState {
    /// Lobby: show the character list
    pub async fn open_player_select(&self) -> Result<(), GameError> {
        self.drop_finished_session().await?;
        *self.lobby.write().await = Lobby::PlayerSelect;
        self.broadcast_state().await;
        Ok(())
    }

    /// Leave whatever is on screen and return to the title menu
    pub async fn back_to_menu(&self) {
        self.end_game().await;
    }

    /// Start a new session against `character_id`, beginning in setup
    pub async fn select_character(&self, character_id: &str) -> Result<SessionId, GameError> {
        self.drop_finished_session().await?;

        let character = self
            .bank
            .read()
            .await
            .character(character_id)
            .cloned()
            .ok_or_else(|| GameError::UnknownCharacter(character_id.to_string()))?;

        let game = ChaseGame::new(character, self.game_config.clone())?;
        let session = Session {
            id: ulid::Ulid::new().to_string(),
            game,
            started_at: Utc::now(),
        };
        let id = session.id.clone();

        tracing::info!("Session {} created against {}", id, character_id);
        *self.session.write().await = Some(session);
        *self.lobby.write().await = Lobby::Menu;

        self.broadcast_state().await;
        Ok(id)
    }

    /// Feed one operator event into the live game
    pub async fn apply_event(&self, event: Event) -> Result<(), GameError> {
        let cues = {
            let mut session_guard = self.session.write().await;
            let session = session_guard.as_mut().ok_or(GameError::NoSession)?;

            let round_before = session.game.round_no();
            let cues = {
                let mut rng = self.rng.lock().await;
                session.game.apply(event, &mut *rng)?
            };

            let game = &session.game;
            if game.phase() != Phase::AwaitingPlayerAnswer || !game.timer_running() {
                self.stop_countdown().await;
            } else if game.round_no() != round_before {
                let handle = timer::spawn_countdown(self.clone(), session.id.clone(), game.round_no());
                self.replace_countdown(handle).await;
            }
            cues
        };

        self.play_cues(&cues);
        self.broadcast_state().await;
        Ok(())
    }

    /// One countdown second for the given round.
    ///
    /// Returns false once the countdown has nothing left to do: the session
    /// or round is no longer current, or the timer stopped.
    pub async fn tick(&self, session_id: &str, round_no: u32) -> bool {
        let cues = {
            let mut session_guard = self.session.write().await;
            let Some(session) = session_guard.as_mut() else {
                return false;
            };
            if session.id != session_id
                || session.game.round_no() != round_no
                || session.game.phase() != Phase::AwaitingPlayerAnswer
            {
                tracing::debug!("Stale countdown for round {} ignored", round_no);
                return false;
            }

            let mut rng = self.rng.lock().await;
            match session.game.apply(Event::Tick, &mut *rng) {
                Ok(cues) => cues,
                Err(e) => {
                    tracing::error!("Countdown tick rejected: {}", e);
                    return false;
                }
            }
        };

        self.play_cues(&cues);
        self.broadcast_state().await;

        let session = self.session.read().await;
        session
            .as_ref()
            .map(|s| s.game.timer_running())
            .unwrap_or(false)
    }

    /// Tear down the session (if any) and go back to the menu
    pub async fn end_game(&self) {
        self.stop_countdown().await;
        if let Some(session) = self.session.write().await.take() {
            tracing::info!(
                "Session {} ended after {} rounds ({:?})",
                session.id,
                session.game.round_no(),
                session.game.phase()
            );
        }
        *self.lobby.write().await = Lobby::Menu;
        self.broadcast_state().await;
    }

    pub async fn session_id(&self) -> Option<SessionId> {
        self.session.read().await.as_ref().map(|s| s.id.clone())
    }

    /// Round state as seen by `role`. Only the operator sees the correct answer early.
    pub async fn snapshot(&self, role: &Role) -> Option<GameSnapshot> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.game.snapshot(*role == Role::Host))
    }

    pub async fn screen(&self, role: &Role) -> Screen {
        match self.snapshot(role).await {
            Some(snapshot) => screen::project(&snapshot),
            None => self.lobby_screen().await,
        }
    }

    async fn lobby_screen(&self) -> Screen {
        let lobby = *self.lobby.read().await;
        screen::lobby(lobby, &*self.bank.read().await)
    }

    pub async fn state_message(&self, role: &Role) -> ServerMessage {
        let (session_id, screen, game) = self.view(role).await;
        ServerMessage::State {
            session_id,
            screen,
            game,
        }
    }

    pub async fn welcome_message(&self, role: &Role) -> ServerMessage {
        let (session_id, screen, game) = self.view(role).await;
        ServerMessage::Welcome {
            protocol: PROTOCOL_VERSION.to_string(),
            role: role.clone(),
            server_now: Utc::now().to_rfc3339(),
            session_id,
            screen,
            game,
        }
    }

    /// Session id, screen and snapshot taken from one read of the session
    async fn view(&self, role: &Role) -> (Option<SessionId>, Screen, Option<GameSnapshot>) {
        let current = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| (s.id.clone(), s.game.snapshot(*role == Role::Host)));

        match current {
            Some((id, snapshot)) => (Some(id), screen::project(&snapshot), Some(snapshot)),
            None => (None, self.lobby_screen().await, None),
        }
    }

    /// Push the current state to operator and display screens
    pub async fn broadcast_state(&self) {
        // Ignore send errors (no receivers connected is fine)
        let _ = self
            .host_broadcast
            .send(self.state_message(&Role::Host).await);
        let _ = self
            .display_broadcast
            .send(self.state_message(&Role::Display).await);
    }

    fn play_cues(&self, cues: &[AudioCue]) {
        for &cue in cues {
            let volume = cue.default_volume() * self.game_config.volume;
            tracing::debug!("Playing {:?} cue at volume {:.2}", cue, volume);
            self.audio.play(
                cue,
                volume,
                Some(Box::new(move || tracing::trace!("{:?} cue finished", cue))),
            );
        }
    }

    /// A finished game may be replaced; a running one must be ended first
    async fn drop_finished_session(&self) -> Result<(), GameError> {
        let mut session = self.session.write().await;
        match session.as_ref() {
            Some(s) if !s.is_finished() => Err(GameError::SessionActive),
            Some(_) => {
                *session = None;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryAudio;
    use crate::bank::QuestionBank;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_state(round_seconds: u32) -> (AppState, Arc<MemoryAudio>) {
        let audio = Arc::new(MemoryAudio::new());
        let config = GameConfig {
            round_seconds,
            ..GameConfig::default()
        };
        let state = AppState::new(QuestionBank::bundled().unwrap(), config)
            .with_seed(7)
            .with_audio(audio.clone());
        (state, audio)
    }

    async fn start_game(state: &AppState, start: Position) {
        state.select_character("example").await.unwrap();
        for step in SETUP_STEPS {
            state
                .apply_event(Event::SetStepLabel {
                    step,
                    label: format!("Seat {}", step),
                })
                .await
                .unwrap();
        }
        state
            .apply_event(Event::ChooseStart { step: start })
            .await
            .unwrap();
        state.apply_event(Event::Start).await.unwrap();
    }

    async fn current_correct(state: &AppState) -> usize {
        state
            .session
            .read()
            .await
            .as_ref()
            .unwrap()
            .game
            .current_question()
            .unwrap()
            .correct_index
    }

    #[tokio::test]
    async fn test_select_unknown_character() {
        let (state, _) = test_state(10);
        assert_eq!(
            state.select_character("nobody").await,
            Err(GameError::UnknownCharacter("nobody".to_string()))
        );
        assert!(state.session_id().await.is_none());
    }

    #[tokio::test]
    async fn test_events_need_session() {
        let (state, _) = test_state(10);
        assert_eq!(
            state.apply_event(Event::Start).await,
            Err(GameError::NoSession)
        );
    }

    #[tokio::test]
    async fn test_session_active_blocks_new_session() {
        let (state, _) = test_state(10);
        state.select_character("example").await.unwrap();
        assert_eq!(
            state.select_character("kiwi").await,
            Err(GameError::SessionActive)
        );
        assert_eq!(
            state.open_player_select().await,
            Err(GameError::SessionActive)
        );

        state.end_game().await;
        assert!(state.select_character("kiwi").await.is_ok());
    }

    #[tokio::test]
    async fn test_state_message_matches_current_session() {
        let (state, _) = test_state(10);
        let first = state.select_character("example").await.unwrap();

        match state.state_message(&Role::Display).await {
            ServerMessage::State {
                session_id,
                screen,
                game,
            } => {
                assert_eq!(session_id.as_deref(), Some(first.as_str()));
                assert!(matches!(screen, Screen::Setup { ref character, .. } if character.id == "example"));
                assert_eq!(game.unwrap().character.id, "example");
            }
            other => panic!("Expected State, got {:?}", other),
        }

        state.end_game().await;
        let second = state.select_character("kiwi").await.unwrap();
        assert_ne!(first, second);

        match state.welcome_message(&Role::Host).await {
            ServerMessage::Welcome {
                session_id,
                screen,
                game,
                ..
            } => {
                assert_eq!(session_id.as_deref(), Some(second.as_str()));
                assert!(matches!(screen, Screen::Setup { ref character, .. } if character.id == "kiwi"));
                assert_eq!(game.unwrap().character.id, "kiwi");
            }
            other => panic!("Expected Welcome, got {:?}", other),
        }

        state.end_game().await;
        match state.state_message(&Role::Display).await {
            ServerMessage::State {
                session_id,
                screen,
                game,
            } => {
                assert!(session_id.is_none());
                assert!(game.is_none());
                assert!(matches!(screen, Screen::Menu { .. }));
            }
            other => panic!("Expected State, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_display_snapshot_withholds_answer() {
        let (state, _) = test_state(10);
        start_game(&state, 4).await;

        let host = state.snapshot(&Role::Host).await.unwrap();
        let display = state.snapshot(&Role::Display).await.unwrap();
        assert!(host.question.unwrap().correct_index.is_some());
        assert!(display.question.unwrap().correct_index.is_none());
    }

    #[tokio::test]
    async fn test_broadcasts_state_per_role() {
        let (state, _) = test_state(10);
        let mut host_rx = state.host_broadcast.subscribe();
        let mut display_rx = state.display_broadcast.subscribe();

        state.open_player_select().await.unwrap();

        match host_rx.recv().await.unwrap() {
            ServerMessage::State { screen, game, .. } => {
                assert!(matches!(screen, Screen::PlayerSelect { .. }));
                assert!(game.is_none());
            }
            other => panic!("Expected State, got {:?}", other),
        }
        assert!(matches!(
            display_rx.recv().await.unwrap(),
            ServerMessage::State { .. }
        ));
    }

    #[tokio::test]
    async fn test_win_plays_victory_cue() {
        let (state, audio) = test_state(10);
        start_game(&state, 5).await;

        for round in 0..4 {
            let correct = current_correct(&state).await;
            state
                .apply_event(Event::PlayerAnswer { index: correct })
                .await
                .unwrap();
            state.apply_event(Event::ChaserNoAnswer).await.unwrap();
            state.apply_event(Event::ShowAnswer).await.unwrap();
            if round < 3 {
                state.apply_event(Event::NextQuestion).await.unwrap();
            }
        }

        let snapshot = state.snapshot(&Role::Display).await.unwrap();
        assert_eq!(snapshot.outcome, Some(Outcome::Won));
        assert_eq!(audio.cues(), vec![AudioCue::Victory]);
        assert!(matches!(
            state.screen(&Role::Display).await,
            Screen::Result { .. }
        ));

        // A finished game can be replaced without ending it first
        state.open_player_select().await.unwrap();
        assert!(state.session_id().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_tick_is_ignored() {
        let (state, _) = test_state(10);
        start_game(&state, 4).await;
        let id = state.session_id().await.unwrap();

        assert!(!state.tick("some-other-session", 1).await);
        assert!(!state.tick(&id, 2).await);
        let snapshot = state.snapshot(&Role::Host).await.unwrap();
        assert_eq!(snapshot.time_remaining, 10);

        assert!(state.tick(&id, 1).await);
        let snapshot = state.snapshot(&Role::Host).await.unwrap();
        assert_eq!(snapshot.time_remaining, 9);
    }

    #[tokio::test]
    async fn test_ticks_until_expiry() {
        let (state, audio) = test_state(4);
        start_game(&state, 4).await;
        state.stop_countdown().await;
        let id = state.session_id().await.unwrap();

        assert!(state.tick(&id, 1).await); // 3, warning
        assert!(state.tick(&id, 1).await); // 2
        assert!(state.tick(&id, 1).await); // 1
        assert!(!state.tick(&id, 1).await); // expired

        let snapshot = state.snapshot(&Role::Host).await.unwrap();
        assert_eq!(snapshot.player_answer, Some(Answer::NoAnswer));
        assert_eq!(snapshot.phase, Phase::AwaitingChaserAnswer);
        assert_eq!(
            audio.cues(),
            vec![
                AudioCue::Warning,
                AudioCue::Warning,
                AudioCue::Warning,
                AudioCue::Expired
            ]
        );

        // No further effect once the player's turn is over
        assert!(!state.tick(&id, 1).await);
    }

    #[tokio::test]
    async fn test_countdown_task_runs_out_the_clock() {
        let (state, audio) = test_state(1);
        start_game(&state, 4).await;

        tokio::time::sleep(Duration::from_millis(1500)).await;

        let snapshot = state.snapshot(&Role::Host).await.unwrap();
        assert_eq!(snapshot.player_answer, Some(Answer::NoAnswer));
        assert_eq!(snapshot.phase, Phase::AwaitingChaserAnswer);
        assert_eq!(audio.cues(), vec![AudioCue::Expired]);
    }

    #[tokio::test]
    async fn test_end_game_stops_countdown() {
        let (state, audio) = test_state(1);
        start_game(&state, 4).await;
        state.end_game().await;

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(state.session_id().await.is_none());
        assert!(audio.cues().is_empty());
        assert!(matches!(state.screen(&Role::Host).await, Screen::Menu { .. }));
    }
}
