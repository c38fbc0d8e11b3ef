mod session;

pub use session::Session;

use crate::audio::{AudioService, BroadcastAudio, SilentAudio};
use crate::bank::{BankError, QuestionBank};
use crate::config::AppConfig;
use crate::protocol::ServerMessage;
use crate::screen::Lobby;
use crate::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub game_config: GameConfig,
    pub bank: Arc<RwLock<QuestionBank>>,
    pub lobby: Arc<RwLock<Lobby>>,
    /// The one live game, if any
    pub session: Arc<RwLock<Option<Session>>>,
    rng: Arc<Mutex<StdRng>>,
    pub audio: Arc<dyn AudioService>,
    /// Per-round countdown task; aborted whenever the round moves on
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Messages for every connected client
    pub broadcast: broadcast::Sender<ServerMessage>,
    /// State updates for the operator (correct answer included)
    pub host_broadcast: broadcast::Sender<ServerMessage>,
    /// State updates for display screens (correct answer withheld until shown)
    pub display_broadcast: broadcast::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(bank: QuestionBank, game_config: GameConfig) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        let (host_tx, _host_rx) = broadcast::channel(100);
        let (display_tx, _display_rx) = broadcast::channel(100);
        let audio: Arc<dyn AudioService> = Arc::new(BroadcastAudio::new(tx.clone()));

        Self {
            game_config,
            bank: Arc::new(RwLock::new(bank)),
            lobby: Arc::new(RwLock::new(Lobby::Menu)),
            session: Arc::new(RwLock::new(None)),
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
            audio,
            countdown: Arc::new(Mutex::new(None)),
            broadcast: tx,
            host_broadcast: host_tx,
            display_broadcast: display_tx,
        }
    }

    /// Build state from process config: load and validate the bank, seed the RNG
    pub fn from_config(config: &AppConfig) -> Result<Self, BankError> {
        let bank = match &config.questions_path {
            Some(path) => {
                tracing::info!("Loading questions from {}", path.display());
                QuestionBank::from_path(path)?
            }
            None => QuestionBank::bundled()?,
        };

        match bank.validate_all() {
            Ok(report) => tracing::info!(
                "Question bank ready: {} characters, {} questions",
                report.characters,
                report.questions
            ),
            Err(e) if config.strict_validation => {
                tracing::error!("Question bank failed validation: {}", e);
                return Err(e);
            }
            Err(e) => tracing::warn!("Question bank failed validation, continuing: {}", e),
        }

        let mut state = Self::new(bank, config.game.clone());
        if let Some(seed) = config.seed {
            state = state.with_seed(seed);
        }
        if !config.audio_enabled {
            tracing::info!("Audio cues disabled");
            state = state.with_audio(Arc::new(SilentAudio));
        }
        Ok(state)
    }

    /// Use a fixed seed for question selection
    pub fn with_seed(mut self, seed: u64) -> Self {
        tracing::info!("Using fixed RNG seed {}", seed);
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioService>) -> Self {
        self.audio = audio;
        self
    }

    /// Add a character to the bank at runtime
    pub async fn register_character(&self, character: Character) -> Result<(), BankError> {
        self.bank.write().await.register(character)
    }

    /// Abort the running countdown task, if any
    pub(crate) async fn stop_countdown(&self) {
        if let Some(handle) = self.countdown.lock().await.take() {
            handle.abort();
        }
    }

    pub(crate) async fn replace_countdown(&self, handle: JoinHandle<()>) {
        if let Some(old) = self.countdown.lock().await.replace(handle) {
            old.abort();
        }
    }
}
