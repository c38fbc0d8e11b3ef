//! Process configuration from the environment (and `.env`, loaded in `main`).

use crate::types::{GameConfig, SETUP_STEPS};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 7331;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Question data on disk; the bundled set is used when unset
    pub questions_path: Option<PathBuf>,
    /// Refuse to start when the question data fails validation
    pub strict_validation: bool,
    pub game: GameConfig,
    /// Fixed RNG seed for reproducible question order
    pub seed: Option<u64>,
    pub audio_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            questions_path: None,
            strict_validation: true,
            game: GameConfig::default(),
            seed: None,
            audio_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load config from `CHASE_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_game = GameConfig::default();

        let mut game = GameConfig {
            round_seconds: env_parse("CHASE_ROUND_SECONDS", default_game.round_seconds),
            warning_seconds: env_parse("CHASE_WARNING_SECONDS", default_game.warning_seconds),
            finish_line: env_parse("CHASE_FINISH_LINE", default_game.finish_line),
            volume: env_parse("CHASE_VOLUME", default_game.volume),
        };

        if game.round_seconds == 0 {
            tracing::warn!(
                "CHASE_ROUND_SECONDS=0 would never time out a round, using {}",
                default_game.round_seconds
            );
            game.round_seconds = default_game.round_seconds;
        }

        // The setup steps must sit below the finish line
        let highest_setup_step = SETUP_STEPS.iter().copied().max().unwrap_or(0);
        if game.finish_line <= highest_setup_step {
            tracing::warn!(
                "CHASE_FINISH_LINE={} leaves no room above the setup steps, using {}",
                game.finish_line,
                default_game.finish_line
            );
            game.finish_line = default_game.finish_line;
        }
        if !(0.0..=1.0).contains(&game.volume) {
            tracing::warn!("CHASE_VOLUME={} out of range, clamping to 0..1", game.volume);
            game.volume = game.volume.clamp(0.0, 1.0);
        }

        let config = Self {
            bind: env_parse("CHASE_BIND", defaults.bind),
            port: env_parse("CHASE_PORT", defaults.port),
            questions_path: std::env::var("CHASE_QUESTIONS_PATH")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            strict_validation: env_flag("CHASE_STRICT_VALIDATION", defaults.strict_validation),
            game,
            seed: std::env::var("CHASE_SEED")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            audio_enabled: env_flag("CHASE_AUDIO", defaults.audio_enabled),
        };

        tracing::info!(
            port = config.port,
            round_seconds = config.game.round_seconds,
            finish_line = config.game.finish_line,
            strict_validation = config.strict_validation,
            audio_enabled = config.audio_enabled,
            seeded = config.seed.is_some(),
            "Chase config loaded"
        );

        config
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// "0" and "false" switch a flag off, anything else switches it on
fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 10] = [
        "CHASE_BIND",
        "CHASE_PORT",
        "CHASE_QUESTIONS_PATH",
        "CHASE_STRICT_VALIDATION",
        "CHASE_ROUND_SECONDS",
        "CHASE_WARNING_SECONDS",
        "CHASE_FINISH_LINE",
        "CHASE_SEED",
        "CHASE_VOLUME",
        "CHASE_AUDIO",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.strict_validation);
        assert!(config.audio_enabled);
        assert!(config.questions_path.is_none());
        assert!(config.seed.is_none());
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("CHASE_PORT", "8080");
        std::env::set_var("CHASE_BIND", "127.0.0.1");
        std::env::set_var("CHASE_ROUND_SECONDS", "30");
        std::env::set_var("CHASE_SEED", "42");
        std::env::set_var("CHASE_STRICT_VALIDATION", "false");
        std::env::set_var("CHASE_AUDIO", "0");
        std::env::set_var("CHASE_QUESTIONS_PATH", "/tmp/questions.json");

        let config = AppConfig::from_env();
        assert_eq!(config.addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.game.round_seconds, 30);
        assert_eq!(config.seed, Some(42));
        assert!(!config.strict_validation);
        assert!(!config.audio_enabled);
        assert_eq!(
            config.questions_path,
            Some(PathBuf::from("/tmp/questions.json"))
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("CHASE_PORT", "not-a-port");
        std::env::set_var("CHASE_FINISH_LINE", "4");
        std::env::set_var("CHASE_VOLUME", "7.5");
        std::env::set_var("CHASE_ROUND_SECONDS", "0");

        let config = AppConfig::from_env();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.game.round_seconds, 10);
        assert_eq!(config.game.finish_line, 9);
        assert_eq!(config.game.volume, 1.0);
        clear_env();
    }
}
