//! Audio cues and the services that play them.
//!
//! The server never makes sound itself. [`BroadcastAudio`] ships each cue's note
//! table to connected screens, which synthesize it locally. Playback is
//! fire-and-forget: every implementation swallows failures and still runs the
//! completion callback, so game flow never waits on audio.

use crate::protocol::ServerMessage;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

/// Callback run once a cue has finished (or failed) playing
pub type Completion = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    /// Low-time beep, once per tick inside the warning window
    Warning,
    /// Alarm when the countdown runs out
    Expired,
    /// Fanfare for an escaped player
    Victory,
    /// Womp-womp for a caught player
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// One oscillator voice of a stinger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Start offset from the beginning of the cue
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub frequency: f32,
    /// Slide target; the pitch ramps here over the note's duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_frequency: Option<f32>,
    pub waveform: Waveform,
    /// Relative gain, multiplied by the cue volume on playback
    pub gain: f32,
}

impl Note {
    fn tone(offset_ms: u64, duration_ms: u64, frequency: f32, waveform: Waveform, gain: f32) -> Self {
        Self {
            offset_ms,
            duration_ms,
            frequency,
            end_frequency: None,
            waveform,
            gain,
        }
    }

    fn end_ms(&self) -> u64 {
        self.offset_ms + self.duration_ms
    }
}

/// Fanfare melody: C5 E5 G5 C6 G5 C6 E6 G6, with note lengths in ms
const FANFARE: [(f32, u64); 8] = [
    (523.25, 150),
    (659.25, 150),
    (783.99, 150),
    (1046.50, 250),
    (783.99, 150),
    (1046.50, 150),
    (1318.51, 400),
    (1567.98, 600),
];

/// Womp-womp slides: (from Hz, to Hz, ms)
const WOMPS: [(f32, f32, u64); 2] = [(330.0, 220.0, 400), (247.0, 165.0, 500)];

impl AudioCue {
    /// Volume used when the caller does not override it
    pub fn default_volume(&self) -> f32 {
        match self {
            AudioCue::Warning => 0.1,
            AudioCue::Expired => 0.3,
            AudioCue::Victory => 0.1,
            AudioCue::Defeat => 0.3,
        }
    }

    pub fn notes(&self) -> Vec<Note> {
        match self {
            AudioCue::Warning => vec![Note::tone(0, 100, 400.0, Waveform::Sine, 1.0)],
            AudioCue::Expired => (0..6u64)
                .flat_map(|i| {
                    [
                        Note::tone(i * 200, 150, 800.0, Waveform::Square, 1.0),
                        Note::tone(i * 200 + 100, 150, 600.0, Waveform::Square, 1.0),
                    ]
                })
                .collect(),
            AudioCue::Victory => {
                let mut offset = 0;
                FANFARE
                    .iter()
                    .enumerate()
                    .map(|(i, &(frequency, duration_ms))| {
                        // Slight crescendo through the melody
                        let note = Note::tone(
                            offset,
                            duration_ms,
                            frequency,
                            Waveform::Triangle,
                            1.0 + i as f32 * 0.5,
                        );
                        offset += duration_ms * 350 / 1000;
                        note
                    })
                    .collect()
            }
            AudioCue::Defeat => {
                let mut offset = 0;
                WOMPS
                    .iter()
                    .map(|&(from, to, duration_ms)| {
                        let note = Note {
                            end_frequency: Some(to),
                            ..Note::tone(offset, duration_ms, from, Waveform::Triangle, 1.0)
                        };
                        offset += duration_ms + 100;
                        note
                    })
                    .collect()
            }
        }
    }

    /// Time until the cue counts as finished
    pub fn duration(&self) -> Duration {
        let end = self.notes().iter().map(Note::end_ms).max().unwrap_or(0);
        let tail = match self {
            AudioCue::Victory => 100,
            AudioCue::Defeat => 200,
            _ => 0,
        };
        Duration::from_millis(end + tail)
    }
}

/// Wire form of a cue sent to screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuePayload {
    pub cue: AudioCue,
    pub volume: f32,
    pub duration_ms: u64,
    pub notes: Vec<Note>,
}

impl CuePayload {
    pub fn new(cue: AudioCue, volume: f32) -> Self {
        Self {
            cue,
            volume: volume.clamp(0.0, 1.0),
            duration_ms: cue.duration().as_millis() as u64,
            notes: cue.notes(),
        }
    }
}

pub trait AudioService: Send + Sync {
    /// Start playing a cue. Must not block and must always run `on_complete`.
    fn play(&self, cue: AudioCue, volume: f32, on_complete: Option<Completion>);
}

/// Sends cues to every connected screen over the broadcast channel
pub struct BroadcastAudio {
    tx: broadcast::Sender<ServerMessage>,
}

impl BroadcastAudio {
    pub fn new(tx: broadcast::Sender<ServerMessage>) -> Self {
        Self { tx }
    }
}

impl AudioService for BroadcastAudio {
    fn play(&self, cue: AudioCue, volume: f32, on_complete: Option<Completion>) {
        let payload = CuePayload::new(cue, volume);
        let duration = Duration::from_millis(payload.duration_ms);

        if self.tx.send(ServerMessage::PlayCue { cue: payload }).is_err() {
            tracing::debug!("No screens connected, {:?} cue not played", cue);
        }

        let Some(done) = on_complete else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    done();
                });
            }
            Err(_) => done(),
        }
    }
}

/// Audio disabled. Completes immediately.
pub struct SilentAudio;

impl AudioService for SilentAudio {
    fn play(&self, cue: AudioCue, _volume: f32, on_complete: Option<Completion>) {
        tracing::trace!("Audio disabled, skipping {:?}", cue);
        if let Some(done) = on_complete {
            done();
        }
    }
}

/// Records every cue it is asked to play
#[derive(Default)]
pub struct MemoryAudio {
    played: Mutex<Vec<(AudioCue, f32)>>,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(cue, _)| *cue)
            .collect()
    }

    pub fn played(&self) -> Vec<(AudioCue, f32)> {
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AudioService for MemoryAudio {
    fn play(&self, cue: AudioCue, volume: f32, on_complete: Option<Completion>) {
        self.played
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((cue, volume));
        if let Some(done) = on_complete {
            done();
        }
    }
}
