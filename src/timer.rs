use crate::state::AppState;
use crate::types::SessionId;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the one-second countdown for a single round.
///
/// The task exits by itself once the round's timer stops or the round is no
/// longer current. Callers keep the handle and abort it when the round moves on.
pub fn spawn_countdown(state: AppState, session_id: SessionId, round_no: u32) -> JoinHandle<()> {
    tracing::debug!("Countdown started for round {}", round_no);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if !state.tick(&session_id, round_no).await {
                break;
            }
        }

        tracing::debug!("Countdown finished for round {}", round_no);
    })
}
