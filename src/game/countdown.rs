//! Per-round countdown. Pure state; the one-second cadence lives in `crate::timer`.

use serde::Serialize;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown not running, nothing changed
    Idle,
    Running { remaining: u32 },
    /// Remaining time is inside the warning window
    Warning { remaining: u32 },
    /// Reached zero and stopped itself
    Expired,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    warning_at: u32,
    running: bool,
}

impl Countdown {
    /// A zero budget is raised to one second so every round can expire
    pub fn new(budget: u32, warning_at: u32) -> Self {
        let budget = budget.max(1);
        Self {
            budget,
            remaining: budget,
            warning_at,
            running: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Refill to the full budget and start counting
    pub fn restart(&mut self) {
        self.remaining = self.budget;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else if self.remaining <= self.warning_at {
            TickOutcome::Warning {
                remaining: self.remaining,
            }
        } else {
            TickOutcome::Running {
                remaining: self.remaining,
            }
        }
    }
}
