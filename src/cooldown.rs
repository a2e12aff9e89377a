//! Mating cooldown tied to the simulation tick counter.
//!
//! Expiry is checked lazily when the owning cell ticks, so there are no
//! timers running outside the simulation loop.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatingCooldown {
    until: Option<u64>,
}

impl MatingCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cooldown ending at `current_tick + interval`.
    pub fn schedule(&mut self, current_tick: u64, interval: u64) {
        self.until = Some(current_tick.saturating_add(interval));
    }

    pub fn is_pending(&self) -> bool {
        self.until.is_some()
    }

    pub fn until(&self) -> Option<u64> {
        self.until
    }

    /// Clear the cooldown if it has run out. Returns true when it expired now.
    pub fn expire(&mut self, current_tick: u64) -> bool {
        match self.until {
            Some(until) if until <= current_tick => {
                self.until = None;
                true
            }
            _ => false,
        }
    }
}
