//! Simulation clock.
//!
//! The tick counter itself lives on [`WorldState`] so that commands can
//! stamp records with it. The clock is the only writer: it seats the world
//! at the configured start tick and advances it one tick at a time with
//! checked arithmetic.

use bastion_world::WorldState;

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Drives the world's tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldClock {
    start_tick: u64,
}

impl WorldClock {
    /// Create a clock that starts at `start_tick`.
    pub const fn new(start_tick: u64) -> Self {
        Self { start_tick }
    }

    /// Create a clock from the `time` configuration section.
    pub const fn from_config(config: &TimeConfig) -> Self {
        Self::new(config.start_tick)
    }

    /// The configured first tick.
    pub const fn start_tick(&self) -> u64 {
        self.start_tick
    }

    /// Move a world that is behind the start tick forward to it. A world
    /// already past the start tick keeps its time.
    pub const fn seat(&self, state: &mut WorldState) {
        if state.current_time < self.start_tick {
            state.current_time = self.start_tick;
        }
    }

    /// Ticks run since the start tick.
    pub const fn elapsed(&self, state: &WorldState) -> u64 {
        state.current_time.saturating_sub(self.start_tick)
    }

    /// Advance the world by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn tick(&self, state: &mut WorldState) -> Result<u64, ClockError> {
        let next = state
            .current_time
            .checked_add(1)
            .ok_or(ClockError::TickOverflow)?;
        state.current_time = next;
        Ok(next)
    }
}
