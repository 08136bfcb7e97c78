//! Error types for the `bastion-core` crate.
//!
//! Rejected commands are not errors here: [`Simulation::submit`] returns
//! them as kernel failures and the run continues. [`SimulationError`] is
//! reserved for conditions that stop a run.
//!
//! [`Simulation::submit`]: crate::simulation::Simulation::submit

use bastion_world::WorldError;

use crate::clock::ClockError;
use crate::config::ConfigError;
use crate::decision::CommandSourceError;
use crate::tick::TickError;

/// Errors that stop a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Configuration could not be loaded.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The world could not be built or was found inconsistent.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A tick hook failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// The command source failed outright.
    #[error("command source error: {source}")]
    Source {
        /// The underlying source error.
        #[from]
        source: CommandSourceError,
    },
}
