//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure that can stop the engine between
//! reading the config file and logging the run summary.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: bastion_core::ConfigError,
    },

    /// The starting world could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: bastion_world::WorldError,
    },

    /// The simulation run stopped.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: bastion_core::SimulationError,
    },
}
