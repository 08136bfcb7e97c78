//! Configuration, clock, and the simulation driver for Bastion.
//!
//! This crate wraps the command kernel in a single-writer loop: commands
//! come in one at a time from a [`CommandSource`], run through the kernel,
//! and land in an audit log; between batches the clock advances and the
//! tick hooks carry out everything time-driven.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `bastion-config.yaml` into
//!   strongly-typed structs.
//! - [`clock`] -- The only writer of the world's tick counter.
//! - [`decision`] -- [`CommandSource`] trait, [`IdleCommandSource`] and
//!   [`ScriptedCommandSource`].
//! - [`tick`] -- Per-tick hooks: entrenchment, reinforcements, movement,
//!   construction, demolition, training.
//! - [`simulation`] -- [`Simulation`], the serialization point with its
//!   audit log.
//! - [`error`] -- [`SimulationError`].
//!
//! [`CommandSource`]: decision::CommandSource
//! [`IdleCommandSource`]: decision::IdleCommandSource
//! [`ScriptedCommandSource`]: decision::ScriptedCommandSource
//! [`Simulation`]: simulation::Simulation
//! [`SimulationError`]: error::SimulationError

pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod simulation;
pub mod tick;

pub use clock::{ClockError, WorldClock};
pub use config::{ConfigError, SimulationConfig};
pub use decision::{CommandSource, CommandSourceError, IdleCommandSource, ScriptedCommandSource};
pub use error::SimulationError;
pub use simulation::{CommandReceipt, RunSummary, Simulation, StepSummary};
pub use tick::{TickError, TickSummary};
