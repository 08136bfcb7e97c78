//! Command kernel for the Bastion simulation.
//!
//! Every gameplay action is a [`Command`]: a read-only validation that runs
//! its checks in a fixed order, and an execution that applies the mutations
//! and returns an ordered [`ChangeList`](bastion_events::ChangeList). A
//! failed command leaves the world untouched and reports a
//! [`CommandFailure`] with a stable [`FailureKind`].
//!
//! # Modules
//!
//! - [`command`] -- The [`Command`] trait and the [`GameCommand`] envelope.
//! - [`commands`] -- Building, training, garrison, movement, gathering,
//!   military, and reinforcement commands.
//! - [`combat`] -- Defensive stack classification, combat sessions, and the
//!   entrenchment state machine.
//! - [`assignment`] -- Builder resolution for construction and upgrades.
//! - [`checks`] -- Shared validation checks.
//! - [`effects`] -- Shared mutations that emit change records.
//! - [`economy`] -- The [`EconomyHooks`] collaborator.
//! - [`context`] -- Collaborators handed to validation and execution.
//! - [`config`] -- Tunable gameplay rules ([`RulesConfig`]).
//! - [`error`] -- [`CommandFailure`] and [`FailureKind`].

pub mod assignment;
pub mod checks;
pub mod combat;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod economy;
pub mod effects;
pub mod error;

// Re-export primary types at crate root.
pub use combat::{CombatEngine, CombatSession, DefenseClassification, DefensiveStack, Participant};
pub use command::{Command, GameCommand};
pub use config::RulesConfig;
pub use context::{ExecutionContext, ValidationContext};
pub use economy::{EconomyHooks, PassiveEconomy};
pub use error::{CommandFailure, FailureKind};
