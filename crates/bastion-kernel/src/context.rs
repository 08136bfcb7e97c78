//! Collaborators handed to commands.
//!
//! Commands never reach for process-wide engines: the pathfinder, economy
//! and combat engine are passed in on every call. Validation only gets
//! read-only collaborators so it cannot mutate anything.

use bastion_world::Pathfinder;

use crate::combat::CombatEngine;
use crate::config::RulesConfig;
use crate::economy::EconomyHooks;

/// Read-only collaborators available to validation.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Routing and map queries.
    pub pathfinder: &'a dyn Pathfinder,
    /// Gameplay constants.
    pub rules: &'a RulesConfig,
}

impl<'a> ValidationContext<'a> {
    /// Bundle the read-only collaborators.
    pub const fn new(pathfinder: &'a dyn Pathfinder, rules: &'a RulesConfig) -> Self {
        Self { pathfinder, rules }
    }
}

/// Collaborators available to execution.
pub struct ExecutionContext<'a> {
    /// Routing and map queries.
    pub pathfinder: &'a dyn Pathfinder,
    /// Gathering registration and rate recomputation.
    pub economy: &'a mut dyn EconomyHooks,
    /// Combat session registry.
    pub combat: &'a mut CombatEngine,
    /// Gameplay constants.
    pub rules: &'a RulesConfig,
}

impl<'a> ExecutionContext<'a> {
    /// Bundle the execution collaborators.
    pub fn new(
        pathfinder: &'a dyn Pathfinder,
        economy: &'a mut dyn EconomyHooks,
        combat: &'a mut CombatEngine,
        rules: &'a RulesConfig,
    ) -> Self {
        Self {
            pathfinder,
            economy,
            combat,
            rules,
        }
    }

    /// The read-only view used to re-run validation before executing.
    pub const fn validation(&self) -> ValidationContext<'a> {
        ValidationContext {
            pathfinder: self.pathfinder,
            rules: self.rules,
        }
    }
}
