//! The single-writer simulation driver.
//!
//! [`Simulation`] owns the world and every collaborator the kernel needs.
//! It is the only place commands are executed: [`Simulation::submit`]
//! takes one command at a time, runs it through the kernel's
//! validate-then-execute contract, and appends a [`CommandReceipt`] to the
//! audit log when it succeeds. Nothing else holds a mutable reference to
//! the world, so commands never interleave.

use bastion_events::{ChangeList, ChangeLogBuilder};
use bastion_kernel::{
    CombatEngine, CommandFailure, EconomyHooks, ExecutionContext, GameCommand, PassiveEconomy,
    RulesConfig, ValidationContext,
};
use bastion_types::PlayerId;
use bastion_world::{HexPathfinder, Pathfinder, WorldState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::WorldClock;
use crate::config::{SessionConfig, SimulationConfig};
use crate::decision::CommandSource;
use crate::error::SimulationError;
use crate::tick;

/// One applied command in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReceipt {
    /// Position in the log, starting at 1.
    pub sequence: u64,
    /// Issuing player.
    pub player: PlayerId,
    /// The command as submitted.
    pub command: GameCommand,
    /// Simulation tick the command ran at.
    pub tick: u64,
    /// Wall-clock time the command was applied.
    pub issued_at: DateTime<Utc>,
    /// Records the command produced.
    pub changes: ChangeList,
}

/// Outcome of one [`Simulation::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    /// Tick after the step's advance.
    pub tick: u64,
    /// Commands applied this step.
    pub accepted: u32,
    /// Commands rejected this step.
    pub rejected: u32,
    /// Records produced by the tick hooks.
    pub changes: ChangeList,
}

/// Outcome of a whole [`Simulation::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps executed.
    pub steps: u64,
    /// Tick the run ended at.
    pub final_tick: u64,
    /// Commands applied over the run.
    pub accepted: u64,
    /// Commands rejected over the run.
    pub rejected: u64,
}

/// The authoritative game session.
pub struct Simulation {
    state: WorldState,
    combat: CombatEngine,
    pathfinder: Box<dyn Pathfinder>,
    economy: Box<dyn EconomyHooks>,
    rules: RulesConfig,
    clock: WorldClock,
    receipts: Vec<CommandReceipt>,
    rejected: u64,
}

impl Simulation {
    /// Wrap a world with the default hex pathfinder and passive economy.
    /// The clock starts at the world's current tick.
    pub fn new(state: WorldState, rules: RulesConfig) -> Self {
        let clock = WorldClock::new(state.current_time);
        Self {
            state,
            combat: CombatEngine::new(),
            pathfinder: Box::new(HexPathfinder),
            economy: Box::new(PassiveEconomy::new()),
            rules,
            clock,
            receipts: Vec::new(),
            rejected: 0,
        }
    }

    /// Wrap a world using the `time` and `rules` sections of `config`.
    pub fn from_config(mut state: WorldState, config: &SimulationConfig) -> Self {
        let clock = WorldClock::from_config(&config.time);
        clock.seat(&mut state);
        let mut simulation = Self::new(state, config.rules.clone());
        simulation.clock = clock;
        simulation
    }

    /// Replace the routing collaborator.
    #[must_use]
    pub fn with_pathfinder(mut self, pathfinder: Box<dyn Pathfinder>) -> Self {
        self.pathfinder = pathfinder;
        self
    }

    /// Replace the economy collaborator.
    #[must_use]
    pub fn with_economy(mut self, economy: Box<dyn EconomyHooks>) -> Self {
        self.economy = economy;
        self
    }

    /// The current world.
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    /// Mutable world access for seeding scenarios. Bypasses the command
    /// path and leaves no receipt.
    pub const fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// Open combat sessions.
    pub const fn combat(&self) -> &CombatEngine {
        &self.combat
    }

    /// Gameplay constants in force.
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// The simulation clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.state.current_time
    }

    /// The audit log, oldest first.
    pub fn receipts(&self) -> &[CommandReceipt] {
        &self.receipts
    }

    /// Commands rejected so far.
    pub const fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Check a command against the current world without changing anything.
    pub fn validate(&self, command: &GameCommand) -> Result<(), CommandFailure> {
        let ctx = ValidationContext::new(self.pathfinder.as_ref(), &self.rules);
        command.validate(&self.state, &ctx)
    }

    /// Validate and execute one command. On success the receipt is
    /// appended to the audit log and the produced records are returned. On
    /// failure the world is unchanged and only a debug line is logged.
    pub fn submit(&mut self, command: &GameCommand) -> Result<ChangeList, CommandFailure> {
        let player = command.issuer();
        let mut ctx = ExecutionContext::new(
            self.pathfinder.as_ref(),
            self.economy.as_mut(),
            &mut self.combat,
            &self.rules,
        );
        let mut changes = ChangeLogBuilder::new();
        match command.execute(&mut self.state, &mut ctx, &mut changes) {
            Ok(list) => {
                let sequence = u64::try_from(self.receipts.len())
                    .unwrap_or(u64::MAX)
                    .saturating_add(1);
                debug!(
                    sequence,
                    %player,
                    command = command.name(),
                    records = list.len(),
                    "Command applied"
                );
                self.receipts.push(CommandReceipt {
                    sequence,
                    player,
                    command: command.clone(),
                    tick: self.state.current_time,
                    issued_at: Utc::now(),
                    changes: list.clone(),
                });
                Ok(list)
            }
            Err(failure) => {
                self.rejected = self.rejected.saturating_add(1);
                debug!(
                    %player,
                    command = command.name(),
                    kind = ?failure.kind,
                    reason = %failure.message,
                    "Command rejected"
                );
                Err(failure)
            }
        }
    }

    /// Advance the clock by `ticks`, running the tick hooks after each one.
    /// After the hooks, combat sessions drop participants the tick destroyed
    /// or emptied, and sessions left with an empty side end. Returns every
    /// record produced.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Tick`] if the clock overflows or a hook
    /// finds the world inconsistent. Ticks already run stay applied.
    pub fn advance(&mut self, ticks: u64) -> Result<ChangeList, SimulationError> {
        let mut changes = ChangeLogBuilder::new();
        for _ in 0..ticks {
            let summary = tick::run_tick(&mut self.state, &self.clock, &self.rules)?;
            changes.append(summary.changes);
            let ended = self.combat.reconcile(&mut self.state, &mut changes);
            if !ended.is_empty() {
                debug!(tick = summary.tick, ended = ended.len(), "Combat sessions closed");
            }
        }
        Ok(changes.finalize())
    }

    /// Collect commands from `source` for every player in id order, submit
    /// them, then advance the clock by `ticks`.
    ///
    /// A command issued in another player's name is rejected without
    /// reaching the kernel.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if the source fails outright or the
    /// advance fails.
    pub fn step(&mut self, source: &mut dyn CommandSource, ticks: u64) -> Result<StepSummary, SimulationError> {
        let players: Vec<PlayerId> = self.state.players().map(|p| p.id).collect();
        let mut accepted: u32 = 0;
        let mut rejected: u32 = 0;

        for player in players {
            for command in source.next_commands(player, &self.state)? {
                if command.issuer() != player {
                    warn!(
                        %player,
                        issuer = %command.issuer(),
                        command = command.name(),
                        "Command issued for another player, dropped"
                    );
                    self.rejected = self.rejected.saturating_add(1);
                    rejected = rejected.saturating_add(1);
                    continue;
                }
                if self.submit(&command).is_ok() {
                    accepted = accepted.saturating_add(1);
                } else {
                    rejected = rejected.saturating_add(1);
                }
            }
        }

        let changes = self.advance(ticks)?;
        Ok(StepSummary {
            tick: self.state.current_time,
            accepted,
            rejected,
            changes,
        })
    }

    /// Run `session.max_steps` steps of `session.ticks_per_step` ticks.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimulationError`] a step raises.
    pub fn run(&mut self, source: &mut dyn CommandSource, session: &SessionConfig) -> Result<RunSummary, SimulationError> {
        info!(
            max_steps = session.max_steps,
            ticks_per_step = session.ticks_per_step,
            start_tick = self.state.current_time,
            "Simulation starting"
        );

        let mut summary = RunSummary {
            steps: 0,
            final_tick: self.state.current_time,
            accepted: 0,
            rejected: 0,
        };
        for _ in 0..session.max_steps {
            let step = self.step(source, session.ticks_per_step)?;
            summary.steps = summary.steps.saturating_add(1);
            summary.accepted = summary.accepted.saturating_add(u64::from(step.accepted));
            summary.rejected = summary.rejected.saturating_add(u64::from(step.rejected));
            summary.final_tick = step.tick;
        }

        info!(
            steps = summary.steps,
            final_tick = summary.final_tick,
            accepted = summary.accepted,
            rejected = summary.rejected,
            "Simulation finished"
        );
        Ok(summary)
    }
}
