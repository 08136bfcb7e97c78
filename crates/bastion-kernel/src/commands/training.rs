//! Unit training queues.

use bastion_events::{ChangeLogBuilder, TrainingCancelledChange, TrainingQueuedChange};
use bastion_types::{BuildingId, PlayerId, UnitType};
use bastion_world::{Cost, TrainingBatch, WorldError, WorldState, blueprint};
use serde::{Deserialize, Serialize};

use super::building::release_population;
use crate::checks;
use crate::command::Command;
use crate::context::{ExecutionContext, ValidationContext};
use crate::effects;
use crate::error::CommandFailure;

/// Queue a batch of units in a training building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainUnits {
    /// Issuing player.
    pub player: PlayerId,
    /// Training building.
    pub building: BuildingId,
    /// Unit type to train.
    pub unit: UnitType,
    /// Number of units.
    pub count: u32,
}

/// What a queued batch costs and when it finishes.
#[derive(Debug, Clone)]
pub struct TrainingPlan {
    cost: Cost,
    population: u32,
    completes_at: u64,
}

impl Command for TrainUnits {
    type Plan = TrainingPlan;

    fn name(&self) -> &'static str {
        "TrainUnits"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<TrainingPlan, CommandFailure> {
        let player = checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        checks::operational(building)?;
        if !building.can_train(self.unit) {
            return Err(CommandFailure::invalid_target(format!(
                "{:?} cannot train {:?}",
                building.building_type, self.unit
            )));
        }
        if self.count == 0 {
            return Err(CommandFailure::invalid_target("Training count must be positive"));
        }

        let spec = blueprint::unit_spec(self.unit);
        let cost = blueprint::scale_cost(&spec.cost, u64::from(self.count))
            .ok_or_else(|| CommandFailure::insufficient("Training cost overflows"))?;
        checks::affordable(player, &cost)?;
        let population = spec
            .population
            .checked_mul(self.count)
            .ok_or_else(|| CommandFailure::insufficient("Population demand overflows"))?;
        if population > player.population_room() {
            return Err(CommandFailure::insufficient(format!(
                "Not enough population room: need {population}, have {}",
                player.population_room()
            )));
        }

        let queue_end = building
            .training_queue
            .last()
            .map_or(state.current_time, |b| b.completes_at.max(state.current_time));
        let completes_at = queue_end.saturating_add(spec.train_ticks.saturating_mul(u64::from(self.count)));
        Ok(TrainingPlan {
            cost,
            population,
            completes_at,
        })
    }

    fn apply(
        &self,
        plan: TrainingPlan,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        effects::spend(state, self.player, &plan.cost, changes)?;
        let player = state
            .player_mut(self.player)
            .ok_or(WorldError::PlayerNotFound(self.player))?;
        player.population_used = player.population_used.saturating_add(plan.population);

        let now = state.current_time;
        state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?
            .training_queue
            .push(TrainingBatch {
                unit: self.unit,
                count: self.count,
                queued_at: now,
                completes_at: plan.completes_at,
            });
        changes.push(TrainingQueuedChange {
            building: self.building,
            unit: self.unit,
            count: self.count,
            completes_at: plan.completes_at,
        });
        Ok(())
    }
}

/// Remove a queued batch and refund it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTraining {
    /// Issuing player.
    pub player: PlayerId,
    /// Training building.
    pub building: BuildingId,
    /// Position of the batch in the queue.
    pub index: usize,
}

impl Command for CancelTraining {
    type Plan = Cost;

    fn name(&self) -> &'static str {
        "CancelTraining"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<Cost, CommandFailure> {
        checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        let batch = building.training_queue.get(self.index).ok_or_else(|| {
            CommandFailure::invalid_target(format!("No training batch at position {}", self.index))
        })?;
        blueprint::scale_cost(&blueprint::unit_spec(batch.unit).cost, u64::from(batch.count))
            .ok_or_else(|| CommandFailure::invalid_state("Training refund overflows"))
    }

    fn apply(
        &self,
        refund: Cost,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        let queue = &mut state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?
            .training_queue;
        if self.index >= queue.len() {
            return Err(CommandFailure::invalid_target(format!(
                "No training batch at position {}",
                self.index
            )));
        }
        let batch = queue.remove(self.index);

        effects::refund(state, self.player, &refund, changes)?;
        release_population(state, self.player, batch.unit, batch.count);
        changes.push(TrainingCancelledChange {
            building: self.building,
            unit: batch.unit,
            count: batch.count,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_events::ChangeList;
    use bastion_types::{BuildingType, Hex, ResourceType};
    use bastion_world::{HexPathfinder, WorldBuilder};

    use super::*;
    use crate::combat::CombatEngine;
    use crate::config::RulesConfig;
    use crate::economy::PassiveEconomy;
    use crate::error::FailureKind;

    fn run(state: &mut WorldState, cmd: &impl Command) -> Result<ChangeList, CommandFailure> {
        let rules = RulesConfig::default();
        let mut economy = PassiveEconomy::new();
        let mut combat = CombatEngine::new();
        let mut ctx = ExecutionContext::new(&HexPathfinder, &mut economy, &mut combat, &rules);
        cmd.execute(state, &mut ctx, &mut ChangeLogBuilder::new())
    }

    fn barracks_world(food: u64, gold: u64) -> (WorldState, PlayerId, BuildingId) {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        b.resource(p, ResourceType::Food, food);
        b.resource(p, ResourceType::Gold, gold);
        let barracks = b.building(Some(p), BuildingType::Barracks, Hex::new(3, 3));
        (b.build().unwrap(), p, barracks)
    }

    fn train(player: PlayerId, building: BuildingId, count: u32) -> TrainUnits {
        TrainUnits {
            player,
            building,
            unit: UnitType::Swordsman,
            count,
        }
    }

    #[test]
    fn batches_queue_back_to_back() {
        let (mut state, p, barracks) = barracks_world(1000, 1000);
        let per_unit = blueprint::unit_spec(UnitType::Swordsman).train_ticks;

        run(&mut state, &train(p, barracks, 2)).unwrap();
        run(&mut state, &train(p, barracks, 1)).unwrap();

        let queue = &state.building(barracks).unwrap().training_queue;
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].completes_at, per_unit * 2);
        assert_eq!(queue[1].completes_at, per_unit * 3);
        assert_eq!(state.player(p).unwrap().population_used, 3);
        assert_eq!(state.player(p).unwrap().balance(ResourceType::Food), 1000 - 180);
    }

    #[test]
    fn wrong_building_and_zero_count_are_invalid_targets() {
        let (mut state, p, barracks) = barracks_world(1000, 1000);
        let archers = TrainUnits {
            player: p,
            building: barracks,
            unit: UnitType::Archer,
            count: 1,
        };
        assert_eq!(run(&mut state, &archers).unwrap_err().kind, FailureKind::InvalidTarget);
        assert_eq!(run(&mut state, &train(p, barracks, 0)).unwrap_err().kind, FailureKind::InvalidTarget);
    }

    #[test]
    fn population_cap_limits_training() {
        let (mut state, p, barracks) = barracks_world(100_000, 100_000);
        state.player_mut(p).unwrap().population_used = 49;
        let err = run(&mut state, &train(p, barracks, 2)).unwrap_err();
        assert_eq!(err.kind, FailureKind::InsufficientResource);
        assert!(state.building(barracks).unwrap().training_queue.is_empty());
    }

    #[test]
    fn cancel_refunds_and_releases_population() {
        let (mut state, p, barracks) = barracks_world(1000, 1000);
        run(&mut state, &train(p, barracks, 2)).unwrap();

        let cancel = CancelTraining {
            player: p,
            building: barracks,
            index: 0,
        };
        let list = run(&mut state, &cancel).unwrap();
        assert_eq!(list.kinds(), vec!["ResourcesRefunded", "TrainingCancelled"]);
        let player = state.player(p).unwrap();
        assert_eq!(player.balance(ResourceType::Food), 1000);
        assert_eq!(player.balance(ResourceType::Gold), 1000);
        assert_eq!(player.population_used, 0);

        assert_eq!(run(&mut state, &cancel).unwrap_err().kind, FailureKind::InvalidTarget);
    }
}
