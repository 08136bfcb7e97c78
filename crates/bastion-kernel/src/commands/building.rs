//! Building placement, upgrades, and demolition.

use bastion_events::{
    ArmyCreatedChange, BuildingPlacedChange, ChangeLogBuilder, DemolitionStartedChange,
    TrainingCancelledChange, UpgradeCancelledChange, VillagerGroupCreatedChange,
};
use bastion_types::{
    ArmyId, BuildingId, BuildingState, BuildingType, Hex, PlayerId, Rotation, UnitType, VillagerGroupId,
};
use bastion_world::{
    Army, Building, Composition, Cost, VillagerGroup, VillagerTask, WorldError, WorldState, blueprint,
};
use serde::{Deserialize, Serialize};

use crate::assignment;
use crate::checks;
use crate::command::Command;
use crate::context::{ExecutionContext, ValidationContext};
use crate::effects;
use crate::error::CommandFailure;

// ---------------------------------------------------------------------------
// PlaceBuilding
// ---------------------------------------------------------------------------

/// Place a new building and put villagers to work on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBuilding {
    /// Issuing player.
    pub player: PlayerId,
    /// What to build.
    pub building_type: BuildingType,
    /// Footprint anchor.
    pub position: Hex,
    /// Footprint orientation.
    #[serde(default)]
    pub rotation: Rotation,
    /// Villager group to build with. The nearest idle group is used when
    /// absent.
    #[serde(default)]
    pub builder: Option<VillagerGroupId>,
}

impl PlaceBuilding {
    fn check_site(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        for tile in blueprint::footprint(self.building_type, self.position, self.rotation) {
            if !ctx.pathfinder.is_valid_coordinate(tile, state) {
                return Err(CommandFailure::invalid_target(format!("Footprint tile {tile} is off the map")));
            }
            if !ctx.pathfinder.is_walkable(tile, state) {
                return Err(CommandFailure::invalid_target(format!("Footprint tile {tile} is blocked")));
            }
            if state.armies_at(tile).next().is_some() || state.villagers_at(tile).next().is_some() {
                return Err(CommandFailure::invalid_target(format!("Footprint tile {tile} is occupied")));
            }
        }
        Ok(())
    }
}

impl Command for PlaceBuilding {
    type Plan = Cost;

    fn name(&self) -> &'static str {
        "PlaceBuilding"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<Cost, CommandFailure> {
        let player = checks::player(state, self.player)?;
        if let Some(group) = self.builder {
            checks::owned_villagers(state, self.player, group)?;
        }
        let cost = blueprint::building_spec(self.building_type).cost;
        checks::affordable(player, &cost)?;
        self.check_site(state, ctx)?;
        Ok(cost)
    }

    fn apply(
        &self,
        cost: Cost,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        effects::spend(state, self.player, &cost, changes)?;
        let now = state.current_time;
        let building = Building::planned(
            BuildingId::new(),
            Some(self.player),
            self.building_type,
            self.position,
            self.rotation,
            now,
        );
        let id = building.id;
        state.add_building(building)?;
        changes.push(BuildingPlacedChange {
            building: id,
            owner: self.player,
            building_type: self.building_type,
            position: self.position,
            rotation: self.rotation,
            tick: now,
        });
        assignment::assign_workers(state, ctx, self.player, id, self.builder, changes)
    }
}

// ---------------------------------------------------------------------------
// UpgradeBuilding
// ---------------------------------------------------------------------------

/// Raise a completed building one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeBuilding {
    /// Issuing player.
    pub player: PlayerId,
    /// Building to upgrade.
    pub building: BuildingId,
    /// Villager group to work with. The nearest idle group is used when
    /// absent.
    #[serde(default)]
    pub builder: Option<VillagerGroupId>,
}

impl Command for UpgradeBuilding {
    type Plan = Cost;

    fn name(&self) -> &'static str {
        "UpgradeBuilding"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<Cost, CommandFailure> {
        let player = checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        if let Some(group) = self.builder {
            checks::owned_villagers(state, self.player, group)?;
        }
        if building.state != BuildingState::Completed {
            return Err(CommandFailure::invalid_state(format!(
                "Building {} is {:?}; only completed buildings can be upgraded",
                building.id, building.state
            )));
        }
        if let Some(active) = player.active_upgrade {
            return Err(CommandFailure::invalid_state(format!("Upgrade of {active} is already in progress")));
        }
        if building.level >= building.spec().max_level {
            return Err(CommandFailure::invalid_state(format!(
                "Building {} is already at its maximum level {}",
                building.id, building.level
            )));
        }
        let target_level = building.level.saturating_add(1);
        let cost = blueprint::upgrade_cost(building.building_type, target_level)
            .ok_or_else(|| CommandFailure::invalid_state("Upgrade cost overflows"))?;
        checks::affordable(player, &cost)?;
        Ok(cost)
    }

    fn apply(
        &self,
        cost: Cost,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        effects::spend(state, self.player, &cost, changes)?;
        let b = state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?;
        b.state = BuildingState::Upgrading;
        b.builders = 0;
        b.upgrade_started_at = None;
        state
            .player_mut(self.player)
            .ok_or(WorldError::PlayerNotFound(self.player))?
            .active_upgrade = Some(self.building);
        assignment::assign_workers(state, ctx, self.player, self.building, self.builder, changes)
    }
}

// ---------------------------------------------------------------------------
// CancelUpgrade
// ---------------------------------------------------------------------------

/// Abort an upgrade in progress and refund its cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelUpgrade {
    /// Issuing player.
    pub player: PlayerId,
    /// Building being upgraded.
    pub building: BuildingId,
}

impl Command for CancelUpgrade {
    type Plan = Cost;

    fn name(&self) -> &'static str {
        "CancelUpgrade"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<Cost, CommandFailure> {
        checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        if building.state != BuildingState::Upgrading {
            return Err(CommandFailure::invalid_state(format!("Building {} is not upgrading", building.id)));
        }
        blueprint::upgrade_cost(building.building_type, building.level.saturating_add(1))
            .ok_or_else(|| CommandFailure::invalid_state("Upgrade cost overflows"))
    }

    fn apply(
        &self,
        refund: Cost,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        effects::refund(state, self.player, &refund, changes)?;
        let b = state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?;
        b.state = BuildingState::Completed;
        b.builders = 0;
        b.awaiting_builders = false;
        b.upgrade_started_at = None;
        let level = b.level;

        if let Some(player) = state.player_mut(self.player) {
            if player.active_upgrade == Some(self.building) {
                player.active_upgrade = None;
            }
        }

        let workers: Vec<VillagerGroupId> = state
            .villager_groups()
            .filter(|g| g.task == VillagerTask::Upgrading(self.building))
            .map(|g| g.id)
            .collect();
        for group in workers {
            effects::set_task(state, group, VillagerTask::Idle, None, changes)?;
        }

        changes.push(UpgradeCancelledChange {
            building: self.building,
            level,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DemolishBuilding
// ---------------------------------------------------------------------------

/// Tear down a completed building, ejecting its garrison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemolishBuilding {
    /// Issuing player.
    pub player: PlayerId,
    /// Building to demolish.
    pub building: BuildingId,
}

/// Resolved demolition: where the garrison steps out and what the training
/// queue refunds.
#[derive(Debug, Clone)]
pub struct DemolitionPlan {
    exit: Option<Hex>,
    refunds: Vec<Cost>,
}

impl Command for DemolishBuilding {
    type Plan = DemolitionPlan;

    fn name(&self) -> &'static str {
        "DemolishBuilding"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<DemolitionPlan, CommandFailure> {
        checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        if building.state != BuildingState::Completed {
            return Err(CommandFailure::invalid_state(format!(
                "Building {} is {:?}; only completed buildings can be demolished",
                building.id, building.state
            )));
        }
        let refunds = building
            .training_queue
            .iter()
            .map(|batch| {
                blueprint::scale_cost(&blueprint::unit_spec(batch.unit).cost, u64::from(batch.count))
                    .ok_or_else(|| CommandFailure::invalid_state("Training refund overflows"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let occupied = !building.garrison.is_empty() || building.villager_garrison > 0;
        let exit = if occupied {
            Some(checks::exit_tile(state, ctx, building).ok_or_else(|| {
                CommandFailure::invalid_target(format!("No free tile to evacuate building {}", building.id))
            })?)
        } else {
            None
        };
        Ok(DemolitionPlan { exit, refunds })
    }

    fn apply(
        &self,
        plan: DemolitionPlan,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        let now = state.current_time;
        let b = state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?;
        b.state = BuildingState::Demolishing;
        b.demolition_started_at = Some(now);
        let queue = std::mem::take(&mut b.training_queue);
        let units = std::mem::take(&mut b.garrison);
        let villagers = std::mem::take(&mut b.villager_garrison);
        changes.push(DemolitionStartedChange {
            building: self.building,
            tick: now,
        });

        for (batch, refund) in queue.iter().zip(&plan.refunds) {
            effects::refund(state, self.player, refund, changes)?;
            release_population(state, self.player, batch.unit, batch.count);
            changes.push(TrainingCancelledChange {
                building: self.building,
                unit: batch.unit,
                count: batch.count,
            });
        }

        if let Some(exit) = plan.exit {
            if let Some(b) = state.building(self.building) {
                changes.push(effects::garrison_changed(b));
            }
            self.evacuate(state, exit, units, villagers, changes)?;
        }
        Ok(())
    }
}

impl DemolishBuilding {
    fn evacuate(
        &self,
        state: &mut WorldState,
        exit: Hex,
        units: Composition,
        villagers: u32,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        if !units.is_empty() {
            let army = Army::new(ArmyId::new(), Some(self.player), exit, units);
            changes.push(ArmyCreatedChange {
                army: army.id,
                owner: self.player,
                position: exit,
                composition: army.composition.clone(),
                home_base: None,
            });
            state.add_army(army)?;
        }
        if villagers > 0 {
            let group = VillagerGroup::new(VillagerGroupId::new(), Some(self.player), exit, villagers);
            changes.push(VillagerGroupCreatedChange {
                group: group.id,
                owner: self.player,
                position: exit,
                headcount: villagers,
            });
            state.add_villager_group(group)?;
        }
        Ok(())
    }
}

/// Give back the population reserved by a training batch.
pub(crate) fn release_population(state: &mut WorldState, player: PlayerId, unit: UnitType, count: u32) {
    let used = blueprint::unit_spec(unit).population.saturating_mul(count);
    if let Some(p) = state.player_mut(player) {
        p.population_used = p.population_used.saturating_sub(used);
    }
}
