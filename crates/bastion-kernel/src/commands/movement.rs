//! Move orders for armies and villager groups.

use bastion_events::{
    ArmyMoveOrderedChange, ChangeLogBuilder, EntrenchmentCancelReason, VillagersMoveOrderedChange,
};
use bastion_types::{ArmyId, Hex, PlayerId, VillagerGroupId};
use bastion_world::{MovementPath, VillagerTask, WorldError, WorldState, movement};
use serde::{Deserialize, Serialize};

use crate::assignment;
use crate::checks;
use crate::combat::entrenchment;
use crate::command::Command;
use crate::context::{ExecutionContext, ValidationContext};
use crate::effects;
use crate::error::CommandFailure;

/// Route from `from` to a walkable `destination`.
fn route(
    state: &WorldState,
    ctx: &ValidationContext<'_>,
    player: PlayerId,
    from: Hex,
    destination: Hex,
) -> Result<Vec<Hex>, CommandFailure> {
    checks::walkable_destination(state, ctx, destination)?;
    if from == destination {
        return Err(CommandFailure::invalid_target(format!("Already at {destination}")));
    }
    ctx.pathfinder
        .find_path(from, destination, Some(player), state, false)
        .ok_or_else(|| CommandFailure::no_path(format!("No path from {from} to {destination}")))
}

/// Order an army to walk to a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveArmy {
    /// Issuing player.
    pub player: PlayerId,
    /// Army to move.
    pub army: ArmyId,
    /// Target tile.
    pub destination: Hex,
}

impl Command for MoveArmy {
    type Plan = Vec<Hex>;

    fn name(&self) -> &'static str {
        "MoveArmy"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<Vec<Hex>, CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        checks::ready_army(army)?;
        route(state, ctx, self.player, army.position, self.destination)
    }

    fn apply(
        &self,
        path: Vec<Hex>,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        entrenchment::cancel(state, self.army, EntrenchmentCancelReason::Move, changes);
        let army = state.army_mut(self.army).ok_or(WorldError::ArmyNotFound(self.army))?;
        let path_length = movement::path_length(&path);
        army.path = Some(MovementPath::new(path));
        changes.push(ArmyMoveOrderedChange {
            army: self.army,
            from: army.position,
            destination: self.destination,
            path_length,
        });
        Ok(())
    }
}

/// Order a villager group to walk to a tile, dropping its current work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveVillagers {
    /// Issuing player.
    pub player: PlayerId,
    /// Group to move.
    pub group: VillagerGroupId,
    /// Target tile.
    pub destination: Hex,
}

impl Command for MoveVillagers {
    type Plan = Vec<Hex>;

    fn name(&self) -> &'static str {
        "MoveVillagers"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<Vec<Hex>, CommandFailure> {
        checks::player(state, self.player)?;
        let group = checks::owned_villagers(state, self.player, self.group)?;
        route(state, ctx, self.player, group.position, self.destination)
    }

    fn apply(
        &self,
        path: Vec<Hex>,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        let released = effects::release_task(state, ctx.economy, self.group, true, changes)?;
        let path_length = movement::path_length(&path);
        effects::set_task(state, self.group, VillagerTask::Moving, Some(MovementPath::new(path)), changes)?;
        assignment::after_release(state, ctx, released, changes)?;

        let from = state
            .villager_group(self.group)
            .ok_or(WorldError::VillagerGroupNotFound(self.group))?
            .position;
        changes.push(VillagersMoveOrderedChange {
            group: self.group,
            from,
            destination: self.destination,
            path_length,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_events::ChangeList;
    use bastion_types::{BuildingState, BuildingType, ResourcePointKind, Terrain, UnitType};
    use bastion_world::{HexPathfinder, WorldBuilder};

    use super::*;
    use crate::combat::CombatEngine;
    use crate::config::RulesConfig;
    use crate::economy::{EconomyHooks, PassiveEconomy};
    use crate::error::FailureKind;

    fn run_with(
        state: &mut WorldState,
        economy: &mut PassiveEconomy,
        cmd: &impl Command,
    ) -> Result<ChangeList, CommandFailure> {
        let rules = RulesConfig::default();
        let mut combat = CombatEngine::new();
        let mut ctx = ExecutionContext::new(&HexPathfinder, economy, &mut combat, &rules);
        cmd.execute(state, &mut ctx, &mut ChangeLogBuilder::new())
    }

    fn run(state: &mut WorldState, cmd: &impl Command) -> Result<ChangeList, CommandFailure> {
        run_with(state, &mut PassiveEconomy::new(), cmd)
    }

    #[test]
    fn move_cancels_entrenchment_and_sets_a_path() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let army = b.army(Some(p), Hex::new(1, 1), &[(UnitType::Spearman, 5)]);
        b.entrenched(army, 0);
        let mut state = b.build().unwrap();

        let list = run(
            &mut state,
            &MoveArmy {
                player: p,
                army,
                destination: Hex::new(4, 1),
            },
        )
        .unwrap();
        assert_eq!(list.kinds(), vec!["EntrenchmentCancelled", "ArmyMoveOrdered"]);
        let a = state.army(army).unwrap();
        assert!(!a.has_entrenchment());
        assert_eq!(a.path.as_ref().unwrap().destination(), Some(Hex::new(4, 1)));
    }

    #[test]
    fn bad_destinations_fail_without_side_effects() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let army = b.army(Some(p), Hex::new(1, 1), &[(UnitType::Spearman, 5)]);
        b.terrain(Hex::new(5, 5), Terrain::Water);
        let mut state = b.build().unwrap();
        let before = state.clone();

        for (destination, kind) in [
            (Hex::new(5, 5), FailureKind::InvalidTarget),
            (Hex::new(1, 1), FailureKind::InvalidTarget),
            (Hex::new(-1, 3), FailureKind::InvalidTarget),
        ] {
            let err = run(
                &mut state,
                &MoveArmy {
                    player: p,
                    army,
                    destination,
                },
            )
            .unwrap_err();
            assert_eq!(err.kind, kind, "{destination}");
        }
        assert_eq!(state, before);
    }

    #[test]
    fn walled_off_destination_has_no_path() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let army = b.army(Some(p), Hex::new(0, 0), &[(UnitType::Spearman, 5)]);
        for n in Hex::new(6, 6).neighbors() {
            b.terrain(n, Terrain::Mountain);
        }
        let mut state = b.build().unwrap();
        let err = run(
            &mut state,
            &MoveArmy {
                player: p,
                army,
                destination: Hex::new(6, 6),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::NoPath);
    }

    #[test]
    fn moving_gatherers_stops_gathering() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let group = b.villagers(Some(p), Hex::new(2, 2), 4);
        let grove = b.resource_point(ResourcePointKind::Grove, Hex::new(3, 2), 500);
        let mut state = b.build().unwrap();
        let mut economy = PassiveEconomy::new();
        assert!(economy.start_gathering(group, grove, &state));
        state.resource_point_mut(grove).unwrap().assigned.insert(group);
        state.villager_group_mut(group).unwrap().task = VillagerTask::Gathering(grove);

        let list = run_with(
            &mut state,
            &mut economy,
            &MoveVillagers {
                player: p,
                group,
                destination: Hex::new(6, 2),
            },
        )
        .unwrap();
        assert_eq!(
            list.kinds(),
            vec!["GatheringStopped", "VillagerTaskChanged", "VillagersMoveOrdered"]
        );
        assert_eq!(economy.working_on(group), None);
        assert_eq!(state.resource_point(grove).unwrap().assigned_count(), 0);
        assert_eq!(state.villager_group(group).unwrap().task, VillagerTask::Moving);
    }

    #[test]
    fn moving_a_dispatched_builder_lets_the_site_start_anyway() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let group = b.villagers(Some(p), Hex::new(0, 0), 4);
        let site = b.building_in_state(Some(p), BuildingType::House, Hex::new(7, 7), BuildingState::Planning);
        let mut state = b.build().unwrap();
        state.building_mut(site).unwrap().awaiting_builders = true;
        let g = state.villager_group_mut(group).unwrap();
        g.task = VillagerTask::Building(site);
        g.path = Some(MovementPath::new(vec![Hex::new(1, 1), Hex::new(2, 2)]));

        let list = run(
            &mut state,
            &MoveVillagers {
                player: p,
                group,
                destination: Hex::new(0, 3),
            },
        )
        .unwrap();
        assert_eq!(list.count_kind("ConstructionStarted"), 1);
        let building = state.building(site).unwrap();
        assert_eq!(building.state, BuildingState::Constructing);
        assert_eq!(building.builders, 1);
    }
}
