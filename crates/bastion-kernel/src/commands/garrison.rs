//! Moving units between buildings and the field.

use bastion_events::{
    ArmyCreatedChange, ArmyDisbandedChange, ChangeLogBuilder, EntrenchmentCancelReason,
    ReinforcementCancelledChange,
};
use bastion_types::{ArmyId, BuildingId, Hex, PlayerId};
use bastion_world::{Army, Composition, WorldError, WorldState, composition};
use serde::{Deserialize, Serialize};

use crate::checks;
use crate::combat::entrenchment;
use crate::command::Command;
use crate::context::{ExecutionContext, ValidationContext};
use crate::effects;
use crate::error::CommandFailure;

// ---------------------------------------------------------------------------
// DeployGarrison
// ---------------------------------------------------------------------------

/// Send garrisoned units out as a new army.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployGarrison {
    /// Issuing player.
    pub player: PlayerId,
    /// Building holding the units.
    pub building: BuildingId,
    /// Units to deploy.
    pub units: Composition,
}

impl Command for DeployGarrison {
    /// Tile the new army appears on.
    type Plan = Hex;

    fn name(&self) -> &'static str {
        "DeployGarrison"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<Hex, CommandFailure> {
        checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        checks::operational(building)?;
        if !composition::is_valid_request(&self.units) {
            return Err(CommandFailure::invalid_target("Deployment must name at least one unit"));
        }
        if !composition::covers(&building.garrison, &self.units) {
            return Err(CommandFailure::insufficient(format!(
                "Building {} does not hold the requested units",
                building.id
            )));
        }
        checks::exit_tile(state, ctx, building)
            .ok_or_else(|| CommandFailure::invalid_target(format!("No free tile around building {}", building.id)))
    }

    fn apply(
        &self,
        exit: Hex,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        let b = state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?;
        composition::subtract(&mut b.garrison, &self.units)?;
        changes.push(effects::garrison_changed(b));

        let mut army = Army::new(ArmyId::new(), Some(self.player), exit, self.units.clone());
        army.home_base = Some(self.building);
        changes.push(ArmyCreatedChange {
            army: army.id,
            owner: self.player,
            position: exit,
            composition: self.units.clone(),
            home_base: Some(self.building),
        });
        state.add_army(army)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GarrisonArmy
// ---------------------------------------------------------------------------

/// Move an adjacent army into a building, disbanding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarrisonArmy {
    /// Issuing player.
    pub player: PlayerId,
    /// Army entering the building.
    pub army: ArmyId,
    /// Building to enter.
    pub building: BuildingId,
}

impl Command for GarrisonArmy {
    type Plan = ();

    fn name(&self) -> &'static str {
        "GarrisonArmy"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        checks::ready_army(army)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        checks::operational(building)?;
        if building.distance_to(army.position) > 1 {
            return Err(CommandFailure::invalid_target(format!(
                "Army {} is not next to building {}",
                army.id, building.id
            )));
        }
        let incoming = army.pending_reinforcements.values().fold(army.size(), |sum, p| {
            sum.saturating_add(composition::total(&p.composition))
        });
        let capacity = u64::from(building.spec().garrison_capacity);
        if building.garrison_total().saturating_add(incoming) > capacity {
            return Err(CommandFailure::insufficient(format!(
                "Building {} can hold {capacity} units, {} already inside, {incoming} arriving",
                building.id,
                building.garrison_total()
            )));
        }
        Ok(())
    }

    fn apply(
        &self,
        (): (),
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        entrenchment::cancel(state, self.army, EntrenchmentCancelReason::Move, changes);
        let a = state.army_mut(self.army).ok_or(WorldError::ArmyNotFound(self.army))?;
        let units = std::mem::take(&mut a.composition);
        let pending = std::mem::take(&mut a.pending_reinforcements);
        a.path = None;

        let b = state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?;
        for reinforcement in pending.values() {
            composition::merge(&mut b.garrison, &reinforcement.composition)?;
        }
        composition::merge(&mut b.garrison, &units)?;
        for id in pending.keys() {
            changes.push(ReinforcementCancelledChange {
                reinforcement: *id,
                army: self.army,
                returned_to: Some(self.building),
            });
        }
        changes.push(effects::garrison_changed(b));
        changes.push(ArmyDisbandedChange { army: self.army });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_events::ChangeList;
    use bastion_types::{BuildingType, ReinforcementId, UnitType};
    use bastion_world::{HexPathfinder, PendingReinforcement, WorldBuilder};

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

    #[test]
    fn deploy_creates_an_army_homed_on_the_building() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let barracks = b.building(Some(p), BuildingType::Barracks, Hex::new(3, 3));
        b.garrison(barracks, &[(UnitType::Spearman, 6)], 0);
        let mut state = b.build().unwrap();

        let deploy = DeployGarrison {
            player: p,
            building: barracks,
            units: Composition::from([(UnitType::Spearman, 4)]),
        };
        let list = run(&mut state, &deploy).unwrap();
        assert_eq!(list.kinds(), vec!["GarrisonChanged", "ArmyCreated"]);

        let army = state.armies().next().unwrap();
        assert_eq!(army.home_base, Some(barracks));
        assert_eq!(army.size(), 4);
        assert!(state.building(barracks).unwrap().distance_to(army.position) <= 2);
        assert_eq!(state.building(barracks).unwrap().garrison_total(), 2);
    }

    #[test]
    fn deploy_rejects_more_than_the_garrison() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let barracks = b.building(Some(p), BuildingType::Barracks, Hex::new(3, 3));
        b.garrison(barracks, &[(UnitType::Spearman, 2)], 0);
        let mut state = b.build().unwrap();

        let too_many = DeployGarrison {
            player: p,
            building: barracks,
            units: Composition::from([(UnitType::Spearman, 3)]),
        };
        assert_eq!(run(&mut state, &too_many).unwrap_err().kind, FailureKind::InsufficientResource);
        let nothing = DeployGarrison {
            player: p,
            building: barracks,
            units: Composition::new(),
        };
        assert_eq!(run(&mut state, &nothing).unwrap_err().kind, FailureKind::InvalidTarget);
    }

    #[test]
    fn garrisoning_absorbs_the_army_and_its_reinforcements() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let barracks = b.building(Some(p), BuildingType::Barracks, Hex::new(3, 3));
        let army = b.army(Some(p), Hex::new(2, 3), &[(UnitType::Archer, 3)]);
        b.entrenched(army, 0);
        let mut state = b.build().unwrap();
        let reinforcement = ReinforcementId::new();
        state.army_mut(army).unwrap().pending_reinforcements.insert(
            reinforcement,
            PendingReinforcement {
                id: reinforcement,
                composition: Composition::from([(UnitType::Spearman, 2)]),
                source_building: barracks,
                source: Hex::new(3, 3),
                path: vec![Hex::new(2, 3)],
                dispatched_at: 0,
                arrives_at: 5,
            },
        );

        let list = run(
            &mut state,
            &GarrisonArmy {
                player: p,
                army,
                building: barracks,
            },
        )
        .unwrap();
        assert_eq!(
            list.kinds(),
            vec!["EntrenchmentCancelled", "ReinforcementCancelled", "GarrisonChanged", "ArmyDisbanded"]
        );
        assert!(!state.army(army).unwrap().is_alive());
        assert_eq!(state.building(barracks).unwrap().garrison_total(), 5);
    }

    #[test]
    fn distant_armies_cannot_garrison() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let barracks = b.building(Some(p), BuildingType::Barracks, Hex::new(3, 3));
        let army = b.army(Some(p), Hex::new(0, 0), &[(UnitType::Archer, 3)]);
        let mut state = b.build().unwrap();
        let err = run(
            &mut state,
            &GarrisonArmy {
                player: p,
                army,
                building: barracks,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidTarget);
    }
}
