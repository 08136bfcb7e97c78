//! Reinforcements: garrisoned units marching out to join a field army.

use bastion_events::{
    ChangeLogBuilder, ReinforcementCancelledChange, ReinforcementDispatchedChange,
    ReinforcementLostChange,
};
use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, ReinforcementId};
use bastion_world::{
    Composition, PendingReinforcement, WorldError, WorldState, composition, movement,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::checks;
use crate::command::Command;
use crate::context::{ExecutionContext, ValidationContext};
use crate::effects;
use crate::error::CommandFailure;

/// Put a reinforcement back into a garrison: its source building when it
/// still stands for the owner, otherwise the owner's nearest base.
///
/// Returns the receiving building, or `None` when nothing can take the
/// units and they are lost.
pub fn return_reinforcement(
    state: &mut WorldState,
    owner: PlayerId,
    reinforcement: &PendingReinforcement,
    changes: &mut ChangeLogBuilder,
) -> Result<Option<BuildingId>, CommandFailure> {
    let source = state
        .building(reinforcement.source_building)
        .filter(|b| b.is_owned_by(owner) && b.is_operational())
        .map(|b| b.id);
    let target = source.or_else(|| {
        state
            .bases_by_distance(owner, reinforcement.source)
            .first()
            .map(|b| b.id)
    });

    let Some(id) = target else {
        warn!(
            reinforcement = %reinforcement.id,
            units = composition::total(&reinforcement.composition),
            "No base to take back a reinforcement; units lost"
        );
        changes.push(ReinforcementLostChange {
            reinforcement: reinforcement.id,
            composition: reinforcement.composition.clone(),
        });
        return Ok(None);
    };

    let building = state.building_mut(id).ok_or(WorldError::BuildingNotFound(id))?;
    composition::merge(&mut building.garrison, &reinforcement.composition)?;
    changes.push(effects::garrison_changed(building));
    Ok(Some(id))
}

// ---------------------------------------------------------------------------
// SendReinforcement
// ---------------------------------------------------------------------------

/// Send garrisoned units to join an army.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReinforcement {
    /// Issuing player.
    pub player: PlayerId,
    /// Building the units leave.
    pub building: BuildingId,
    /// Army they join.
    pub army: ArmyId,
    /// Units to send.
    pub units: Composition,
}

/// Route and arrival of a reinforcement.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    source: Hex,
    path: Vec<Hex>,
    arrives_at: u64,
}

impl Command for SendReinforcement {
    type Plan = DispatchPlan;

    fn name(&self) -> &'static str {
        "SendReinforcement"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<DispatchPlan, CommandFailure> {
        checks::player(state, self.player)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        checks::operational(building)?;
        if !composition::is_valid_request(&self.units) {
            return Err(CommandFailure::invalid_target("Reinforcement must name at least one unit"));
        }
        if !composition::covers(&building.garrison, &self.units) {
            return Err(CommandFailure::insufficient(format!(
                "Building {} does not hold the requested units",
                building.id
            )));
        }

        let army = checks::owned_army(state, self.player, self.army)?;
        if !army.is_alive() {
            return Err(CommandFailure::invalid_state(format!("Army {} has no units", army.id)));
        }
        if army.retreating {
            return Err(CommandFailure::invalid_state(format!("Army {} is retreating", army.id)));
        }

        let source = building.position;
        let path = ctx
            .pathfinder
            .find_path(source, army.position, Some(self.player), state, true)
            .ok_or_else(|| CommandFailure::no_path(format!("No path from {source} to army {}", army.id)))?;
        let arrives_at = state.current_time.saturating_add(ctx.rules.travel_ticks(path.len()));
        Ok(DispatchPlan {
            source,
            path,
            arrives_at,
        })
    }

    fn apply(
        &self,
        plan: DispatchPlan,
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        let b = state
            .building_mut(self.building)
            .ok_or(WorldError::BuildingNotFound(self.building))?;
        composition::subtract(&mut b.garrison, &self.units)?;
        changes.push(effects::garrison_changed(b));

        let now = state.current_time;
        let id = ReinforcementId::new();
        let path_length = movement::path_length(&plan.path);
        let army = state.army_mut(self.army).ok_or(WorldError::ArmyNotFound(self.army))?;
        army.pending_reinforcements.insert(
            id,
            PendingReinforcement {
                id,
                composition: self.units.clone(),
                source_building: self.building,
                source: plan.source,
                path: plan.path,
                dispatched_at: now,
                arrives_at: plan.arrives_at,
            },
        );
        changes.push(ReinforcementDispatchedChange {
            reinforcement: id,
            army: self.army,
            source: self.building,
            composition: self.units.clone(),
            arrives_at: plan.arrives_at,
        });
        debug!(%id, army = %self.army, path_length, "Reinforcement dispatched");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CancelReinforcement
// ---------------------------------------------------------------------------

/// Call back a reinforcement still in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReinforcement {
    /// Issuing player.
    pub player: PlayerId,
    /// Army the reinforcement was heading to.
    pub army: ArmyId,
    /// Reinforcement to call back.
    pub reinforcement: ReinforcementId,
}

impl Command for CancelReinforcement {
    type Plan = ();

    fn name(&self) -> &'static str {
        "CancelReinforcement"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        if !army.pending_reinforcements.contains_key(&self.reinforcement) {
            return Err(CommandFailure::not_found(format!(
                "Reinforcement {} is not heading to army {}",
                self.reinforcement, army.id
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
        let pending = state
            .army_mut(self.army)
            .ok_or(WorldError::ArmyNotFound(self.army))?
            .pending_reinforcements
            .remove(&self.reinforcement)
            .ok_or_else(|| {
                CommandFailure::not_found(format!("Reinforcement {} not found", self.reinforcement))
            })?;
        let returned_to = return_reinforcement(state, self.player, &pending, changes)?;
        changes.push(ReinforcementCancelledChange {
            reinforcement: self.reinforcement,
            army: self.army,
            returned_to,
        });
        Ok(())
    }
}
