//! Shared validation checks.
//!
//! Each lookup reports existence before ownership, matching the order in
//! which every command surfaces its first failure.

use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, ResourcePointId, VillagerGroupId};
use bastion_world::{Army, Building, Cost, Player, ResourcePoint, VillagerGroup, WorldState};

use crate::context::ValidationContext;
use crate::error::CommandFailure;

/// Resolve the issuing player.
pub fn player(state: &WorldState, id: PlayerId) -> Result<&Player, CommandFailure> {
    state
        .player(id)
        .ok_or_else(|| CommandFailure::not_found(format!("Player {id} not found")))
}

/// Resolve a building owned by `player`.
pub fn owned_building(state: &WorldState, player: PlayerId, id: BuildingId) -> Result<&Building, CommandFailure> {
    let building = state
        .building(id)
        .ok_or_else(|| CommandFailure::not_found(format!("Building {id} not found")))?;
    if !building.is_owned_by(player) {
        return Err(CommandFailure::not_owned(format!("Building {id} is not owned by {player}")));
    }
    Ok(building)
}

/// Resolve an army owned by `player`.
pub fn owned_army(state: &WorldState, player: PlayerId, id: ArmyId) -> Result<&Army, CommandFailure> {
    let army = state
        .army(id)
        .ok_or_else(|| CommandFailure::not_found(format!("Army {id} not found")))?;
    if !army.is_owned_by(player) {
        return Err(CommandFailure::not_owned(format!("Army {id} is not owned by {player}")));
    }
    Ok(army)
}

/// Resolve a villager group owned by `player`.
pub fn owned_villagers(
    state: &WorldState,
    player: PlayerId,
    id: VillagerGroupId,
) -> Result<&VillagerGroup, CommandFailure> {
    let group = state
        .villager_group(id)
        .ok_or_else(|| CommandFailure::not_found(format!("Villager group {id} not found")))?;
    if !group.is_owned_by(player) {
        return Err(CommandFailure::not_owned(format!(
            "Villager group {id} is not owned by {player}"
        )));
    }
    if !group.is_present() {
        return Err(CommandFailure::invalid_state(format!("Villager group {id} has no members")));
    }
    Ok(group)
}

/// Resolve a resource point.
pub fn resource_point(state: &WorldState, id: ResourcePointId) -> Result<&ResourcePoint, CommandFailure> {
    state
        .resource_point(id)
        .ok_or_else(|| CommandFailure::not_found(format!("Resource point {id} not found")))
}

/// The building must be Completed or Upgrading.
pub fn operational(building: &Building) -> Result<(), CommandFailure> {
    if building.is_operational() {
        Ok(())
    } else {
        Err(CommandFailure::invalid_state(format!(
            "Building {} is {:?}, not operational",
            building.id, building.state
        )))
    }
}

/// The army must be alive and free to take new orders.
pub fn ready_army(army: &Army) -> Result<(), CommandFailure> {
    if !army.is_alive() {
        return Err(CommandFailure::invalid_state(format!("Army {} has no units", army.id)));
    }
    if army.in_combat {
        return Err(CommandFailure::invalid_state(format!("Army {} is in combat", army.id)));
    }
    if army.retreating {
        return Err(CommandFailure::invalid_state(format!("Army {} is retreating", army.id)));
    }
    Ok(())
}

/// The player must hold at least `cost`.
pub fn affordable(player: &Player, cost: &Cost) -> Result<(), CommandFailure> {
    match player.shortfall(cost) {
        Some((resource, needed, held)) => Err(CommandFailure::insufficient(format!(
            "Not enough {resource:?}: need {needed}, have {held}"
        ))),
        None => Ok(()),
    }
}

/// The coordinate must be on the map and walkable.
pub fn walkable_destination(state: &WorldState, ctx: &ValidationContext<'_>, hex: Hex) -> Result<(), CommandFailure> {
    if !ctx.pathfinder.is_valid_coordinate(hex, state) {
        return Err(CommandFailure::invalid_target(format!("{hex} is off the map")));
    }
    if !ctx.pathfinder.is_walkable(hex, state) {
        return Err(CommandFailure::invalid_target(format!("{hex} is not walkable")));
    }
    Ok(())
}

/// Nearest free tile around a building where units can step out.
pub fn exit_tile(state: &WorldState, ctx: &ValidationContext<'_>, building: &Building) -> Option<Hex> {
    ctx.pathfinder
        .find_nearest_walkable(building.position, ctx.rules.exit_search_radius, building.owner, state)
}
