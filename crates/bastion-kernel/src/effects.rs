//! Mutation helpers shared by command execution.
//!
//! Every helper here pairs a state change with the record describing it.

use bastion_events::{
    ChangeLogBuilder, GarrisonChangedChange, GatheringStoppedChange, ResourcesRefundedChange,
    ResourcesSpentChange, VillagerActivity, VillagerTaskChangedChange,
};
use bastion_types::{BuildingId, PlayerId, VillagerGroupId};
use bastion_world::{Building, Cost, MovementPath, VillagerTask, WorldError, WorldState};

use crate::error::CommandFailure;
use crate::economy::EconomyHooks;

/// Deduct `cost` from a player and record it.
pub fn spend(
    state: &mut WorldState,
    player: PlayerId,
    cost: &Cost,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    state
        .player_mut(player)
        .ok_or(WorldError::PlayerNotFound(player))?
        .spend(cost)?;
    changes.push(ResourcesSpentChange {
        player,
        amounts: cost.clone(),
    });
    Ok(())
}

/// Credit `amounts` back to a player and record it.
pub fn refund(
    state: &mut WorldState,
    player: PlayerId,
    amounts: &Cost,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    state
        .player_mut(player)
        .ok_or(WorldError::PlayerNotFound(player))?
        .credit(amounts)?;
    changes.push(ResourcesRefundedChange {
        player,
        amounts: amounts.clone(),
    });
    Ok(())
}

/// Record a building's current garrison.
pub fn garrison_changed(building: &Building) -> GarrisonChangedChange {
    GarrisonChangedChange {
        building: building.id,
        units: building.garrison.clone(),
        villagers: building.villager_garrison,
    }
}

/// The observer-facing activity of a task.
pub const fn activity(task: VillagerTask) -> VillagerActivity {
    match task {
        VillagerTask::Idle => VillagerActivity::Idle,
        VillagerTask::Moving => VillagerActivity::Moving,
        VillagerTask::Gathering(_) => VillagerActivity::Gathering,
        VillagerTask::Hunting(_) => VillagerActivity::Hunting,
        VillagerTask::Building(_) => VillagerActivity::Building,
        VillagerTask::Upgrading(_) => VillagerActivity::Upgrading,
    }
}

/// Give a group a new task and path, and record the change.
pub fn set_task(
    state: &mut WorldState,
    group: VillagerGroupId,
    task: VillagerTask,
    path: Option<MovementPath>,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    let g = state
        .villager_group_mut(group)
        .ok_or(WorldError::VillagerGroupNotFound(group))?;
    g.task = task;
    g.path = path;
    changes.push(VillagerTaskChangedChange {
        group,
        activity: activity(task),
    });
    Ok(())
}

/// What a group was doing before [`release_task`] freed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// The group had no work.
    Nothing,
    /// The group stopped gathering for its owner.
    Gathering(PlayerId),
    /// The group left a building it was walking to before arriving.
    AbandonedSite(BuildingId),
    /// The group stopped working on a building.
    LeftSite(BuildingId),
}

/// Detach a group from its current work without giving it a new task.
///
/// Gatherers are removed from their resource point; the economy is told
/// only when `notify_economy` is set, because gather commands re-register
/// the group themselves. Builders that had arrived are subtracted from
/// their building.
pub fn release_task(
    state: &mut WorldState,
    economy: &mut dyn EconomyHooks,
    group: VillagerGroupId,
    notify_economy: bool,
    changes: &mut ChangeLogBuilder,
) -> Result<Released, CommandFailure> {
    let g = state
        .villager_group(group)
        .ok_or(WorldError::VillagerGroupNotFound(group))?;
    let (task, headcount, owner) = (g.task, g.headcount, g.owner);
    let en_route = g.path.as_ref().is_some_and(|p| !p.is_complete());

    if let Some(resource) = task.resource() {
        if let Some(point) = state.resource_point_mut(resource) {
            point.assigned.remove(&group);
        }
        if notify_economy {
            economy.stop_gathering(group);
        }
        changes.push(GatheringStoppedChange { group, resource });
        return Ok(owner.map_or(Released::Nothing, Released::Gathering));
    }

    if let Some(building) = task.building() {
        if en_route {
            return Ok(Released::AbandonedSite(building));
        }
        if let Some(b) = state.building_mut(building) {
            b.builders = b.builders.saturating_sub(headcount);
        }
        return Ok(Released::LeftSite(building));
    }

    Ok(Released::Nothing)
}
