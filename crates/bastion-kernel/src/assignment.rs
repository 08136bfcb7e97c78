//! Worker resolution for construction and upgrades.
//!
//! A designated group is always used, pre-empting whatever it was doing.
//! Otherwise the idle owned group nearest to the site is picked, the first
//! one in id order winning ties. A group within one tile of the footprint
//! starts work at once; a farther group is dispatched along a path and the
//! building waits for it. When no group exists or none can reach the site,
//! work still starts with the configured fallback builder count.

use bastion_events::{BuilderDispatchedChange, ChangeLogBuilder, ConstructionStartedChange, UpgradeStartedChange};
use bastion_types::{BuildingId, BuildingState, Hex, PlayerId, VillagerGroupId};
use bastion_world::{Building, MovementPath, Pathfinder, VillagerTask, WorldError, WorldState, movement};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::effects::{self, Released};
use crate::error::CommandFailure;

/// How a site gets its workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerAssignment {
    /// The group is already at the site.
    OnSite(VillagerGroupId),
    /// The group walks to `destination` first.
    Dispatched {
        /// The group sent.
        group: VillagerGroupId,
        /// Tile next to the footprint the group walks to.
        destination: Hex,
        /// Steps to the destination, start excluded.
        path: Vec<Hex>,
    },
    /// Nobody can come; work starts with the fallback builder count.
    Fallback,
}

/// Tiles adjacent to a footprint, nearest to `from` first.
pub(crate) fn approach_tiles(footprint: &[Hex], from: Hex) -> Vec<Hex> {
    let mut tiles: Vec<Hex> = footprint
        .iter()
        .flat_map(|t| t.neighbors())
        .filter(|t| !footprint.contains(t))
        .collect();
    tiles.sort_by_key(|t| (from.distance(*t), *t));
    tiles.dedup();
    tiles
}

/// Decide who works on `building`.
pub fn resolve_worker(
    state: &WorldState,
    pathfinder: &dyn Pathfinder,
    player: PlayerId,
    designated: Option<VillagerGroupId>,
    building: &Building,
) -> WorkerAssignment {
    let candidate = match designated {
        Some(id) => state.villager_group(id),
        None => state
            .villager_groups()
            .filter(|g| g.is_owned_by(player) && g.is_present() && g.is_idle())
            .min_by_key(|g| building.distance_to(g.position)),
    };
    let Some(group) = candidate else {
        return WorkerAssignment::Fallback;
    };

    if building.distance_to(group.position) <= 1 {
        return WorkerAssignment::OnSite(group.id);
    }

    approach_tiles(&building.footprint, group.position)
        .into_iter()
        .find_map(|tile| {
            pathfinder
                .find_path(group.position, tile, Some(player), state, false)
                .map(|path| WorkerAssignment::Dispatched {
                    group: group.id,
                    destination: tile,
                    path,
                })
        })
        .unwrap_or(WorkerAssignment::Fallback)
}

/// Start construction or upgrade work on a building with `builders`
/// workers, recording the start.
///
/// Planning buildings move to Constructing; Upgrading buildings record the
/// start of the upgrade. Used on assignment and when dispatched builders
/// arrive.
pub fn begin_work(
    state: &mut WorldState,
    building: BuildingId,
    builders: u32,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    let now = state.current_time;
    let b = state
        .building_mut(building)
        .ok_or(WorldError::BuildingNotFound(building))?;
    b.builders = b.builders.saturating_add(builders);
    b.awaiting_builders = false;
    match b.state {
        BuildingState::Planning | BuildingState::Constructing => {
            b.state = BuildingState::Constructing;
            b.construction_started_at.get_or_insert(now);
            changes.push(ConstructionStartedChange {
                building,
                builders: b.builders,
                tick: now,
            });
        }
        BuildingState::Upgrading => {
            b.upgrade_started_at.get_or_insert(now);
            changes.push(UpgradeStartedChange {
                building,
                target_level: b.level.saturating_add(1),
                builders: b.builders,
                tick: now,
            });
        }
        BuildingState::Completed | BuildingState::Demolishing | BuildingState::Destroyed => {}
    }
    Ok(())
}

/// Resolve and apply the workforce for a freshly placed or upgrading
/// building. Never fails for lack of workers.
pub fn assign_workers(
    state: &mut WorldState,
    ctx: &mut ExecutionContext<'_>,
    player: PlayerId,
    building: BuildingId,
    designated: Option<VillagerGroupId>,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    let site = state
        .building(building)
        .ok_or(WorldError::BuildingNotFound(building))?;
    let task = if site.state == BuildingState::Upgrading {
        VillagerTask::Upgrading(building)
    } else {
        VillagerTask::Building(building)
    };
    let assignment = resolve_worker(state, ctx.pathfinder, player, designated, site);

    if let Some(id) = designated {
        let released = effects::release_task(state, ctx.economy, id, true, changes)?;
        after_release(state, ctx, released, changes)?;
    }

    match assignment {
        WorkerAssignment::OnSite(group) => {
            let headcount = state.villager_group(group).map_or(0, |g| g.headcount);
            effects::set_task(state, group, task, None, changes)?;
            begin_work(state, building, headcount, changes)
        }
        WorkerAssignment::Dispatched {
            group,
            destination,
            path,
        } => {
            let path_length = movement::path_length(&path);
            effects::set_task(state, group, task, Some(MovementPath::new(path)), changes)?;
            if let Some(b) = state.building_mut(building) {
                b.awaiting_builders = true;
            }
            changes.push(BuilderDispatchedChange {
                building,
                group,
                destination,
                path_length,
            });
            Ok(())
        }
        WorkerAssignment::Fallback => {
            debug!(%building, "No builder available, starting with fallback builders");
            begin_work(state, building, ctx.rules.fallback_builders, changes)
        }
    }
}

/// Follow-up after a group was pulled off its work: update the owner's
/// collection rates, or let a site whose builder never arrived start with
/// the fallback count instead of waiting forever.
pub fn after_release(
    state: &mut WorldState,
    ctx: &mut ExecutionContext<'_>,
    released: Released,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    match released {
        Released::Gathering(owner) => {
            ctx.economy.update_collection_rates(owner, state);
            Ok(())
        }
        Released::AbandonedSite(building) => {
            let still_waiting = state
                .building(building)
                .is_some_and(|b| b.awaiting_builders && b.builders == 0);
            let others_coming = state
                .villager_groups()
                .any(|g| g.task.building() == Some(building) && g.path.as_ref().is_some_and(|p| !p.is_complete()));
            if still_waiting && !others_coming {
                begin_work(state, building, ctx.rules.fallback_builders, changes)?;
            }
            Ok(())
        }
        Released::LeftSite(_) | Released::Nothing => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{BuildingType, Terrain};
    use bastion_world::{HexPathfinder, WorldBuilder};

    use super::*;

    fn site(state: &WorldState) -> &Building {
        state.buildings().next().unwrap()
    }

    #[test]
    fn nearest_idle_group_is_chosen() {
        let mut b = WorldBuilder::grass(12, 12).unwrap();
        let p = b.player("A");
        b.building_in_state(Some(p), BuildingType::House, Hex::new(5, 5), BuildingState::Planning);
        let far = b.villagers(Some(p), Hex::new(0, 0), 3);
        let near = b.villagers(Some(p), Hex::new(8, 5), 3);
        let state = b.build().unwrap();

        let dispatched = match resolve_worker(&state, &HexPathfinder, p, None, site(&state)) {
            WorkerAssignment::Dispatched { group, destination, path } => Some((group, destination, path)),
            _ => None,
        };
        let (group, destination, path) = dispatched.unwrap();
        assert_eq!(group, near);
        assert_ne!(group, far);
        assert_eq!(destination.distance(Hex::new(5, 5)), 1);
        assert_eq!(path.last(), Some(&destination));
    }

    #[test]
    fn adjacent_group_is_on_site() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        b.building_in_state(Some(p), BuildingType::House, Hex::new(3, 3), BuildingState::Planning);
        let g = b.villagers(Some(p), Hex::new(4, 3), 2);
        let state = b.build().unwrap();
        assert_eq!(
            resolve_worker(&state, &HexPathfinder, p, None, site(&state)),
            WorkerAssignment::OnSite(g)
        );
    }

    #[test]
    fn unreachable_group_falls_back() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        b.building_in_state(Some(p), BuildingType::House, Hex::new(5, 5), BuildingState::Planning);
        b.villagers(Some(p), Hex::new(0, 0), 2);
        for hex in Hex::new(0, 0).neighbors() {
            b.terrain(hex, Terrain::Water);
        }
        let state = b.build().unwrap();
        assert_eq!(
            resolve_worker(&state, &HexPathfinder, p, None, site(&state)),
            WorkerAssignment::Fallback
        );
    }

    #[test]
    fn busy_groups_are_not_candidates() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        b.building_in_state(Some(p), BuildingType::House, Hex::new(3, 3), BuildingState::Planning);
        let g = b.villagers(Some(p), Hex::new(4, 3), 2);
        let mut state = b.build().unwrap();
        state.villager_group_mut(g).unwrap().task = VillagerTask::Moving;
        assert_eq!(
            resolve_worker(&state, &HexPathfinder, p, None, site(&state)),
            WorkerAssignment::Fallback
        );
        assert_eq!(
            resolve_worker(&state, &HexPathfinder, p, Some(g), site(&state)),
            WorkerAssignment::OnSite(g)
        );
    }
}
