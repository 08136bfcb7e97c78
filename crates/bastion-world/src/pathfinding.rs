//! The map and pathfinding collaborator.
//!
//! Commands never route on their own: they ask a [`Pathfinder`] for a path
//! and treat `None` as a documented, recoverable outcome. [`HexPathfinder`]
//! is the default implementation, an A* search over walkable hexes with
//! uniform step cost and hex distance as the heuristic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use bastion_types::{Hex, PlayerId, Terrain};

use crate::state::WorldState;

/// Routing and map queries consumed by commands.
pub trait Pathfinder {
    /// Find a path from `from` to `to` for `player`.
    ///
    /// The returned path excludes `from` and ends at `to`; an empty path
    /// means `from == to`. When `allow_impassable_destination` is set, the
    /// destination itself may be blocked (occupied by a building or hostile
    /// army) as long as it lies on the map.
    fn find_path(
        &self,
        from: Hex,
        to: Hex,
        player: Option<PlayerId>,
        state: &WorldState,
        allow_impassable_destination: bool,
    ) -> Option<Vec<Hex>>;

    /// The passable coordinate nearest to `origin` within `radius`.
    fn find_nearest_walkable(
        &self,
        origin: Hex,
        radius: u32,
        player: Option<PlayerId>,
        state: &WorldState,
    ) -> Option<Hex>;

    /// Whether `hex` lies on the map.
    fn is_valid_coordinate(&self, hex: Hex, state: &WorldState) -> bool {
        state.map.is_valid_coordinate(hex)
    }

    /// Whether `hex` can be stood on: walkable terrain, no standing building.
    fn is_walkable(&self, hex: Hex, state: &WorldState) -> bool {
        state.is_walkable(hex)
    }

    /// Terrain at `hex`.
    fn terrain(&self, hex: Hex, state: &WorldState) -> Option<Terrain> {
        state.map.terrain(hex)
    }
}

/// Whether `player` may step onto `hex` while routing.
fn is_passable(hex: Hex, player: Option<PlayerId>, state: &WorldState) -> bool {
    state.is_walkable(hex) && !state.has_hostile_army(hex, player)
}

/// Default A* pathfinder over the hex grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexPathfinder;

impl Pathfinder for HexPathfinder {
    fn find_path(
        &self,
        from: Hex,
        to: Hex,
        player: Option<PlayerId>,
        state: &WorldState,
        allow_impassable_destination: bool,
    ) -> Option<Vec<Hex>> {
        if !state.map.is_valid_coordinate(from) || !state.map.is_valid_coordinate(to) {
            return None;
        }
        if from == to {
            return Some(Vec::new());
        }
        if !allow_impassable_destination && !is_passable(to, player, state) {
            return None;
        }

        let mut open = BinaryHeap::new();
        let mut came_from: BTreeMap<Hex, Hex> = BTreeMap::new();
        let mut g_score: BTreeMap<Hex, u32> = BTreeMap::new();
        let mut closed: BTreeSet<Hex> = BTreeSet::new();

        g_score.insert(from, 0);
        open.push(Node {
            hex: from,
            cost: 0,
            priority: from.distance(to),
        });

        while let Some(Node { hex: current, cost, .. }) = open.pop() {
            if !closed.insert(current) {
                continue;
            }
            if current == to {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(&prev) = came_from.get(&cursor) {
                    if prev == from {
                        break;
                    }
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }

            for neighbor in current.neighbors() {
                if closed.contains(&neighbor) {
                    continue;
                }
                let enterable = if neighbor == to {
                    allow_impassable_destination || is_passable(neighbor, player, state)
                } else {
                    is_passable(neighbor, player, state)
                };
                if !enterable {
                    continue;
                }
                let tentative = cost.saturating_add(1);
                if tentative < g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative);
                    open.push(Node {
                        hex: neighbor,
                        cost: tentative,
                        priority: tentative.saturating_add(neighbor.distance(to)),
                    });
                }
            }
        }

        None
    }

    fn find_nearest_walkable(
        &self,
        origin: Hex,
        radius: u32,
        player: Option<PlayerId>,
        state: &WorldState,
    ) -> Option<Hex> {
        origin
            .within(radius)
            .into_iter()
            .filter(|hex| is_passable(*hex, player, state))
            .min_by_key(|hex| (origin.distance(*hex), *hex))
    }
}

/// Priority-queue entry. Ordered so that the heap pops the lowest
/// priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    hex: Hex,
    cost: u32,
    priority: u32,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.hex.cmp(&self.hex))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{ArmyId, BuildingId, BuildingType, Rotation, UnitType};

    use super::*;
    use crate::army::Army;
    use crate::building::Building;
    use crate::composition::Composition;
    use crate::map::GameMap;

    fn open_world() -> WorldState {
        WorldState::new(GameMap::filled(10, 10, Terrain::Grass).unwrap())
    }

    #[test]
    fn straight_path_excludes_start() {
        let w = open_world();
        let path = HexPathfinder
            .find_path(Hex::new(0, 0), Hex::new(3, 0), None, &w, false)
            .unwrap();
        assert_eq!(path, vec![Hex::new(1, 0), Hex::new(2, 0), Hex::new(3, 0)]);
    }

    #[test]
    fn same_tile_is_empty_path() {
        let w = open_world();
        let path = HexPathfinder.find_path(Hex::new(2, 2), Hex::new(2, 2), None, &w, false);
        assert_eq!(path, Some(Vec::new()));
    }

    #[test]
    fn routes_around_water() {
        let mut w = open_world();
        w.map.set_terrain(Hex::new(1, 0), Terrain::Water).unwrap();
        let path = HexPathfinder
            .find_path(Hex::new(0, 0), Hex::new(2, 0), None, &w, false)
            .unwrap();
        assert!(!path.contains(&Hex::new(1, 0)));
        assert_eq!(path.last(), Some(&Hex::new(2, 0)));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn blocked_destination_needs_permission() {
        let mut w = open_world();
        w.add_building(Building::completed(
            BuildingId::new(),
            None,
            BuildingType::House,
            Hex::new(3, 3),
            Rotation::East,
        ))
        .unwrap();
        let from = Hex::new(0, 3);
        assert!(HexPathfinder.find_path(from, Hex::new(3, 3), None, &w, false).is_none());
        let path = HexPathfinder.find_path(from, Hex::new(3, 3), None, &w, true).unwrap();
        assert_eq!(path.last(), Some(&Hex::new(3, 3)));
    }

    #[test]
    fn hostile_armies_block_routing() {
        let mut w = open_world();
        let me = Some(PlayerId::new());
        w.add_army(Army::new(
            ArmyId::new(),
            Some(PlayerId::new()),
            Hex::new(5, 5),
            Composition::from([(UnitType::Swordsman, 1)]),
        ))
        .unwrap();
        assert!(HexPathfinder.find_path(Hex::new(3, 5), Hex::new(5, 5), me, &w, false).is_none());
        assert!(HexPathfinder.find_path(Hex::new(3, 5), Hex::new(5, 5), me, &w, true).is_some());
    }

    #[test]
    fn nearest_walkable_skips_blocked_origin() {
        let mut w = open_world();
        w.map.set_terrain(Hex::new(4, 4), Terrain::Mountain).unwrap();
        let found = HexPathfinder.find_nearest_walkable(Hex::new(4, 4), 1, None, &w).unwrap();
        assert_eq!(Hex::new(4, 4).distance(found), 1);
        assert!(HexPathfinder.find_nearest_walkable(Hex::new(4, 4), 0, None, &w).is_none());
    }
}
