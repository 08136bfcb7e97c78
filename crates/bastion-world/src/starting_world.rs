//! Default starting world for the Bastion simulation.
//!
//! Generates seeded terrain, then places up to four players in the map
//! corners. Each player starts with a town center, a villager group, a
//! small army homed at the town center, and a grove and berry bush nearby.
//! Neutral deer and a gold mine sit in the middle of the map.

use bastion_types::{
    ArmyId, BuildingId, BuildingType, Hex, PlayerId, ResourcePointId, ResourcePointKind,
    ResourceType, Rotation, Terrain, UnitType, VillagerGroupId,
};

use crate::army::{Army, Commander};
use crate::building::Building;
use crate::composition::Composition;
use crate::error::WorldError;
use crate::map::GameMap;
use crate::player::Player;
use crate::resource::ResourcePoint;
use crate::state::WorldState;
use crate::villager::VillagerGroup;

/// Smallest map edge that fits four start corners.
pub const MIN_STARTING_DIMENSION: u32 = 16;

/// Margin between a start anchor and the map edge.
const CORNER_MARGIN: i32 = 4;

/// Radius of grass cleared around each start anchor.
const CLEARING_RADIUS: u32 = 3;

/// Identifiers of one player's starting entities.
#[derive(Debug, Clone)]
pub struct StartingPlayer {
    /// The player.
    pub player: PlayerId,
    /// Their town center.
    pub town_center: BuildingId,
    /// Their villager group.
    pub villagers: VillagerGroupId,
    /// Their army.
    pub army: ArmyId,
    /// Their grove.
    pub grove: ResourcePointId,
    /// Their berry bush.
    pub berries: ResourcePointId,
}

/// Identifiers for everything placed in the starting world.
#[derive(Debug, Clone)]
pub struct StartingIds {
    /// Per-player entities, in the order the names were given.
    pub players: Vec<StartingPlayer>,
    /// Neutral deer herd in the map center.
    pub deer: ResourcePointId,
    /// Neutral gold mine in the map center.
    pub gold_mine: ResourcePointId,
}

fn corner_anchors(width: u32, height: u32) -> [Hex; 4] {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let h = i32::try_from(height).unwrap_or(i32::MAX);
    let far_q = w.saturating_sub(CORNER_MARGIN).saturating_sub(1);
    let far_r = h.saturating_sub(CORNER_MARGIN).saturating_sub(1);
    [
        Hex::new(CORNER_MARGIN, CORNER_MARGIN),
        Hex::new(far_q, far_r),
        Hex::new(far_q, CORNER_MARGIN),
        Hex::new(CORNER_MARGIN, far_r),
    ]
}

fn clear(map: &mut GameMap, center: Hex, radius: u32) -> Result<(), WorldError> {
    for hex in center.within(radius) {
        if map.is_valid_coordinate(hex) {
            map.set_terrain(hex, Terrain::Grass)?;
        }
    }
    Ok(())
}

/// Create the starting world for the given player names.
///
/// # Errors
///
/// Returns [`WorldError::TooManyPlayers`] for more than four players and
/// [`WorldError::InvalidDimensions`] for maps smaller than
/// [`MIN_STARTING_DIMENSION`].
pub fn create_starting_world(
    width: u32,
    height: u32,
    seed: u64,
    names: &[&str],
) -> Result<(WorldState, StartingIds), WorldError> {
    let anchors = corner_anchors(width, height);
    if names.len() > anchors.len() {
        return Err(WorldError::TooManyPlayers {
            requested: names.len(),
            max: anchors.len(),
        });
    }
    if width < MIN_STARTING_DIMENSION || height < MIN_STARTING_DIMENSION {
        return Err(WorldError::InvalidDimensions { width, height });
    }

    let mut map = GameMap::generate(width, height, seed)?;
    let center = Hex::new(
        i32::try_from(width / 2).unwrap_or(0),
        i32::try_from(height / 2).unwrap_or(0),
    );
    for anchor in anchors.iter().take(names.len()) {
        clear(&mut map, *anchor, CLEARING_RADIUS)?;
    }
    clear(&mut map, center, 1)?;

    let mut state = WorldState::new(map);
    let mut players = Vec::with_capacity(names.len());

    for (name, anchor) in names.iter().zip(anchors) {
        let mut player = Player::new(PlayerId::new(), *name);
        player.resources.insert(ResourceType::Food, 200);
        player.resources.insert(ResourceType::Wood, 200);
        player.resources.insert(ResourceType::Stone, 100);
        player.resources.insert(ResourceType::Gold, 100);

        let tc = Building::completed(
            BuildingId::new(),
            Some(player.id),
            BuildingType::TownCenter,
            anchor,
            Rotation::East,
        );
        player.population_cap = tc.spec().population_capacity;

        // South-west of the anchor is never part of an east-facing footprint.
        let toward = Rotation::SouthWest;
        let villagers = VillagerGroup::new(
            VillagerGroupId::new(),
            Some(player.id),
            anchor.step(toward),
            5,
        );

        let mut army = Army::new(
            ArmyId::new(),
            Some(player.id),
            anchor.step(toward).step(toward),
            Composition::from([(UnitType::Swordsman, 4), (UnitType::Archer, 2)]),
        );
        army.home_base = Some(tc.id);
        army.commander = Some(Commander {
            name: format!("{name}'s marshal"),
            stamina: 100,
            max_stamina: 100,
        });
        player.population_used = 6;

        let grove = ResourcePoint::new(
            ResourcePointId::new(),
            ResourcePointKind::Grove,
            anchor.step(Rotation::West).step(Rotation::West),
            500,
        );
        let berries = ResourcePoint::new(
            ResourcePointId::new(),
            ResourcePointKind::BerryBush,
            anchor.step(Rotation::SouthEast).step(Rotation::SouthEast),
            300,
        );

        players.push(StartingPlayer {
            player: player.id,
            town_center: tc.id,
            villagers: villagers.id,
            army: army.id,
            grove: grove.id,
            berries: berries.id,
        });

        state.add_player(player)?;
        state.add_building(tc)?;
        state.add_villager_group(villagers)?;
        state.add_army(army)?;
        state.add_resource_point(grove)?;
        state.add_resource_point(berries)?;
    }

    let deer = ResourcePoint::new(ResourcePointId::new(), ResourcePointKind::Deer, center, 200);
    let gold_mine = ResourcePoint::new(
        ResourcePointId::new(),
        ResourcePointKind::GoldMine,
        center.step(Rotation::East),
        800,
    );
    let ids = StartingIds {
        players,
        deer: deer.id,
        gold_mine: gold_mine.id,
    };
    state.add_resource_point(deer)?;
    state.add_resource_point(gold_mine)?;

    Ok((state, ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_player_world_is_populated() {
        let result = create_starting_world(32, 32, 11, &["Ada", "Brutus"]);
        assert!(result.is_ok());
        if let Ok((state, ids)) = result {
            assert_eq!(state.players().count(), 2);
            assert_eq!(state.buildings().count(), 2);
            assert_eq!(state.armies().count(), 2);
            assert_eq!(state.resource_points().count(), 6);
            for start in &ids.players {
                let army = state.army(start.army);
                assert_eq!(army.and_then(|a| a.home_base), Some(start.town_center));
                let tc = state.building(start.town_center);
                assert!(tc.is_some_and(|b| b.is_operational()));
            }
        }
    }

    #[test]
    fn starting_units_stand_on_walkable_tiles() {
        let result = create_starting_world(24, 24, 3, &["A", "B", "C", "D"]);
        assert!(result.is_ok());
        if let Ok((state, _)) = result {
            for army in state.armies() {
                assert!(state.is_walkable(army.position), "army on {}", army.position);
            }
            for group in state.villager_groups() {
                assert!(state.is_walkable(group.position), "villagers on {}", group.position);
            }
        }
    }

    #[test]
    fn five_players_rejected() {
        let result = create_starting_world(32, 32, 1, &["A", "B", "C", "D", "E"]);
        assert!(matches!(result, Err(WorldError::TooManyPlayers { requested: 5, max: 4 })));
    }

    #[test]
    fn small_map_rejected() {
        let result = create_starting_world(8, 8, 1, &["A"]);
        assert!(matches!(result, Err(WorldError::InvalidDimensions { .. })));
    }
}
