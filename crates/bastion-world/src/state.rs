//! The authoritative world state.
//!
//! [`WorldState`] is an arena of entities keyed by identifier plus the
//! terrain grid and the simulation clock. Entities are registered exactly
//! once and never removed: death and destruction are state transitions.
//! Arena maps are `BTreeMap`s so that every query iterates in identifier
//! order and is deterministic.

use std::collections::BTreeMap;

use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, ResourcePointId, VillagerGroupId};
use serde::{Deserialize, Serialize};

use crate::army::Army;
use crate::building::Building;
use crate::error::WorldError;
use crate::map::GameMap;
use crate::player::Player;
use crate::resource::ResourcePoint;
use crate::villager::VillagerGroup;

/// Whether two owners are hostile to each other.
///
/// Different owners are hostile. A neutral (`None`) entity is hostile to
/// every player but not to another neutral entity.
pub fn are_hostile(a: Option<PlayerId>, b: Option<PlayerId>) -> bool {
    a != b
}

/// Complete mutable world snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    /// Terrain grid.
    pub map: GameMap,
    /// Simulation clock in ticks.
    pub current_time: u64,
    players: BTreeMap<PlayerId, Player>,
    buildings: BTreeMap<BuildingId, Building>,
    armies: BTreeMap<ArmyId, Army>,
    villagers: BTreeMap<VillagerGroupId, VillagerGroup>,
    resources: BTreeMap<ResourcePointId, ResourcePoint>,
}

impl WorldState {
    /// Create an empty world on the given map at tick 0.
    pub const fn new(map: GameMap) -> Self {
        Self {
            map,
            current_time: 0,
            players: BTreeMap::new(),
            buildings: BTreeMap::new(),
            armies: BTreeMap::new(),
            villagers: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Advance the clock.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if the clock would wrap.
    pub fn advance_time(&mut self, ticks: u64) -> Result<u64, WorldError> {
        self.current_time = self
            .current_time
            .checked_add(ticks)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(self.current_time)
    }

    // -------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------

    /// Register a player.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicatePlayer`] if the id is taken.
    pub fn add_player(&mut self, player: Player) -> Result<(), WorldError> {
        if self.players.contains_key(&player.id) {
            return Err(WorldError::DuplicatePlayer(player.id));
        }
        self.players.insert(player.id, player);
        Ok(())
    }

    /// Register a building.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateBuilding`] if the id is taken.
    pub fn add_building(&mut self, building: Building) -> Result<(), WorldError> {
        if self.buildings.contains_key(&building.id) {
            return Err(WorldError::DuplicateBuilding(building.id));
        }
        self.buildings.insert(building.id, building);
        Ok(())
    }

    /// Register an army.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateArmy`] if the id is taken.
    pub fn add_army(&mut self, army: Army) -> Result<(), WorldError> {
        if self.armies.contains_key(&army.id) {
            return Err(WorldError::DuplicateArmy(army.id));
        }
        self.armies.insert(army.id, army);
        Ok(())
    }

    /// Register a villager group.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateVillagerGroup`] if the id is taken.
    pub fn add_villager_group(&mut self, group: VillagerGroup) -> Result<(), WorldError> {
        if self.villagers.contains_key(&group.id) {
            return Err(WorldError::DuplicateVillagerGroup(group.id));
        }
        self.villagers.insert(group.id, group);
        Ok(())
    }

    /// Register a resource point.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateResourcePoint`] if the id is taken.
    pub fn add_resource_point(&mut self, point: ResourcePoint) -> Result<(), WorldError> {
        if self.resources.contains_key(&point.id) {
            return Err(WorldError::DuplicateResourcePoint(point.id));
        }
        self.resources.insert(point.id, point);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Look up a player mutably.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Look up a building.
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Look up a building mutably.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.get_mut(&id)
    }

    /// Look up an army.
    pub fn army(&self, id: ArmyId) -> Option<&Army> {
        self.armies.get(&id)
    }

    /// Look up an army mutably.
    pub fn army_mut(&mut self, id: ArmyId) -> Option<&mut Army> {
        self.armies.get_mut(&id)
    }

    /// Look up a villager group.
    pub fn villager_group(&self, id: VillagerGroupId) -> Option<&VillagerGroup> {
        self.villagers.get(&id)
    }

    /// Look up a villager group mutably.
    pub fn villager_group_mut(&mut self, id: VillagerGroupId) -> Option<&mut VillagerGroup> {
        self.villagers.get_mut(&id)
    }

    /// Look up a resource point.
    pub fn resource_point(&self, id: ResourcePointId) -> Option<&ResourcePoint> {
        self.resources.get(&id)
    }

    /// Look up a resource point mutably.
    pub fn resource_point_mut(&mut self, id: ResourcePointId) -> Option<&mut ResourcePoint> {
        self.resources.get_mut(&id)
    }

    // -------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------

    /// All players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// All buildings in id order, destroyed ones included.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// All buildings mutably.
    pub fn buildings_mut(&mut self) -> impl Iterator<Item = &mut Building> {
        self.buildings.values_mut()
    }

    /// All armies in id order, dead ones included.
    pub fn armies(&self) -> impl Iterator<Item = &Army> {
        self.armies.values()
    }

    /// All armies mutably.
    pub fn armies_mut(&mut self) -> impl Iterator<Item = &mut Army> {
        self.armies.values_mut()
    }

    /// All villager groups in id order.
    pub fn villager_groups(&self) -> impl Iterator<Item = &VillagerGroup> {
        self.villagers.values()
    }

    /// All villager groups mutably.
    pub fn villager_groups_mut(&mut self) -> impl Iterator<Item = &mut VillagerGroup> {
        self.villagers.values_mut()
    }

    /// All resource points in id order.
    pub fn resource_points(&self) -> impl Iterator<Item = &ResourcePoint> {
        self.resources.values()
    }

    // -------------------------------------------------------------------
    // Spatial queries
    // -------------------------------------------------------------------

    /// The standing building whose footprint covers `hex`.
    pub fn building_at(&self, hex: Hex) -> Option<&Building> {
        self.buildings
            .values()
            .find(|b| b.is_standing() && b.occupies(hex))
    }

    /// Live armies on `hex`.
    pub fn armies_at(&self, hex: Hex) -> impl Iterator<Item = &Army> {
        self.armies
            .values()
            .filter(move |a| a.position == hex && a.is_alive())
    }

    /// Villager groups with members on `hex`.
    pub fn villagers_at(&self, hex: Hex) -> impl Iterator<Item = &VillagerGroup> {
        self.villagers
            .values()
            .filter(move |g| g.position == hex && g.is_present())
    }

    /// Whether `hex` is on the map, has walkable terrain, and is not covered
    /// by a standing building.
    pub fn is_walkable(&self, hex: Hex) -> bool {
        self.map.is_walkable_terrain(hex) && self.building_at(hex).is_none()
    }

    /// Whether a live army hostile to `player` stands on `hex`.
    pub fn has_hostile_army(&self, hex: Hex, player: Option<PlayerId>) -> bool {
        self.armies_at(hex).any(|a| are_hostile(a.owner, player))
    }

    /// Operational base buildings owned by `player`, nearest to `from`
    /// first. Ties keep id order.
    pub fn bases_by_distance(&self, player: PlayerId, from: Hex) -> Vec<&Building> {
        let mut bases: Vec<&Building> = self
            .buildings
            .values()
            .filter(|b| b.is_owned_by(player) && b.is_operational() && b.spec().is_base)
            .collect();
        bases.sort_by_key(|b| b.distance_to(from));
        bases
    }
}
