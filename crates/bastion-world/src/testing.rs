//! Fixture builder for assembling small worlds in tests.
//!
//! ```text
//! let mut b = WorldBuilder::grass(12, 12)?;
//! let alice = b.player("Alice");
//! b.resource(alice, ResourceType::Wood, 40);
//! let army = b.army(Some(alice), Hex::new(2, 2), &[(UnitType::Swordsman, 5)]);
//! let state = b.build()?;
//! ```

use bastion_types::{
    ArmyId, BuildingId, BuildingState, BuildingType, Hex, PlayerId, ResourcePointId,
    ResourcePointKind, ResourceType, Rotation, Terrain, UnitType, VillagerGroupId,
};

use crate::army::{Army, Commander, Entrenchment};
use crate::building::Building;
use crate::composition::Composition;
use crate::error::WorldError;
use crate::map::GameMap;
use crate::player::Player;
use crate::resource::ResourcePoint;
use crate::state::WorldState;
use crate::villager::VillagerGroup;

/// Population cap given to fixture players.
pub const FIXTURE_POPULATION_CAP: u32 = 50;

/// Incrementally builds a [`WorldState`]. Errors are collected and the
/// first one is reported by [`WorldBuilder::build`].
#[derive(Debug)]
pub struct WorldBuilder {
    state: WorldState,
    errors: Vec<WorldError>,
}

fn units(entries: &[(UnitType, u32)]) -> Composition {
    entries.iter().copied().filter(|(_, n)| *n > 0).collect()
}

impl WorldBuilder {
    /// Start from an existing map.
    pub const fn new(map: GameMap) -> Self {
        Self {
            state: WorldState::new(map),
            errors: Vec::new(),
        }
    }

    /// Start from an all-grass map.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] for invalid dimensions.
    pub fn grass(width: u32, height: u32) -> Result<Self, WorldError> {
        Ok(Self::new(GameMap::filled(width, height, Terrain::Grass)?))
    }

    fn record(&mut self, result: Result<(), WorldError>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    /// Set the simulation clock.
    pub const fn time(&mut self, tick: u64) -> &mut Self {
        self.state.current_time = tick;
        self
    }

    /// Overwrite one tile's terrain.
    pub fn terrain(&mut self, hex: Hex, terrain: Terrain) -> &mut Self {
        let result = self.state.map.set_terrain(hex, terrain);
        self.record(result);
        self
    }

    /// Add a player with an empty treasury.
    pub fn player(&mut self, name: &str) -> PlayerId {
        let mut player = Player::new(PlayerId::new(), name);
        player.population_cap = FIXTURE_POPULATION_CAP;
        let id = player.id;
        let result = self.state.add_player(player);
        self.record(result);
        id
    }

    /// Set one resource balance of a player.
    pub fn resource(&mut self, player: PlayerId, resource: ResourceType, amount: u64) -> &mut Self {
        match self.state.player_mut(player) {
            Some(p) => {
                p.resources.insert(resource, amount);
            }
            None => self.errors.push(WorldError::PlayerNotFound(player)),
        }
        self
    }

    /// Add a completed, east-facing building.
    pub fn building(&mut self, owner: Option<PlayerId>, building_type: BuildingType, at: Hex) -> BuildingId {
        self.building_in_state(owner, building_type, at, BuildingState::Completed)
    }

    /// Add an east-facing building in the given lifecycle state.
    pub fn building_in_state(
        &mut self,
        owner: Option<PlayerId>,
        building_type: BuildingType,
        at: Hex,
        state: BuildingState,
    ) -> BuildingId {
        let mut building = Building::completed(BuildingId::new(), owner, building_type, at, Rotation::East);
        building.state = state;
        let id = building.id;
        let result = self.state.add_building(building);
        self.record(result);
        id
    }

    /// Put units and villagers into a building's garrison.
    pub fn garrison(&mut self, building: BuildingId, entries: &[(UnitType, u32)], villagers: u32) -> &mut Self {
        match self.state.building_mut(building) {
            Some(b) => {
                b.garrison = units(entries);
                b.villager_garrison = villagers;
            }
            None => self.errors.push(WorldError::BuildingNotFound(building)),
        }
        self
    }

    /// Add a mobile army with no orders.
    pub fn army(&mut self, owner: Option<PlayerId>, at: Hex, entries: &[(UnitType, u32)]) -> ArmyId {
        let army = Army::new(ArmyId::new(), owner, at, units(entries));
        let id = army.id;
        let result = self.state.add_army(army);
        self.record(result);
        id
    }

    fn with_army(&mut self, army: ArmyId, f: impl FnOnce(&mut Army)) -> &mut Self {
        match self.state.army_mut(army) {
            Some(a) => f(a),
            None => self.errors.push(WorldError::ArmyNotFound(army)),
        }
        self
    }

    /// Mark an army as fully entrenched since `since`.
    pub fn entrenched(&mut self, army: ArmyId, since: u64) -> &mut Self {
        self.with_army(army, |a| a.entrenchment = Entrenchment::Entrenched { since })
    }

    /// Mark an army as entrenching since `since`.
    pub fn entrenching(&mut self, army: ArmyId, since: u64) -> &mut Self {
        self.with_army(army, |a| a.entrenchment = Entrenchment::Entrenching { since })
    }

    /// Give an army a commander with the given stamina.
    pub fn commander(&mut self, army: ArmyId, stamina: u32) -> &mut Self {
        self.with_army(army, |a| {
            a.commander = Some(Commander {
                name: String::from("Marshal"),
                stamina,
                max_stamina: stamina.max(100),
            });
        })
    }

    /// Register an army's home base.
    pub fn home_base(&mut self, army: ArmyId, building: BuildingId) -> &mut Self {
        self.with_army(army, |a| a.home_base = Some(building))
    }

    /// Flag an army as in combat without opening a session.
    pub fn in_combat(&mut self, army: ArmyId) -> &mut Self {
        self.with_army(army, |a| a.in_combat = true)
    }

    /// Add an idle villager group.
    pub fn villagers(&mut self, owner: Option<PlayerId>, at: Hex, headcount: u32) -> VillagerGroupId {
        let group = VillagerGroup::new(VillagerGroupId::new(), owner, at, headcount);
        let id = group.id;
        let result = self.state.add_villager_group(group);
        self.record(result);
        id
    }

    /// Add a resource point.
    pub fn resource_point(&mut self, kind: ResourcePointKind, at: Hex, remaining: u64) -> ResourcePointId {
        let point = ResourcePoint::new(ResourcePointId::new(), kind, at, remaining);
        let id = point.id;
        let result = self.state.add_resource_point(point);
        self.record(result);
        id
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building.
    pub fn build(self) -> Result<WorldState, WorldError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(self.state),
        }
    }
}
