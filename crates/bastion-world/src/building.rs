//! Buildings: footprint, lifecycle, garrison, and training queue.

use bastion_types::{BuildingId, BuildingState, BuildingType, Hex, PlayerId, Rotation, UnitType};
use serde::{Deserialize, Serialize};

use crate::blueprint::{self, BuildingSpec};
use crate::composition::{self, Composition};

/// One batch of units waiting in a training queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingBatch {
    /// Unit type being trained.
    pub unit: UnitType,
    /// Number of units in the batch.
    pub count: u32,
    /// Tick the batch was queued.
    pub queued_at: u64,
    /// Tick the batch completes.
    pub completes_at: u64,
}

/// A building placed on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Unique identifier.
    pub id: BuildingId,
    /// Owning player. `None` for neutral buildings.
    pub owner: Option<PlayerId>,
    /// Building type.
    pub building_type: BuildingType,
    /// Anchor coordinate of the footprint.
    pub position: Hex,
    /// Footprint rotation.
    pub rotation: Rotation,
    /// All coordinates the building covers. The anchor is first.
    pub footprint: Vec<Hex>,
    /// Lifecycle phase.
    pub state: BuildingState,
    /// Current level, starting at 1.
    pub level: u32,
    /// Units stored inside.
    pub garrison: Composition,
    /// Villagers sheltering inside.
    pub villager_garrison: u32,
    /// Pending training batches in completion order.
    pub training_queue: Vec<TrainingBatch>,
    /// Builders currently contributing to construction or upgrade.
    pub builders: u32,
    /// Whether construction or upgrade waits for a dispatched builder.
    pub awaiting_builders: bool,
    /// Tick the building was placed.
    pub placed_at: u64,
    /// Tick construction started, once builders are on site.
    pub construction_started_at: Option<u64>,
    /// Tick the current upgrade started.
    pub upgrade_started_at: Option<u64>,
    /// Tick demolition started.
    pub demolition_started_at: Option<u64>,
}

impl Building {
    /// Create a building in the planning state with its footprint computed
    /// from the blueprint.
    pub fn planned(
        id: BuildingId,
        owner: Option<PlayerId>,
        building_type: BuildingType,
        position: Hex,
        rotation: Rotation,
        placed_at: u64,
    ) -> Self {
        Self {
            id,
            owner,
            building_type,
            position,
            rotation,
            footprint: blueprint::footprint(building_type, position, rotation),
            state: BuildingState::Planning,
            level: 1,
            garrison: Composition::new(),
            villager_garrison: 0,
            training_queue: Vec::new(),
            builders: 0,
            awaiting_builders: false,
            placed_at,
            construction_started_at: None,
            upgrade_started_at: None,
            demolition_started_at: None,
        }
    }

    /// Create an already completed building, used when seeding a world.
    pub fn completed(
        id: BuildingId,
        owner: Option<PlayerId>,
        building_type: BuildingType,
        position: Hex,
        rotation: Rotation,
    ) -> Self {
        let mut building = Self::planned(id, owner, building_type, position, rotation, 0);
        building.state = BuildingState::Completed;
        building.construction_started_at = Some(0);
        building
    }

    /// Static properties of this building's type.
    pub fn spec(&self) -> BuildingSpec {
        blueprint::building_spec(self.building_type)
    }

    /// Whether the building is Completed or Upgrading.
    pub const fn is_operational(&self) -> bool {
        self.state.is_operational()
    }

    /// Whether the building still occupies its footprint.
    pub const fn is_standing(&self) -> bool {
        self.state.is_standing()
    }

    /// Whether the building is owned by `player`.
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Whether the footprint covers `hex`.
    pub fn occupies(&self, hex: Hex) -> bool {
        self.footprint.contains(&hex)
    }

    /// Hex distance from `hex` to the nearest footprint tile.
    pub fn distance_to(&self, hex: Hex) -> u32 {
        self.footprint
            .iter()
            .map(|t| t.distance(hex))
            .min()
            .unwrap_or_else(|| self.position.distance(hex))
    }

    /// Total garrisoned units.
    pub fn garrison_total(&self) -> u64 {
        composition::total(&self.garrison)
    }

    /// Whether this building type can train `unit`.
    pub fn can_train(&self, unit: UnitType) -> bool {
        self.spec().trains.contains(&unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_building_covers_its_footprint() {
        let b = Building::planned(
            BuildingId::new(),
            Some(PlayerId::new()),
            BuildingType::Barracks,
            Hex::new(2, 2),
            Rotation::East,
            0,
        );
        assert_eq!(b.state, BuildingState::Planning);
        assert!(b.occupies(Hex::new(2, 2)));
        assert!(b.occupies(Hex::new(3, 2)));
        assert!(!b.occupies(Hex::new(1, 2)));
        assert_eq!(b.distance_to(Hex::new(5, 2)), 2);
        assert!(!b.is_operational());
    }

    #[test]
    fn completed_building_is_operational() {
        let b = Building::completed(
            BuildingId::new(),
            None,
            BuildingType::Tower,
            Hex::new(0, 0),
            Rotation::East,
        );
        assert!(b.is_operational());
        assert!(b.owner.is_none());
        assert!(!b.can_train(UnitType::Archer));
    }
}
