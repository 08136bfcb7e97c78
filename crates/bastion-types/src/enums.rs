//! Enumeration types for the Bastion simulation.
//!
//! Every enum here is closed: gameplay code branches on variants with
//! exhaustive matches and never on runtime type inspection.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A stockpiled resource held in a player's treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ResourceType {
    /// Food from farms, berries, and hunting.
    Food,
    /// Lumber from forests.
    Wood,
    /// Quarried stone.
    Stone,
    /// Mined gold.
    Gold,
}

/// The kind of a resource point on the map.
///
/// Huntable kinds have health instead of a fixed stockpile and are worked
/// with the hunt command rather than the gather command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ResourcePointKind {
    /// A stand of trees yielding wood.
    Grove,
    /// A berry bush yielding food.
    BerryBush,
    /// An exposed stone deposit.
    StoneQuarry,
    /// A gold vein.
    GoldMine,
    /// A herd of deer. Huntable.
    Deer,
    /// A wild boar. Huntable.
    Boar,
}

impl ResourcePointKind {
    /// The treasury resource this point produces.
    pub const fn yields(self) -> ResourceType {
        match self {
            Self::Grove => ResourceType::Wood,
            Self::BerryBush | Self::Deer | Self::Boar => ResourceType::Food,
            Self::StoneQuarry => ResourceType::Stone,
            Self::GoldMine => ResourceType::Gold,
        }
    }

    /// Whether the point must be hunted rather than gathered.
    pub const fn is_huntable(self) -> bool {
        matches!(self, Self::Deer | Self::Boar)
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain covering a single hex of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Terrain {
    /// Open ground.
    Grass,
    /// Woodland.
    Forest,
    /// Raised ground.
    Hill,
    /// Lakes and rivers. Not walkable.
    Water,
    /// Impassable peaks. Not walkable.
    Mountain,
}

impl Terrain {
    /// Whether units and villagers can stand on this terrain.
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Water | Self::Mountain)
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// A military unit type. Armies and garrisons hold counts per unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum UnitType {
    /// Sword infantry.
    Swordsman,
    /// Pike infantry.
    Spearman,
    /// Foot archers.
    Archer,
    /// Light cavalry.
    Horseman,
    /// Siege engine.
    Catapult,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// A type of building that can be placed on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BuildingType {
    /// Settlement core. A base: armies retreat to it and reinforcements
    /// return to it.
    TownCenter,
    /// Raises the population cap.
    House,
    /// Drop-off point for gathered resources.
    Storehouse,
    /// Trains infantry.
    Barracks,
    /// Trains archers.
    ArcheryRange,
    /// Trains cavalry.
    Stable,
    /// Builds siege engines.
    SiegeWorkshop,
    /// Defensive structure protecting nearby buildings from direct attack.
    Tower,
    /// Military base with a large garrison.
    Fort,
}

/// Lifecycle phase of a building.
///
/// `Planning -> Constructing -> Completed -> {Upgrading, Demolishing}`,
/// then back to `Completed` (upgrade done or cancelled) or `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BuildingState {
    /// Placed and paid for, waiting for builders to arrive.
    Planning,
    /// Under construction.
    Constructing,
    /// Standing and fully functional.
    Completed,
    /// Functional while an upgrade to the next level is in progress.
    Upgrading,
    /// Being torn down. No longer functional.
    Demolishing,
    /// Gone. Kept in the arena as a tombstone.
    Destroyed,
}

impl BuildingState {
    /// Whether the building can garrison, train, and act as a base.
    pub const fn is_operational(self) -> bool {
        matches!(self, Self::Completed | Self::Upgrading)
    }

    /// Whether the building still occupies its footprint on the map.
    pub const fn is_standing(self) -> bool {
        !matches!(self, Self::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huntable_points_yield_food() {
        assert!(ResourcePointKind::Deer.is_huntable());
        assert!(ResourcePointKind::Boar.is_huntable());
        assert!(!ResourcePointKind::Grove.is_huntable());
        assert_eq!(ResourcePointKind::Deer.yields(), ResourceType::Food);
        assert_eq!(ResourcePointKind::Grove.yields(), ResourceType::Wood);
    }

    #[test]
    fn water_and_mountains_block_movement() {
        assert!(Terrain::Grass.is_walkable());
        assert!(Terrain::Forest.is_walkable());
        assert!(!Terrain::Water.is_walkable());
        assert!(!Terrain::Mountain.is_walkable());
    }

    #[test]
    fn only_completed_and_upgrading_are_operational() {
        assert!(BuildingState::Completed.is_operational());
        assert!(BuildingState::Upgrading.is_operational());
        assert!(!BuildingState::Planning.is_operational());
        assert!(!BuildingState::Demolishing.is_operational());
        assert!(!BuildingState::Destroyed.is_standing());
    }

    #[test]
    fn enums_serialize_as_variant_names() {
        let json = serde_json::to_string(&UnitType::Swordsman).unwrap_or_default();
        assert_eq!(json, "\"Swordsman\"");
    }
}
