//! Static building and unit tables.
//!
//! Every [`BuildingType`] has a [`BuildingSpec`] and every [`UnitType`] a
//! [`UnitSpec`]. The tables are plain `match` expressions so that adding a
//! variant is a compile error until its numbers are filled in.

use std::collections::BTreeMap;

use bastion_types::{BuildingType, Hex, ResourceType, Rotation, UnitType};

/// A resource cost: amount per resource type.
pub type Cost = BTreeMap<ResourceType, u64>;

/// Static properties of a building type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingSpec {
    /// The building type described.
    pub building_type: BuildingType,
    /// Cost to place at level 1.
    pub cost: Cost,
    /// Number of tiles the footprint covers (1 to 3).
    pub footprint_size: u8,
    /// Unit types this building can train.
    pub trains: &'static [UnitType],
    /// Whether armies can retreat to it and reinforcements return to it.
    pub is_base: bool,
    /// Whether it protects nearby buildings from direct attack.
    pub is_defensive: bool,
    /// Population capacity granted once completed.
    pub population_capacity: u32,
    /// Maximum number of garrisoned units.
    pub garrison_capacity: u32,
    /// Ticks of construction with one builder.
    pub build_ticks: u64,
    /// Highest reachable level.
    pub max_level: u32,
}

/// Static properties of a unit type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    /// The unit type described.
    pub unit_type: UnitType,
    /// Cost per unit.
    pub cost: Cost,
    /// Ticks to train one unit.
    pub train_ticks: u64,
    /// Population consumed per unit.
    pub population: u32,
}

/// Look up the spec of a building type.
pub fn building_spec(building_type: BuildingType) -> BuildingSpec {
    match building_type {
        BuildingType::TownCenter => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 300), (ResourceType::Stone, 200)]),
            footprint_size: 3,
            trains: &[],
            is_base: true,
            is_defensive: false,
            population_capacity: 10,
            garrison_capacity: 15,
            build_ticks: 120,
            max_level: 3,
        },
        BuildingType::House => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 50)]),
            footprint_size: 1,
            trains: &[],
            is_base: false,
            is_defensive: false,
            population_capacity: 5,
            garrison_capacity: 0,
            build_ticks: 25,
            max_level: 1,
        },
        BuildingType::Storehouse => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 80)]),
            footprint_size: 1,
            trains: &[],
            is_base: false,
            is_defensive: false,
            population_capacity: 0,
            garrison_capacity: 0,
            build_ticks: 30,
            max_level: 2,
        },
        BuildingType::Barracks => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 150)]),
            footprint_size: 2,
            trains: &[UnitType::Swordsman, UnitType::Spearman],
            is_base: false,
            is_defensive: false,
            population_capacity: 0,
            garrison_capacity: 20,
            build_ticks: 50,
            max_level: 3,
        },
        BuildingType::ArcheryRange => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 150), (ResourceType::Gold, 25)]),
            footprint_size: 2,
            trains: &[UnitType::Archer],
            is_base: false,
            is_defensive: false,
            population_capacity: 0,
            garrison_capacity: 20,
            build_ticks: 50,
            max_level: 3,
        },
        BuildingType::Stable => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 150), (ResourceType::Gold, 50)]),
            footprint_size: 2,
            trains: &[UnitType::Horseman],
            is_base: false,
            is_defensive: false,
            population_capacity: 0,
            garrison_capacity: 20,
            build_ticks: 50,
            max_level: 3,
        },
        BuildingType::SiegeWorkshop => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Wood, 200), (ResourceType::Gold, 100)]),
            footprint_size: 2,
            trains: &[UnitType::Catapult],
            is_base: false,
            is_defensive: false,
            population_capacity: 0,
            garrison_capacity: 10,
            build_ticks: 60,
            max_level: 2,
        },
        BuildingType::Tower => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Stone, 125), (ResourceType::Wood, 25)]),
            footprint_size: 1,
            trains: &[],
            is_base: false,
            is_defensive: true,
            population_capacity: 0,
            garrison_capacity: 5,
            build_ticks: 60,
            max_level: 2,
        },
        BuildingType::Fort => BuildingSpec {
            building_type,
            cost: Cost::from([(ResourceType::Stone, 400), (ResourceType::Wood, 100)]),
            footprint_size: 3,
            trains: &[UnitType::Swordsman, UnitType::Spearman, UnitType::Archer],
            is_base: true,
            is_defensive: false,
            population_capacity: 0,
            garrison_capacity: 25,
            build_ticks: 150,
            max_level: 3,
        },
    }
}

/// Look up the spec of a unit type.
pub fn unit_spec(unit_type: UnitType) -> UnitSpec {
    match unit_type {
        UnitType::Swordsman => UnitSpec {
            unit_type,
            cost: Cost::from([(ResourceType::Food, 60), (ResourceType::Gold, 20)]),
            train_ticks: 20,
            population: 1,
        },
        UnitType::Spearman => UnitSpec {
            unit_type,
            cost: Cost::from([(ResourceType::Food, 35), (ResourceType::Wood, 25)]),
            train_ticks: 18,
            population: 1,
        },
        UnitType::Archer => UnitSpec {
            unit_type,
            cost: Cost::from([(ResourceType::Wood, 25), (ResourceType::Gold, 45)]),
            train_ticks: 22,
            population: 1,
        },
        UnitType::Horseman => UnitSpec {
            unit_type,
            cost: Cost::from([(ResourceType::Food, 80), (ResourceType::Gold, 30)]),
            train_ticks: 30,
            population: 2,
        },
        UnitType::Catapult => UnitSpec {
            unit_type,
            cost: Cost::from([(ResourceType::Wood, 160), (ResourceType::Gold, 135)]),
            train_ticks: 50,
            population: 3,
        },
    }
}

/// Multiply every entry of a cost, or `None` on overflow.
pub fn scale_cost(cost: &Cost, factor: u64) -> Option<Cost> {
    cost.iter()
        .map(|(r, &amount)| amount.checked_mul(factor).map(|scaled| (*r, scaled)))
        .collect()
}

/// Cost to upgrade a building type to `target_level`: the base cost times
/// the number of levels above the first. `None` on overflow or for a
/// target level below 2.
pub fn upgrade_cost(building_type: BuildingType, target_level: u32) -> Option<Cost> {
    let steps = target_level.checked_sub(1).filter(|s| *s > 0)?;
    scale_cost(&building_spec(building_type).cost, u64::from(steps))
}

/// Coordinates covered by a building anchored at `anchor` with the given
/// rotation. The anchor is always the first element.
///
/// Two-tile footprints extend one step in the rotation's direction;
/// three-tile footprints add the next direction counter-clockwise, forming
/// a compact triangle.
pub fn footprint(building_type: BuildingType, anchor: Hex, rotation: Rotation) -> Vec<Hex> {
    match building_spec(building_type).footprint_size {
        0 | 1 => vec![anchor],
        2 => vec![anchor, anchor.step(rotation)],
        _ => vec![anchor, anchor.step(rotation), anchor.step(rotation.turned())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_BUILDINGS: [BuildingType; 9] = [
        BuildingType::TownCenter,
        BuildingType::House,
        BuildingType::Storehouse,
        BuildingType::Barracks,
        BuildingType::ArcheryRange,
        BuildingType::Stable,
        BuildingType::SiegeWorkshop,
        BuildingType::Tower,
        BuildingType::Fort,
    ];

    #[test]
    fn every_building_has_a_cost_and_small_footprint() {
        for bt in ALL_BUILDINGS {
            let spec = building_spec(bt);
            assert!(!spec.cost.is_empty(), "{bt:?} has no cost");
            assert!((1..=3).contains(&spec.footprint_size));
            assert!(spec.max_level >= 1);
        }
    }

    #[test]
    fn footprints_are_contiguous() {
        let anchor = Hex::new(5, 5);
        for bt in ALL_BUILDINGS {
            for rotation in Rotation::ALL {
                let tiles = footprint(bt, anchor, rotation);
                assert_eq!(tiles.first(), Some(&anchor));
                assert!(tiles.iter().skip(1).all(|t| anchor.is_adjacent(*t)));
            }
        }
    }

    #[test]
    fn only_bases_are_bases() {
        assert!(building_spec(BuildingType::TownCenter).is_base);
        assert!(building_spec(BuildingType::Fort).is_base);
        assert!(!building_spec(BuildingType::Barracks).is_base);
        assert!(building_spec(BuildingType::Tower).is_defensive);
    }

    #[test]
    fn upgrade_cost_scales_with_level() {
        let level2 = upgrade_cost(BuildingType::Barracks, 2);
        let level3 = upgrade_cost(BuildingType::Barracks, 3);
        assert_eq!(level2.and_then(|c| c.get(&ResourceType::Wood).copied()), Some(150));
        assert_eq!(level3.and_then(|c| c.get(&ResourceType::Wood).copied()), Some(300));
        assert!(upgrade_cost(BuildingType::Barracks, 1).is_none());
    }
}
