//! Defensive stack construction and classification.
//!
//! Given a target coordinate and the attacking player, collect every hostile
//! defender: armies standing on the coordinate, entrenched armies around it
//! whose coverage reaches it, villager groups on it, and the building whose
//! footprint covers it. Classification then picks exactly one encounter
//! shape, most specific first.
//!
//! Protection by defensive structures is a separate check that runs before
//! classification: a building covered by a standing friendly tower cannot be
//! attacked directly.

use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, VillagerGroupId};
use bastion_world::{Building, WorldState, are_hostile};
use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The encounter shape at a target coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseClassification {
    /// Building with defending armies: the defenders must be cleared first.
    BuildingWithDefenders,
    /// Undefended building with civilian occupants.
    BuildingVillagers,
    /// Undefended, unoccupied building.
    BuildingOnly,
    /// Two or more defending armies, or any entrenched defender.
    StackedArmies,
    /// Exactly one mobile defending army.
    SingleArmy,
    /// Villager groups in the open.
    VillagersOnly,
    /// Nothing on the coordinate but entrenched armies nearby cover it.
    CrossTileCoverage,
    /// Nothing to attack.
    NoTarget,
}

impl DefenseClassification {
    /// Whether the classification names something to attack.
    pub const fn has_target(self) -> bool {
        !matches!(self, Self::NoTarget)
    }
}

// ---------------------------------------------------------------------------
// DefensiveStack
// ---------------------------------------------------------------------------

/// Every hostile defender of one coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefensiveStack {
    /// The attacked coordinate.
    pub target: Hex,
    /// Hostile standing building covering the coordinate.
    pub building: Option<BuildingId>,
    /// Hostile live armies on the coordinate.
    pub located: Vec<ArmyId>,
    /// Whether any army in `located` is entrenching or entrenched.
    pub located_entrenched: bool,
    /// Hostile entrenched armies around the coordinate whose coverage
    /// reaches it.
    pub covering: Vec<ArmyId>,
    /// Hostile villager groups on the coordinate.
    pub villagers: Vec<VillagerGroupId>,
    /// Villagers garrisoned inside `building`.
    pub villager_garrison: u32,
}

impl DefensiveStack {
    /// Collect the defenders of `target` against `attacker`.
    pub fn collect(state: &WorldState, attacker: PlayerId, target: Hex, rules: &RulesConfig) -> Self {
        let hostile = |owner| are_hostile(owner, Some(attacker));

        let building = state.building_at(target).filter(|b| hostile(b.owner));

        let located_armies: Vec<_> = state.armies_at(target).filter(|a| hostile(a.owner)).collect();
        let located_entrenched = located_armies.iter().any(|a| a.has_entrenchment());
        let located = located_armies.iter().map(|a| a.id).collect();

        let radius = rules.entrench_cover_radius;
        let covering = state
            .armies()
            .filter(|a| a.is_alive() && a.is_entrenched() && hostile(a.owner))
            .filter(|a| {
                let d = a.position.distance(target);
                d >= 1 && d <= radius
            })
            .map(|a| a.id)
            .collect();

        let villagers = state
            .villagers_at(target)
            .filter(|g| hostile(g.owner))
            .map(|g| g.id)
            .collect();

        Self {
            target,
            building: building.map(|b| b.id),
            located,
            located_entrenched,
            covering,
            villagers,
            villager_garrison: building.map_or(0, |b| b.villager_garrison),
        }
    }

    /// Armies on the coordinate followed by covering armies.
    pub fn defenders(&self) -> Vec<ArmyId> {
        self.located.iter().chain(&self.covering).copied().collect()
    }

    /// Pick the encounter shape.
    pub fn classify(&self) -> DefenseClassification {
        let has_villagers = !self.villagers.is_empty();

        if self.building.is_some() {
            return if !self.located.is_empty() || !self.covering.is_empty() {
                DefenseClassification::BuildingWithDefenders
            } else if has_villagers || self.villager_garrison > 0 {
                DefenseClassification::BuildingVillagers
            } else {
                DefenseClassification::BuildingOnly
            };
        }

        if !self.located.is_empty() {
            let defenders = self.located.len().saturating_add(self.covering.len());
            return if defenders >= 2 || self.located_entrenched {
                DefenseClassification::StackedArmies
            } else {
                DefenseClassification::SingleArmy
            };
        }

        if has_villagers {
            DefenseClassification::VillagersOnly
        } else if !self.covering.is_empty() {
            DefenseClassification::CrossTileCoverage
        } else {
            DefenseClassification::NoTarget
        }
    }
}

/// Classify the defence of `target` against `attacker`.
pub fn classify_defense(
    state: &WorldState,
    attacker: PlayerId,
    target: Hex,
    rules: &RulesConfig,
) -> DefenseClassification {
    DefensiveStack::collect(state, attacker, target, rules).classify()
}

// ---------------------------------------------------------------------------
// Protection
// ---------------------------------------------------------------------------

/// Standing defensive structures of the same owner that cover `building`.
pub fn protecting_structures(state: &WorldState, building: &Building, rules: &RulesConfig) -> Vec<BuildingId> {
    state
        .buildings()
        .filter(|t| t.id != building.id && t.owner == building.owner)
        .filter(|t| t.is_operational() && t.spec().is_defensive)
        .filter(|t| building.distance_to(t.position) <= rules.tower_protection_radius)
        .map(|t| t.id)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{BuildingState, BuildingType, UnitType};
    use bastion_world::WorldBuilder;

    use super::*;

    const SWORDS: &[(UnitType, u32)] = &[(UnitType::Swordsman, 5)];

    fn classify(b: WorldBuilder, attacker: PlayerId, target: Hex) -> DefenseClassification {
        let state = b.build().unwrap();
        classify_defense(&state, attacker, target, &RulesConfig::default())
    }

    fn two_players() -> (WorldBuilder, PlayerId, PlayerId) {
        let mut b = WorldBuilder::grass(12, 12).unwrap();
        let a = b.player("Attacker");
        let d = b.player("Defender");
        (b, a, d)
    }

    #[test]
    fn empty_tile_has_no_target() {
        let (b, a, _) = two_players();
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::NoTarget);
    }

    #[test]
    fn own_units_are_not_defenders() {
        let (mut b, a, _) = two_players();
        b.army(Some(a), Hex::new(5, 5), SWORDS);
        b.villagers(Some(a), Hex::new(5, 5), 3);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::NoTarget);
    }

    #[test]
    fn one_mobile_army_is_single() {
        let (mut b, a, d) = two_players();
        b.army(Some(d), Hex::new(5, 5), SWORDS);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::SingleArmy);
    }

    #[test]
    fn one_entrenched_army_escalates_to_stack() {
        let (mut b, a, d) = two_players();
        let army = b.army(Some(d), Hex::new(5, 5), SWORDS);
        b.entrenched(army, 0);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::StackedArmies);
    }

    #[test]
    fn entrenching_army_also_escalates() {
        let (mut b, a, d) = two_players();
        let army = b.army(Some(d), Hex::new(5, 5), SWORDS);
        b.entrenching(army, 0);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::StackedArmies);
    }

    #[test]
    fn two_armies_are_a_stack() {
        let (mut b, a, d) = two_players();
        b.army(Some(d), Hex::new(5, 5), SWORDS);
        b.army(None, Hex::new(5, 5), SWORDS);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::StackedArmies);
    }

    #[test]
    fn mobile_army_plus_covering_neighbour_is_a_stack() {
        let (mut b, a, d) = two_players();
        b.army(Some(d), Hex::new(5, 5), SWORDS);
        let cover = b.army(Some(d), Hex::new(6, 5), SWORDS);
        b.entrenched(cover, 0);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::StackedArmies);
    }

    #[test]
    fn villagers_beat_coverage() {
        let (mut b, a, d) = two_players();
        b.villagers(Some(d), Hex::new(5, 5), 4);
        let cover = b.army(Some(d), Hex::new(6, 5), SWORDS);
        b.entrenched(cover, 0);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::VillagersOnly);
    }

    #[test]
    fn coverage_alone_is_a_target() {
        let (mut b, a, d) = two_players();
        let cover = b.army(Some(d), Hex::new(6, 5), SWORDS);
        b.entrenched(cover, 0);
        let state = b.build().unwrap();
        let stack = DefensiveStack::collect(&state, a, Hex::new(5, 5), &RulesConfig::default());
        assert_eq!(stack.classify(), DefenseClassification::CrossTileCoverage);
        assert_eq!(stack.defenders(), vec![cover]);
    }

    #[test]
    fn coverage_requires_full_entrenchment_and_radius() {
        let (mut b, a, d) = two_players();
        let digging = b.army(Some(d), Hex::new(6, 5), SWORDS);
        b.entrenching(digging, 0);
        let far = b.army(Some(d), Hex::new(8, 5), SWORDS);
        b.entrenched(far, 0);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::NoTarget);
    }

    #[test]
    fn building_tiers() {
        let (mut b, a, d) = two_players();
        b.building(Some(d), BuildingType::House, Hex::new(2, 2));
        let occupied = b.building(Some(d), BuildingType::House, Hex::new(5, 5));
        b.garrison(occupied, &[], 3);
        b.building(Some(d), BuildingType::House, Hex::new(8, 8));
        let cover = b.army(Some(d), Hex::new(9, 8), SWORDS);
        b.entrenched(cover, 0);
        let state = b.build().unwrap();
        let rules = RulesConfig::default();

        assert_eq!(classify_defense(&state, a, Hex::new(2, 2), &rules), DefenseClassification::BuildingOnly);
        assert_eq!(classify_defense(&state, a, Hex::new(5, 5), &rules), DefenseClassification::BuildingVillagers);
        assert_eq!(
            classify_defense(&state, a, Hex::new(8, 8), &rules),
            DefenseClassification::BuildingWithDefenders
        );
    }

    #[test]
    fn destroyed_buildings_are_ignored() {
        let (mut b, a, d) = two_players();
        b.building_in_state(Some(d), BuildingType::House, Hex::new(5, 5), BuildingState::Destroyed);
        assert_eq!(classify(b, a, Hex::new(5, 5)), DefenseClassification::NoTarget);
    }

    #[test]
    fn classification_is_stable() {
        let (mut b, a, d) = two_players();
        b.army(Some(d), Hex::new(5, 5), SWORDS);
        let state = b.build().unwrap();
        let rules = RulesConfig::default();
        let first = classify_defense(&state, a, Hex::new(5, 5), &rules);
        assert_eq!(classify_defense(&state, a, Hex::new(5, 5), &rules), first);
    }

    #[test]
    fn towers_protect_nearby_friendly_buildings() {
        let (mut b, _, d) = two_players();
        let house = b.building(Some(d), BuildingType::House, Hex::new(5, 5));
        let tower = b.building(Some(d), BuildingType::Tower, Hex::new(7, 5));
        let ruined = b.building_in_state(Some(d), BuildingType::Tower, Hex::new(3, 5), BuildingState::Destroyed);
        b.building(None, BuildingType::Tower, Hex::new(5, 6));
        let state = b.build().unwrap();
        let rules = RulesConfig::default();

        let protectors = protecting_structures(&state, state.building(house).unwrap(), &rules);
        assert_eq!(protectors, vec![tower]);
        assert!(!protectors.contains(&ruined));
        assert!(protecting_structures(&state, state.building(tower).unwrap(), &rules).is_empty());
    }
}
