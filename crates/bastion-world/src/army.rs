//! Armies: unit stacks that move, fight, entrench, and retreat.

use std::collections::BTreeMap;

use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, ReinforcementId};
use serde::{Deserialize, Serialize};

use crate::composition::{self, Composition};
use crate::movement::MovementPath;

/// Entrenchment progress of an army.
///
/// `Mobile -> Entrenching -> Entrenched`, and back to `Mobile` on cancel
/// or when a move, attack, or retreat forces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Entrenchment {
    /// Not dug in.
    #[default]
    Mobile,
    /// Digging in since the given tick.
    Entrenching {
        /// Tick entrenching started.
        since: u64,
    },
    /// Fully dug in. Grants cross-tile coverage.
    Entrenched {
        /// Tick entrenching started.
        since: u64,
    },
}

/// A named leader with stamina spent on demanding orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commander {
    /// Display name.
    pub name: String,
    /// Current stamina.
    pub stamina: u32,
    /// Stamina ceiling.
    pub max_stamina: u32,
}

/// Units in transit from a garrison to an army.
///
/// Immutable once created, except for cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReinforcement {
    /// Unique identifier.
    pub id: ReinforcementId,
    /// Units in transit.
    pub composition: Composition,
    /// Building the units left.
    pub source_building: BuildingId,
    /// Coordinate the units left from.
    pub source: Hex,
    /// Route to the army at dispatch time.
    pub path: Vec<Hex>,
    /// Tick of dispatch.
    pub dispatched_at: u64,
    /// Estimated arrival tick.
    pub arrives_at: u64,
}

/// A stack of military units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    /// Unique identifier.
    pub id: ArmyId,
    /// Owning player. `None` for neutral armies.
    pub owner: Option<PlayerId>,
    /// Current coordinate.
    pub position: Hex,
    /// Units per type. Empty means the army is dead.
    pub composition: Composition,
    /// Active movement order.
    pub path: Option<MovementPath>,
    /// Whether the army is a participant of a combat session.
    pub in_combat: bool,
    /// Entrenchment progress.
    pub entrenchment: Entrenchment,
    /// Whether the army is retreating and committed to its path.
    pub retreating: bool,
    /// Base the army is retreating to.
    pub retreat_target: Option<BuildingId>,
    /// Registered home base.
    pub home_base: Option<BuildingId>,
    /// Optional commander.
    pub commander: Option<Commander>,
    /// Reinforcements on their way to this army.
    pub pending_reinforcements: BTreeMap<ReinforcementId, PendingReinforcement>,
}

impl Army {
    /// Create a mobile army with no orders.
    pub const fn new(id: ArmyId, owner: Option<PlayerId>, position: Hex, composition: Composition) -> Self {
        Self {
            id,
            owner,
            position,
            composition,
            path: None,
            in_combat: false,
            entrenchment: Entrenchment::Mobile,
            retreating: false,
            retreat_target: None,
            home_base: None,
            commander: None,
            pending_reinforcements: BTreeMap::new(),
        }
    }

    /// Whether the army still has units.
    pub fn is_alive(&self) -> bool {
        composition::total(&self.composition) > 0
    }

    /// Whether the army is owned by `player`.
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Whether the army is digging in.
    pub const fn is_entrenching(&self) -> bool {
        matches!(self.entrenchment, Entrenchment::Entrenching { .. })
    }

    /// Whether the army is fully dug in.
    pub const fn is_entrenched(&self) -> bool {
        matches!(self.entrenchment, Entrenchment::Entrenched { .. })
    }

    /// Whether the army is entrenching or entrenched.
    pub const fn has_entrenchment(&self) -> bool {
        !matches!(self.entrenchment, Entrenchment::Mobile)
    }

    /// Tick entrenching started, if any.
    pub const fn entrenchment_started_at(&self) -> Option<u64> {
        match self.entrenchment {
            Entrenchment::Mobile => None,
            Entrenchment::Entrenching { since } | Entrenchment::Entrenched { since } => Some(since),
        }
    }

    /// Whether the army is moving along a path.
    pub fn is_moving(&self) -> bool {
        self.path.as_ref().is_some_and(|p| !p.is_complete())
    }

    /// Alive, not fighting, not moving, not retreating, and mobile.
    pub fn is_idle(&self) -> bool {
        self.is_alive()
            && !self.in_combat
            && !self.is_moving()
            && !self.retreating
            && !self.has_entrenchment()
    }

    /// Total unit count.
    pub fn size(&self) -> u64 {
        composition::total(&self.composition)
    }
}

#[cfg(test)]
mod tests {
    use bastion_types::UnitType;

    use super::*;

    fn army(n: u32) -> Army {
        Army::new(
            ArmyId::new(),
            Some(PlayerId::new()),
            Hex::new(0, 0),
            Composition::from([(UnitType::Swordsman, n)]),
        )
    }

    #[test]
    fn empty_composition_is_dead() {
        assert!(army(3).is_alive());
        assert!(!army(0).is_alive());
    }

    #[test]
    fn entrenchment_flags_are_exclusive() {
        let mut a = army(3);
        assert!(a.is_idle());
        a.entrenchment = Entrenchment::Entrenching { since: 4 };
        assert!(a.is_entrenching());
        assert!(!a.is_entrenched());
        assert!(!a.is_idle());
        a.entrenchment = Entrenchment::Entrenched { since: 4 };
        assert!(!a.is_entrenching());
        assert!(a.is_entrenched());
        assert_eq!(a.entrenchment_started_at(), Some(4));
    }

    #[test]
    fn moving_army_is_not_idle() {
        let mut a = army(2);
        a.path = Some(MovementPath::new(vec![Hex::new(1, 0)]));
        assert!(a.is_moving());
        assert!(!a.is_idle());
    }
}
