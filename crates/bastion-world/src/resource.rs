//! Resource points: groves, quarries, mines, and game animals.

use std::collections::BTreeSet;

use bastion_types::{Hex, ResourcePointId, ResourcePointKind, VillagerGroupId};
use serde::{Deserialize, Serialize};

/// A harvestable point on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePoint {
    /// Unique identifier.
    pub id: ResourcePointId,
    /// What the point is.
    pub kind: ResourcePointKind,
    /// Coordinate of the point.
    pub position: Hex,
    /// Amount left to harvest.
    pub remaining: u64,
    /// Health of a huntable animal. `None` for static points.
    pub health: Option<u32>,
    /// Villager groups working the point.
    pub assigned: BTreeSet<VillagerGroupId>,
}

impl ResourcePoint {
    /// Create a point with nobody assigned. Huntable kinds start with
    /// full health.
    pub fn new(id: ResourcePointId, kind: ResourcePointKind, position: Hex, remaining: u64) -> Self {
        Self {
            id,
            kind,
            position,
            remaining,
            health: kind.is_huntable().then_some(100),
            assigned: BTreeSet::new(),
        }
    }

    /// Whether nothing is left to harvest.
    pub const fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// Number of groups working the point.
    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huntables_have_health() {
        let deer = ResourcePoint::new(ResourcePointId::new(), ResourcePointKind::Deer, Hex::new(0, 0), 100);
        let grove = ResourcePoint::new(ResourcePointId::new(), ResourcePointKind::Grove, Hex::new(0, 0), 100);
        assert!(deer.health.is_some());
        assert!(grove.health.is_none());
        assert!(!grove.is_depleted());
    }
}
