//! Players: treasury, population, and the single upgrade/research slots.

use std::collections::BTreeMap;

use bastion_types::{BuildingId, PlayerId, ResourceType};
use serde::{Deserialize, Serialize};

use crate::blueprint::Cost;
use crate::error::WorldError;

/// A human or AI participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Resource balances. Missing entries are zero; balances never go
    /// negative.
    pub resources: BTreeMap<ResourceType, u64>,
    /// Population consumed by units alive or in training.
    pub population_used: u32,
    /// Population ceiling granted by completed buildings.
    pub population_cap: u32,
    /// The building currently being upgraded, if any. At most one at a time.
    pub active_upgrade: Option<BuildingId>,
    /// The technology currently being researched, if any. At most one.
    pub active_research: Option<String>,
}

impl Player {
    /// Create a player with an empty treasury.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            resources: BTreeMap::new(),
            population_used: 0,
            population_cap: 0,
            active_upgrade: None,
            active_research: None,
        }
    }

    /// Current balance of one resource.
    pub fn balance(&self, resource: ResourceType) -> u64 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    /// The first resource (in resource order) the player cannot cover,
    /// with the amount needed and held.
    pub fn shortfall(&self, cost: &Cost) -> Option<(ResourceType, u64, u64)> {
        cost.iter().find_map(|(resource, &needed)| {
            let held = self.balance(*resource);
            (held < needed).then_some((*resource, needed, held))
        })
    }

    /// Whether every entry of `cost` is covered.
    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.shortfall(cost).is_none()
    }

    /// Deduct a cost.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Insufficient`] without touching any balance if
    /// the player cannot afford the whole cost.
    pub fn spend(&mut self, cost: &Cost) -> Result<(), WorldError> {
        if let Some((resource, needed, available)) = self.shortfall(cost) {
            return Err(WorldError::Insufficient {
                what: format!("{resource:?}"),
                needed,
                available,
            });
        }
        for (resource, &amount) in cost {
            let balance = self.resources.entry(*resource).or_insert(0);
            *balance = balance.saturating_sub(amount);
        }
        Ok(())
    }

    /// Add resources to the treasury.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] without touching any
    /// balance if a balance would overflow.
    pub fn credit(&mut self, amounts: &Cost) -> Result<(), WorldError> {
        for (resource, &amount) in amounts {
            self.balance(*resource)
                .checked_add(amount)
                .ok_or(WorldError::ArithmeticOverflow)?;
        }
        for (resource, &amount) in amounts {
            let balance = self.resources.entry(*resource).or_insert(0);
            *balance = balance.saturating_add(amount);
        }
        Ok(())
    }

    /// Population still available below the cap.
    pub const fn population_room(&self) -> u32 {
        self.population_cap.saturating_sub(self.population_used)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rich() -> Player {
        let mut p = Player::new(PlayerId::new(), "Ada");
        p.resources.insert(ResourceType::Wood, 100);
        p.resources.insert(ResourceType::Gold, 10);
        p
    }

    #[test]
    fn spend_deducts_exactly() {
        let mut p = rich();
        p.spend(&Cost::from([(ResourceType::Wood, 40)])).unwrap();
        assert_eq!(p.balance(ResourceType::Wood), 60);
    }

    #[test]
    fn spend_is_all_or_nothing() {
        let mut p = rich();
        let cost = Cost::from([(ResourceType::Wood, 40), (ResourceType::Gold, 11)]);
        assert!(p.spend(&cost).is_err());
        assert_eq!(p.balance(ResourceType::Wood), 100);
        assert_eq!(p.balance(ResourceType::Gold), 10);
        assert_eq!(p.shortfall(&cost), Some((ResourceType::Gold, 11, 10)));
    }

    #[test]
    fn credit_adds_new_resources() {
        let mut p = rich();
        p.credit(&Cost::from([(ResourceType::Stone, 5)])).unwrap();
        assert_eq!(p.balance(ResourceType::Stone), 5);
    }

    #[test]
    fn population_room_saturates() {
        let mut p = rich();
        p.population_cap = 5;
        p.population_used = 7;
        assert_eq!(p.population_room(), 0);
    }
}
