//! The resource/economy collaborator.
//!
//! Gathering rates and production live outside the kernel. Commands only
//! announce who starts and stops working where, and ask for a rate
//! recomputation afterwards. Gather-type commands call
//! [`EconomyHooks::start_gathering`] before touching any state and abort
//! when it refuses.

use std::collections::BTreeMap;

use bastion_types::{PlayerId, ResourcePointId, ResourceType, VillagerGroupId};
use bastion_world::{VillagerTask, WorldState};
use tracing::debug;

/// Narrow interface to the economy engine.
pub trait EconomyHooks {
    /// Register `group` as working `point`. Returning `false` vetoes the
    /// gather command.
    fn start_gathering(&mut self, group: VillagerGroupId, point: ResourcePointId, state: &WorldState) -> bool;

    /// Unregister `group` from whatever point it works.
    fn stop_gathering(&mut self, group: VillagerGroupId);

    /// Recompute collection rates for `player`.
    fn update_collection_rates(&mut self, player: PlayerId, state: &WorldState);
}

/// Default economy: tracks who works where and derives a per-player rate
/// of one unit per villager per resource type.
#[derive(Debug, Clone, Default)]
pub struct PassiveEconomy {
    working: BTreeMap<VillagerGroupId, ResourcePointId>,
    rates: BTreeMap<PlayerId, BTreeMap<ResourceType, u32>>,
}

impl PassiveEconomy {
    /// Create an economy with nobody working.
    pub const fn new() -> Self {
        Self {
            working: BTreeMap::new(),
            rates: BTreeMap::new(),
        }
    }

    /// The point a group is registered on.
    pub fn working_on(&self, group: VillagerGroupId) -> Option<ResourcePointId> {
        self.working.get(&group).copied()
    }

    /// Last computed collection rate of a player for a resource.
    pub fn rate(&self, player: PlayerId, resource: ResourceType) -> u32 {
        self.rates
            .get(&player)
            .and_then(|r| r.get(&resource))
            .copied()
            .unwrap_or(0)
    }
}

impl EconomyHooks for PassiveEconomy {
    fn start_gathering(&mut self, group: VillagerGroupId, point: ResourcePointId, state: &WorldState) -> bool {
        let Some(rp) = state.resource_point(point) else {
            return false;
        };
        if rp.is_depleted() {
            return false;
        }
        self.working.insert(group, point);
        debug!(%group, %point, "Gathering registered");
        true
    }

    fn stop_gathering(&mut self, group: VillagerGroupId) {
        if self.working.remove(&group).is_some() {
            debug!(%group, "Gathering unregistered");
        }
    }

    fn update_collection_rates(&mut self, player: PlayerId, state: &WorldState) {
        let mut rates: BTreeMap<ResourceType, u32> = BTreeMap::new();
        for group in state.villager_groups().filter(|g| g.is_owned_by(player)) {
            let point = match group.task {
                VillagerTask::Gathering(p) | VillagerTask::Hunting(p) => p,
                _ => continue,
            };
            if let Some(rp) = state.resource_point(point) {
                let rate = rates.entry(rp.kind.yields()).or_insert(0);
                *rate = rate.saturating_add(group.headcount);
            }
        }
        debug!(%player, ?rates, "Collection rates updated");
        self.rates.insert(player, rates);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{Hex, ResourcePointKind};
    use bastion_world::WorldBuilder;

    use super::*;

    #[test]
    fn depleted_points_are_refused() {
        let mut b = WorldBuilder::grass(6, 6).unwrap();
        let empty = b.resource_point(ResourcePointKind::Grove, Hex::new(1, 1), 0);
        let full = b.resource_point(ResourcePointKind::Grove, Hex::new(2, 2), 10);
        let state = b.build().unwrap();
        let mut economy = PassiveEconomy::new();
        let group = VillagerGroupId::new();

        assert!(!economy.start_gathering(group, empty, &state));
        assert!(economy.start_gathering(group, full, &state));
        assert_eq!(economy.working_on(group), Some(full));
        economy.stop_gathering(group);
        assert_eq!(economy.working_on(group), None);
    }

    #[test]
    fn rates_follow_gathering_tasks() {
        let mut b = WorldBuilder::grass(6, 6).unwrap();
        let p = b.player("A");
        let grove = b.resource_point(ResourcePointKind::Grove, Hex::new(1, 1), 100);
        let g = b.villagers(Some(p), Hex::new(1, 1), 4);
        let mut state = b.build().unwrap();
        if let Some(group) = state.villager_group_mut(g) {
            group.task = VillagerTask::Gathering(grove);
        }
        let mut economy = PassiveEconomy::new();
        economy.update_collection_rates(p, &state);
        assert_eq!(economy.rate(p, ResourceType::Wood), 4);
        assert_eq!(economy.rate(p, ResourceType::Food), 0);
    }
}
