//! Gameplay rules and their defaults.
//!
//! [`RulesConfig`] bundles every tunable the commands and the tick hooks
//! read, so that callers (simulation driver, tests) can override defaults.
//! It is loaded from the `rules` section of the simulation YAML.

use bastion_types::ResourceType;
use bastion_world::Cost;
use serde::{Deserialize, Serialize};

/// Gameplay constants consumed by commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Resources paid to start entrenching (default: 50 wood).
    pub entrench_cost: Cost,

    /// Commander stamina paid to start entrenching (default: 20).
    pub entrench_stamina_cost: u32,

    /// Ticks from entrenching to entrenched (default: 30).
    pub entrench_duration_ticks: u64,

    /// Radius around an entrenched army its coverage reaches (default: 1).
    pub entrench_cover_radius: u32,

    /// Radius around a tower within which friendly buildings are protected
    /// from direct attack (default: 2).
    pub tower_protection_radius: u32,

    /// Builders credited when no villager can be assigned (default: 1).
    pub fallback_builders: u32,

    /// Maximum villager groups per resource point (default: 2).
    pub max_gatherers_per_point: usize,

    /// Ticks needed to cross one tile (default: 5).
    pub ticks_per_tile: u64,

    /// Radius around the attacker or the target from which idle friendly
    /// armies join a stack attack (default: 1).
    pub ally_pull_in_radius: u32,

    /// Radius searched for a free tile to eject or deploy units (default: 2).
    pub exit_search_radius: u32,

    /// Ticks a demolition takes (default: 20).
    pub demolition_ticks: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            entrench_cost: Cost::from([(ResourceType::Wood, 50)]),
            entrench_stamina_cost: 20,
            entrench_duration_ticks: 30,
            entrench_cover_radius: 1,
            tower_protection_radius: 2,
            fallback_builders: 1,
            max_gatherers_per_point: 2,
            ticks_per_tile: 5,
            ally_pull_in_radius: 1,
            exit_search_radius: 2,
            demolition_ticks: 20,
        }
    }
}

impl RulesConfig {
    /// Ticks to walk a path of `steps` tiles. Saturates on overflow.
    pub fn travel_ticks(&self, steps: usize) -> u64 {
        u64::try_from(steps)
            .unwrap_or(u64::MAX)
            .saturating_mul(self.ticks_per_tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let rules = RulesConfig::default();
        assert_eq!(rules.entrench_cost.get(&ResourceType::Wood), Some(&50));
        assert_eq!(rules.entrench_stamina_cost, 20);
        assert_eq!(rules.fallback_builders, 1);
        assert_eq!(rules.max_gatherers_per_point, 2);
        assert_eq!(rules.travel_ticks(3), 15);
    }
}
