//! Gathering and hunting orders.
//!
//! Both commands share one flow. Validation checks the point matches the
//! order (animals are hunted, everything else is gathered), is not
//! depleted, and has room for another group. Execution asks the economy
//! first and aborts untouched if it refuses.

use bastion_events::{ChangeLogBuilder, GatheringStartedChange};
use bastion_types::{Hex, PlayerId, ResourcePointId, VillagerGroupId};
use bastion_world::{MovementPath, VillagerTask, WorldError, WorldState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assignment;
use crate::checks;
use crate::command::Command;
use crate::context::{ExecutionContext, ValidationContext};
use crate::effects;
use crate::error::CommandFailure;

/// Route to a resource point, or `None` when already next to it.
#[derive(Debug, Clone)]
pub struct GatherPlan {
    path: Option<Vec<Hex>>,
}

/// Send a villager group to gather from a non-animal resource point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherResource {
    /// Issuing player.
    pub player: PlayerId,
    /// Group to send.
    pub group: VillagerGroupId,
    /// Point to gather from.
    pub resource: ResourcePointId,
}

/// Send a villager group to hunt an animal resource point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntResource {
    /// Issuing player.
    pub player: PlayerId,
    /// Group to send.
    pub group: VillagerGroupId,
    /// Animal to hunt.
    pub resource: ResourcePointId,
}

/// The shared parameters of a gather or hunt order.
#[derive(Debug, Clone, Copy)]
struct GatherOrder {
    player: PlayerId,
    group: VillagerGroupId,
    resource: ResourcePointId,
    hunting: bool,
}

impl GatherOrder {
    fn plan(self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<GatherPlan, CommandFailure> {
        let Self {
            player,
            group,
            resource,
            hunting,
        } = self;
        checks::player(state, player)?;
        let g = checks::owned_villagers(state, player, group)?;
        let point = checks::resource_point(state, resource)?;

        match (hunting, point.kind.is_huntable()) {
            (true, false) => {
                return Err(CommandFailure::invalid_target(format!("{:?} cannot be hunted", point.kind)));
            }
            (false, true) => {
                return Err(CommandFailure::invalid_target(format!("{:?} must be hunted", point.kind)));
            }
            _ => {}
        }
        if point.is_depleted() {
            return Err(CommandFailure::invalid_state(format!("Resource point {resource} is depleted")));
        }
        if !point.assigned.contains(&group) && point.assigned_count() >= ctx.rules.max_gatherers_per_point {
            return Err(CommandFailure::invalid_target(format!(
                "Resource point {resource} already has {} groups",
                point.assigned_count()
            )));
        }

        if g.position.distance(point.position) <= 1 {
            return Ok(GatherPlan { path: None });
        }
        ctx.pathfinder
            .find_path(g.position, point.position, Some(player), state, true)
            .map(|path| GatherPlan { path: Some(path) })
            .ok_or_else(|| CommandFailure::no_path(format!("No path to resource point {resource}")))
    }

    fn apply(
        self,
        plan: GatherPlan,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        let Self {
            player,
            group,
            resource,
            hunting,
        } = self;
        if !ctx.economy.start_gathering(group, resource, state) {
            return Err(CommandFailure::invalid_state(format!(
                "Economy refused to start gathering at {resource}"
            )));
        }

        let released = effects::release_task(state, ctx.economy, group, false, changes)?;
        state
            .resource_point_mut(resource)
            .ok_or(WorldError::ResourcePointNotFound(resource))?
            .assigned
            .insert(group);

        let task = if hunting {
            VillagerTask::Hunting(resource)
        } else {
            VillagerTask::Gathering(resource)
        };
        let on_site = plan.path.is_none();
        effects::set_task(state, group, task, plan.path.map(MovementPath::new), changes)?;
        assignment::after_release(state, ctx, released, changes)?;
        ctx.economy.update_collection_rates(player, state);

        debug!(%group, %resource, hunting, on_site, "Gathering started");
        changes.push(GatheringStartedChange {
            group,
            resource,
            hunting,
            on_site,
        });
        Ok(())
    }
}

impl GatherResource {
    const fn order(&self) -> GatherOrder {
        GatherOrder {
            player: self.player,
            group: self.group,
            resource: self.resource,
            hunting: false,
        }
    }
}

impl HuntResource {
    const fn order(&self) -> GatherOrder {
        GatherOrder {
            player: self.player,
            group: self.group,
            resource: self.resource,
            hunting: true,
        }
    }
}

impl Command for GatherResource {
    type Plan = GatherPlan;

    fn name(&self) -> &'static str {
        "GatherResource"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<GatherPlan, CommandFailure> {
        self.order().plan(state, ctx)
    }

    fn apply(
        &self,
        plan: GatherPlan,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        self.order().apply(plan, state, ctx, changes)
    }
}

impl Command for HuntResource {
    type Plan = GatherPlan;

    fn name(&self) -> &'static str {
        "HuntResource"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<GatherPlan, CommandFailure> {
        self.order().plan(state, ctx)
    }

    fn apply(
        &self,
        plan: GatherPlan,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        self.order().apply(plan, state, ctx, changes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_events::ChangeList;
    use bastion_types::ResourcePointKind;
    use bastion_world::{HexPathfinder, WorldBuilder};

    use super::*;
    use crate::combat::CombatEngine;
    use crate::config::RulesConfig;
    use crate::economy::{EconomyHooks, PassiveEconomy};
    use crate::error::FailureKind;

    /// Economy that refuses every request.
    struct Closed;

    impl EconomyHooks for Closed {
        fn start_gathering(&mut self, _: VillagerGroupId, _: ResourcePointId, _: &WorldState) -> bool {
            false
        }
        fn stop_gathering(&mut self, _: VillagerGroupId) {}
        fn update_collection_rates(&mut self, _: PlayerId, _: &WorldState) {}
    }

    fn run_with(
        state: &mut WorldState,
        economy: &mut dyn EconomyHooks,
        cmd: &impl Command,
    ) -> Result<ChangeList, CommandFailure> {
        let rules = RulesConfig::default();
        let mut combat = CombatEngine::new();
        let mut ctx = ExecutionContext::new(&HexPathfinder, economy, &mut combat, &rules);
        cmd.execute(state, &mut ctx, &mut ChangeLogBuilder::new())
    }

    fn world() -> (WorldState, PlayerId, VillagerGroupId, ResourcePointId, ResourcePointId) {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let group = b.villagers(Some(p), Hex::new(1, 1), 4);
        let grove = b.resource_point(ResourcePointKind::Grove, Hex::new(2, 1), 300);
        let deer = b.resource_point(ResourcePointKind::Deer, Hex::new(7, 7), 100);
        (b.build().unwrap(), p, group, grove, deer)
    }

    #[test]
    fn adjacent_gathering_starts_on_site() {
        let (mut state, p, group, grove, _) = world();
        let mut economy = PassiveEconomy::new();
        let list = run_with(
            &mut state,
            &mut economy,
            &GatherResource {
                player: p,
                group,
                resource: grove,
            },
        )
        .unwrap();
        assert_eq!(list.kinds(), vec!["VillagerTaskChanged", "GatheringStarted"]);
        assert_eq!(economy.working_on(group), Some(grove));
        assert!(state.resource_point(grove).unwrap().assigned.contains(&group));
        assert_eq!(state.villager_group(group).unwrap().task, VillagerTask::Gathering(grove));
    }

    #[test]
    fn hunting_walks_to_the_animal() {
        let (mut state, p, group, _, deer) = world();
        let list = run_with(
            &mut state,
            &mut PassiveEconomy::new(),
            &HuntResource {
                player: p,
                group,
                resource: deer,
            },
        )
        .unwrap();
        let g = state.villager_group(group).unwrap();
        assert_eq!(g.task, VillagerTask::Hunting(deer));
        assert_eq!(g.path.as_ref().unwrap().destination(), Some(Hex::new(7, 7)));
        assert_eq!(list.count_kind("GatheringStarted"), 1);
    }

    #[test]
    fn kind_must_match_the_order() {
        let (mut state, p, group, grove, deer) = world();
        let hunt_grove = HuntResource {
            player: p,
            group,
            resource: grove,
        };
        let gather_deer = GatherResource {
            player: p,
            group,
            resource: deer,
        };
        let mut economy = PassiveEconomy::new();
        assert_eq!(
            run_with(&mut state, &mut economy, &hunt_grove).unwrap_err().kind,
            FailureKind::InvalidTarget
        );
        assert_eq!(
            run_with(&mut state, &mut economy, &gather_deer).unwrap_err().kind,
            FailureKind::InvalidTarget
        );
    }

    #[test]
    fn full_points_reject_new_groups() {
        let (mut state, p, group, grove, _) = world();
        let point = state.resource_point_mut(grove).unwrap();
        point.assigned.insert(VillagerGroupId::new());
        point.assigned.insert(VillagerGroupId::new());
        let err = run_with(
            &mut state,
            &mut PassiveEconomy::new(),
            &GatherResource {
                player: p,
                group,
                resource: grove,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidTarget);
    }

    #[test]
    fn economy_refusal_leaves_the_world_untouched() {
        let (mut state, p, group, grove, _) = world();
        let before = state.clone();
        let gather = GatherResource {
            player: p,
            group,
            resource: grove,
        };
        let mut closed = Closed;
        assert!(gather.validate(&state, &ValidationContext::new(&HexPathfinder, &RulesConfig::default())).is_ok());
        let err = run_with(&mut state, &mut closed, &gather).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidState);
        assert_eq!(state, before);
    }
}
