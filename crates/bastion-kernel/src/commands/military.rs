//! Attack, entrenchment, retreat, and home base orders.

use bastion_events::{
    ArmyMoveOrderedChange, ChangeLogBuilder, EntrenchmentCancelReason, HomeBaseAssignedChange,
    RetreatStartedChange,
};
use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, VillagerGroupId};
use bastion_world::{Army, Building, MovementPath, WorldError, WorldState, movement};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assignment;
use crate::checks;
use crate::combat::{DefenseClassification, DefensiveStack, entrenchment, protecting_structures};
use crate::command::Command;
use crate::config::RulesConfig;
use crate::context::{ExecutionContext, ValidationContext};
use crate::error::CommandFailure;

// ---------------------------------------------------------------------------
// AttackTarget
// ---------------------------------------------------------------------------

/// Attack whatever defends a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackTarget {
    /// Issuing player.
    pub player: PlayerId,
    /// Attacking army.
    pub army: ArmyId,
    /// Coordinate under attack.
    pub target: Hex,
}

/// The session an attack opens.
#[derive(Debug, Clone)]
enum Engagement {
    Single(ArmyId),
    Stack {
        attackers: Vec<ArmyId>,
        stack: DefensiveStack,
    },
    Siege(BuildingId),
    Villagers {
        groups: Vec<VillagerGroupId>,
        building: Option<BuildingId>,
    },
}

/// Resolved attack: the encounter shape and the approach route.
#[derive(Debug, Clone)]
pub struct AttackPlan {
    classification: DefenseClassification,
    engagement: Engagement,
    path: Option<Vec<Hex>>,
}

impl AttackPlan {
    /// The encounter shape the attack resolved to.
    pub const fn classification(&self) -> DefenseClassification {
        self.classification
    }
}

/// Idle armies of `player` next to the attacker or the target that join a
/// stack attack, in id order.
fn nearby_allies(
    state: &WorldState,
    player: PlayerId,
    attacker: &Army,
    target: Hex,
    radius: u32,
) -> Vec<ArmyId> {
    let near = |hex: Hex| hex.distance(attacker.position) <= radius || hex.distance(target) <= radius;
    state
        .armies()
        .filter(|a| a.id != attacker.id && a.is_owned_by(player) && a.is_idle())
        .filter(|a| near(a.position))
        .map(|a| a.id)
        .collect()
}

impl AttackTarget {
    fn check_protection(
        &self,
        state: &WorldState,
        stack: &DefensiveStack,
        rules: &RulesConfig,
    ) -> Result<(), CommandFailure> {
        let Some(building) = stack.building.and_then(|id| state.building(id)) else {
            return Ok(());
        };
        let protectors = protecting_structures(state, building, rules);
        if protectors.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = protectors.iter().map(ToString::to_string).collect();
        Err(CommandFailure::invalid_target(format!(
            "Building {} is protected by {}",
            building.id,
            names.join(", ")
        )))
    }
}

impl Command for AttackTarget {
    type Plan = AttackPlan;

    fn name(&self) -> &'static str {
        "AttackTarget"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<AttackPlan, CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        checks::ready_army(army)?;
        if !ctx.pathfinder.is_valid_coordinate(self.target, state) {
            return Err(CommandFailure::invalid_target(format!("{} is off the map", self.target)));
        }

        let stack = DefensiveStack::collect(state, self.player, self.target, ctx.rules);
        self.check_protection(state, &stack, ctx.rules)?;

        let classification = stack.classify();
        let engagement = match classification {
            DefenseClassification::NoTarget => {
                return Err(CommandFailure::invalid_target("No valid target found"));
            }
            DefenseClassification::SingleArmy => match stack.located.first() {
                Some(&defender) => Engagement::Single(defender),
                None => return Err(CommandFailure::invalid_target("No valid target found")),
            },
            DefenseClassification::StackedArmies
            | DefenseClassification::CrossTileCoverage
            | DefenseClassification::BuildingWithDefenders => {
                let mut attackers = vec![self.army];
                let radius = ctx.rules.ally_pull_in_radius;
                attackers.extend(nearby_allies(state, self.player, army, self.target, radius));
                Engagement::Stack { attackers, stack }
            }
            DefenseClassification::BuildingOnly => match stack.building {
                Some(building) => Engagement::Siege(building),
                None => return Err(CommandFailure::invalid_target("No valid target found")),
            },
            DefenseClassification::BuildingVillagers | DefenseClassification::VillagersOnly => {
                Engagement::Villagers {
                    groups: stack.villagers.clone(),
                    building: stack.building,
                }
            }
        };

        let from = army.position;
        let path = if from.distance(self.target) > 1 {
            let path = ctx
                .pathfinder
                .find_path(from, self.target, Some(self.player), state, true)
                .ok_or_else(|| {
                    CommandFailure::no_path(format!("No path from {from} to {}", self.target))
                })?;
            Some(path)
        } else {
            None
        };

        Ok(AttackPlan {
            classification,
            engagement,
            path,
        })
    }

    fn apply(
        &self,
        plan: AttackPlan,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        debug!(
            army = %self.army,
            target = %self.target,
            classification = ?plan.classification,
            "Attack resolved"
        );
        let engine = &mut *ctx.combat;
        let combat = match plan.engagement {
            Engagement::Single(defender) => {
                engine.start_single_combat(state, self.army, defender, changes)?
            }
            Engagement::Stack { attackers, stack } => {
                engine.start_stack_combat(state, &attackers, &stack, changes)?
            }
            Engagement::Siege(building) => {
                engine.start_building_combat(state, self.army, building, changes)?
            }
            Engagement::Villagers { groups, building } => engine.start_villager_combat(
                state,
                self.army,
                self.target,
                &groups,
                building,
                changes,
            )?,
        };
        // March orders are set only once the engagement stands.
        if let Some(path) = plan.path {
            let army = state.army_mut(self.army).ok_or(WorldError::ArmyNotFound(self.army))?;
            let path_length = movement::path_length(&path);
            army.path = Some(MovementPath::new(path));
            changes.push(ArmyMoveOrderedChange {
                army: self.army,
                from: army.position,
                destination: self.target,
                path_length,
            });
        }
        info!(army = %self.army, %combat, "Combat engaged");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entrench / CancelEntrenchment
// ---------------------------------------------------------------------------

/// Dig an army in where it stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrench {
    /// Issuing player.
    pub player: PlayerId,
    /// Army to entrench.
    pub army: ArmyId,
}

impl Command for Entrench {
    type Plan = ();

    fn name(&self) -> &'static str {
        "Entrench"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        checks::ready_army(army)?;
        entrenchment::check_begin(state, self.player, army, ctx.rules)
    }

    fn apply(
        &self,
        (): (),
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        entrenchment::begin(state, self.player, self.army, ctx.rules, changes)
    }
}

/// Return an entrenching or entrenched army to mobile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelEntrenchment {
    /// Issuing player.
    pub player: PlayerId,
    /// Army to release.
    pub army: ArmyId,
}

impl Command for CancelEntrenchment {
    type Plan = ();

    fn name(&self) -> &'static str {
        "CancelEntrenchment"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        if !army.has_entrenchment() {
            return Err(CommandFailure::invalid_state(format!("Army {} is not entrenched", army.id)));
        }
        Ok(())
    }

    fn apply(
        &self,
        (): (),
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        entrenchment::cancel(state, self.army, EntrenchmentCancelReason::Manual, changes);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Retreat
// ---------------------------------------------------------------------------

/// Pull an army out of combat or its position back to a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retreat {
    /// Issuing player.
    pub player: PlayerId,
    /// Army to withdraw.
    pub army: ArmyId,
}

/// Where a retreat ends.
#[derive(Debug, Clone)]
pub struct RetreatPlan {
    base: BuildingId,
    destination: Hex,
    path: Vec<Hex>,
}

/// Bases to fall back on: a valid home base first, then the player's other
/// bases nearest first.
fn retreat_candidates<'s>(state: &'s WorldState, player: PlayerId, army: &Army) -> Vec<&'s Building> {
    let home = army
        .home_base
        .and_then(|id| state.building(id))
        .filter(|b| b.is_owned_by(player) && b.is_operational());
    let mut candidates: Vec<&Building> = home.into_iter().collect();
    candidates.extend(
        state
            .bases_by_distance(player, army.position)
            .into_iter()
            .filter(|b| Some(b.id) != army.home_base),
    );
    candidates
}

/// Route to the nearest reachable tile next to `base`.
fn route_to_base(
    state: &WorldState,
    ctx: &ValidationContext<'_>,
    player: PlayerId,
    from: Hex,
    base: &Building,
) -> Option<(Hex, Vec<Hex>)> {
    if base.distance_to(from) <= 1 {
        return Some((from, Vec::new()));
    }
    assignment::approach_tiles(&base.footprint, from)
        .into_iter()
        .filter(|tile| ctx.pathfinder.is_walkable(*tile, state))
        .find_map(|tile| {
            ctx.pathfinder
                .find_path(from, tile, Some(player), state, false)
                .map(|path| (tile, path))
        })
}

impl Command for Retreat {
    type Plan = RetreatPlan;

    fn name(&self) -> &'static str {
        "Retreat"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<RetreatPlan, CommandFailure> {
        checks::player(state, self.player)?;
        let army = checks::owned_army(state, self.player, self.army)?;
        if !army.is_alive() {
            return Err(CommandFailure::invalid_state(format!("Army {} has no units", army.id)));
        }
        if army.retreating {
            return Err(CommandFailure::invalid_state(format!("Army {} is already retreating", army.id)));
        }
        if !army.in_combat && !army.has_entrenchment() {
            return Err(CommandFailure::invalid_state(format!(
                "Army {} is neither in combat nor entrenched",
                army.id
            )));
        }

        let candidates = retreat_candidates(state, self.player, army);
        if candidates.is_empty() {
            return Err(CommandFailure::no_candidate(format!("No base for army {} to retreat to", army.id)));
        }
        candidates
            .into_iter()
            .find_map(|base| {
                route_to_base(state, ctx, self.player, army.position, base).map(|(destination, path)| RetreatPlan {
                    base: base.id,
                    destination,
                    path,
                })
            })
            .ok_or_else(|| CommandFailure::no_path(format!("No base reachable from {}", army.position)))
    }

    fn apply(
        &self,
        plan: RetreatPlan,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        entrenchment::cancel(state, self.army, EntrenchmentCancelReason::Retreat, changes);
        if let Some(combat) = ctx.combat.retreat_from_combat(state, self.army, changes) {
            debug!(army = %self.army, %combat, "Disengaged");
        }

        let army = state.army_mut(self.army).ok_or(WorldError::ArmyNotFound(self.army))?;
        let path_length = movement::path_length(&plan.path);
        army.retreating = true;
        army.retreat_target = Some(plan.base);
        army.path = Some(MovementPath::new(plan.path));
        changes.push(RetreatStartedChange {
            army: self.army,
            base: plan.base,
            destination: plan.destination,
            path_length,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AssignHomeBase
// ---------------------------------------------------------------------------

/// Set the base an army retreats to and is reinforced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignHomeBase {
    /// Issuing player.
    pub player: PlayerId,
    /// Army to assign.
    pub army: ArmyId,
    /// New home base.
    pub building: BuildingId,
}

impl Command for AssignHomeBase {
    type Plan = ();

    fn name(&self) -> &'static str {
        "AssignHomeBase"
    }

    fn issuer(&self) -> PlayerId {
        self.player
    }

    fn plan(&self, state: &WorldState, _ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        checks::player(state, self.player)?;
        checks::owned_army(state, self.player, self.army)?;
        let building = checks::owned_building(state, self.player, self.building)?;
        checks::operational(building)?;
        if !building.spec().is_base {
            return Err(CommandFailure::invalid_target(format!(
                "{:?} cannot serve as a home base",
                building.building_type
            )));
        }
        Ok(())
    }

    fn apply(
        &self,
        (): (),
        state: &mut WorldState,
        _ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure> {
        state
            .army_mut(self.army)
            .ok_or(WorldError::ArmyNotFound(self.army))?
            .home_base = Some(self.building);
        changes.push(HomeBaseAssignedChange {
            army: self.army,
            building: self.building,
        });
        Ok(())
    }
}
