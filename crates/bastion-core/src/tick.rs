//! Tick hooks: everything that happens because time passes.
//!
//! Commands only start things. Each tick the driver advances the clock and
//! then runs, in order:
//!
//! 1. **Entrenchment** -- armies entrenching for the configured duration
//!    become entrenched.
//! 2. **Reinforcements** -- reinforcements whose arrival tick has passed
//!    merge into their army, or go back to a garrison when the army has
//!    no units left.
//! 3. **Movement** -- armies and villager groups take one step every
//!    `ticks_per_tile` ticks. Arrival clears the path and any retreat
//!    flags; dispatched builders start work with their headcount.
//! 4. **Construction and upgrades** -- finish after the blueprint's build
//!    time divided by the builder count, rounded up.
//! 5. **Demolition** -- buildings torn down for `demolition_ticks` are
//!    destroyed.
//! 6. **Training** -- due batches join the garrison.
//!
//! Every hook is deterministic given the same world and rules.

use bastion_events::{
    ArmyArrivedChange, BuildingCompletedChange, BuildingDestroyedChange, ChangeList,
    ChangeLogBuilder, ReinforcementArrivedChange, ReinforcementLostChange,
    TrainingCompletedChange, UpgradeCompletedChange, VillagersArrivedChange,
};
use bastion_kernel::combat::entrenchment;
use bastion_kernel::commands::return_reinforcement;
use bastion_kernel::{CommandFailure, RulesConfig, assignment, effects};
use bastion_types::{ArmyId, BuildingId, BuildingState, Hex, PlayerId, VillagerGroupId};
use bastion_world::{
    Army, Composition, MovementPath, PendingReinforcement, VillagerTask, WorldError, WorldState,
    composition,
};
use tracing::debug;

use crate::clock::{ClockError, WorldClock};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A kernel helper rejected a tick-side mutation.
    #[error("kernel error: {source}")]
    Kernel {
        /// The underlying failure.
        #[from]
        source: CommandFailure,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick that was executed.
    pub tick: u64,
    /// Armies that finished entrenching.
    pub entrenched: Vec<ArmyId>,
    /// Everything the hooks changed, in order.
    pub changes: ChangeList,
}

/// Advance the clock by one tick and run every hook.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows or the world is found in an
/// inconsistent state. Records of a failed tick are discarded.
pub fn run_tick(state: &mut WorldState, clock: &WorldClock, rules: &RulesConfig) -> Result<TickSummary, TickError> {
    let tick = clock.tick(state)?;
    let mut changes = ChangeLogBuilder::new();

    let entrenched = entrenchment::promote_due(state, rules, &mut changes);
    deliver_reinforcements(state, &mut changes)?;
    advance_movement(state, rules, &mut changes)?;
    complete_construction(state, &mut changes)?;
    complete_upgrades(state, &mut changes)?;
    complete_demolitions(state, rules, &mut changes)?;
    complete_training(state, &mut changes)?;

    let changes = changes.finalize();
    if !changes.is_empty() {
        debug!(tick, records = changes.len(), entrenched = entrenched.len(), "Tick hooks applied");
    }
    Ok(TickSummary {
        tick,
        entrenched,
        changes,
    })
}

/// Ticks of work a site needs with `builders` workers, never less than one
/// builder.
fn work_ticks(build_ticks: u64, builders: u32) -> u64 {
    build_ticks.div_ceil(u64::from(builders.max(1)))
}

/// Idle every group working `task`.
fn idle_workers(state: &mut WorldState, task: VillagerTask, changes: &mut ChangeLogBuilder) -> Result<(), TickError> {
    let groups: Vec<VillagerGroupId> = state
        .villager_groups()
        .filter(|g| g.task == task)
        .map(|g| g.id)
        .collect();
    for group in groups {
        effects::set_task(state, group, VillagerTask::Idle, None, changes)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reinforcements
// ---------------------------------------------------------------------------

fn deliver_reinforcements(state: &mut WorldState, changes: &mut ChangeLogBuilder) -> Result<(), TickError> {
    let now = state.current_time;
    let mut due: Vec<(ArmyId, Option<PlayerId>, PendingReinforcement)> = Vec::new();
    for army in state.armies_mut() {
        let arrived: Vec<_> = army
            .pending_reinforcements
            .values()
            .filter(|r| r.arrives_at <= now)
            .map(|r| r.id)
            .collect();
        for id in arrived {
            if let Some(reinforcement) = army.pending_reinforcements.remove(&id) {
                due.push((army.id, army.owner, reinforcement));
            }
        }
    }

    for (army_id, owner, reinforcement) in due {
        let target = state.army_mut(army_id).filter(|a| a.is_alive());
        if let Some(army) = target {
            composition::merge(&mut army.composition, &reinforcement.composition)?;
            debug!(reinforcement = %reinforcement.id, army = %army_id, "Reinforcement arrived");
            changes.push(ReinforcementArrivedChange {
                reinforcement: reinforcement.id,
                army: army_id,
                composition: reinforcement.composition,
            });
            continue;
        }

        debug!(reinforcement = %reinforcement.id, army = %army_id, "Reinforcement found no army");
        match owner {
            Some(owner) => {
                return_reinforcement(state, owner, &reinforcement, changes)?;
            }
            None => changes.push(ReinforcementLostChange {
                reinforcement: reinforcement.id,
                composition: reinforcement.composition,
            }),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Spend one tick on a path. Returns the tile entered, if any.
fn walk(path: &mut MovementPath, pace: u64) -> Option<Hex> {
    if path.is_complete() {
        return None;
    }
    path.progress = path.progress.saturating_add(1);
    if path.progress < pace {
        return None;
    }
    path.advance()
}

fn step_army(army: &mut Army, pace: u64) -> bool {
    let Some(path) = army.path.as_mut() else {
        return false;
    };
    if let Some(hex) = walk(path, pace) {
        army.position = hex;
    }
    if !path.is_complete() {
        return false;
    }
    army.path = None;
    army.retreating = false;
    army.retreat_target = None;
    true
}

fn advance_movement(state: &mut WorldState, rules: &RulesConfig, changes: &mut ChangeLogBuilder) -> Result<(), TickError> {
    let pace = rules.ticks_per_tile.max(1);

    for army in state.armies_mut() {
        if step_army(army, pace) {
            changes.push(ArmyArrivedChange {
                army: army.id,
                position: army.position,
            });
        }
    }

    let mut arrivals: Vec<(VillagerGroupId, VillagerTask, u32)> = Vec::new();
    for group in state.villager_groups_mut() {
        let Some(path) = group.path.as_mut() else {
            continue;
        };
        if let Some(hex) = walk(path, pace) {
            group.position = hex;
        }
        if path.is_complete() {
            group.path = None;
            changes.push(VillagersArrivedChange {
                group: group.id,
                position: group.position,
            });
            arrivals.push((group.id, group.task, group.headcount));
        }
    }

    for (group, task, headcount) in arrivals {
        match task {
            VillagerTask::Moving => effects::set_task(state, group, VillagerTask::Idle, None, changes)?,
            VillagerTask::Building(site) | VillagerTask::Upgrading(site) => {
                let workable = state.building(site).is_some_and(|b| {
                    matches!(
                        b.state,
                        BuildingState::Planning | BuildingState::Constructing | BuildingState::Upgrading
                    )
                });
                if workable {
                    assignment::begin_work(state, site, headcount, changes)?;
                } else {
                    effects::set_task(state, group, VillagerTask::Idle, None, changes)?;
                }
            }
            VillagerTask::Idle | VillagerTask::Gathering(_) | VillagerTask::Hunting(_) => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

fn complete_construction(state: &mut WorldState, changes: &mut ChangeLogBuilder) -> Result<(), TickError> {
    let now = state.current_time;
    let mut finished: Vec<(BuildingId, Option<PlayerId>, u32)> = Vec::new();
    for b in state.buildings_mut() {
        if b.state != BuildingState::Constructing || b.builders == 0 {
            continue;
        }
        let Some(started) = b.construction_started_at else {
            continue;
        };
        let spec = b.spec();
        if started.saturating_add(work_ticks(spec.build_ticks, b.builders)) > now {
            continue;
        }
        b.state = BuildingState::Completed;
        b.builders = 0;
        b.awaiting_builders = false;
        finished.push((b.id, b.owner, spec.population_capacity));
    }

    for (building, owner, capacity) in finished {
        if let Some(player) = owner.and_then(|o| state.player_mut(o)) {
            player.population_cap = player.population_cap.saturating_add(capacity);
        }
        debug!(%building, tick = now, "Construction completed");
        changes.push(BuildingCompletedChange { building, tick: now });
        idle_workers(state, VillagerTask::Building(building), changes)?;
    }
    Ok(())
}

fn complete_upgrades(state: &mut WorldState, changes: &mut ChangeLogBuilder) -> Result<(), TickError> {
    let now = state.current_time;
    let mut finished: Vec<(BuildingId, Option<PlayerId>, u32)> = Vec::new();
    for b in state.buildings_mut() {
        if b.state != BuildingState::Upgrading || b.builders == 0 {
            continue;
        }
        let Some(started) = b.upgrade_started_at else {
            continue;
        };
        if started.saturating_add(work_ticks(b.spec().build_ticks, b.builders)) > now {
            continue;
        }
        b.state = BuildingState::Completed;
        b.level = b.level.saturating_add(1);
        b.builders = 0;
        b.awaiting_builders = false;
        b.upgrade_started_at = None;
        finished.push((b.id, b.owner, b.level));
    }

    for (building, owner, level) in finished {
        if let Some(player) = owner.and_then(|o| state.player_mut(o)) {
            if player.active_upgrade == Some(building) {
                player.active_upgrade = None;
            }
        }
        debug!(%building, level, "Upgrade completed");
        changes.push(UpgradeCompletedChange {
            building,
            level,
            tick: now,
        });
        idle_workers(state, VillagerTask::Upgrading(building), changes)?;
    }
    Ok(())
}

fn complete_demolitions(
    state: &mut WorldState,
    rules: &RulesConfig,
    changes: &mut ChangeLogBuilder,
) -> Result<(), TickError> {
    let now = state.current_time;
    let mut destroyed: Vec<(BuildingId, Option<PlayerId>, u32)> = Vec::new();
    for b in state.buildings_mut() {
        if b.state != BuildingState::Demolishing {
            continue;
        }
        let Some(started) = b.demolition_started_at else {
            continue;
        };
        if started.saturating_add(rules.demolition_ticks) > now {
            continue;
        }
        b.state = BuildingState::Destroyed;
        destroyed.push((b.id, b.owner, b.spec().population_capacity));
    }

    for (building, owner, capacity) in destroyed {
        if let Some(player) = owner.and_then(|o| state.player_mut(o)) {
            player.population_cap = player.population_cap.saturating_sub(capacity);
        }
        debug!(%building, "Building destroyed");
        changes.push(BuildingDestroyedChange { building, tick: now });
    }
    Ok(())
}

fn complete_training(state: &mut WorldState, changes: &mut ChangeLogBuilder) -> Result<(), TickError> {
    let now = state.current_time;
    for b in state.buildings_mut() {
        if !b.is_operational() {
            continue;
        }
        let due = b.training_queue.partition_point(|batch| batch.completes_at <= now);
        if due == 0 {
            continue;
        }
        let batches: Vec<_> = b.training_queue.drain(..due).collect();
        for batch in batches {
            composition::merge(&mut b.garrison, &Composition::from([(batch.unit, batch.count)]))?;
            debug!(building = %b.id, unit = ?batch.unit, count = batch.count, "Training completed");
            changes.push(TrainingCompletedChange {
                building: b.id,
                unit: batch.unit,
                count: batch.count,
            });
            changes.push(effects::garrison_changed(b));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{BuildingType, ReinforcementId, UnitType};
    use bastion_world::{TrainingBatch, WorldBuilder};

    use super::*;

    fn rules() -> RulesConfig {
        RulesConfig {
            ticks_per_tile: 2,
            entrench_duration_ticks: 3,
            demolition_ticks: 4,
            ..RulesConfig::default()
        }
    }

    fn run(state: &mut WorldState, ticks: u64) -> Vec<&'static str> {
        let clock = WorldClock::new(0);
        let mut kinds = Vec::new();
        for _ in 0..ticks {
            kinds.extend(run_tick(state, &clock, &rules()).unwrap().changes.kinds());
        }
        kinds
    }

    #[test]
    fn work_ticks_round_up() {
        assert_eq!(work_ticks(40, 1), 40);
        assert_eq!(work_ticks(40, 3), 14);
        assert_eq!(work_ticks(40, 0), 40);
    }

    #[test]
    fn entrenching_army_is_promoted() {
        let mut b = WorldBuilder::grass(6, 6).unwrap();
        let p = b.player("A");
        let army = b.army(Some(p), Hex::new(2, 2), &[(UnitType::Spearman, 3)]);
        b.entrenching(army, 0);
        let mut state = b.build().unwrap();

        assert!(run(&mut state, 2).is_empty());
        assert_eq!(run(&mut state, 1), vec!["EntrenchmentCompleted"]);
        assert!(state.army(army).unwrap().is_entrenched());
    }

    #[test]
    fn armies_walk_one_tile_per_pace() {
        let mut b = WorldBuilder::grass(8, 8).unwrap();
        let p = b.player("A");
        let army = b.army(Some(p), Hex::new(1, 1), &[(UnitType::Swordsman, 2)]);
        let mut state = b.build().unwrap();
        {
            let a = state.army_mut(army).unwrap();
            a.path = Some(MovementPath::new(vec![Hex::new(2, 1), Hex::new(3, 1)]));
            a.retreating = true;
        }

        run(&mut state, 2);
        let a = state.army(army).unwrap();
        assert_eq!(a.position, Hex::new(2, 1));
        assert!(a.retreating);

        assert_eq!(run(&mut state, 2), vec!["ArmyArrived"]);
        let a = state.army(army).unwrap();
        assert_eq!(a.position, Hex::new(3, 1));
        assert!(a.path.is_none());
        assert!(!a.retreating);
        assert!(a.retreat_target.is_none());
    }

    #[test]
    fn empty_path_arrives_immediately() {
        let mut b = WorldBuilder::grass(6, 6).unwrap();
        let p = b.player("A");
        let army = b.army(Some(p), Hex::new(1, 1), &[(UnitType::Swordsman, 2)]);
        let mut state = b.build().unwrap();
        state.army_mut(army).unwrap().path = Some(MovementPath::new(Vec::new()));
        assert_eq!(run(&mut state, 1), vec!["ArmyArrived"]);
    }

    #[test]
    fn moving_villagers_become_idle_on_arrival() {
        let mut b = WorldBuilder::grass(6, 6).unwrap();
        let p = b.player("A");
        let group = b.villagers(Some(p), Hex::new(1, 1), 3);
        let mut state = b.build().unwrap();
        {
            let g = state.villager_group_mut(group).unwrap();
            g.task = VillagerTask::Moving;
            g.path = Some(MovementPath::new(vec![Hex::new(2, 1)]));
        }
        assert_eq!(run(&mut state, 2), vec!["VillagersArrived", "VillagerTaskChanged"]);
        let g = state.villager_group(group).unwrap();
        assert_eq!(g.position, Hex::new(2, 1));
        assert_eq!(g.task, VillagerTask::Idle);
    }

    #[test]
    fn arriving_builders_start_construction() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let site = b.building_in_state(Some(p), BuildingType::House, Hex::new(5, 5), BuildingState::Planning);
        let group = b.villagers(Some(p), Hex::new(3, 5), 4);
        let mut state = b.build().unwrap();
        state.building_mut(site).unwrap().awaiting_builders = true;
        {
            let g = state.villager_group_mut(group).unwrap();
            g.task = VillagerTask::Building(site);
            g.path = Some(MovementPath::new(vec![Hex::new(4, 5)]));
        }

        assert_eq!(run(&mut state, 2), vec!["VillagersArrived", "ConstructionStarted"]);
        let building = state.building(site).unwrap();
        assert_eq!(building.state, BuildingState::Constructing);
        assert_eq!(building.builders, 4);
        assert!(!building.awaiting_builders);
    }

    #[test]
    fn construction_completes_and_raises_the_cap() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let site = b.building_in_state(Some(p), BuildingType::House, Hex::new(5, 5), BuildingState::Constructing);
        let group = b.villagers(Some(p), Hex::new(4, 5), 2);
        let mut state = b.build().unwrap();
        let build_ticks = state.building(site).unwrap().spec().build_ticks;
        {
            let building = state.building_mut(site).unwrap();
            building.builders = 2;
            building.construction_started_at = Some(0);
        }
        state.villager_group_mut(group).unwrap().task = VillagerTask::Building(site);
        let cap = state.player(p).unwrap().population_cap;

        run(&mut state, work_ticks(build_ticks, 2).saturating_sub(1));
        assert_eq!(state.building(site).unwrap().state, BuildingState::Constructing);

        assert_eq!(run(&mut state, 1), vec!["BuildingCompleted", "VillagerTaskChanged"]);
        assert_eq!(state.building(site).unwrap().state, BuildingState::Completed);
        assert_eq!(state.player(p).unwrap().population_cap, cap.saturating_add(5));
        assert_eq!(state.villager_group(group).unwrap().task, VillagerTask::Idle);
    }

    #[test]
    fn upgrade_completes_and_frees_the_slot() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let barracks = b.building_in_state(Some(p), BuildingType::Barracks, Hex::new(5, 5), BuildingState::Upgrading);
        let mut state = b.build().unwrap();
        let build_ticks = state.building(barracks).unwrap().spec().build_ticks;
        {
            let building = state.building_mut(barracks).unwrap();
            building.builders = 1;
            building.upgrade_started_at = Some(0);
        }
        state.player_mut(p).unwrap().active_upgrade = Some(barracks);

        let kinds = run(&mut state, build_ticks);
        assert_eq!(kinds, vec!["UpgradeCompleted"]);
        let building = state.building(barracks).unwrap();
        assert_eq!(building.level, 2);
        assert_eq!(building.state, BuildingState::Completed);
        assert!(state.player(p).unwrap().active_upgrade.is_none());
    }

    #[test]
    fn demolition_destroys_after_the_delay() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let house = b.building_in_state(Some(p), BuildingType::House, Hex::new(5, 5), BuildingState::Demolishing);
        let mut state = b.build().unwrap();
        state.building_mut(house).unwrap().demolition_started_at = Some(0);
        state.player_mut(p).unwrap().population_cap = 20;

        assert!(run(&mut state, 3).is_empty());
        assert_eq!(run(&mut state, 1), vec!["BuildingDestroyed"]);
        assert_eq!(state.building(house).unwrap().state, BuildingState::Destroyed);
        assert_eq!(state.player(p).unwrap().population_cap, 15);
    }

    #[test]
    fn due_training_joins_the_garrison() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let barracks = b.building(Some(p), BuildingType::Barracks, Hex::new(5, 5));
        let mut state = b.build().unwrap();
        state.building_mut(barracks).unwrap().training_queue = vec![
            TrainingBatch {
                unit: UnitType::Spearman,
                count: 3,
                queued_at: 0,
                completes_at: 2,
            },
            TrainingBatch {
                unit: UnitType::Swordsman,
                count: 1,
                queued_at: 0,
                completes_at: 6,
            },
        ];

        assert_eq!(run(&mut state, 2), vec!["TrainingCompleted", "GarrisonChanged"]);
        let building = state.building(barracks).unwrap();
        assert_eq!(building.garrison.get(&UnitType::Spearman), Some(&3));
        assert_eq!(building.training_queue.len(), 1);
    }

    fn reinforcement(source_building: BuildingId, arrives_at: u64) -> PendingReinforcement {
        PendingReinforcement {
            id: ReinforcementId::new(),
            composition: Composition::from([(UnitType::Spearman, 4)]),
            source_building,
            source: Hex::new(1, 1),
            path: vec![Hex::new(2, 1)],
            dispatched_at: 0,
            arrives_at,
        }
    }

    #[test]
    fn reinforcements_merge_on_arrival() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let fort = b.building(Some(p), BuildingType::Fort, Hex::new(1, 1));
        let army = b.army(Some(p), Hex::new(6, 6), &[(UnitType::Swordsman, 2)]);
        let mut state = b.build().unwrap();
        let pending = reinforcement(fort, 3);
        state.army_mut(army).unwrap().pending_reinforcements.insert(pending.id, pending);

        assert!(run(&mut state, 2).is_empty());
        assert_eq!(run(&mut state, 1), vec!["ReinforcementArrived"]);
        let a = state.army(army).unwrap();
        assert_eq!(a.size(), 6);
        assert!(a.pending_reinforcements.is_empty());
    }

    #[test]
    fn reinforcements_for_a_dead_army_go_home() {
        let mut b = WorldBuilder::grass(10, 10).unwrap();
        let p = b.player("A");
        let fort = b.building(Some(p), BuildingType::Fort, Hex::new(1, 1));
        let army = b.army(Some(p), Hex::new(6, 6), &[(UnitType::Swordsman, 2)]);
        let mut state = b.build().unwrap();
        let pending = reinforcement(fort, 1);
        {
            let a = state.army_mut(army).unwrap();
            a.composition.clear();
            a.pending_reinforcements.insert(pending.id, pending);
        }

        assert_eq!(run(&mut state, 1), vec!["GarrisonChanged"]);
        assert_eq!(state.building(fort).unwrap().garrison_total(), 4);
    }
}
