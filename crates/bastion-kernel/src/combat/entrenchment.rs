//! The entrenchment state machine.
//!
//! ```text
//! Mobile --begin--> Entrenching --promote_due--> Entrenched
//!    ^                   |                          |
//!    +------ cancel (Move, Attack, Retreat, Manual, Engaged) ---+
//! ```
//!
//! Beginning costs resources and, when the army has a commander, stamina.
//! Promotion is driven by the tick cycle once the configured duration has
//! elapsed. Every cancellation emits exactly one record.

use bastion_events::{
    ChangeLogBuilder, EntrenchmentCancelReason, EntrenchmentCancelledChange,
    EntrenchmentCompletedChange, EntrenchmentStartedChange,
};
use bastion_types::{ArmyId, PlayerId};
use bastion_world::{Army, Entrenchment, WorldError, WorldState};
use tracing::debug;

use crate::config::RulesConfig;
use crate::effects;
use crate::error::CommandFailure;

/// Check that `army` may start entrenching: mobile, the owner affords the
/// resource cost, the commander (if any) has the stamina.
pub fn check_begin(state: &WorldState, owner: PlayerId, army: &Army, rules: &RulesConfig) -> Result<(), CommandFailure> {
    if army.has_entrenchment() {
        return Err(CommandFailure::invalid_state(format!("Army {} is already entrenching", army.id)));
    }
    let player = crate::checks::player(state, owner)?;
    crate::checks::affordable(player, &rules.entrench_cost)?;
    if let Some(commander) = &army.commander {
        if commander.stamina < rules.entrench_stamina_cost {
            return Err(CommandFailure::insufficient(format!(
                "Commander {} has {} stamina, needs {}",
                commander.name, commander.stamina, rules.entrench_stamina_cost
            )));
        }
    }
    Ok(())
}

/// Pay for and start entrenching.
pub fn begin(
    state: &mut WorldState,
    owner: PlayerId,
    army: ArmyId,
    rules: &RulesConfig,
    changes: &mut ChangeLogBuilder,
) -> Result<(), CommandFailure> {
    effects::spend(state, owner, &rules.entrench_cost, changes)?;
    let now = state.current_time;
    let a = state.army_mut(army).ok_or(WorldError::ArmyNotFound(army))?;
    let stamina_spent = match a.commander.as_mut() {
        Some(commander) => {
            commander.stamina = commander.stamina.saturating_sub(rules.entrench_stamina_cost);
            rules.entrench_stamina_cost
        }
        None => 0,
    };
    a.entrenchment = Entrenchment::Entrenching { since: now };
    a.path = None;
    changes.push(EntrenchmentStartedChange {
        army,
        stamina_spent,
        tick: now,
    });
    Ok(())
}

/// Return an army to Mobile. Emits a record and returns `true` only if the
/// army was entrenching or entrenched.
pub fn cancel(
    state: &mut WorldState,
    army: ArmyId,
    reason: EntrenchmentCancelReason,
    changes: &mut ChangeLogBuilder,
) -> bool {
    let Some(a) = state.army_mut(army) else {
        return false;
    };
    if !a.has_entrenchment() {
        return false;
    }
    a.entrenchment = Entrenchment::Mobile;
    debug!(%army, ?reason, "Entrenchment cancelled");
    changes.push(EntrenchmentCancelledChange { army, reason });
    true
}

/// Promote every army that has been entrenching for at least the configured
/// duration. Returns the promoted armies in id order.
pub fn promote_due(state: &mut WorldState, rules: &RulesConfig, changes: &mut ChangeLogBuilder) -> Vec<ArmyId> {
    let now = state.current_time;
    let mut promoted = Vec::new();
    for army in state.armies_mut() {
        let Entrenchment::Entrenching { since } = army.entrenchment else {
            continue;
        };
        if army.in_combat || since.saturating_add(rules.entrench_duration_ticks) > now {
            continue;
        }
        army.entrenchment = Entrenchment::Entrenched { since };
        changes.push(EntrenchmentCompletedChange { army: army.id, tick: now });
        promoted.push(army.id);
    }
    promoted
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{Hex, ResourceType, UnitType};
    use bastion_world::WorldBuilder;

    use super::*;
    use crate::error::FailureKind;

    fn world(wood: u64, stamina: Option<u32>) -> (WorldState, PlayerId, ArmyId) {
        let mut b = WorldBuilder::grass(6, 6).unwrap();
        let p = b.player("A");
        b.resource(p, ResourceType::Wood, wood);
        let army = b.army(Some(p), Hex::new(2, 2), &[(UnitType::Spearman, 4)]);
        if let Some(s) = stamina {
            b.commander(army, s);
        }
        (b.build().unwrap(), p, army)
    }

    #[test]
    fn begin_charges_wood_and_stamina() {
        let (mut state, p, army) = world(80, Some(50));
        let rules = RulesConfig::default();
        let mut changes = ChangeLogBuilder::new();
        check_begin(&state, p, state.army(army).unwrap(), &rules).unwrap();
        begin(&mut state, p, army, &rules, &mut changes).unwrap();

        assert_eq!(state.player(p).unwrap().balance(ResourceType::Wood), 30);
        let a = state.army(army).unwrap();
        assert!(a.is_entrenching());
        assert_eq!(a.commander.as_ref().unwrap().stamina, 30);
        assert_eq!(changes.finalize().kinds(), vec!["ResourcesSpent", "EntrenchmentStarted"]);
    }

    #[test]
    fn tired_commander_cannot_entrench() {
        let (state, p, army) = world(80, Some(10));
        let err = check_begin(&state, p, state.army(army).unwrap(), &RulesConfig::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::InsufficientResource);
    }

    #[test]
    fn promotion_waits_for_the_duration() {
        let (mut state, p, army) = world(80, None);
        let rules = RulesConfig::default();
        let mut changes = ChangeLogBuilder::new();
        begin(&mut state, p, army, &rules, &mut changes).unwrap();

        state.current_time = 29;
        assert!(promote_due(&mut state, &rules, &mut changes).is_empty());
        state.current_time = 30;
        assert_eq!(promote_due(&mut state, &rules, &mut changes), vec![army]);
        assert!(state.army(army).unwrap().is_entrenched());
    }

    #[test]
    fn cancel_emits_only_when_entrenched() {
        let (mut state, p, army) = world(80, None);
        let rules = RulesConfig::default();
        let mut changes = ChangeLogBuilder::new();
        assert!(!cancel(&mut state, army, EntrenchmentCancelReason::Manual, &mut changes));
        assert!(changes.is_empty());

        begin(&mut state, p, army, &rules, &mut changes).unwrap();
        let _ = changes.finalize();
        assert!(cancel(&mut state, army, EntrenchmentCancelReason::Manual, &mut changes));
        assert_eq!(changes.finalize().count_kind("EntrenchmentCancelled"), 1);
        assert!(!state.army(army).unwrap().has_entrenchment());
    }
}
