//! Combat session lifecycle.
//!
//! The [`CombatEngine`] owns every in-progress session, keyed by
//! [`CombatId`], and a participant index mapping each army, building and
//! villager group to at most one session. Starting combat against a
//! defender that is already fighting joins the existing session instead of
//! opening a second one. The newcomer always lands on the side opposite
//! its target, so attacking an army that is itself attacking makes the
//! newcomer a defender of that session.
//!
//! Every start operation follows the same order:
//!
//! 1. Verify all participants exist and can fight (no mutation yet)
//! 2. Cancel the attackers' own entrenchment (`Attack`)
//! 3. Cancel the entrenching (not yet entrenched) defenders (`Engaged`)
//! 4. Join the defenders' session or open a new one
//! 5. Flag every army as in combat and index every participant
//!
//! The side to join is settled during verification, so a rejected start
//! leaves nothing behind. Per-tick damage resolution is driven elsewhere;
//! this module only manages who fights whom. [`CombatEngine::reconcile`]
//! drops participants the world no longer has and closes sessions left
//! with an empty side.

use std::collections::{BTreeMap, BTreeSet};

use bastion_events::{
    ArmyDisengagedChange, ChangeLogBuilder, CombatEndedChange, CombatJoinedChange, CombatMode,
    CombatStartedChange, EntrenchmentCancelReason,
};
use bastion_types::{ArmyId, BuildingId, CombatId, Hex, VillagerGroupId};
use bastion_world::{Army, WorldState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::defense::DefensiveStack;
use super::entrenchment;
use crate::error::CommandFailure;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Anything that can take part in a combat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Participant {
    /// An army on either side.
    Army(ArmyId),
    /// A besieged building.
    Building(BuildingId),
    /// A harassed villager group.
    Villagers(VillagerGroupId),
}

/// One ongoing battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSession {
    /// Session identifier.
    pub id: CombatId,
    /// Encounter shape the session was opened with.
    pub mode: CombatMode,
    /// Coordinate being fought over.
    pub position: Hex,
    /// Attacking armies.
    pub attackers: BTreeSet<ArmyId>,
    /// Defending armies.
    pub defenders: BTreeSet<ArmyId>,
    /// Besieged building, if any.
    pub building: Option<BuildingId>,
    /// Harassed villager groups.
    pub villagers: BTreeSet<VillagerGroupId>,
    /// Tick the session opened.
    pub started_at: u64,
}

impl CombatSession {
    /// Every participant of the session.
    pub fn participants(&self) -> Vec<Participant> {
        self.attackers
            .iter()
            .chain(&self.defenders)
            .map(|a| Participant::Army(*a))
            .chain(self.building.map(Participant::Building))
            .chain(self.villagers.iter().map(|g| Participant::Villagers(*g)))
            .collect()
    }

    /// A session is over when one side has nobody left.
    pub fn is_over(&self) -> bool {
        self.attackers.is_empty()
            || (self.defenders.is_empty() && self.building.is_none() && self.villagers.is_empty())
    }
}

/// Participants of one start request.
struct Engagement<'e> {
    mode: CombatMode,
    position: Hex,
    attackers: &'e [ArmyId],
    defenders: &'e [ArmyId],
    building: Option<BuildingId>,
    villagers: &'e [VillagerGroupId],
}

/// Where a start request lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// No defender is fighting yet.
    Open,
    /// A defender already defends in this session.
    Join(CombatId),
    /// A defender is attacking in this session; the newcomers defend it.
    Oppose(CombatId),
}

impl Engagement<'_> {
    fn defending_participants(&self) -> impl Iterator<Item = Participant> + '_ {
        self.defenders
            .iter()
            .map(|a| Participant::Army(*a))
            .chain(self.building.map(Participant::Building))
            .chain(self.villagers.iter().map(|g| Participant::Villagers(*g)))
    }
}

// ---------------------------------------------------------------------------
// CombatEngine
// ---------------------------------------------------------------------------

/// Registry of combat sessions.
#[derive(Debug, Clone, Default)]
pub struct CombatEngine {
    sessions: BTreeMap<CombatId, CombatSession>,
    index: BTreeMap<Participant, CombatId>,
}

impl CombatEngine {
    /// Create an engine with no sessions.
    pub const fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            index: BTreeMap::new(),
        }
    }

    /// One army attacks one mobile army.
    pub fn start_single_combat(
        &mut self,
        state: &mut WorldState,
        attacker: ArmyId,
        defender: ArmyId,
        changes: &mut ChangeLogBuilder,
    ) -> Result<CombatId, CommandFailure> {
        let position = state
            .army(defender)
            .map(|a| a.position)
            .ok_or_else(|| CommandFailure::not_found(format!("Defender {defender} not found")))?;
        self.open_or_join(
            state,
            &Engagement {
                mode: CombatMode::Single,
                position,
                attackers: &[attacker],
                defenders: &[defender],
                building: None,
                villagers: &[],
            },
            changes,
        )
    }

    /// Several attackers engage a whole defensive stack. Stacks around a
    /// building open a building-defended session.
    pub fn start_stack_combat(
        &mut self,
        state: &mut WorldState,
        attackers: &[ArmyId],
        stack: &DefensiveStack,
        changes: &mut ChangeLogBuilder,
    ) -> Result<CombatId, CommandFailure> {
        let mode = if stack.building.is_some() {
            CombatMode::BuildingDefended
        } else {
            CombatMode::Stack
        };
        let defenders = stack.defenders();
        self.open_or_join(
            state,
            &Engagement {
                mode,
                position: stack.target,
                attackers,
                defenders: &defenders,
                building: stack.building,
                villagers: &stack.villagers,
            },
            changes,
        )
    }

    /// One army besieges an undefended building.
    pub fn start_building_combat(
        &mut self,
        state: &mut WorldState,
        attacker: ArmyId,
        building: BuildingId,
        changes: &mut ChangeLogBuilder,
    ) -> Result<CombatId, CommandFailure> {
        let position = state
            .building(building)
            .map(|b| b.position)
            .ok_or_else(|| CommandFailure::not_found(format!("Building {building} not found")))?;
        self.open_or_join(
            state,
            &Engagement {
                mode: CombatMode::Siege,
                position,
                attackers: &[attacker],
                defenders: &[],
                building: Some(building),
                villagers: &[],
            },
            changes,
        )
    }

    /// One army attacks villagers, in the open or sheltering in `building`.
    pub fn start_villager_combat(
        &mut self,
        state: &mut WorldState,
        attacker: ArmyId,
        position: Hex,
        villagers: &[VillagerGroupId],
        building: Option<BuildingId>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<CombatId, CommandFailure> {
        let mode = if building.is_some() {
            CombatMode::Harassment
        } else {
            CombatMode::Villagers
        };
        self.open_or_join(
            state,
            &Engagement {
                mode,
                position,
                attackers: &[attacker],
                defenders: &[],
                building,
                villagers,
            },
            changes,
        )
    }

    /// Pull an army out of its session. Ends the session when a side is
    /// left empty. Returns the session the army left, if it was in one.
    pub fn retreat_from_combat(
        &mut self,
        state: &mut WorldState,
        army: ArmyId,
        changes: &mut ChangeLogBuilder,
    ) -> Option<CombatId> {
        if let Some(a) = state.army_mut(army) {
            a.in_combat = false;
        }
        let id = self.index.remove(&Participant::Army(army))?;
        let session = self.sessions.get_mut(&id)?;
        session.attackers.remove(&army);
        session.defenders.remove(&army);
        changes.push(ArmyDisengagedChange { combat: id, army });
        if session.is_over() {
            self.end_session(state, id, changes);
        }
        Some(id)
    }

    /// Close a session, releasing every participant.
    pub fn end_session(&mut self, state: &mut WorldState, id: CombatId, changes: &mut ChangeLogBuilder) -> bool {
        let Some(session) = self.sessions.remove(&id) else {
            return false;
        };
        for participant in session.participants() {
            self.index.remove(&participant);
            if let Participant::Army(army) = participant {
                if let Some(a) = state.army_mut(army) {
                    a.in_combat = false;
                }
            }
        }
        debug!(combat = %id, "Combat ended");
        changes.push(CombatEndedChange {
            combat: id,
            tick: state.current_time,
        });
        true
    }

    /// Drop participants that no longer exist, have no units, or stopped
    /// standing, then end every session left with an empty side. Returns
    /// the sessions that ended.
    pub fn reconcile(&mut self, state: &mut WorldState, changes: &mut ChangeLogBuilder) -> Vec<CombatId> {
        let mut ended = Vec::new();
        for (&id, session) in &mut self.sessions {
            let fallen: Vec<ArmyId> = session
                .attackers
                .iter()
                .chain(&session.defenders)
                .copied()
                .filter(|army| !state.army(*army).is_some_and(Army::is_alive))
                .collect();
            for army in fallen {
                session.attackers.remove(&army);
                session.defenders.remove(&army);
                self.index.remove(&Participant::Army(army));
                if let Some(a) = state.army_mut(army) {
                    a.in_combat = false;
                }
                changes.push(ArmyDisengagedChange { combat: id, army });
            }
            if let Some(building) = session.building {
                if !state.building(building).is_some_and(|b| b.is_standing()) {
                    session.building = None;
                    self.index.remove(&Participant::Building(building));
                }
            }
            let scattered: Vec<VillagerGroupId> = session
                .villagers
                .iter()
                .copied()
                .filter(|group| !state.villager_group(*group).is_some_and(|g| g.is_present()))
                .collect();
            for group in scattered {
                session.villagers.remove(&group);
                self.index.remove(&Participant::Villagers(group));
            }
            if session.is_over() {
                ended.push(id);
            }
        }
        for &id in &ended {
            self.end_session(state, id, changes);
        }
        ended
    }

    /// Look up a session.
    pub fn session(&self, id: CombatId) -> Option<&CombatSession> {
        self.sessions.get(&id)
    }

    /// The session a participant belongs to.
    pub fn session_of(&self, participant: Participant) -> Option<&CombatSession> {
        self.index.get(&participant).and_then(|id| self.sessions.get(id))
    }

    /// Whether an army is part of any session.
    pub fn is_in_combat(&self, army: ArmyId) -> bool {
        self.index.contains_key(&Participant::Army(army))
    }

    /// All sessions in id order.
    pub fn sessions(&self) -> impl Iterator<Item = &CombatSession> {
        self.sessions.values()
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn verify(&self, state: &WorldState, e: &Engagement<'_>) -> Result<Placement, CommandFailure> {
        if e.attackers.is_empty() {
            return Err(CommandFailure::invalid_state("Combat needs at least one attacker"));
        }
        for &id in e.attackers {
            let army = fighting_army(state, id)?;
            if self.is_in_combat(id) {
                return Err(CommandFailure::invalid_state(format!("Army {} is already in combat", army.id)));
            }
        }
        for &id in e.defenders {
            fighting_army(state, id)?;
        }
        if let Some(id) = e.building {
            if !state.building(id).is_some_and(|b| b.is_standing()) {
                return Err(CommandFailure::not_found(format!("Building {id} is not standing")));
            }
        }
        for &id in e.villagers {
            if !state.villager_group(id).is_some_and(|g| g.is_present()) {
                return Err(CommandFailure::not_found(format!("Villager group {id} not found")));
            }
        }
        if e.defending_participants().next().is_none() {
            return Err(CommandFailure::invalid_target("Combat needs at least one defender"));
        }
        self.placement(e)
    }

    /// Pick the session to join. A defender defending somewhere wins over
    /// one attacking somewhere. Joining opposite a session's attackers only
    /// carries armies, so a building or villagers that would have to switch
    /// sides reject the start.
    fn placement(&self, e: &Engagement<'_>) -> Result<Placement, CommandFailure> {
        let mut opposed = None;
        for participant in e.defending_participants() {
            let Some(session) = self.index.get(&participant).and_then(|id| self.sessions.get(id)) else {
                continue;
            };
            match participant {
                Participant::Army(army) if session.attackers.contains(&army) => {
                    opposed = opposed.or(Some(session.id));
                }
                _ => return Ok(Placement::Join(session.id)),
            }
        }
        let Some(id) = opposed else {
            return Ok(Placement::Open);
        };
        let stray_building = e
            .building
            .is_some_and(|b| !self.index.contains_key(&Participant::Building(b)));
        let stray_villagers = e
            .villagers
            .iter()
            .any(|g| !self.index.contains_key(&Participant::Villagers(*g)));
        if stray_building || stray_villagers {
            return Err(CommandFailure::invalid_state(format!(
                "Defenders are attacking in combat {id}; only armies can join its defending side"
            )));
        }
        Ok(Placement::Oppose(id))
    }

    fn open_or_join(
        &mut self,
        state: &mut WorldState,
        e: &Engagement<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<CombatId, CommandFailure> {
        let placement = self.verify(state, e)?;

        for &army in e.attackers {
            entrenchment::cancel(state, army, EntrenchmentCancelReason::Attack, changes);
        }
        for &army in e.defenders {
            if state.army(army).is_some_and(Army::is_entrenching) {
                entrenchment::cancel(state, army, EntrenchmentCancelReason::Engaged, changes);
            }
        }

        let id = match placement {
            Placement::Open => self.open(state.current_time, e, changes),
            Placement::Join(id) => {
                self.join(id, e, false, changes);
                id
            }
            Placement::Oppose(id) => {
                self.join(id, e, true, changes);
                id
            }
        };

        for &army in e.attackers.iter().chain(e.defenders) {
            let indexed = self.index.get(&Participant::Army(army)) == Some(&id);
            if let Some(a) = state.army_mut(army).filter(|_| indexed) {
                a.in_combat = true;
            }
        }
        Ok(id)
    }

    fn open(&mut self, now: u64, e: &Engagement<'_>, changes: &mut ChangeLogBuilder) -> CombatId {
        let id = CombatId::new();
        let session = CombatSession {
            id,
            mode: e.mode,
            position: e.position,
            attackers: e.attackers.iter().copied().collect(),
            defenders: e.defenders.iter().copied().collect(),
            building: e.building,
            villagers: e.villagers.iter().copied().collect(),
            started_at: now,
        };
        for participant in session.participants() {
            self.index.insert(participant, id);
        }
        debug!(combat = %id, mode = ?e.mode, position = %e.position, "Combat started");
        changes.push(CombatStartedChange {
            combat: id,
            mode: e.mode,
            position: e.position,
            attackers: e.attackers.to_vec(),
            defenders: e.defenders.to_vec(),
            building: e.building,
            villagers: e.villagers.to_vec(),
            tick: now,
        });
        self.sessions.insert(id, session);
        id
    }

    /// Add the request's unindexed participants to session `id`. With
    /// `opposite` the request's attackers defend and its defenders attack.
    fn join(&mut self, id: CombatId, e: &Engagement<'_>, opposite: bool, changes: &mut ChangeLogBuilder) {
        let Some(session) = self.sessions.get_mut(&id) else {
            return;
        };
        let (attacking, defending) = if opposite {
            (&mut session.defenders, &mut session.attackers)
        } else {
            (&mut session.attackers, &mut session.defenders)
        };
        enlist(&mut self.index, attacking, e.attackers, id, changes);
        enlist(&mut self.index, defending, e.defenders, id, changes);
        if opposite {
            return;
        }
        if let Some(building) = e.building {
            if session.building.is_none() && !self.index.contains_key(&Participant::Building(building)) {
                session.building = Some(building);
                self.index.insert(Participant::Building(building), id);
            }
        }
        for &group in e.villagers {
            if !self.index.contains_key(&Participant::Villagers(group)) {
                session.villagers.insert(group);
                self.index.insert(Participant::Villagers(group), id);
            }
        }
    }
}

/// Put every army not yet fighting on `side` of session `id`.
fn enlist(
    index: &mut BTreeMap<Participant, CombatId>,
    side: &mut BTreeSet<ArmyId>,
    armies: &[ArmyId],
    id: CombatId,
    changes: &mut ChangeLogBuilder,
) {
    for &army in armies {
        if index.contains_key(&Participant::Army(army)) {
            continue;
        }
        side.insert(army);
        index.insert(Participant::Army(army), id);
        changes.push(CombatJoinedChange { combat: id, army });
    }
}

fn fighting_army(state: &WorldState, id: ArmyId) -> Result<&Army, CommandFailure> {
    let army = state
        .army(id)
        .ok_or_else(|| CommandFailure::not_found(format!("Army {id} not found")))?;
    if !army.is_alive() {
        return Err(CommandFailure::invalid_state(format!("Army {id} has no units")));
    }
    Ok(army)
}
