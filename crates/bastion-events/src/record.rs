//! Change record kinds.
//!
//! Each record is an immutable fact describing one observable effect of a
//! command or of the tick cycle. Payloads carry only identifiers,
//! coordinates, counts and small closed enums so that observers can
//! reconstruct the effect without access to the world state.

use std::collections::BTreeMap;

use bastion_types::{
    ArmyId, BuildingId, BuildingType, CombatId, Hex, PlayerId, ReinforcementId, ResourcePointId,
    ResourceType, Rotation, UnitType, VillagerGroupId,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Shared payload vocabulary
// ---------------------------------------------------------------------------

/// Why an army's entrenchment was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntrenchmentCancelReason {
    /// The army was ordered to move.
    Move,
    /// The army started an attack.
    Attack,
    /// The army started a retreat.
    Retreat,
    /// The owner cancelled the entrenchment explicitly.
    Manual,
    /// The army was attacked before it finished digging in.
    Engaged,
}

/// Shape of a combat session, one per defensive classification that opens
/// a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CombatMode {
    /// One attacker against one mobile defender.
    Single,
    /// Several armies on either side, or any entrenched defender.
    Stack,
    /// Defenders protecting a building must be cleared first.
    BuildingDefended,
    /// Attacker against the civilian occupants of a building.
    Harassment,
    /// Direct assault on an undefended building.
    Siege,
    /// Attacker against villager groups in the open.
    Villagers,
}

/// A villager group's activity as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum VillagerActivity {
    /// No task.
    Idle,
    /// Walking to a coordinate.
    Moving,
    /// Gathering from a resource point.
    Gathering,
    /// Hunting a huntable resource point.
    Hunting,
    /// Constructing a building.
    Building,
    /// Upgrading a building.
    Upgrading,
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// Resources were deducted from a player's treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourcesSpentChange {
    /// The paying player.
    pub player: PlayerId,
    /// Amount deducted per resource.
    pub amounts: BTreeMap<ResourceType, u64>,
}

/// Resources were returned to a player's treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourcesRefundedChange {
    /// The player receiving the refund.
    pub player: PlayerId,
    /// Amount returned per resource.
    pub amounts: BTreeMap<ResourceType, u64>,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// A building was placed on the map in the planning state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildingPlacedChange {
    /// The new building.
    pub building: BuildingId,
    /// Owning player.
    pub owner: PlayerId,
    /// Building type.
    pub building_type: BuildingType,
    /// Anchor coordinate of the footprint.
    pub position: Hex,
    /// Footprint rotation.
    pub rotation: Rotation,
    /// Tick of placement.
    pub tick: u64,
}

/// Construction of a building began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConstructionStartedChange {
    /// The building under construction.
    pub building: BuildingId,
    /// Number of builders contributing.
    pub builders: u32,
    /// Tick construction started.
    pub tick: u64,
}

/// A villager group was sent to a building site and will start work on
/// arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuilderDispatchedChange {
    /// Target building.
    pub building: BuildingId,
    /// The dispatched villager group.
    pub group: VillagerGroupId,
    /// Coordinate the group is walking to.
    pub destination: Hex,
    /// Number of tiles on the path.
    pub path_length: u32,
}

/// A building finished construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildingCompletedChange {
    /// The completed building.
    pub building: BuildingId,
    /// Tick of completion.
    pub tick: u64,
}

/// An upgrade to the next level began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpgradeStartedChange {
    /// The upgrading building.
    pub building: BuildingId,
    /// Level the building will reach.
    pub target_level: u32,
    /// Number of builders contributing.
    pub builders: u32,
    /// Tick the upgrade started.
    pub tick: u64,
}

/// An in-progress upgrade was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpgradeCancelledChange {
    /// The building that returns to completed.
    pub building: BuildingId,
    /// Level the building stays at.
    pub level: u32,
}

/// An upgrade finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpgradeCompletedChange {
    /// The upgraded building.
    pub building: BuildingId,
    /// New level.
    pub level: u32,
    /// Tick of completion.
    pub tick: u64,
}

/// Demolition of a building began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DemolitionStartedChange {
    /// The building being torn down.
    pub building: BuildingId,
    /// Tick demolition started.
    pub tick: u64,
}

/// A building was destroyed and no longer occupies its footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildingDestroyedChange {
    /// The destroyed building.
    pub building: BuildingId,
    /// Tick of destruction.
    pub tick: u64,
}

/// A building's garrison changed. Carries the new totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GarrisonChangedChange {
    /// The garrisoned building.
    pub building: BuildingId,
    /// Garrisoned unit counts after the change.
    pub units: BTreeMap<UnitType, u32>,
    /// Garrisoned villagers after the change.
    pub villagers: u32,
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// Units were queued for training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrainingQueuedChange {
    /// The training building.
    pub building: BuildingId,
    /// Unit type in training.
    pub unit: UnitType,
    /// Number of units.
    pub count: u32,
    /// Tick the batch completes.
    pub completes_at: u64,
}

/// A queued training batch was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrainingCancelledChange {
    /// The training building.
    pub building: BuildingId,
    /// Unit type of the cancelled batch.
    pub unit: UnitType,
    /// Number of units cancelled.
    pub count: u32,
}

/// A training batch finished and joined the garrison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TrainingCompletedChange {
    /// The training building.
    pub building: BuildingId,
    /// Unit type trained.
    pub unit: UnitType,
    /// Number of units trained.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Armies
// ---------------------------------------------------------------------------

/// A new army was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ArmyCreatedChange {
    /// The new army.
    pub army: ArmyId,
    /// Owning player.
    pub owner: PlayerId,
    /// Starting coordinate.
    pub position: Hex,
    /// Starting composition.
    pub composition: BTreeMap<UnitType, u32>,
    /// Home base, if one was assigned on creation.
    pub home_base: Option<BuildingId>,
}

/// An army's composition reached zero. The army stays in the arena as a
/// dead entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ArmyDisbandedChange {
    /// The disbanded army.
    pub army: ArmyId,
}

/// An army was given a movement path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ArmyMoveOrderedChange {
    /// The moving army.
    pub army: ArmyId,
    /// Coordinate the army leaves from.
    pub from: Hex,
    /// Final coordinate of the path.
    pub destination: Hex,
    /// Number of tiles on the path.
    pub path_length: u32,
}

/// An army reached the end of its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ArmyArrivedChange {
    /// The arriving army.
    pub army: ArmyId,
    /// Coordinate reached.
    pub position: Hex,
}

/// An army's home base was set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HomeBaseAssignedChange {
    /// The army.
    pub army: ArmyId,
    /// Its new home base.
    pub building: BuildingId,
}

/// An army started digging in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntrenchmentStartedChange {
    /// The entrenching army.
    pub army: ArmyId,
    /// Commander stamina spent, zero without a commander.
    pub stamina_spent: u32,
    /// Tick entrenching started.
    pub tick: u64,
}

/// An army finished digging in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntrenchmentCompletedChange {
    /// The entrenched army.
    pub army: ArmyId,
    /// Tick of completion.
    pub tick: u64,
}

/// An army left the entrenching or entrenched state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntrenchmentCancelledChange {
    /// The army.
    pub army: ArmyId,
    /// What caused the cancellation.
    pub reason: EntrenchmentCancelReason,
}

/// An army started retreating to a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RetreatStartedChange {
    /// The retreating army.
    pub army: ArmyId,
    /// Base the army retreats to.
    pub base: BuildingId,
    /// Final coordinate of the retreat path.
    pub destination: Hex,
    /// Number of tiles on the path.
    pub path_length: u32,
}

// ---------------------------------------------------------------------------
// Villagers
// ---------------------------------------------------------------------------

/// A new villager group was registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VillagerGroupCreatedChange {
    /// The new group.
    pub group: VillagerGroupId,
    /// Owning player.
    pub owner: PlayerId,
    /// Starting coordinate.
    pub position: Hex,
    /// Number of villagers.
    pub headcount: u32,
}

/// A villager group was given a movement path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VillagersMoveOrderedChange {
    /// The moving group.
    pub group: VillagerGroupId,
    /// Coordinate the group leaves from.
    pub from: Hex,
    /// Final coordinate of the path.
    pub destination: Hex,
    /// Number of tiles on the path.
    pub path_length: u32,
}

/// A villager group reached the end of its path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VillagersArrivedChange {
    /// The arriving group.
    pub group: VillagerGroupId,
    /// Coordinate reached.
    pub position: Hex,
}

/// A villager group's task changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VillagerTaskChangedChange {
    /// The group.
    pub group: VillagerGroupId,
    /// The new activity.
    pub activity: VillagerActivity,
}

/// A villager group started working a resource point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GatheringStartedChange {
    /// The working group.
    pub group: VillagerGroupId,
    /// The resource point.
    pub resource: ResourcePointId,
    /// Whether the group was hunting rather than gathering.
    pub hunting: bool,
    /// Whether the group was already on the resource tile.
    pub on_site: bool,
}

/// A villager group stopped working a resource point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GatheringStoppedChange {
    /// The group.
    pub group: VillagerGroupId,
    /// The resource point it left.
    pub resource: ResourcePointId,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// A combat session opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CombatStartedChange {
    /// The session.
    pub combat: CombatId,
    /// Session shape.
    pub mode: CombatMode,
    /// Contested coordinate.
    pub position: Hex,
    /// Attacking armies.
    pub attackers: Vec<ArmyId>,
    /// Defending armies.
    pub defenders: Vec<ArmyId>,
    /// Besieged building, if any.
    pub building: Option<BuildingId>,
    /// Villager groups under attack.
    pub villagers: Vec<VillagerGroupId>,
    /// Tick the session opened.
    pub tick: u64,
}

/// An army joined an existing session on the attacking side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CombatJoinedChange {
    /// The session.
    pub combat: CombatId,
    /// The joining army.
    pub army: ArmyId,
}

/// An army left a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ArmyDisengagedChange {
    /// The session.
    pub combat: CombatId,
    /// The army that left.
    pub army: ArmyId,
}

/// A session closed because one side had no participants left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CombatEndedChange {
    /// The session.
    pub combat: CombatId,
    /// Tick the session closed.
    pub tick: u64,
}

// ---------------------------------------------------------------------------
// Reinforcements
// ---------------------------------------------------------------------------

/// Units left a garrison to reinforce an army.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReinforcementDispatchedChange {
    /// The reinforcement.
    pub reinforcement: ReinforcementId,
    /// Receiving army.
    pub army: ArmyId,
    /// Source building.
    pub source: BuildingId,
    /// Units in transit.
    pub composition: BTreeMap<UnitType, u32>,
    /// Estimated arrival tick.
    pub arrives_at: u64,
}

/// A pending reinforcement was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReinforcementCancelledChange {
    /// The reinforcement.
    pub reinforcement: ReinforcementId,
    /// The army it was headed for.
    pub army: ArmyId,
    /// Building whose garrison received the units, if any.
    pub returned_to: Option<BuildingId>,
}

/// Units of a cancelled reinforcement had nowhere to go and were lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReinforcementLostChange {
    /// The reinforcement.
    pub reinforcement: ReinforcementId,
    /// Units lost.
    pub composition: BTreeMap<UnitType, u32>,
}

/// A reinforcement reached its army and merged into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReinforcementArrivedChange {
    /// The reinforcement.
    pub reinforcement: ReinforcementId,
    /// Receiving army.
    pub army: ArmyId,
    /// Units merged.
    pub composition: BTreeMap<UnitType, u32>,
}

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

/// Declares [`ChangeRecord`], its `From` conversions and the list of kind
/// names it understands.
macro_rules! define_records {
    ($( $(#[$meta:meta])* $kind:ident($payload:ident), )+) => {
        /// One typed fact in a change list, tagged by `kind` on the wire.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
        #[serde(tag = "kind")]
        #[ts(export, export_to = "bindings/")]
        pub enum ChangeRecord {
            $( $(#[$meta])* $kind($payload), )+
        }

        impl ChangeRecord {
            /// Every kind name this version can decode.
            pub const KINDS: &'static [&'static str] = &[$( stringify!($kind), )+];

            /// The wire name of this record's kind.
            pub const fn kind(&self) -> &'static str {
                match self {
                    $( Self::$kind(_) => stringify!($kind), )+
                }
            }
        }

        $(
            impl From<$payload> for ChangeRecord {
                fn from(payload: $payload) -> Self {
                    Self::$kind(payload)
                }
            }
        )+
    };
}

define_records! {
    /// See [`ResourcesSpentChange`].
    ResourcesSpent(ResourcesSpentChange),
    /// See [`ResourcesRefundedChange`].
    ResourcesRefunded(ResourcesRefundedChange),
    /// See [`BuildingPlacedChange`].
    BuildingPlaced(BuildingPlacedChange),
    /// See [`ConstructionStartedChange`].
    ConstructionStarted(ConstructionStartedChange),
    /// See [`BuilderDispatchedChange`].
    BuilderDispatched(BuilderDispatchedChange),
    /// See [`BuildingCompletedChange`].
    BuildingCompleted(BuildingCompletedChange),
    /// See [`UpgradeStartedChange`].
    UpgradeStarted(UpgradeStartedChange),
    /// See [`UpgradeCancelledChange`].
    UpgradeCancelled(UpgradeCancelledChange),
    /// See [`UpgradeCompletedChange`].
    UpgradeCompleted(UpgradeCompletedChange),
    /// See [`DemolitionStartedChange`].
    DemolitionStarted(DemolitionStartedChange),
    /// See [`BuildingDestroyedChange`].
    BuildingDestroyed(BuildingDestroyedChange),
    /// See [`GarrisonChangedChange`].
    GarrisonChanged(GarrisonChangedChange),
    /// See [`TrainingQueuedChange`].
    TrainingQueued(TrainingQueuedChange),
    /// See [`TrainingCancelledChange`].
    TrainingCancelled(TrainingCancelledChange),
    /// See [`TrainingCompletedChange`].
    TrainingCompleted(TrainingCompletedChange),
    /// See [`ArmyCreatedChange`].
    ArmyCreated(ArmyCreatedChange),
    /// See [`ArmyDisbandedChange`].
    ArmyDisbanded(ArmyDisbandedChange),
    /// See [`ArmyMoveOrderedChange`].
    ArmyMoveOrdered(ArmyMoveOrderedChange),
    /// See [`ArmyArrivedChange`].
    ArmyArrived(ArmyArrivedChange),
    /// See [`HomeBaseAssignedChange`].
    HomeBaseAssigned(HomeBaseAssignedChange),
    /// See [`EntrenchmentStartedChange`].
    EntrenchmentStarted(EntrenchmentStartedChange),
    /// See [`EntrenchmentCompletedChange`].
    EntrenchmentCompleted(EntrenchmentCompletedChange),
    /// See [`EntrenchmentCancelledChange`].
    EntrenchmentCancelled(EntrenchmentCancelledChange),
    /// See [`RetreatStartedChange`].
    RetreatStarted(RetreatStartedChange),
    /// See [`VillagerGroupCreatedChange`].
    VillagerGroupCreated(VillagerGroupCreatedChange),
    /// See [`VillagersMoveOrderedChange`].
    VillagersMoveOrdered(VillagersMoveOrderedChange),
    /// See [`VillagersArrivedChange`].
    VillagersArrived(VillagersArrivedChange),
    /// See [`VillagerTaskChangedChange`].
    VillagerTaskChanged(VillagerTaskChangedChange),
    /// See [`GatheringStartedChange`].
    GatheringStarted(GatheringStartedChange),
    /// See [`GatheringStoppedChange`].
    GatheringStopped(GatheringStoppedChange),
    /// See [`CombatStartedChange`].
    CombatStarted(CombatStartedChange),
    /// See [`CombatJoinedChange`].
    CombatJoined(CombatJoinedChange),
    /// See [`ArmyDisengagedChange`].
    ArmyDisengaged(ArmyDisengagedChange),
    /// See [`CombatEndedChange`].
    CombatEnded(CombatEndedChange),
    /// See [`ReinforcementDispatchedChange`].
    ReinforcementDispatched(ReinforcementDispatchedChange),
    /// See [`ReinforcementCancelledChange`].
    ReinforcementCancelled(ReinforcementCancelledChange),
    /// See [`ReinforcementLostChange`].
    ReinforcementLost(ReinforcementLostChange),
    /// See [`ReinforcementArrivedChange`].
    ReinforcementArrived(ReinforcementArrivedChange),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn records_are_tagged_by_kind() {
        let record = ChangeRecord::from(ArmyDisbandedChange { army: ArmyId::new() });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json.get("kind").and_then(|k| k.as_str()), Some("ArmyDisbanded"));
        assert!(json.get("army").is_some());
        assert_eq!(record.kind(), "ArmyDisbanded");
    }

    #[test]
    fn kinds_lists_every_variant_name() {
        assert!(ChangeRecord::KINDS.contains(&"BuildingPlaced"));
        assert!(ChangeRecord::KINDS.contains(&"EntrenchmentCancelled"));
        assert!(ChangeRecord::KINDS.contains(&"ReinforcementArrived"));
        assert!(!ChangeRecord::KINDS.contains(&"Unknown"));
    }

    #[test]
    fn cancellation_reason_survives_serialization() {
        let record = ChangeRecord::from(EntrenchmentCancelledChange {
            army: ArmyId::new(),
            reason: EntrenchmentCancelReason::Engaged,
        });
        let json = serde_json::to_string(&record).unwrap();
        let back: ChangeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
