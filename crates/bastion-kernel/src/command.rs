//! The two-phase command contract.
//!
//! Every gameplay action is a value implementing [`Command`]. A command is
//! split into a read-only [`Command::plan`] that runs every check in order
//! (existence, ownership, state, affordability, target validity) and
//! computes what it needs, and [`Command::apply`] that performs the
//! mutations. `validate` runs the plan and discards it; `execute` re-runs
//! the plan against the current state before applying, so a caller that
//! validated earlier is protected against drift.
//!
//! `apply` may only fail before its first mutation (the economy veto of
//! gather commands). If it fails anyway, the records it pushed are dropped.

use bastion_events::{ChangeList, ChangeLogBuilder};
use bastion_types::PlayerId;
use bastion_world::WorldState;
use serde::{Deserialize, Serialize};

use crate::commands::{
    AssignHomeBase, AttackTarget, CancelEntrenchment, CancelReinforcement, CancelTraining,
    CancelUpgrade, DemolishBuilding, DeployGarrison, Entrench, GarrisonArmy, GatherResource,
    HuntResource, MoveArmy, MoveVillagers, PlaceBuilding, Retreat, SendReinforcement, TrainUnits,
    UpgradeBuilding,
};
use crate::context::{ExecutionContext, ValidationContext};
use crate::error::CommandFailure;

/// A validate-then-execute unit of world mutation.
pub trait Command {
    /// Everything the checks resolved that execution needs.
    type Plan;

    /// Stable command name for logs and receipts.
    fn name(&self) -> &'static str;

    /// The player issuing the command.
    fn issuer(&self) -> PlayerId;

    /// Run every check without mutating anything.
    fn plan(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<Self::Plan, CommandFailure>;

    /// Perform the mutations for a plan produced against the same state.
    fn apply(
        &self,
        plan: Self::Plan,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<(), CommandFailure>;

    /// Check whether the command would succeed. Never mutates; calling it
    /// twice on unchanged state gives the same answer.
    fn validate(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        self.plan(state, ctx).map(|_| ())
    }

    /// Re-validate, apply, and drain `changes` into the finalized list.
    fn execute(
        &self,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<ChangeList, CommandFailure> {
        let plan = self.plan(state, &ctx.validation())?;
        let mark = changes.len();
        if let Err(failure) = self.apply(plan, state, ctx, changes) {
            changes.truncate(mark);
            return Err(failure);
        }
        Ok(changes.finalize())
    }
}

// ---------------------------------------------------------------------------
// GameCommand
// ---------------------------------------------------------------------------

/// Every command as one serializable value.
///
/// Human players, the AI planner and network replication all submit
/// `GameCommand`s; none of them has a privileged entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum GameCommand {
    /// See [`PlaceBuilding`].
    PlaceBuilding(PlaceBuilding),
    /// See [`UpgradeBuilding`].
    UpgradeBuilding(UpgradeBuilding),
    /// See [`CancelUpgrade`].
    CancelUpgrade(CancelUpgrade),
    /// See [`DemolishBuilding`].
    DemolishBuilding(DemolishBuilding),
    /// See [`TrainUnits`].
    TrainUnits(TrainUnits),
    /// See [`CancelTraining`].
    CancelTraining(CancelTraining),
    /// See [`DeployGarrison`].
    DeployGarrison(DeployGarrison),
    /// See [`GarrisonArmy`].
    GarrisonArmy(GarrisonArmy),
    /// See [`MoveArmy`].
    MoveArmy(MoveArmy),
    /// See [`MoveVillagers`].
    MoveVillagers(MoveVillagers),
    /// See [`GatherResource`].
    GatherResource(GatherResource),
    /// See [`HuntResource`].
    HuntResource(HuntResource),
    /// See [`AttackTarget`].
    AttackTarget(AttackTarget),
    /// See [`Entrench`].
    Entrench(Entrench),
    /// See [`CancelEntrenchment`].
    CancelEntrenchment(CancelEntrenchment),
    /// See [`Retreat`].
    Retreat(Retreat),
    /// See [`AssignHomeBase`].
    AssignHomeBase(AssignHomeBase),
    /// See [`SendReinforcement`].
    SendReinforcement(SendReinforcement),
    /// See [`CancelReinforcement`].
    CancelReinforcement(CancelReinforcement),
}

macro_rules! dispatch {
    ($self:expr, $cmd:ident => $body:expr) => {
        match $self {
            GameCommand::PlaceBuilding($cmd) => $body,
            GameCommand::UpgradeBuilding($cmd) => $body,
            GameCommand::CancelUpgrade($cmd) => $body,
            GameCommand::DemolishBuilding($cmd) => $body,
            GameCommand::TrainUnits($cmd) => $body,
            GameCommand::CancelTraining($cmd) => $body,
            GameCommand::DeployGarrison($cmd) => $body,
            GameCommand::GarrisonArmy($cmd) => $body,
            GameCommand::MoveArmy($cmd) => $body,
            GameCommand::MoveVillagers($cmd) => $body,
            GameCommand::GatherResource($cmd) => $body,
            GameCommand::HuntResource($cmd) => $body,
            GameCommand::AttackTarget($cmd) => $body,
            GameCommand::Entrench($cmd) => $body,
            GameCommand::CancelEntrenchment($cmd) => $body,
            GameCommand::Retreat($cmd) => $body,
            GameCommand::AssignHomeBase($cmd) => $body,
            GameCommand::SendReinforcement($cmd) => $body,
            GameCommand::CancelReinforcement($cmd) => $body,
        }
    };
}

impl GameCommand {
    /// Name of the wrapped command.
    pub fn name(&self) -> &'static str {
        dispatch!(self, c => c.name())
    }

    /// Player issuing the wrapped command.
    pub fn issuer(&self) -> PlayerId {
        dispatch!(self, c => c.issuer())
    }

    /// Validate the wrapped command.
    pub fn validate(&self, state: &WorldState, ctx: &ValidationContext<'_>) -> Result<(), CommandFailure> {
        dispatch!(self, c => c.validate(state, ctx))
    }

    /// Execute the wrapped command.
    pub fn execute(
        &self,
        state: &mut WorldState,
        ctx: &mut ExecutionContext<'_>,
        changes: &mut ChangeLogBuilder,
    ) -> Result<ChangeList, CommandFailure> {
        dispatch!(self, c => c.execute(state, ctx, changes))
    }
}

macro_rules! impl_from_command {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for GameCommand {
                fn from(command: $variant) -> Self {
                    Self::$variant(command)
                }
            }
        )+
    };
}

impl_from_command!(
    PlaceBuilding,
    UpgradeBuilding,
    CancelUpgrade,
    DemolishBuilding,
    TrainUnits,
    CancelTraining,
    DeployGarrison,
    GarrisonArmy,
    MoveArmy,
    MoveVillagers,
    GatherResource,
    HuntResource,
    AttackTarget,
    Entrench,
    CancelEntrenchment,
    Retreat,
    AssignHomeBase,
    SendReinforcement,
    CancelReinforcement,
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bastion_types::{ArmyId, Hex};

    use super::*;

    #[test]
    fn commands_are_tagged_on_the_wire() {
        let cmd = GameCommand::from(MoveArmy {
            player: PlayerId::new(),
            army: ArmyId::new(),
            destination: Hex::new(3, 4),
        });
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json.get("command").and_then(|c| c.as_str()), Some("MoveArmy"));
        let back: GameCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
        assert_eq!(back.name(), "MoveArmy");
    }
}
