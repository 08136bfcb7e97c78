//! Villager groups and their tasks.

use bastion_types::{BuildingId, Hex, PlayerId, ResourcePointId, VillagerGroupId};
use serde::{Deserialize, Serialize};

use crate::movement::MovementPath;

/// What a villager group is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VillagerTask {
    /// Nothing.
    #[default]
    Idle,
    /// Walking to a coordinate.
    Moving,
    /// Gathering from a resource point.
    Gathering(ResourcePointId),
    /// Hunting a huntable resource point.
    Hunting(ResourcePointId),
    /// Constructing a building.
    Building(BuildingId),
    /// Upgrading a building.
    Upgrading(BuildingId),
}

impl VillagerTask {
    /// Whether the task is [`VillagerTask::Idle`].
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The resource point worked by a gathering or hunting task.
    pub const fn resource(self) -> Option<ResourcePointId> {
        match self {
            Self::Gathering(id) | Self::Hunting(id) => Some(id),
            _ => None,
        }
    }

    /// The building worked by a building or upgrading task.
    pub const fn building(self) -> Option<BuildingId> {
        match self {
            Self::Building(id) | Self::Upgrading(id) => Some(id),
            _ => None,
        }
    }
}

/// A group of villagers moving and working together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillagerGroup {
    /// Unique identifier.
    pub id: VillagerGroupId,
    /// Owning player.
    pub owner: Option<PlayerId>,
    /// Current coordinate.
    pub position: Hex,
    /// Number of villagers.
    pub headcount: u32,
    /// Current task.
    pub task: VillagerTask,
    /// Active movement order.
    pub path: Option<MovementPath>,
}

impl VillagerGroup {
    /// Create an idle group.
    pub const fn new(id: VillagerGroupId, owner: Option<PlayerId>, position: Hex, headcount: u32) -> Self {
        Self {
            id,
            owner,
            position,
            headcount,
            task: VillagerTask::Idle,
            path: None,
        }
    }

    /// Whether the group is owned by `player`.
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Whether the group has members.
    pub const fn is_present(&self) -> bool {
        self.headcount > 0
    }

    /// Idle task and no path.
    pub const fn is_idle(&self) -> bool {
        self.task.is_idle() && self.path.is_none()
    }

    /// Drop any task and path.
    pub fn make_idle(&mut self) {
        self.task = VillagerTask::Idle;
        self.path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_requires_no_path() {
        let mut g = VillagerGroup::new(VillagerGroupId::new(), None, Hex::new(0, 0), 3);
        assert!(g.is_idle());
        g.path = Some(MovementPath::new(vec![Hex::new(1, 0)]));
        assert!(!g.is_idle());
        g.make_idle();
        assert!(g.is_idle());
    }

    #[test]
    fn task_targets() {
        let rp = ResourcePointId::new();
        let b = BuildingId::new();
        assert_eq!(VillagerTask::Hunting(rp).resource(), Some(rp));
        assert_eq!(VillagerTask::Upgrading(b).building(), Some(b));
        assert_eq!(VillagerTask::Moving.resource(), None);
        assert!(!VillagerTask::Building(b).is_idle());
    }
}
