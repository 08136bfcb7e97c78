//! Command failures.
//!
//! A failed command is a value: a [`FailureKind`] that callers and tests
//! branch on, plus a short human-readable message that is neither localized
//! nor stable across versions.

use bastion_world::WorldError;
use serde::{Deserialize, Serialize};

/// Closed taxonomy of command failures.
///
/// Validation surfaces the first failing check, with checks ordered
/// existence, ownership, state, affordability, target validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// An entity id did not resolve.
    NotFound,
    /// The issuing player does not own the entity.
    NotOwned,
    /// The entity is in the wrong lifecycle phase for the command.
    InvalidState,
    /// A resource, stamina, population or garrison check failed.
    InsufficientResource,
    /// The coordinate, terrain, stacking or target rejects the action.
    InvalidTarget,
    /// Routing failed.
    NoPath,
    /// No eligible worker, army or base was found.
    NoCandidate,
}

/// A command rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct CommandFailure {
    /// What kind of check failed.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

impl CommandFailure {
    /// Create a failure of any kind.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// [`FailureKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    /// [`FailureKind::NotOwned`].
    pub fn not_owned(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotOwned, message)
    }

    /// [`FailureKind::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidState, message)
    }

    /// [`FailureKind::InsufficientResource`].
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InsufficientResource, message)
    }

    /// [`FailureKind::InvalidTarget`].
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidTarget, message)
    }

    /// [`FailureKind::NoPath`].
    pub fn no_path(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NoPath, message)
    }

    /// [`FailureKind::NoCandidate`].
    pub fn no_candidate(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NoCandidate, message)
    }
}

impl From<WorldError> for CommandFailure {
    fn from(err: WorldError) -> Self {
        let kind = match &err {
            WorldError::PlayerNotFound(_)
            | WorldError::BuildingNotFound(_)
            | WorldError::ArmyNotFound(_)
            | WorldError::VillagerGroupNotFound(_)
            | WorldError::ResourcePointNotFound(_) => FailureKind::NotFound,
            WorldError::OutOfBounds(_) => FailureKind::InvalidTarget,
            WorldError::Insufficient { .. } => FailureKind::InsufficientResource,
            WorldError::DuplicatePlayer(_)
            | WorldError::DuplicateBuilding(_)
            | WorldError::DuplicateArmy(_)
            | WorldError::DuplicateVillagerGroup(_)
            | WorldError::DuplicateResourcePoint(_)
            | WorldError::InvalidDimensions { .. }
            | WorldError::TooManyPlayers { .. }
            | WorldError::ArithmeticOverflow => FailureKind::InvalidState,
        };
        Self::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use bastion_types::ArmyId;

    use super::*;

    #[test]
    fn world_errors_map_to_kinds() {
        let f = CommandFailure::from(WorldError::ArmyNotFound(ArmyId::new()));
        assert_eq!(f.kind, FailureKind::NotFound);
        let f = CommandFailure::from(WorldError::Insufficient {
            what: String::from("Wood"),
            needed: 5,
            available: 1,
        });
        assert_eq!(f.kind, FailureKind::InsufficientResource);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let f = CommandFailure::invalid_target("No valid target found");
        assert_eq!(f.to_string(), "InvalidTarget: No valid target found");
    }
}
