//! Error types for the `bastion-world` crate.
//!
//! All fallible arena and map operations in this crate return
//! [`WorldError`]. Gameplay rejections are not world errors: commands
//! report those as values in `bastion-kernel`.

use bastion_types::{ArmyId, BuildingId, Hex, PlayerId, ResourcePointId, VillagerGroupId};

/// Errors that can occur during world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A player was not found in the arena.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// A building was not found in the arena.
    #[error("building not found: {0}")]
    BuildingNotFound(BuildingId),

    /// An army was not found in the arena.
    #[error("army not found: {0}")]
    ArmyNotFound(ArmyId),

    /// A villager group was not found in the arena.
    #[error("villager group not found: {0}")]
    VillagerGroupNotFound(VillagerGroupId),

    /// A resource point was not found in the arena.
    #[error("resource point not found: {0}")]
    ResourcePointNotFound(ResourcePointId),

    /// A duplicate player was registered.
    #[error("duplicate player id: {0}")]
    DuplicatePlayer(PlayerId),

    /// A duplicate building was registered.
    #[error("duplicate building id: {0}")]
    DuplicateBuilding(BuildingId),

    /// A duplicate army was registered.
    #[error("duplicate army id: {0}")]
    DuplicateArmy(ArmyId),

    /// A duplicate villager group was registered.
    #[error("duplicate villager group id: {0}")]
    DuplicateVillagerGroup(VillagerGroupId),

    /// A duplicate resource point was registered.
    #[error("duplicate resource point id: {0}")]
    DuplicateResourcePoint(ResourcePointId),

    /// A coordinate lies outside the map.
    #[error("coordinate {0} is outside the map")]
    OutOfBounds(Hex),

    /// Map dimensions are zero or too large to index.
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// More players were requested than the starting layout has slots for.
    #[error("starting world supports at most {max} players, got {requested}")]
    TooManyPlayers {
        /// Players requested.
        requested: usize,
        /// Available start slots.
        max: usize,
    },

    /// A balance or counter would drop below zero.
    #[error("insufficient {what}: need {needed}, have {available}")]
    Insufficient {
        /// What ran short.
        what: String,
        /// Amount required.
        needed: u64,
        /// Amount held.
        available: u64,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
