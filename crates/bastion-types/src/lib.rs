//! Shared type definitions for the Bastion simulation.
//!
//! This crate is the single source of truth for the identifiers,
//! enumerations and coordinates used across the Bastion workspace. Types
//! defined here flow downstream to `TypeScript` via `ts-rs` for observers
//! of the change log.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Closed enumerations (resources, terrain, units, buildings)
//! - [`hex`] -- Axial hex coordinates and directions

pub mod enums;
pub mod hex;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{BuildingState, BuildingType, ResourcePointKind, ResourceType, Terrain, UnitType};
pub use hex::{Hex, Rotation};
pub use ids::{
    ArmyId, BuildingId, CombatId, PlayerId, ReinforcementId, ResourcePointId, VillagerGroupId,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Calling export_all writes each type to `bindings/` relative to the
        // crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::BuildingId::export_all();
        let _ = crate::ids::ArmyId::export_all();
        let _ = crate::ids::VillagerGroupId::export_all();
        let _ = crate::ids::ResourcePointId::export_all();
        let _ = crate::ids::ReinforcementId::export_all();
        let _ = crate::ids::CombatId::export_all();

        // Enums
        let _ = crate::enums::ResourceType::export_all();
        let _ = crate::enums::ResourcePointKind::export_all();
        let _ = crate::enums::Terrain::export_all();
        let _ = crate::enums::UnitType::export_all();
        let _ = crate::enums::BuildingType::export_all();
        let _ = crate::enums::BuildingState::export_all();

        // Coordinates
        let _ = crate::hex::Hex::export_all();
        let _ = crate::hex::Rotation::export_all();
    }
}
