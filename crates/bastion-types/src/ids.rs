//! Entity identifiers.
//!
//! Players, buildings, armies, villager groups, resource points, pending
//! reinforcements and combat sessions each get their own [`Uuid`] newtype,
//! so an army id can never be passed where a building id is expected. Ids
//! are v7 UUIDs: within one process a later id sorts after an earlier one,
//! and the world arena iterates entities in that order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Declares one identifier newtype.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// A fresh identifier, ordered after every one minted before it.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The wrapped [`Uuid`].
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player (human or AI controlled).
    PlayerId
}

define_id! {
    /// Unique identifier for a building placed on the map.
    BuildingId
}

define_id! {
    /// Unique identifier for an army (a stack of military units).
    ArmyId
}

define_id! {
    /// Unique identifier for a group of villagers moving and working together.
    VillagerGroupId
}

define_id! {
    /// Unique identifier for a gatherable or huntable resource point.
    ResourcePointId
}

define_id! {
    /// Unique identifier for reinforcements travelling towards an army.
    ReinforcementId
}

define_id! {
    /// Unique identifier for an in-progress combat session.
    CombatId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let ids: Vec<ArmyId> = (0..64).map(|_| ArmyId::new()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn ids_serialize_as_bare_uuid_strings() {
        let id = BuildingId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
        let back: BuildingId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_is_the_uuid() {
        let id = CombatId::from(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
        assert_eq!(Uuid::from(id), Uuid::nil());
    }
}
