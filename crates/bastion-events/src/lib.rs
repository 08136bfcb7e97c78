//! Change records and the change log for the Bastion simulation.
//!
//! Every effect a command or the tick cycle has on the world is described
//! by an immutable [`ChangeRecord`]. Records are accumulated in a
//! [`ChangeLogBuilder`] and handed to observers (UI, replication, AI) as a
//! finalized [`ChangeList`]. Observers decode with [`decode_lenient`] so
//! that record kinds added by newer versions are ignored rather than fatal.
//!
//! # Modules
//!
//! - [`record`] -- Record kinds and their payloads
//! - [`log`] -- Builder, finalized list, lenient decoding
//! - [`error`] -- Decoding errors

pub mod error;
pub mod log;
pub mod record;

pub use error::DecodeError;
pub use log::{ChangeList, ChangeLogBuilder, DecodedChanges, decode_lenient};
pub use record::*;

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::record::ChangeRecord::export_all();
        let _ = crate::record::EntrenchmentCancelReason::export_all();
        let _ = crate::record::CombatMode::export_all();
        let _ = crate::record::VillagerActivity::export_all();
    }
}
