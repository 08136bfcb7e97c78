//! Concrete gameplay commands, grouped by concern.

pub mod building;
pub mod garrison;
pub mod gathering;
pub mod military;
pub mod movement;
pub mod reinforcement;
pub mod training;

pub use building::{CancelUpgrade, DemolishBuilding, PlaceBuilding, UpgradeBuilding};
pub use garrison::{DeployGarrison, GarrisonArmy};
pub use gathering::{GatherResource, HuntResource};
pub use military::{AssignHomeBase, AttackTarget, CancelEntrenchment, Entrench, Retreat};
pub use movement::{MoveArmy, MoveVillagers};
pub use reinforcement::{CancelReinforcement, SendReinforcement, return_reinforcement};
pub use training::{CancelTraining, TrainUnits};
