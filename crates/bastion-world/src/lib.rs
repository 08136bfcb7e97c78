//! World state for the Bastion simulation.
//!
//! This crate models the authoritative world: players, buildings, armies,
//! villager groups and resource points held in an id-keyed arena, plus the
//! hex terrain grid and the routing collaborator commands consume.
//!
//! # Modules
//!
//! - [`state`] -- [`WorldState`], the arena and its spatial queries.
//! - [`map`] -- The rectangular terrain grid and seeded generation.
//! - [`blueprint`] -- Static building and unit tables, footprints, costs.
//! - [`player`] -- Treasury, population, upgrade and research slots.
//! - [`building`] -- Building lifecycle, garrison, training queue.
//! - [`army`] -- Armies, entrenchment, commanders, reinforcements.
//! - [`villager`] -- Villager groups and their closed task variants.
//! - [`resource`] -- Resource points and their assigned gatherers.
//! - [`composition`] -- Unit-count maps shared by armies and garrisons.
//! - [`movement`] -- Movement paths with a progress cursor.
//! - [`pathfinding`] -- The [`Pathfinder`] collaborator and hex A*.
//! - [`starting_world`] -- Default seeded starting world.
//! - [`testing`] -- [`WorldBuilder`] fixture for tests.
//! - [`error`] -- Error types for arena and map operations.
//!
//! [`WorldBuilder`]: testing::WorldBuilder

pub mod army;
pub mod blueprint;
pub mod building;
pub mod composition;
pub mod error;
pub mod map;
pub mod movement;
pub mod pathfinding;
pub mod player;
pub mod resource;
pub mod starting_world;
pub mod state;
pub mod testing;
pub mod villager;

// Re-export primary types at crate root.
pub use army::{Army, Commander, Entrenchment, PendingReinforcement};
pub use blueprint::{BuildingSpec, Cost, UnitSpec, building_spec, footprint, unit_spec, upgrade_cost};
pub use building::{Building, TrainingBatch};
pub use composition::Composition;
pub use error::WorldError;
pub use map::GameMap;
pub use movement::MovementPath;
pub use pathfinding::{HexPathfinder, Pathfinder};
pub use player::Player;
pub use resource::ResourcePoint;
pub use starting_world::{StartingIds, StartingPlayer, create_starting_world};
pub use state::{WorldState, are_hostile};
pub use testing::WorldBuilder;
pub use villager::{VillagerGroup, VillagerTask};
