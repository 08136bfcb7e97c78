//! Combat: defensive stacks, session lifecycle, and entrenchment.

pub mod defense;
pub mod engine;
pub mod entrenchment;

pub use defense::{DefenseClassification, DefensiveStack, classify_defense, protecting_structures};
pub use engine::{CombatEngine, CombatSession, Participant};
