//! Movement paths shared by armies and villager groups.

use bastion_types::Hex;
use serde::{Deserialize, Serialize};

/// An ordered sequence of coordinates to walk, excluding the starting
/// coordinate, with a cursor at the next step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPath {
    steps: Vec<Hex>,
    cursor: usize,
    /// Ticks spent walking toward the step under the cursor.
    pub progress: u64,
}

impl MovementPath {
    /// Wrap a path produced by the pathfinder.
    pub const fn new(steps: Vec<Hex>) -> Self {
        Self {
            steps,
            cursor: 0,
            progress: 0,
        }
    }

    /// Final coordinate, or `None` for an empty path.
    pub fn destination(&self) -> Option<Hex> {
        self.steps.last().copied()
    }

    /// The coordinate the walker is heading to next.
    pub fn next_step(&self) -> Option<Hex> {
        self.steps.get(self.cursor).copied()
    }

    /// Move the cursor past the current step and return it.
    pub fn advance(&mut self) -> Option<Hex> {
        let step = self.next_step()?;
        self.cursor = self.cursor.saturating_add(1);
        self.progress = 0;
        Some(step)
    }

    /// Steps not yet taken.
    pub fn remaining(&self) -> &[Hex] {
        self.steps.get(self.cursor..).unwrap_or(&[])
    }

    /// Total number of steps on the path.
    pub const fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the path has no steps at all.
    pub const fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether every step has been taken.
    pub const fn is_complete(&self) -> bool {
        self.cursor >= self.steps.len()
    }
}

/// Path length as a `u32` for change records, saturating on huge paths.
pub fn path_length(steps: &[Hex]) -> u32 {
    u32::try_from(steps.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_walks_to_destination() {
        let mut path = MovementPath::new(vec![Hex::new(1, 0), Hex::new(2, 0)]);
        assert_eq!(path.destination(), Some(Hex::new(2, 0)));
        assert_eq!(path.advance(), Some(Hex::new(1, 0)));
        assert_eq!(path.remaining(), &[Hex::new(2, 0)]);
        assert_eq!(path.advance(), Some(Hex::new(2, 0)));
        assert!(path.is_complete());
        assert_eq!(path.advance(), None);
    }
}
