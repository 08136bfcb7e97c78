//! Axial hex-grid coordinates.
//!
//! A [`Hex`] is an axial coordinate `(q, r)`; the implicit cube coordinate
//! is `s = -q - r`. Distances are cube distances, so two coordinates are
//! adjacent exactly when their distance is 1.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Axial coordinate of a single hex on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Hex {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

/// One of the six hex directions, also used as a building rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Rotation {
    /// `(+1, 0)`.
    #[default]
    East,
    /// `(+1, -1)`.
    NorthEast,
    /// `(0, -1)`.
    NorthWest,
    /// `(-1, 0)`.
    West,
    /// `(-1, +1)`.
    SouthWest,
    /// `(0, +1)`.
    SouthEast,
}

impl Rotation {
    /// All rotations in counter-clockwise order starting at east.
    pub const ALL: [Self; 6] = [
        Self::East,
        Self::NorthEast,
        Self::NorthWest,
        Self::West,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Unit offset of this direction.
    pub const fn offset(self) -> Hex {
        match self {
            Self::East => Hex::new(1, 0),
            Self::NorthEast => Hex::new(1, -1),
            Self::NorthWest => Hex::new(0, -1),
            Self::West => Hex::new(-1, 0),
            Self::SouthWest => Hex::new(-1, 1),
            Self::SouthEast => Hex::new(0, 1),
        }
    }

    /// The next direction counter-clockwise.
    pub const fn turned(self) -> Self {
        match self {
            Self::East => Self::NorthEast,
            Self::NorthEast => Self::NorthWest,
            Self::NorthWest => Self::West,
            Self::West => Self::SouthWest,
            Self::SouthWest => Self::SouthEast,
            Self::SouthEast => Self::East,
        }
    }
}

impl Hex {
    /// Create a coordinate from its axial components.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third cube component.
    pub const fn s(self) -> i32 {
        self.q.saturating_neg().saturating_sub(self.r)
    }

    /// The coordinate one step away in `direction`.
    pub const fn step(self, direction: Rotation) -> Self {
        let d = direction.offset();
        Self::new(self.q.saturating_add(d.q), self.r.saturating_add(d.r))
    }

    /// The six adjacent coordinates in [`Rotation::ALL`] order.
    pub fn neighbors(self) -> [Self; 6] {
        Rotation::ALL.map(|d| self.step(d))
    }

    /// Cube distance between two coordinates.
    pub const fn distance(self, other: Self) -> u32 {
        let dq = self.q.abs_diff(other.q);
        let dr = self.r.abs_diff(other.r);
        let ds = self.s().abs_diff(other.s());
        let max = if dq > dr { dq } else { dr };
        if ds > max { ds } else { max }
    }

    /// Whether `other` is one of the six neighbours.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }

    /// All coordinates within `radius` (inclusive), including `self`, in a
    /// deterministic order.
    pub fn within(self, radius: u32) -> Vec<Self> {
        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        let mut out = Vec::new();
        for dq in radius.saturating_neg()..=radius {
            let dr_min = radius.saturating_neg().max(dq.saturating_neg().saturating_sub(radius));
            let dr_max = radius.min(radius.saturating_sub(dq));
            for dr in dr_min..=dr_max {
                out.push(Self::new(self.q.saturating_add(dq), self.r.saturating_add(dr)));
            }
        }
        out
    }
}

impl core::fmt::Display for Hex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}
