//! The terrain grid.
//!
//! The map is a rectangular block of axial coordinates
//! `0 <= q < width`, `0 <= r < height`, stored row-major. Terrain is
//! generated from a seed so that the same seed always produces the same
//! map.
//!
//! # Terrain weights
//!
//! | Terrain  | Weight |
//! |----------|--------|
//! | Grass    | 55     |
//! | Forest   | 20     |
//! | Hill     | 12     |
//! | Water    | 8      |
//! | Mountain | 5      |

use bastion_types::{Hex, Terrain};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 4096;

/// Weighted terrain table used by [`GameMap::generate`].
const TERRAIN_WEIGHTS: [(Terrain, u32); 5] = [
    (Terrain::Grass, 55),
    (Terrain::Forest, 20),
    (Terrain::Hill, 12),
    (Terrain::Water, 8),
    (Terrain::Mountain, 5),
];

/// Rectangular terrain grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMap {
    width: u32,
    height: u32,
    tiles: Vec<Terrain>,
}

impl GameMap {
    /// Create a map filled with a single terrain.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is zero
    /// or larger than [`MAX_DIMENSION`].
    pub fn filled(width: u32, height: u32, terrain: Terrain) -> Result<Self, WorldError> {
        let len = Self::tile_count(width, height)?;
        Ok(Self {
            width,
            height,
            tiles: vec![terrain; len],
        })
    }

    /// Generate a map from a seed using the weighted terrain table.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] for invalid dimensions.
    pub fn generate(width: u32, height: u32, seed: u64) -> Result<Self, WorldError> {
        let len = Self::tile_count(width, height)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let total: u32 = TERRAIN_WEIGHTS.iter().map(|(_, w)| *w).sum();
        let tiles = (0..len)
            .map(|_| {
                let mut roll = rng.random_range(0..total);
                for (terrain, weight) in TERRAIN_WEIGHTS {
                    if roll < weight {
                        return terrain;
                    }
                    roll = roll.saturating_sub(weight);
                }
                Terrain::Grass
            })
            .collect();
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    fn tile_count(width: u32, height: u32) -> Result<usize, WorldError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(WorldError::InvalidDimensions { width, height });
        }
        let count = width
            .checked_mul(height)
            .ok_or(WorldError::InvalidDimensions { width, height })?;
        usize::try_from(count).map_err(|_e| WorldError::InvalidDimensions { width, height })
    }

    /// Map width (number of `q` columns).
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height (number of `r` rows).
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, hex: Hex) -> Option<usize> {
        let q = u32::try_from(hex.q).ok()?;
        let r = u32::try_from(hex.r).ok()?;
        if q >= self.width || r >= self.height {
            return None;
        }
        let flat = r.checked_mul(self.width)?.checked_add(q)?;
        usize::try_from(flat).ok()
    }

    /// Whether the coordinate lies on the map.
    pub fn is_valid_coordinate(&self, hex: Hex) -> bool {
        self.index(hex).is_some()
    }

    /// Terrain at a coordinate, or `None` off the map.
    pub fn terrain(&self, hex: Hex) -> Option<Terrain> {
        self.index(hex).and_then(|i| self.tiles.get(i)).copied()
    }

    /// Whether the terrain at a coordinate can be walked on. Off-map
    /// coordinates are never walkable.
    pub fn is_walkable_terrain(&self, hex: Hex) -> bool {
        self.terrain(hex).is_some_and(Terrain::is_walkable)
    }

    /// Overwrite the terrain at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if the coordinate is off the map.
    pub fn set_terrain(&mut self, hex: Hex, terrain: Terrain) -> Result<(), WorldError> {
        let slot = self
            .index(hex)
            .and_then(|i| self.tiles.get_mut(i))
            .ok_or(WorldError::OutOfBounds(hex))?;
        *slot = terrain;
        Ok(())
    }
}
