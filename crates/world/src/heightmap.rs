//! Heightmap generation for terrain.
//!
//! Converts the noise field into one surface height per `(x, z)` column.

use serde::{Deserialize, Serialize};

use crate::grid::GridDims;
use crate::noise::NoiseGenerator;

/// Surface height for every column of the grid.
///
/// Each value is the y of the grass cell in that column, in `[0, size_y]`.
/// A value of `size_y` puts the grass just above the grid top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heightmap {
    size_x: usize,
    size_z: usize,
    /// Indexed as `heights[x * size_z + z]`, matching the grid's x-major order.
    heights: Vec<i32>,
}

impl Heightmap {
    /// Sample `noise` at `(x, z)` for every column and apply
    /// `floor(size_y * (magnitude * noise + offset))`, clamped to `[0, size_y]`.
    pub fn generate(noise: &NoiseGenerator, dims: GridDims, magnitude: f64, offset: f64) -> Self {
        let size_y = dims.y as f64;
        let mut heights = Vec::with_capacity(dims.x * dims.z);
        for x in 0..dims.x {
            for z in 0..dims.z {
                let n = noise.sample_2d(x as f64, z as f64);
                let height = (size_y * (magnitude * n + offset)).floor();
                heights.push(height.clamp(0.0, size_y) as i32);
            }
        }
        Self {
            size_x: dims.x,
            size_z: dims.z,
            heights,
        }
    }

    /// Height of column `(x, z)`.
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds.
    pub fn get(&self, x: usize, z: usize) -> i32 {
        assert!(x < self.size_x, "x out of bounds");
        assert!(z < self.size_z, "z out of bounds");
        self.heights[x * self.size_z + z]
    }

    /// Raw heights in x-major order.
    pub fn heights(&self) -> &[i32] {
        &self.heights
    }

    pub fn min_height(&self) -> i32 {
        self.heights.iter().copied().min().unwrap_or(0)
    }

    pub fn max_height(&self) -> i32 {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    pub fn avg_height(&self) -> f32 {
        let sum: i64 = self.heights.iter().map(|&h| h as i64).sum();
        sum as f32 / self.heights.len().max(1) as f32
    }
}
