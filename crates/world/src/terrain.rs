//! Terrain generation: fills the grid once from the heightmap.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::block::BlockKind;
use crate::error::WorldError;
use crate::grid::VoxelGrid;
use crate::heightmap::Heightmap;
use crate::noise::{NoiseConfig, NoiseGenerator};
use cubeworld_core::WorldRng;
use glam::IVec3;

/// Parameters for the single generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u64,
    /// Horizontal distance (in cells) covered by one noise period unit.
    pub noise_scale: f64,
    /// Fraction of the grid height the noise can swing the surface by.
    pub magnitude: f64,
    /// Baseline surface height as a fraction of the grid height.
    pub offset: f64,
    /// Octave count; 1 reproduces the plain single-sample formula.
    pub octaves: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            noise_scale: 30.0,
            magnitude: 0.2,
            offset: 0.5,
            octaves: 1,
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.noise_scale.is_finite() || self.noise_scale <= 0.0 {
            return Err(WorldError::InvalidTerrain {
                field: "noise_scale",
                reason: "must be positive and finite",
            });
        }
        if !self.magnitude.is_finite() {
            return Err(WorldError::InvalidTerrain {
                field: "magnitude",
                reason: "must be finite",
            });
        }
        if !self.offset.is_finite() {
            return Err(WorldError::InvalidTerrain {
                field: "offset",
                reason: "must be finite",
            });
        }
        if self.octaves == 0 {
            return Err(WorldError::InvalidTerrain {
                field: "octaves",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Deterministic heightmap-based terrain generator.
pub struct TerrainGenerator {
    config: TerrainConfig,
    noise: NoiseGenerator,
}

impl TerrainGenerator {
    /// Build a generator; the noise permutation is drawn from the seed's RNG.
    pub fn new(config: TerrainConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let mut rng = WorldRng::from_seed(config.seed).derive("terrain");
        let noise = NoiseGenerator::new(
            NoiseConfig {
                octaves: config.octaves,
                ..NoiseConfig::with_scale(config.noise_scale)
            },
            &mut rng,
        );
        Ok(Self { config, noise })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Heightmap for a grid of the given dimensions.
    pub fn heightmap(&self, grid: &VoxelGrid) -> Heightmap {
        Heightmap::generate(
            &self.noise,
            grid.dims(),
            self.config.magnitude,
            self.config.offset,
        )
    }

    /// Fill every column: grass at the surface, dirt one below, stone beneath, air above.
    #[instrument(skip_all, fields(seed = self.config.seed))]
    pub fn generate(&self, grid: &mut VoxelGrid) -> Heightmap {
        debug!("Starting terrain generation");
        let heightmap = self.heightmap(grid);
        let dims = grid.dims();

        for x in 0..dims.x {
            for z in 0..dims.z {
                let height = heightmap.get(x, z);
                for y in 0..dims.y as i32 {
                    let kind = column_block(y, height);
                    if kind.is_solid() {
                        grid.set_type(IVec3::new(x as i32, y, z as i32), kind);
                    }
                }
            }
        }

        debug!(
            min = heightmap.min_height(),
            max = heightmap.max_height(),
            "Terrain generation complete"
        );
        heightmap
    }
}

/// Block for height `y` in a column whose surface is at `height`.
pub fn column_block(y: i32, height: i32) -> BlockKind {
    if y == height {
        BlockKind::Grass
    } else if y == height - 1 {
        BlockKind::Dirt
    } else if y < height - 1 {
        BlockKind::Stone
    } else {
        BlockKind::Air
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridDims;

    fn grid() -> VoxelGrid {
        VoxelGrid::new(GridDims::new(12, 16, 12).unwrap())
    }

    #[test]
    fn column_layers() {
        assert_eq!(column_block(5, 5), BlockKind::Grass);
        assert_eq!(column_block(4, 5), BlockKind::Dirt);
        assert_eq!(column_block(0, 5), BlockKind::Stone);
        assert_eq!(column_block(6, 5), BlockKind::Air);
        // Zero-height columns hold only grass at y = 0.
        assert_eq!(column_block(0, 0), BlockKind::Grass);
    }

    #[test]
    fn columns_follow_heightmap() {
        let gen = TerrainGenerator::new(TerrainConfig {
            seed: 5,
            ..Default::default()
        })
        .unwrap();
        let mut g = grid();
        let hm = gen.generate(&mut g);

        for x in 0..12 {
            for z in 0..12 {
                let h = hm.get(x, z);
                for y in 0..16 {
                    let expected = column_block(y, h);
                    assert_eq!(g.get(x as i32, y, z as i32).kind, expected);
                }
            }
        }
    }

    #[test]
    fn generation_assigns_no_slots() {
        let gen = TerrainGenerator::new(TerrainConfig::default()).unwrap();
        let mut g = grid();
        gen.generate(&mut g);
        assert!(g.cells().iter().all(|c| c.slot.is_none()));
    }

    #[test]
    fn rejects_bad_config() {
        let bad = TerrainConfig {
            noise_scale: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            TerrainGenerator::new(bad),
            Err(WorldError::InvalidTerrain {
                field: "noise_scale",
                ..
            })
        ));
        let bad = TerrainConfig {
            octaves: 0,
            ..Default::default()
        };
        assert!(TerrainGenerator::new(bad).is_err());
    }
}
