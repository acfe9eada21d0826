use anyhow::{Context, Result};
use cubeworld_physics::{CapsuleConfig, PhysicsConfig};
use cubeworld_world::{TerrainConfig, WorldConfig};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/cubeworld.toml";

/// Grid extents, the `[world]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldSection {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
}

impl Default for WorldSection {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            size_x: world.size_x,
            size_y: world.size_y,
            size_z: world.size_z,
        }
    }
}

/// Everything a headless session is built from. Fixed once the world exists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldSection,
    pub terrain: TerrainConfig,
    pub player: CapsuleConfig,
    pub physics: PhysicsConfig,
}

impl SimConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SimConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SimConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Config not found at {}. Using defaults", path.display());
                }
                SimConfig::default()
            }
        }
    }

    /// Save configuration as pretty TOML.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            size_x: self.world.size_x,
            size_y: self.world.size_y,
            size_z: self.world.size_z,
            terrain: self.terrain.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let world = self.world_config();
        world.dims().context("invalid [world] section")?;
        world.terrain.validate().context("invalid [terrain] section")?;
        self.player.validate().context("invalid [player] section")?;
        self.physics.validate().context("invalid [physics] section")?;
        Ok(())
    }
}
