//! Block kinds that can occupy a grid cell.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WorldError;

/// Identifier for the content of a cell.
///
/// `Air` is the empty kind; every other variant is solid and rendered
/// through its own instance batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BlockKind {
    /// Empty space.
    #[default]
    Air = 0,
    /// Surface layer produced by terrain generation.
    Grass = 1,
    /// One layer below the surface.
    Dirt = 2,
    /// Everything deeper.
    Stone = 3,
    /// Placeable only.
    Log = 4,
    /// Placeable only.
    Glass = 5,
    /// Placeable only.
    Plank = 6,
}

impl BlockKind {
    /// Every solid kind, in registry order.
    pub const SOLID: [BlockKind; 6] = [
        BlockKind::Grass,
        BlockKind::Dirt,
        BlockKind::Stone,
        BlockKind::Log,
        BlockKind::Glass,
        BlockKind::Plank,
    ];

    #[inline]
    pub fn is_air(self) -> bool {
        self == BlockKind::Air
    }

    #[inline]
    pub fn is_solid(self) -> bool {
        !self.is_air()
    }

    /// Stable numeric id.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BlockKind::Air),
            1 => Some(BlockKind::Grass),
            2 => Some(BlockKind::Dirt),
            3 => Some(BlockKind::Stone),
            4 => Some(BlockKind::Log),
            5 => Some(BlockKind::Glass),
            6 => Some(BlockKind::Plank),
            _ => None,
        }
    }

    /// Lowercase name used in config files and logs.
    pub const fn name(self) -> &'static str {
        match self {
            BlockKind::Air => "air",
            BlockKind::Grass => "grass",
            BlockKind::Dirt => "dirt",
            BlockKind::Stone => "stone",
            BlockKind::Log => "log",
            BlockKind::Glass => "glass",
            BlockKind::Plank => "plank",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockKind {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        (0..=6u8)
            .filter_map(BlockKind::from_u8)
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| WorldError::UnknownBlock(s.to_string()))
    }
}
