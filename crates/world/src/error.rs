use thiserror::Error;

/// Errors raised while building a world.
///
/// Only construction can fail. Runtime reads and edits never error: they
/// resolve out-of-range input to air or to a no-op.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    /// A grid axis was zero.
    #[error("grid dimensions must be non-zero, got {x}x{y}x{z}")]
    EmptyDimension { x: usize, y: usize, z: usize },
    /// The grid volume does not fit a `u32` slot index.
    #[error("grid volume {0} exceeds the addressable slot range")]
    TooLarge(usize),
    /// Terrain parameters are out of range.
    #[error("invalid terrain parameter `{field}`: {reason}")]
    InvalidTerrain {
        field: &'static str,
        reason: &'static str,
    },
    /// A block name did not match any known kind.
    #[error("unknown block kind `{0}`")]
    UnknownBlock(String),
}
