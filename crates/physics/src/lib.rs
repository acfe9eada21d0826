#![warn(missing_docs)]
//! Capsule collision against the voxel grid (AABB broad phase, contact resolution).

mod collision;
mod config;
mod entity;

use glam::{IVec3, Vec3};

pub use collision::{
    broad_phase, narrow_phase, resolve, CollisionEngine, CollisionReport, Contact, CONTACT_EPSILON,
};
pub use config::{CapsuleConfig, PhysicsConfig, PhysicsError};
pub use entity::{spawn_eye, EntityState, MoveInput};

/// Axis-aligned bounding box used for the broad phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z).
    pub min: Vec3,
    /// Maximum corner (x, y, z).
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all());
        Self { min, max }
    }

    /// Box enclosing a vertical capsule.
    pub fn around_capsule(center: Vec3, half_height: f32, radius: f32) -> Self {
        let extent = Vec3::new(radius, half_height, radius);
        Self::new(center - extent, center + extent)
    }

    /// Inclusive integer cell range `[floor(min), ceil(max)]` covering the box.
    pub fn cell_range(&self) -> (IVec3, IVec3) {
        (self.min.floor().as_ivec3(), self.max.ceil().as_ivec3())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capsule_box_extents() {
        let aabb = Aabb::around_capsule(Vec3::new(2.0, 3.0, 2.0), 0.75, 0.25);
        assert_eq!(aabb.min, Vec3::new(1.75, 2.25, 1.75));
        assert_eq!(aabb.max, Vec3::new(2.25, 3.75, 2.25));
    }

    #[test]
    fn cell_range_rounds_outward() {
        let aabb = Aabb::new(Vec3::new(1.75, 2.25, -0.5), Vec3::new(2.25, 3.75, 0.5));
        let (lo, hi) = aabb.cell_range();
        assert_eq!(lo, IVec3::new(1, 2, -1));
        assert_eq!(hi, IVec3::new(3, 4, 1));
    }
}
