//! Voxel picking by DDA traversal.
//!
//! Cells are unit cubes centred on integer coordinates, so traversal runs in
//! a space shifted by half a cell where cell `c` spans `[c, c + 1)`.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Upper bound on cells visited by one cast, whatever the reach.
pub const MAX_STEPS: usize = 1 << 16;

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    /// Need not be normalized; zero-length rays never hit.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

/// Result of a raycast against the voxel world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// The cell that was hit.
    pub block: IVec3,
    /// The normal of the face that was entered. Zero when the ray starts inside the cell.
    pub face_normal: IVec3,
    /// Distance from the ray origin to the entry point.
    pub distance: f32,
}

/// Walk cells along `ray` and return the nearest one for which `is_hit` is true.
///
/// Cells further than `max_distance` are never reported.
pub fn raycast<F>(ray: Ray, max_distance: f32, mut is_hit: F) -> Option<RaycastHit>
where
    F: FnMut(IVec3) -> bool,
{
    let direction = ray.direction.normalize_or_zero();
    if direction == Vec3::ZERO || !max_distance.is_finite() || max_distance < 0.0 {
        return None;
    }
    let origin = ray.origin + Vec3::splat(0.5);
    let mut cell = origin.floor().as_ivec3();

    let still = direction.cmpeq(Vec3::ZERO);
    let step = IVec3::select(direction.cmpgt(Vec3::ZERO), IVec3::ONE, IVec3::NEG_ONE);
    // Ray length needed to cross one whole cell, per axis.
    let span = Vec3::select(still, Vec3::INFINITY, direction.recip().abs());
    // Ray length at which the next boundary is crossed, per axis.
    let next_boundary = (cell + step.max(IVec3::ZERO)).as_vec3();
    let mut crossing = Vec3::select(still, Vec3::INFINITY, (next_boundary - origin) / direction);

    let mut face_normal = IVec3::ZERO;
    let mut distance = 0.0;
    let max_steps = ((max_distance * 3.0).ceil() as usize)
        .min(MAX_STEPS)
        .saturating_add(3);

    for _ in 0..max_steps {
        if is_hit(cell) {
            return Some(RaycastHit {
                block: cell,
                face_normal,
                distance,
            });
        }

        let axis = nearest_axis(crossing);
        distance = crossing[axis];
        if distance > max_distance {
            break;
        }
        cell[axis] += step[axis];
        crossing[axis] += span[axis];
        face_normal = IVec3::ZERO;
        face_normal[axis] = -step[axis];
    }

    None
}

/// Axis whose boundary the ray reaches first; ties go to the later axis.
fn nearest_axis(crossing: Vec3) -> usize {
    if crossing.x < crossing.y && crossing.x < crossing.z {
        0
    } else if crossing.y < crossing.z {
        1
    } else {
        2
    }
}
