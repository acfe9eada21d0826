//! The player capsule as seen by the collision engine.

use cubeworld_world::GridDims;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CapsuleConfig;

/// Movement intent for one sub-step, in the entity's facing frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    /// Move along facing (-Z local).
    pub forward: bool,
    /// Move against facing.
    pub backward: bool,
    /// Strafe left (-X local).
    pub left: bool,
    /// Strafe right (+X local).
    pub right: bool,
    /// Jump if grounded.
    pub jump: bool,
}

impl MoveInput {
    /// Unit horizontal direction in the local frame, or zero with no (or cancelling) input.
    pub fn local_direction(&self) -> Vec3 {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f32;
        Vec3::new(
            axis(self.right, self.left),
            0.0,
            axis(self.backward, self.forward),
        )
        .normalize_or_zero()
    }
}

/// Capsule state exchanged with the collision engine every sub-step.
///
/// `velocity` is stored in the entity's local frame (rotated by `yaw` about
/// +Y), so movement keys keep following the facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Capsule centre.
    pub center: Vec3,
    /// Vertical half-extent.
    pub half_height: f32,
    /// Horizontal radius.
    pub radius: f32,
    /// Velocity in the local (yaw) frame.
    pub velocity: Vec3,
    /// Facing angle about +Y, radians.
    pub yaw: f32,
    /// Standing on a floor contact after the last sub-step.
    pub grounded: bool,
}

impl EntityState {
    /// Entity at rest with its eye (capsule top) at `eye`.
    pub fn at_eye(eye: Vec3, capsule: CapsuleConfig) -> Self {
        let half_height = capsule.height * 0.5;
        Self {
            center: eye - Vec3::Y * half_height,
            half_height,
            radius: capsule.radius,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            grounded: false,
        }
    }

    /// Spawn above the middle of the grid, one cell below the top.
    pub fn spawn(dims: GridDims, capsule: CapsuleConfig) -> Self {
        Self::at_eye(spawn_eye(dims), capsule)
    }

    /// Top of the capsule (camera position).
    pub fn eye(&self) -> Vec3 {
        self.center + Vec3::Y * self.half_height
    }

    /// Bottom of the capsule.
    pub fn feet(&self) -> Vec3 {
        self.center - Vec3::Y * self.half_height
    }

    fn facing(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Unit look direction at the given pitch.
    pub fn look_direction(&self, pitch: f32) -> Vec3 {
        self.facing() * (Quat::from_rotation_x(pitch) * Vec3::NEG_Z)
    }

    /// Velocity in world space.
    pub fn world_velocity(&self) -> Vec3 {
        self.facing() * self.velocity
    }

    /// Add a world-space velocity change, converted back to the local frame.
    pub fn apply_world_delta_velocity(&mut self, delta: Vec3) {
        self.velocity += self.facing().inverse() * delta;
    }

    /// Whether `point` lies strictly inside the capsule.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.penetration(point)
            .is_some_and(|(vertical, horizontal)| vertical > 0.0 && horizontal > 0.0)
    }

    /// Vertical and horizontal overlaps of `point` with the capsule, if it is
    /// within the capsule's height band.
    pub(crate) fn penetration(&self, point: Vec3) -> Option<(f32, f32)> {
        let d = point - self.center;
        let vertical = self.half_height - d.y.abs();
        let horizontal_sq = d.x * d.x + d.z * d.z;
        if horizontal_sq >= self.radius * self.radius {
            return None;
        }
        Some((vertical, self.radius - horizontal_sq.sqrt()))
    }
}

/// Eye position used for spawning and resets.
pub fn spawn_eye(dims: GridDims) -> Vec3 {
    Vec3::new(
        dims.x as f32 / 2.0,
        dims.y as f32 - 1.0,
        dims.z as f32 / 2.0,
    )
}
