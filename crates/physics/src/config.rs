use cubeworld_core::ClockError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building the collision engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Bad sub-step rate.
    #[error(transparent)]
    Clock(#[from] ClockError),
    /// A physics or capsule parameter is out of range.
    #[error("invalid physics parameter `{field}`: must be positive and finite")]
    InvalidParameter {
        /// Offending field name.
        field: &'static str,
    },
    /// A parameter exceeds its upper bound.
    #[error("physics parameter `{field}` must be at most {max}")]
    TooLarge {
        /// Offending field name.
        field: &'static str,
        /// Largest accepted value.
        max: f32,
    },
}

/// Capsule dimensions of the player entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleConfig {
    /// Horizontal radius.
    pub radius: f32,
    /// Full height; the vertical half-extent is `height / 2`.
    pub height: f32,
}

impl Default for CapsuleConfig {
    fn default() -> Self {
        Self {
            radius: 0.25,
            height: 1.5,
        }
    }
}

impl CapsuleConfig {
    /// Reject non-positive or non-finite dimensions.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        positive("radius", self.radius)?;
        positive("height", self.height)
    }
}

/// Fixed physics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed sub-steps per second.
    pub sub_step_hz: f32,
    /// Downward acceleration (units/s²).
    pub gravity: f32,
    /// Maximum distance for break/place rays.
    pub reach: f32,
    /// Vertical speed added by a jump.
    pub jump_speed: f32,
    /// Horizontal walking speed.
    pub move_speed: f32,
    /// Cap on sub-steps run for one frame.
    pub max_steps_per_frame: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            sub_step_hz: 250.0,
            gravity: 32.0,
            reach: 8.0,
            jump_speed: 10.0,
            move_speed: 3.0,
            max_steps_per_frame: 250,
        }
    }
}

impl PhysicsConfig {
    /// Longest break/place ray accepted from config.
    pub const MAX_REACH: f32 = 256.0;

    /// Reject non-positive or non-finite parameters.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        positive("sub_step_hz", self.sub_step_hz)?;
        positive("reach", self.reach)?;
        if self.reach > Self::MAX_REACH {
            return Err(PhysicsError::TooLarge {
                field: "reach",
                max: Self::MAX_REACH,
            });
        }
        positive("move_speed", self.move_speed)?;
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidParameter { field: "gravity" });
        }
        if !self.jump_speed.is_finite() || self.jump_speed < 0.0 {
            return Err(PhysicsError::InvalidParameter { field: "jump_speed" });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), PhysicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter { field })
    }
}
