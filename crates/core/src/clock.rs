//! Fixed-step accumulator decoupling physics from the render frame rate.

use thiserror::Error;
use tracing::warn;

use crate::SimTick;

/// Errors raised when constructing a [`FixedStep`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    /// The sub-step rate must be a positive, finite number of Hz.
    #[error("sub-step rate must be positive and finite, got {0}")]
    InvalidRate(f32),
}

/// Accumulates real frame time and hands out whole fixed sub-steps.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
    max_steps_per_frame: u32,
    tick: SimTick,
}

impl FixedStep {
    /// Default cap on sub-steps executed for a single frame.
    pub const DEFAULT_MAX_STEPS: u32 = 250;

    /// Create a clock running at `hz` sub-steps per second.
    pub fn new(hz: f32) -> Result<Self, ClockError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ClockError::InvalidRate(hz));
        }
        Ok(Self {
            step: 1.0 / hz,
            accumulator: 0.0,
            max_steps_per_frame: Self::DEFAULT_MAX_STEPS,
            tick: SimTick::ZERO,
        })
    }

    /// Override the catch-up cap (minimum 1).
    pub fn with_max_steps(mut self, max_steps_per_frame: u32) -> Self {
        self.max_steps_per_frame = max_steps_per_frame.max(1);
        self
    }

    /// Duration of one sub-step in seconds.
    pub fn step_seconds(&self) -> f32 {
        self.step
    }

    /// Time banked but not yet consumed by a sub-step.
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Sub-steps executed so far.
    pub fn tick(&self) -> SimTick {
        self.tick
    }

    /// Bank `frame_dt` seconds and return how many sub-steps to run now.
    ///
    /// Invalid deltas (negative, NaN, infinite) are ignored. When the banked
    /// time exceeds the per-frame cap the surplus is dropped.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt < 0.0 {
            return 0;
        }
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= self.step {
            if steps == self.max_steps_per_frame {
                warn!(
                    dropped_seconds = self.accumulator,
                    max_steps = self.max_steps_per_frame,
                    "physics falling behind, dropping banked time"
                );
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= self.step;
            steps += 1;
        }
        self.tick = self.tick.advance(steps as u64);
        steps
    }
}
