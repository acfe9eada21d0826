#![warn(missing_docs)]
//! Seeded RNG and fixed-step timing shared across the workspace.

pub mod clock;
pub mod rng;

use serde::{Deserialize, Serialize};

pub use clock::{ClockError, FixedStep};
pub use rng::WorldRng;

/// Count of fixed physics sub-steps executed since startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_advances() {
        assert_eq!(SimTick::ZERO.advance(3), SimTick(3));
        assert!(SimTick(2) < SimTick(5));
    }
}
