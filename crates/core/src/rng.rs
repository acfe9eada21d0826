//! Seeded pseudo-random generator feeding world generation.
//!
//! Everything that needs randomness during generation pulls from a
//! [`WorldRng`] derived from the world seed, so a given seed always
//! reproduces the same world.

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

/// Deterministic generator keyed by a 64-bit seed.
#[derive(Debug, Clone)]
pub struct WorldRng {
    seed: u64,
    inner: StdRng,
}

impl WorldRng {
    /// Create a generator for `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next 32 random bits.
    pub fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    /// Next 64 random bits.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Independent sub-stream for a named consumer.
    ///
    /// The derived stream depends only on the parent seed and `label`, not on
    /// how much of the parent stream has been consumed.
    pub fn derive(&self, label: &str) -> Self {
        Self::from_seed(self.seed ^ fnv1a(label.as_bytes()))
    }
}

// 64-bit FNV-1a; stable across platforms and releases, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}
