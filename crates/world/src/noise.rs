//! Coherent noise used for heightmaps.
//!
//! Wraps `noise::Simplex` with an octave loop. The permutation seed is drawn
//! from a [`WorldRng`], so the same world seed always yields the same field.

use cubeworld_core::WorldRng;
use noise::{NoiseFn, Simplex};

/// Octave layering for [`NoiseGenerator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    pub octaves: u32,
    /// Frequency gain per octave.
    pub lacunarity: f64,
    /// Amplitude gain per octave.
    pub persistence: f64,
    /// First-octave frequency, `1 / scale`.
    pub frequency: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 1,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 1.0,
        }
    }
}

impl NoiseConfig {
    /// Single-octave config sampling at `(x / scale, z / scale)`.
    pub fn with_scale(scale: f64) -> Self {
        Self {
            frequency: 1.0 / scale,
            ..Default::default()
        }
    }
}

/// Seeded 2D simplex field.
pub struct NoiseGenerator {
    simplex: Simplex,
    config: NoiseConfig,
}

impl NoiseGenerator {
    /// Create a generator whose permutation is seeded from `rng`.
    pub fn new(config: NoiseConfig, rng: &mut WorldRng) -> Self {
        Self {
            simplex: Simplex::new(rng.next_u32()),
            config,
        }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Octave-summed sample at `(x, z)`, normalised by the total amplitude
    /// and clamped to [-1, 1]. One octave is a single raw simplex sample.
    pub fn sample_2d(&self, x: f64, z: f64) -> f64 {
        let NoiseConfig {
            octaves,
            lacunarity,
            persistence,
            frequency,
        } = self.config;
        let (sum, total_amplitude, _, _) = (0..octaves.max(1)).fold(
            (0.0, 0.0, 1.0, frequency),
            |(sum, total, amplitude, freq), _| {
                let sample = self.simplex.get([x * freq, z * freq]);
                (
                    sum + sample * amplitude,
                    total + amplitude,
                    amplitude * persistence,
                    freq * lacunarity,
                )
            },
        );
        (sum / total_amplitude).clamp(-1.0, 1.0)
    }
}
