//! Random number streams for procedural surface generation.
//!
//! Every generator in this crate takes its randomness from an explicit
//! `&mut dyn SurfaceRng` instead of a global source, so a body painted with a
//! seed always comes out the same:
//!
//! - `SeededRandom`: 32-bit LCG seeded from a number or a string (reproducible)
//! - `EntropyRandom`: wraps `rand::rngs::StdRng` seeded from OS entropy
//!
//! # Example
//!
//! ```ignore
//! use cosmos_core::rng::{make_generator, Seed, SurfaceRng};
//!
//! let mut rng = make_generator(Some(&Seed::from("Kepler-22b")));
//! let value = rng.next_f64(); // 0.0..1.0
//! let radius = rng.next_range(6.0, 120.0);
//! let pick = rng.next_index(4); // 0..4
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 16_777_619;

/// LCG multiplier (Numerical Recipes).
const LCG_MULTIPLIER: u32 = 1_664_525;

/// LCG increment (Numerical Recipes).
const LCG_INCREMENT: u32 = 1_013_904_223;

/// Output keeps the low 28 bits of the state.
const OUTPUT_MASK: u32 = 0x0FFF_FFFF;

/// 2^28, the divisor that maps masked output into [0, 1).
const OUTPUT_SCALE: f64 = 268_435_456.0;

/// Seed attached to a celestial body.
///
/// Data records may carry either a number or a string; both reduce to the same
/// 32-bit LCG state space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(f64),
    Text(String),
}

impl Seed {
    /// Reduce the seed to the initial 32-bit generator state.
    pub fn to_state(&self) -> u32 {
        match self {
            Seed::Number(n) => number_to_u32(*n),
            Seed::Text(s) => hash_seed_string(s),
        }
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Seed::Number(value as f64)
    }
}

impl From<f64> for Seed {
    fn from(value: f64) -> Self {
        Seed::Number(value)
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Text(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed::Text(value)
    }
}

/// Convert an arbitrary number to an unsigned 32-bit integer by truncating and
/// wrapping modulo 2^32. Non-finite values map to zero.
pub fn number_to_u32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// 32-bit FNV-1a over the UTF-16 code units of `s`.
pub fn hash_seed_string(s: &str) -> u32 {
    s.encode_utf16().fold(FNV_OFFSET_BASIS, |h, unit| {
        (h ^ unit as u32).wrapping_mul(FNV_PRIME)
    })
}

/// Random stream consumed by the surface painters and scene generators.
///
/// Only `next_f64` is required; the helpers are all derived from it so that a
/// seeded stream advances by exactly one step per helper call.
pub trait SurfaceRng: Send + Sync {
    /// Returns a value in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Returns a value in [0.0, 1.0) as `f32`.
    fn next_f32(&mut self) -> f32 {
        // Values just below 1.0 round up when narrowed.
        (self.next_f64() as f32).min(1.0 - f32::EPSILON / 2.0)
    }

    /// Returns a value in [min, max).
    fn next_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns a value uniformly spread over `±half_width`.
    fn next_signed(&mut self, half_width: f32) -> f32 {
        (self.next_f32() - 0.5) * 2.0 * half_width
    }

    /// Returns an index in [0, len). Returns 0 for an empty range.
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }

    /// Returns `floor(min + rng * span)`, the usual "random count" draw.
    fn next_count(&mut self, min: usize, span: usize) -> usize {
        min + (self.next_f64() * span as f64) as usize
    }

    /// Returns true when the draw exceeds `threshold`.
    fn chance_above(&mut self, threshold: f64) -> bool {
        self.next_f64() > threshold
    }
}

/// Deterministic linear-congruential stream.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    /// Start a stream from a raw 32-bit state.
    pub fn from_state(state: u32) -> Self {
        Self { state }
    }

    /// Start a stream from a body seed.
    pub fn from_seed(seed: &Seed) -> Self {
        Self::from_state(seed.to_state())
    }

    /// Current generator state.
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl SurfaceRng for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        (self.state & OUTPUT_MASK) as f64 / OUTPUT_SCALE
    }
}

impl Iterator for SeededRandom {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

/// Non-deterministic stream for bodies without a seed.
#[derive(Clone)]
pub struct EntropyRandom {
    rng: StdRng,
}

impl EntropyRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceRng for EntropyRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen()
    }
}

/// Build the stream for an optional body seed.
pub fn make_generator(seed: Option<&Seed>) -> Box<dyn SurfaceRng> {
    match seed {
        Some(seed) => Box::new(SeededRandom::from_seed(seed)),
        None => Box::new(EntropyRandom::new()),
    }
}
