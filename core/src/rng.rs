//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call a platform RNG.
//! Scenario and index-rate models receive their randomness as a
//! `&mut impl RandomSource` argument for every call, so each request
//! owns its stream and tests can script exact draws.
//!
//! Streams are seeded deterministically from
//! (master_seed, request_sequence). This means:
//!   - Two requests never share a stream.
//!   - Replaying a run with the same seed reproduces every outcome.

use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rand_pcg::Pcg64Mcg;

/// The randomness contract consumed by the stochastic models.
pub trait RandomSource {
    /// Draw a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Draw a standard normal variate (mean 0, stddev 1).
    fn gaussian(&mut self) -> f64;

    /// Draw a float in [low, high).
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// A named, deterministic RNG stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream from a seed. Same seed, same draws.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }
}

impl RandomSource for SimRng {
    fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn gaussian(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }
}

/// Per-run seed source. Hands out one independent stream per request.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Stream for the `sequence`-th request of this run.
    pub fn for_request(&self, sequence: u64) -> SimRng {
        let derived_seed = self.master_seed ^ sequence.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        SimRng::from_seed(derived_seed).with_name("simulation")
    }
}
