//! Injectable random sources.
//!
//! RULE: Nothing in the planner reaches for a process-wide RNG.
//! Every generation run is handed its own source, so two runs never
//! share state and any run can be replayed from its seed.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A uniform random source. The planner only ever needs these two draws.
pub trait UniformSource {
    /// Uniform integer in [0, n). `n` must be > 0.
    fn below(&mut self, n: u64) -> u64;

    /// Uniform float in [0.0, 1.0).
    fn unit(&mut self) -> f64;
}

/// The production source: PCG seeded from a recorded u64.
pub struct PlanRng {
    seed: u64,
    inner: Pcg64Mcg,
}

impl PlanRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy. The chosen seed is kept so the run can be
    /// reproduced later.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl UniformSource for PlanRng {
    fn below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    fn unit(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn below(&mut self, n: u64) -> u64 {
        (**self).below(n)
    }

    fn unit(&mut self) -> f64 {
        (**self).unit()
    }
}
