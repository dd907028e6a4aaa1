//! Deterministic per-run RNG.
//!
//! # Determinism strategy
//!
//! Every simulation run owns exactly one `SimRng`.  Experiments derive the
//! run seed from the experiment seed and the (scenario, replication) pair:
//!
//!   seed = base XOR (scenario * MIXING_CONSTANT) XOR rotl(replication * MIXING_CONSTANT, 32)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive ids uniformly across the seed space.  Runs never
//! share RNG state, so parallel replications cannot perturb each other and
//! a run's output does not depend on which worker thread executed it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{ReplicationId, ScenarioId};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG.
///
/// Used only from the run's own thread; the type is intentionally not
/// shared.  If a plugin needs an independent stream, derive one with
/// [`SimRng::child`].
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// The seed for one (scenario, replication) run of an experiment.
    pub fn run_seed(base: u64, scenario: ScenarioId, replication: ReplicationId) -> u64 {
        let s = u64::from(scenario.0).wrapping_mul(MIXING_CONSTANT);
        let r = u64::from(replication.0)
            .wrapping_add(1)
            .wrapping_mul(MIXING_CONSTANT)
            .rotate_left(32);
        base ^ s ^ r
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).  NaN counts as 0.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform index in `0..len`, or `None` if `len == 0`.
    #[inline]
    pub fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0.gen_range(0..len))
    }

    /// Exponentially distributed waiting time with the given mean.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        let u: f64 = self.0.r#gen();
        -mean * (1.0 - u).ln()
    }
}
