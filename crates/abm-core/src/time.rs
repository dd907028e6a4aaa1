//! Simulation time model.
//!
//! # Design
//!
//! Time is a continuous `f64` measured in days from the start of the run.
//! Epidemiological plans routinely land on fractional days (an incubation
//! period of 3.7 days), so integer ticks would force every plugin to pick a
//! resolution.  Plan times must be finite; the plan queue rejects NaN and
//! infinities, which gives `f64::total_cmp` a total order over every time the
//! kernel ever sees.
//!
//! The clock only moves forward.  `SimClock::advance_to` is called by the run
//! loop before each plan executes.

use std::fmt;

use crate::{ReplicationId, ScenarioId};

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The current simulation time, in days.
#[derive(Clone, Debug, Default)]
pub struct SimClock {
    now: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move the clock to `time`.  Never moves backwards.
    #[inline]
    pub fn advance_to(&mut self, time: f64) {
        if time > self.now {
            self.now = time;
        }
    }

    /// `true` if `time` lies strictly before the current time.
    #[inline]
    pub fn is_past(&self, time: f64) -> bool {
        time < self.now
    }

    /// Break the current time into (day, hour, minute) components.
    /// Useful for human-readable logging without a datetime library.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_minutes = (self.now.max(0.0) * 1_440.0).round() as u64;
        let days = total_minutes / 1_440;
        let hours = ((total_minutes % 1_440) / 60) as u32;
        let minutes = (total_minutes % 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "t={:.3} (day {} {:02}:{:02})", self.now, d, h, m)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Configuration of one simulation run.
///
/// Experiments build one per (scenario, replication); standalone runs use
/// [`SimConfig::default`] and override the seed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Seed of the run's `SimRng`.  The same seed always produces identical
    /// results.
    pub seed: u64,

    /// Plans scheduled after this time are never executed.  `None` runs until
    /// the queue holds no active plans.
    pub halt_time: Option<f64>,

    /// Scenario this run belongs to; stamped on every output record.
    pub scenario: ScenarioId,

    /// Replication of the scenario; stamped on every output record.
    pub replication: ReplicationId,
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }

    /// `true` if a plan at `time` falls beyond the halt time.
    #[inline]
    pub fn is_beyond_halt(&self, time: f64) -> bool {
        self.halt_time.is_some_and(|halt| time > halt)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed:        0,
            halt_time:   None,
            scenario:    ScenarioId(0),
            replication: ReplicationId(0),
        }
    }
}
