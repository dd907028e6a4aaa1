//! Run observer trait for progress reporting.

use abm_plan::PlanOwner;

/// Why [`Sim::run`][crate::Sim::run] returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// No active plan remained.
    Exhausted,
    /// A plan called [`Sim::halt`][crate::Sim::halt].
    Halted,
    /// The next plan lay beyond `SimConfig::halt_time`.
    HaltTime,
}

/// What a finished run did.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub end_time:         f64,
    pub plans_executed:   u64,
    pub events_published: u64,
    pub stop:             StopReason,
}

/// Callbacks invoked by [`Sim::run_with`][crate::Sim::run_with].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct DailyProgress { last_day: u64 }
///
/// impl SimObserver for DailyProgress {
///     fn on_plan(&mut self, time: f64, _owner: PlanOwner) {
///         if time as u64 > self.last_day {
///             self.last_day = time as u64;
///             println!("day {}", self.last_day);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once, before the first plan executes.
    fn on_run_start(&mut self, _time: f64) {}

    /// Called before each plan executes, after the clock has moved to it.
    fn on_plan(&mut self, _time: f64, _owner: PlanOwner) {}

    /// Called once after the loop stops without error.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
