//! Experiment configuration.

use std::path::PathBuf;

use abm_core::{ReplicationId, ScenarioId, SimConfig, SimRng};

/// How an experiment is run.  Scenarios themselves are added to the
/// [`Experiment`][crate::Experiment]; this struct only says how many times
/// each is replicated and how.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentConfig {
    /// Runs per scenario.
    pub replication_count: u32,

    /// Base seed; each run's seed is derived from it and the run's
    /// (scenario, replication).
    pub seed: u64,

    /// Worker threads.  `None` lets rayon pick (one per core).
    pub num_threads: Option<usize>,

    /// Applied to every run.
    pub halt_time: Option<f64>,

    /// Where completed runs are recorded.  `None` disables the log.
    pub progress_log: Option<PathBuf>,

    /// Skip runs already recorded in `progress_log` instead of starting
    /// over.
    pub continue_from_progress: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            replication_count:      1,
            seed:                   0,
            num_threads:            None,
            halt_time:              None,
            progress_log:           None,
            continue_from_progress: false,
        }
    }
}

impl ExperimentConfig {
    /// The configuration of one run.
    pub fn run_config(&self, scenario: ScenarioId, replication: ReplicationId) -> SimConfig {
        SimConfig {
            seed: SimRng::run_seed(self.seed, scenario, replication),
            halt_time: self.halt_time,
            scenario,
            replication,
        }
    }
}
