//! `Experiment` — every (scenario, replication) run, in parallel.

use std::collections::BTreeSet;
use std::sync::Arc;

use abm_core::{ReplicationId, ScenarioId};
use abm_sim::{OutputSink, RunSummary, SimBuilder, SimError, SimPlugin};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::progress::{ProgressLog, RunKey};
use crate::{ExperimentConfig, ExperimentError, ExperimentResult};

/// The result of one run.
#[derive(Debug, PartialEq)]
pub struct RunReport {
    pub scenario:    ScenarioId,
    pub replication: ReplicationId,
    pub outcome:     Result<RunSummary, SimError>,
}

/// What an experiment did.  Runs are ordered by (scenario, replication).
#[derive(Debug, Default, PartialEq)]
pub struct ExperimentReport {
    pub runs:    Vec<RunReport>,
    /// Runs skipped because the progress log already recorded them.
    pub skipped: usize,
}

impl ExperimentReport {
    pub fn succeeded(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunReport> + '_ {
        self.runs.iter().filter(|r| r.outcome.is_err())
    }
}

/// A set of scenarios, each a complete plugin list, replicated
/// `replication_count` times.
///
/// Every run builds its own [`Sim`][abm_sim::Sim] on a rayon worker from a
/// clone of its scenario's plugins.  Plugins are immutable snapshots, so the
/// clones share all plugin data.
///
/// ```rust,ignore
/// let report = Experiment::new(config)
///     .add_scenario(baseline_plugins)
///     .add_scenario(vaccination_plugins)
///     .run(sink.clone())?;
/// ```
pub struct Experiment {
    config:    ExperimentConfig,
    scenarios: Vec<Vec<SimPlugin>>,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config, scenarios: Vec::new() }
    }

    /// Add a scenario.  Scenario ids follow insertion order from 0.
    pub fn add_scenario(mut self, plugins: Vec<SimPlugin>) -> Self {
        self.scenarios.push(plugins);
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Execute every run not already recorded as complete.
    ///
    /// A failing run is reported in the returned [`ExperimentReport`] and
    /// does not affect other runs.  Errors here are experiment-level:
    /// invalid configuration, thread pool or progress log I/O.
    pub fn run(&self, sink: Arc<dyn OutputSink>) -> ExperimentResult<ExperimentReport> {
        if self.scenarios.is_empty() {
            return Err(ExperimentError::Config("no scenarios".into()));
        }
        if self.config.replication_count == 0 {
            return Err(ExperimentError::Config("replication_count must be positive".into()));
        }

        let (log, completed) = self.open_progress_log()?;
        let pending: Vec<RunKey> = self
            .run_keys()?
            .into_iter()
            .filter(|key| !completed.contains(key))
            .collect();
        let skipped = self.scenarios.len() * self.config.replication_count as usize - pending.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads.unwrap_or(0))
            .build()?;
        info!(
            scenarios = self.scenarios.len(),
            replications = self.config.replication_count,
            pending = pending.len(),
            skipped,
            threads = pool.current_num_threads(),
            "experiment start"
        );

        let runs = pool.install(|| {
            pending
                .par_iter()
                .map(|&(scenario, replication)| {
                    self.execute(scenario, replication, &sink, log.as_ref())
                })
                .collect::<ExperimentResult<Vec<RunReport>>>()
        })?;

        sink.flush();
        let report = ExperimentReport { runs, skipped };
        info!(
            succeeded = report.succeeded(),
            failed = report.runs.len() - report.succeeded(),
            skipped,
            "experiment end"
        );
        Ok(report)
    }

    fn run_keys(&self) -> ExperimentResult<Vec<RunKey>> {
        let mut keys = Vec::with_capacity(self.scenarios.len() * self.config.replication_count as usize);
        for s in 0..self.scenarios.len() {
            let scenario = u32::try_from(s)
                .map(ScenarioId)
                .map_err(|_| ExperimentError::Config("too many scenarios".into()))?;
            for r in 0..self.config.replication_count {
                keys.push((scenario, ReplicationId(r)));
            }
        }
        Ok(keys)
    }

    fn open_progress_log(&self) -> ExperimentResult<(Option<ProgressLog>, BTreeSet<RunKey>)> {
        match &self.config.progress_log {
            None => Ok((None, BTreeSet::new())),
            Some(path) if self.config.continue_from_progress => {
                let (log, completed) = ProgressLog::resume(path)?;
                Ok((Some(log), completed))
            }
            Some(path) => Ok((Some(ProgressLog::create(path)?), BTreeSet::new())),
        }
    }

    fn execute(
        &self,
        scenario: ScenarioId,
        replication: ReplicationId,
        sink: &Arc<dyn OutputSink>,
        log: Option<&ProgressLog>,
    ) -> ExperimentResult<RunReport> {
        let config = self.config.run_config(scenario, replication);
        debug!(%scenario, %replication, seed = config.seed, "run start");

        let plugins = self.scenarios[scenario.0 as usize].iter().cloned();
        let outcome = SimBuilder::new(config)
            .add_plugins(plugins)
            .output(Arc::clone(sink))
            .build()
            .and_then(|mut sim| sim.run());

        match &outcome {
            Ok(summary) => {
                if let Some(log) = log {
                    log.record(scenario, replication)?;
                }
                debug!(%scenario, %replication, end_time = summary.end_time, "run finished");
            }
            Err(error) => warn!(%scenario, %replication, %error, "run failed"),
        }
        Ok(RunReport { scenario, replication, outcome })
    }
}
