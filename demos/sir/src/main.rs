//! sir — a stochastic SIR epidemic on the abm simulation kernel.
//!
//! Two scenarios (baseline and reduced contacts) × several replications,
//! run in parallel.  Daily compartment counts go to a CSV file:
//!
//! ```text
//! cargo run --release -p sir -- [output.csv]
//! RUST_LOG=debug cargo run -p sir
//! ```

mod model;
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use abm_experiment::{CsvSink, Experiment, ExperimentConfig};
use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use model::{scenario, SirParameters};

// ── Constants ─────────────────────────────────────────────────────────────────

const POPULATION:   u32 = 2_000;
const REPLICATIONS: u32 = 8;
const SEED:         u64 = 42;
const HALT_DAYS:    f64 = 180.0;

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sir_output.csv"));

    let baseline = SirParameters {
        population:         POPULATION,
        initial_infections: 5,
        contact_rate:       4.0,
        transmission:       0.08,
        recovery_days:      5.0,
    };
    let distancing = SirParameters { contact_rate: 2.0, ..baseline.clone() };

    let config = ExperimentConfig {
        replication_count: REPLICATIONS,
        seed:              SEED,
        halt_time:         Some(HALT_DAYS),
        ..ExperimentConfig::default()
    };
    let experiment = Experiment::new(config)
        .add_scenario(scenario(baseline)?)
        .add_scenario(scenario(distancing)?);

    info!(
        output = %output.display(),
        columns = ?report::COLUMNS,
        "writing daily counts"
    );
    let sink = Arc::new(CsvSink::create(&output)?);
    let started = Instant::now();
    let report = experiment.run(sink.clone())?;
    sink.finish()?;

    for run in &report.runs {
        match &run.outcome {
            Ok(summary) => info!(
                scenario = %run.scenario,
                replication = %run.replication,
                end_day = summary.end_time,
                plans = summary.plans_executed,
                events = summary.events_published,
                "run complete"
            ),
            Err(e) => error!(scenario = %run.scenario, replication = %run.replication, error = %e, "run failed"),
        }
    }
    println!(
        "{} runs ({} failed) in {:.2?} → {}",
        report.runs.len(),
        report.failures().count(),
        started.elapsed(),
        output.display()
    );
    Ok(())
}
