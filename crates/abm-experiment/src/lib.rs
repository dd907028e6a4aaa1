//! `abm-experiment` — runs a simulation many times.
//!
//! An experiment is a list of scenarios (each a complete plugin list) and a
//! replication count.  Every (scenario, replication) pair is one
//! independent [`Sim`][abm_sim::Sim] with its own derived seed, run on a
//! rayon worker.  All runs share one [`OutputSink`][abm_sim::OutputSink].
//!
//! # Crate layout
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`config`]     | `ExperimentConfig`                                     |
//! | [`experiment`] | `Experiment`, `ExperimentReport`, `RunReport`          |
//! | [`progress`]   | `ProgressLog` — resumable record of completed runs     |
//! | [`sink`]       | `CsvSink`                                              |
//! | [`error`]      | `ExperimentError`, `ExperimentResult<T>`               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                          |
//! |---------|-------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on `ExperimentConfig`. |

pub mod config;
pub mod error;
pub mod experiment;
pub mod progress;
pub mod sink;


pub use config::ExperimentConfig;
pub use error::{ExperimentError, ExperimentResult};
pub use experiment::{Experiment, ExperimentReport, RunReport};
pub use progress::{read_completed, ProgressLog, RunKey};
pub use sink::CsvSink;
