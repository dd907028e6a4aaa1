//! Error types for abm-experiment.

use thiserror::Error;

/// Errors that stop an experiment as a whole.  A failing run is not one of
/// them: it is reported in [`ExperimentReport`][crate::ExperimentReport].
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid experiment configuration: {0}")]
    Config(String),
}

/// Alias for `Result<T, ExperimentError>`.
pub type ExperimentResult<T> = Result<T, ExperimentError>;
