use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("cannot schedule a plan at {requested} before the current time {now}")]
    PastTime { now: f64, requested: f64 },

    #[error("plan time {0} is not a finite number")]
    InvalidTime(f64),
}

pub type PlanResult<T> = Result<T, PlanError>;
