use abm_core::EventLabelerId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event labeler {0} is not registered")]
    UnknownLabeler(EventLabelerId),

    #[error("event labeler {0} is already registered")]
    DuplicateLabeler(EventLabelerId),

    #[error("label built by {0} belongs to a different event type")]
    LabelTypeMismatch(EventLabelerId),
}

pub type EventResult<T> = Result<T, EventError>;
