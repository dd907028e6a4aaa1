use abm_core::{AgentIndex, CoreError, PropertyId};
use abm_event::EventError;
use abm_partition::PartitionError;
use abm_plan::PlanError;
use abm_plugin::PluginError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("agent {0} does not exist")]
    AgentNotFound(AgentIndex),

    #[error("property {0} is immutable once assigned")]
    ImmutableProperty(PropertyId),

    #[error("agent {agent} has no value for property {property}, which has no default")]
    MissingPropertyValue { agent: AgentIndex, property: PropertyId },

    #[error("property {0} is already defined")]
    DuplicateProperty(PropertyId),

    #[error("property {0} does not track assignment times")]
    TimeNotTracked(PropertyId),

    #[error("the simulation has already run")]
    AlreadyStarted,

    /// Raised by model code (plan callbacks, handlers, initializers).
    #[error("model error: {0}")]
    Model(String),
}

pub type SimResult<T> = Result<T, SimError>;
