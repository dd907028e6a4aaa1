use abm_core::{AgentIndex, CoreError, PartitionId, PropertyId, ValueType};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PartitionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{value_type} property {property} cannot be used as a label")]
    Unlabelable { property: PropertyId, value_type: ValueType },

    #[error("property {property} of agent {agent} has no label value")]
    UnlabelableValue { agent: AgentIndex, property: PropertyId },

    #[error("label set has {got} dimensions, partition has {expected}")]
    LabelArity { expected: usize, got: usize },

    #[error("partition {0} does not exist")]
    UnknownPartition(PartitionId),

    #[error("partition {0} already exists")]
    DuplicatePartition(PartitionId),

    #[error("population unavailable: {0}")]
    PopulationUnavailable(String),
}

pub type PartitionResult<T> = Result<T, PartitionError>;
