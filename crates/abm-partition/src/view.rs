use abm_core::{AgentIndex, PropertyDefinition, PropertyId, PropertyValue};

use crate::PartitionResult;

/// Read access partitions need from the population.
///
/// Custom labelers and filters receive the full context `C`, so they may
/// read anything else `C` exposes.
pub trait PopulationView {
    /// Live agents in ascending index order.  An error means the population
    /// cannot be enumerated at all, never that it is empty.
    fn agent_indices(&self) -> PartitionResult<Vec<AgentIndex>>;

    fn property_definition(&self, property: PropertyId) -> Option<&PropertyDefinition>;

    /// Current value, or `None` for an unknown property or an agent with no
    /// value and no default.
    fn property_value(&self, agent: AgentIndex, property: PropertyId) -> Option<PropertyValue>;
}
