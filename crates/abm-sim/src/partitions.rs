//! Kernel-owned partitions.
//!
//! Every partition is kept current inside [`Sim::publish`]: before an event
//! reaches its subscribers, each partition sensitive to the event's type
//! re-evaluates the agents the event names, and only those.  `AgentAdded`
//! evaluates the new agent everywhere; `AgentRemoved` drops it everywhere.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;

use abm_core::{
    AgentAdded, AgentIndex, AgentRemoved, PartitionId, PropertyDefinition, PropertyId, PropertyValue,
};
use abm_partition::{
    Filter, LabelSet, Partition, PartitionError, PartitionIndex, PartitionResult, PopulationView,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::agents::AgentsManager;
use crate::properties::AgentPropertiesManager;
use crate::{Sim, SimResult};

#[derive(Default)]
pub(crate) struct Partitions {
    indices: BTreeMap<PartitionId, PartitionIndex<Sim>>,
    /// Event type → number of partitions sensitive to it.
    watched: FxHashMap<TypeId, usize>,
}

impl Partitions {
    fn index(&self, id: PartitionId) -> SimResult<&PartitionIndex<Sim>> {
        Ok(self.indices.get(&id).ok_or(PartitionError::UnknownPartition(id))?)
    }
}

impl PopulationView for Sim {
    fn agent_indices(&self) -> PartitionResult<Vec<AgentIndex>> {
        self.agents()
            .map_err(|e| PartitionError::PopulationUnavailable(e.to_string()))
    }

    fn property_definition(&self, property: PropertyId) -> Option<&PropertyDefinition> {
        self.data_manager::<AgentPropertiesManager>()
            .ok()?
            .definition(property)
    }

    fn property_value(&self, agent: AgentIndex, property: PropertyId) -> Option<PropertyValue> {
        self.data_manager::<AgentPropertiesManager>()
            .ok()?
            .value(agent, property)
            .ok()
            .flatten()
    }
}

impl Sim {
    /// Build a partition over the current population and keep it current
    /// from now on.
    ///
    /// The agents plugin must already be loaded: a partition built before
    /// the initial population exists would never see those agents.
    pub fn add_partition(&mut self, id: PartitionId, partition: Partition<Sim>) -> SimResult<()> {
        if self.partitions.indices.contains_key(&id) {
            return Err(PartitionError::DuplicatePartition(id).into());
        }
        self.data_manager::<AgentsManager>()?;
        let index = PartitionIndex::build(partition, self)?;
        for event_type in index.event_types() {
            *self.partitions.watched.entry(event_type).or_default() += 1;
        }
        debug!(partition = %id, members = index.len(), "partition added");
        self.partitions.indices.insert(id, index);
        Ok(())
    }

    /// Stop maintaining a partition.  `false` if it did not exist.
    pub fn remove_partition(&mut self, id: PartitionId) -> bool {
        let Some(index) = self.partitions.indices.remove(&id) else {
            return false;
        };
        for event_type in index.event_types() {
            if let Some(count) = self.partitions.watched.get_mut(&event_type) {
                *count -= 1;
                if *count == 0 {
                    self.partitions.watched.remove(&event_type);
                }
            }
        }
        debug!(partition = %id, "partition removed");
        true
    }

    pub fn partition_exists(&self, id: PartitionId) -> bool {
        self.partitions.indices.contains_key(&id)
    }

    /// Members matching `labels`, ascending, optionally narrowed by an ad hoc
    /// filter.
    pub fn query_partition(
        &self,
        id: PartitionId,
        labels: &LabelSet,
        filter: Option<&Filter<Sim>>,
    ) -> SimResult<Vec<AgentIndex>> {
        Ok(self.partitions.index(id)?.query(self, labels, filter)?)
    }

    pub fn partition_count(&self, id: PartitionId, labels: &LabelSet) -> SimResult<usize> {
        Ok(self.partitions.index(id)?.count(labels)?)
    }

    pub fn partition_contains(
        &self,
        id: PartitionId,
        agent: AgentIndex,
        labels: &LabelSet,
    ) -> SimResult<bool> {
        Ok(self.partitions.index(id)?.contains(agent, labels)?)
    }

    /// A uniformly random member matching `labels`, drawn from the run's
    /// RNG.  `None` when no eligible member exists.
    pub fn sample_partition(
        &mut self,
        id: PartitionId,
        labels: &LabelSet,
        exclude: Option<AgentIndex>,
    ) -> SimResult<Option<AgentIndex>> {
        let index = self.partitions.index(id)?;
        Ok(index.sample(labels, exclude, &mut self.rng)?)
    }

    /// Agent evaluations the partition has performed since it was added.
    pub fn partition_evaluations(&self, id: PartitionId) -> SimResult<u64> {
        Ok(self.partitions.index(id)?.evaluations())
    }

    pub(crate) fn refresh_partitions(&mut self, event_type: TypeId, event: &dyn Any) -> SimResult<()> {
        if self.partitions.indices.is_empty() {
            return Ok(());
        }
        if let Some(removed) = event.downcast_ref::<AgentRemoved>() {
            for index in self.partitions.indices.values_mut() {
                index.remove(removed.agent);
            }
            return Ok(());
        }
        let added = event.downcast_ref::<AgentAdded>().map(|e| e.agent);
        if added.is_none() && !self.partitions.watched.contains_key(&event_type) {
            return Ok(());
        }

        let mut updates = Vec::new();
        for (&id, index) in &self.partitions.indices {
            let agents = match added {
                Some(agent) => vec![agent],
                None => index.affected(event_type, event),
            };
            for agent in agents {
                if self.agent_exists(agent)? {
                    updates.push((id, agent, index.evaluate(self, agent)?));
                }
            }
        }
        for (id, agent, outcome) in updates {
            if let Some(index) = self.partitions.indices.get_mut(&id) {
                index.apply(agent, outcome);
            }
        }
        Ok(())
    }
}
