//! The built-in agents plugin: which agent indices exist.
//!
//! Indices are issued densely from 0 and never reused.  Removing an agent
//! records the index in a [`RemovalLog`] shared with every property
//! container, so containers can report live-agent counts without the kernel
//! ever clearing their storage.

use std::rc::Rc;

use abm_core::{AgentAdded, AgentIndex, AgentRemoved, CoreError, PluginId, PropertyId, PropertyValue};
use abm_plugin::{DataManager, PluginData};
use abm_property::RemovalLog;
use tracing::debug;

use crate::context::{PluginBuilderExt, SimPlugin};
use crate::properties::AgentPropertiesManager;
use crate::{Sim, SimError, SimResult};

pub const AGENTS: PluginId = PluginId::new("agents");

// ── Plugin data ───────────────────────────────────────────────────────────────

/// Initial population of the agents plugin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentsPluginData {
    initial_count: u32,
}

impl AgentsPluginData {
    pub fn new(initial_count: u32) -> Self {
        Self { initial_count }
    }

    pub fn initial_count(&self) -> u32 {
        self.initial_count
    }
}

impl PluginData for AgentsPluginData {}

/// The agents plugin.  Agents `0..initial_count` exist before the first
/// plan runs; no `AgentAdded` events are published for them.
pub fn agents_plugin(data: AgentsPluginData) -> SimPlugin {
    SimPlugin::builder(AGENTS)
        .add_data(data)
        .init(|ctx| {
            let data = ctx.plugin_data::<AgentsPluginData>()?;
            let mut manager = AgentsManager::new();
            for _ in 0..data.initial_count() {
                manager.allocate()?;
            }
            ctx.add_data_manager(manager)
        })
        .build()
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct AgentsManager {
    alive:      Vec<bool>,
    population: usize,
    removed:    Rc<RemovalLog>,
}

impl DataManager for AgentsManager {}

impl AgentsManager {
    fn new() -> Self {
        Self { alive: Vec::new(), population: 0, removed: RemovalLog::new() }
    }

    /// The index the next addition will receive.
    fn next_index(&self) -> SimResult<AgentIndex> {
        AgentIndex::try_from(self.alive.len())
            .ok()
            .filter(|a| a.is_valid())
            .ok_or(SimError::Core(CoreError::InvalidIndex(AgentIndex::INVALID)))
    }

    fn allocate(&mut self) -> SimResult<AgentIndex> {
        let agent = self.next_index()?;
        self.alive.push(true);
        self.population += 1;
        Ok(agent)
    }

    fn mark_removed(&mut self, agent: AgentIndex) -> bool {
        match self.alive.get_mut(agent.index()) {
            Some(alive) if *alive => {
                *alive = false;
                self.population -= 1;
                self.removed.record(agent);
                true
            }
            _ => false,
        }
    }

    pub fn exists(&self, agent: AgentIndex) -> bool {
        self.alive.get(agent.index()).copied().unwrap_or(false)
    }

    /// Live agents.
    pub fn population(&self) -> usize {
        self.population
    }

    /// Indices ever issued, removed ones included.
    pub fn issued(&self) -> usize {
        self.alive.len()
    }

    /// Live agents, ascending.
    pub fn agents(&self) -> impl Iterator<Item = AgentIndex> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| AgentIndex(i as u32))
    }

    pub fn removal_log(&self) -> Rc<RemovalLog> {
        Rc::clone(&self.removed)
    }
}

// ── Sim API ───────────────────────────────────────────────────────────────────

impl Sim {
    /// Add an agent with the given initial property values.
    ///
    /// Values are validated before an index is issued: an unknown property,
    /// a wrong type or a missing value for a property without default
    /// leaves the population unchanged.  Subscribers to [`AgentAdded`] see
    /// the agent with every initial value in place.
    pub fn add_agent(&mut self, initial: Vec<(PropertyId, PropertyValue)>) -> SimResult<AgentIndex> {
        let agent = self.data_manager::<AgentsManager>()?.next_index()?;
        let has_properties = self.has_data_manager::<AgentPropertiesManager>();
        if has_properties {
            self.data_manager::<AgentPropertiesManager>()?.validate_initial(agent, &initial)?;
        } else if let Some((property, _)) = initial.first() {
            return Err(CoreError::UnknownProperty(*property).into());
        }

        self.data_manager_mut::<AgentsManager>()?.allocate()?;
        if has_properties {
            let now = self.now();
            self.data_manager_mut::<AgentPropertiesManager>()?.assign_initial(agent, initial, now)?;
        }
        debug!(%agent, time = self.now(), "agent added");
        self.publish(AgentAdded { agent })?;
        Ok(agent)
    }

    /// Remove a live agent.  Its index is never issued again.
    pub fn remove_agent(&mut self, agent: AgentIndex) -> SimResult<()> {
        if !self.data_manager_mut::<AgentsManager>()?.mark_removed(agent) {
            return Err(SimError::AgentNotFound(agent));
        }
        if let Ok(properties) = self.data_manager_mut::<AgentPropertiesManager>() {
            properties.remove_agent(agent);
        }
        debug!(%agent, time = self.now(), "agent removed");
        self.publish(AgentRemoved { agent })
    }

    /// Whether `agent` is alive.  Fails if the agents plugin is not loaded.
    pub fn agent_exists(&self, agent: AgentIndex) -> SimResult<bool> {
        Ok(self.data_manager::<AgentsManager>()?.exists(agent))
    }

    /// Number of live agents.
    pub fn population(&self) -> SimResult<usize> {
        Ok(self.data_manager::<AgentsManager>()?.population())
    }

    /// Live agents, ascending.
    pub fn agents(&self) -> SimResult<Vec<AgentIndex>> {
        Ok(self.data_manager::<AgentsManager>()?.agents().collect())
    }

    /// `AgentNotFound` unless `agent` is alive.
    pub(crate) fn require_agent(&self, agent: AgentIndex) -> SimResult<()> {
        if self.agent_exists(agent)? {
            Ok(())
        } else {
            Err(SimError::AgentNotFound(agent))
        }
    }
}
