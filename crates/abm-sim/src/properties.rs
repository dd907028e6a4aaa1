//! The built-in agent-properties plugin: per-agent property values.
//!
//! # Plugin data
//!
//! [`AgentPropertiesPluginData`] is an immutable snapshot of definitions and
//! initial values.  `to_builder` starts a copy-on-write builder from an
//! existing snapshot, so scenario variants share everything they do not
//! change.
//!
//! # Events
//!
//! Every successful [`Sim::set_property`] publishes a [`PropertyUpdate`].
//! Two labelers are registered so subscribers can narrow delivery:
//!
//! | Labeler                                  | Keys                 |
//! |------------------------------------------|----------------------|
//! | [`PROPERTY_UPDATE_BY_PROPERTY`]          | `[property]`         |
//! | [`PROPERTY_UPDATE_BY_AGENT_AND_PROPERTY`]| `[agent, property]`  |

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::Arc;

use abm_core::{
    AgentIndex, CoreError, Event, EventLabelerId, Label, PluginId, PropertyDefinition,
    PropertyId, PropertyUpdate, PropertyValue,
};
use abm_event::{EventLabel, EventLabeler};
use abm_plugin::{DataManager, PluginData};
use abm_property::{new_container, DoubleContainer, PropertyContainer, RemovalLog};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::agents::{AgentsManager, AGENTS};
use crate::context::{PluginBuilderExt, SimPlugin};
use crate::{Sim, SimError, SimResult};

pub const AGENT_PROPERTIES: PluginId = PluginId::new("agent_properties");

pub const PROPERTY_UPDATE_BY_PROPERTY: EventLabelerId = EventLabelerId(0);
pub const PROPERTY_UPDATE_BY_AGENT_AND_PROPERTY: EventLabelerId = EventLabelerId(1);

/// Label matching every update of `property`.
pub fn property_update_label(property: PropertyId) -> EventLabel {
    EventLabel::new::<PropertyUpdate>(PROPERTY_UPDATE_BY_PROPERTY, vec![Label::Property(property)])
}

/// Label matching updates of `property` for one agent.
pub fn agent_property_update_label(agent: AgentIndex, property: PropertyId) -> EventLabel {
    EventLabel::new::<PropertyUpdate>(
        PROPERTY_UPDATE_BY_AGENT_AND_PROPERTY,
        vec![Label::Agent(agent), Label::Property(property)],
    )
}

/// A property was defined after the simulation was built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PropertyDefined {
    pub property: PropertyId,
}

impl Event for PropertyDefined {}

// ── Plugin data ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
struct Snapshot {
    definitions: BTreeMap<PropertyId, PropertyDefinition>,
    values:      BTreeMap<(AgentIndex, PropertyId), PropertyValue>,
}

/// Definitions and initial values of the agent-properties plugin.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentPropertiesPluginData {
    snapshot: Arc<Snapshot>,
}

impl PluginData for AgentPropertiesPluginData {}

impl AgentPropertiesPluginData {
    pub fn builder() -> AgentPropertiesPluginDataBuilder {
        AgentPropertiesPluginDataBuilder { snapshot: Arc::default() }
    }

    /// A builder starting from this snapshot.  Nothing is copied until the
    /// builder changes something.
    pub fn to_builder(&self) -> AgentPropertiesPluginDataBuilder {
        AgentPropertiesPluginDataBuilder { snapshot: Arc::clone(&self.snapshot) }
    }

    pub fn definitions(&self) -> impl Iterator<Item = (PropertyId, &PropertyDefinition)> + '_ {
        self.snapshot.definitions.iter().map(|(id, def)| (*id, def))
    }

    pub fn definition(&self, property: PropertyId) -> Option<&PropertyDefinition> {
        self.snapshot.definitions.get(&property)
    }

    /// Initial values, ordered by agent then property.
    pub fn values(&self) -> impl Iterator<Item = (AgentIndex, PropertyId, &PropertyValue)> + '_ {
        self.snapshot.values.iter().map(|((a, p), v)| (*a, *p, v))
    }

    pub fn value(&self, agent: AgentIndex, property: PropertyId) -> Option<&PropertyValue> {
        self.snapshot.values.get(&(agent, property))
    }
}

pub struct AgentPropertiesPluginDataBuilder {
    snapshot: Arc<Snapshot>,
}

impl AgentPropertiesPluginDataBuilder {
    /// Define (or redefine) a property.
    pub fn define_property(mut self, property: PropertyId, definition: PropertyDefinition) -> Self {
        Arc::make_mut(&mut self.snapshot).definitions.insert(property, definition);
        self
    }

    /// Set an agent's initial value, replacing any earlier one.
    pub fn set_value(
        mut self,
        agent: AgentIndex,
        property: PropertyId,
        value: impl Into<PropertyValue>,
    ) -> Self {
        Arc::make_mut(&mut self.snapshot).values.insert((agent, property), value.into());
        self
    }

    /// Validate and freeze.
    ///
    /// Every value must belong to a defined property and match its type.
    /// Every agent that has any initial value must have one for each
    /// property without a default.
    pub fn build(self) -> SimResult<AgentPropertiesPluginData> {
        let snapshot = &self.snapshot;
        for ((agent, property), value) in &snapshot.values {
            if !agent.is_valid() {
                return Err(CoreError::InvalidIndex(*agent).into());
            }
            let definition = snapshot
                .definitions
                .get(property)
                .ok_or(CoreError::UnknownProperty(*property))?;
            definition.check(value)?;
        }

        let agents: BTreeSet<AgentIndex> = snapshot.values.keys().map(|(a, _)| *a).collect();
        for agent in agents {
            for (property, definition) in &snapshot.definitions {
                if definition.default_value().is_none()
                    && !snapshot.values.contains_key(&(agent, *property))
                {
                    return Err(SimError::MissingPropertyValue { agent, property: *property });
                }
            }
        }
        Ok(AgentPropertiesPluginData { snapshot: self.snapshot })
    }
}

/// The agent-properties plugin.  Depends on the agents plugin, whose
/// initial population must have a value for every property without a
/// default.
pub fn agent_properties_plugin(data: AgentPropertiesPluginData) -> SimPlugin {
    SimPlugin::builder(AGENT_PROPERTIES)
        .depends_on(AGENTS)
        .add_data(data)
        .init(|ctx| {
            let data = ctx.plugin_data::<AgentPropertiesPluginData>()?;
            let removed = ctx.data_manager::<AgentsManager>()?.removal_log();
            let now = ctx.now();

            let mut manager = AgentPropertiesManager::new(removed);
            for (property, definition) in data.definitions() {
                manager.define(property, definition.clone(), now)?;
            }
            for (agent, property, value) in data.values() {
                ctx.require_agent(agent)?;
                manager.assign(agent, property, value.clone(), now)?;
            }

            let agents = ctx.agents()?;
            for &agent in &agents {
                for (property, definition) in data.definitions() {
                    if definition.default_value().is_none() && data.value(agent, property).is_none() {
                        return Err(SimError::MissingPropertyValue { agent, property });
                    }
                }
            }
            manager.ensure_capacity(agents.len());
            debug!(
                properties = manager.definitions.len(),
                agents = agents.len(),
                "agent properties loaded"
            );
            ctx.add_data_manager(manager)?;

            ctx.add_event_labeler(EventLabeler::new(
                PROPERTY_UPDATE_BY_PROPERTY,
                |e: &PropertyUpdate| vec![Label::Property(e.property)],
            ))?;
            ctx.add_event_labeler(EventLabeler::new(
                PROPERTY_UPDATE_BY_AGENT_AND_PROPERTY,
                |e: &PropertyUpdate| vec![Label::Agent(e.agent), Label::Property(e.property)],
            ))
        })
        .build()
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct AgentPropertiesManager {
    definitions: BTreeMap<PropertyId, PropertyDefinition>,
    containers:  FxHashMap<PropertyId, Box<dyn PropertyContainer>>,
    /// Assignment times, for properties that track them.
    times:       FxHashMap<PropertyId, DoubleContainer>,
    removed:     Rc<RemovalLog>,
}

impl DataManager for AgentPropertiesManager {}

impl AgentPropertiesManager {
    fn new(removed: Rc<RemovalLog>) -> Self {
        Self {
            definitions: BTreeMap::new(),
            containers: FxHashMap::default(),
            times: FxHashMap::default(),
            removed,
        }
    }

    /// Agents that never had a tracked property assigned report `now` as
    /// its assignment time.
    fn define(&mut self, property: PropertyId, definition: PropertyDefinition, now: f64) -> SimResult<()> {
        if self.definitions.contains_key(&property) {
            return Err(SimError::DuplicateProperty(property));
        }
        self.containers
            .insert(property, new_container(&definition, self.removed.clone()));
        if definition.tracks_time() {
            self.times
                .insert(property, DoubleContainer::new(now, self.removed.clone()));
        }
        self.definitions.insert(property, definition);
        Ok(())
    }

    fn assign(&mut self, agent: AgentIndex, property: PropertyId, value: PropertyValue, now: f64) -> SimResult<()> {
        let container = self
            .containers
            .get_mut(&property)
            .ok_or(CoreError::UnknownProperty(property))?;
        container.set(agent, value)?;
        if let Some(times) = self.times.get_mut(&property) {
            times.set_f64(agent, now)?;
        }
        Ok(())
    }

    pub(crate) fn validate_initial(
        &self,
        agent: AgentIndex,
        initial: &[(PropertyId, PropertyValue)],
    ) -> SimResult<()> {
        for (property, value) in initial {
            self.definitions
                .get(property)
                .ok_or(CoreError::UnknownProperty(*property))?
                .check(value)?;
        }
        for (property, definition) in &self.definitions {
            if definition.default_value().is_none() && !initial.iter().any(|(p, _)| p == property) {
                return Err(SimError::MissingPropertyValue { agent, property: *property });
            }
        }
        Ok(())
    }

    /// Store a new agent's initial values and stamp every tracked
    /// property with the creation time.
    pub(crate) fn assign_initial(
        &mut self,
        agent: AgentIndex,
        initial: Vec<(PropertyId, PropertyValue)>,
        now: f64,
    ) -> SimResult<()> {
        for (property, value) in initial {
            self.assign(agent, property, value, now)?;
        }
        for times in self.times.values_mut() {
            times.set_f64(agent, now)?;
        }
        Ok(())
    }

    pub(crate) fn remove_agent(&mut self, agent: AgentIndex) {
        for container in self.containers.values_mut() {
            container.remove_id(agent);
        }
        for times in self.times.values_mut() {
            times.remove_id(agent);
        }
    }

    fn ensure_capacity(&mut self, count: usize) {
        for container in self.containers.values_mut() {
            container.ensure_capacity(count);
        }
        for times in self.times.values_mut() {
            times.ensure_capacity(count);
        }
    }

    pub fn definition(&self, property: PropertyId) -> Option<&PropertyDefinition> {
        self.definitions.get(&property)
    }

    pub fn property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.definitions.keys().copied()
    }

    /// Raw container read: no liveness check.
    pub fn value(&self, agent: AgentIndex, property: PropertyId) -> SimResult<Option<PropertyValue>> {
        let container = self
            .containers
            .get(&property)
            .ok_or(CoreError::UnknownProperty(property))?;
        Ok(container.get(agent))
    }

    /// Live agents holding an explicitly assigned value.
    pub fn assigned_count(&self, property: PropertyId) -> SimResult<usize> {
        Ok(self
            .containers
            .get(&property)
            .ok_or(CoreError::UnknownProperty(property))?
            .assigned_count())
    }
}

// ── Sim API ───────────────────────────────────────────────────────────────────

impl Sim {
    /// Define a property while the simulation runs.
    ///
    /// A property without a default can only be defined while the
    /// population is empty.  Publishes [`PropertyDefined`].
    pub fn define_property(&mut self, property: PropertyId, definition: PropertyDefinition) -> SimResult<()> {
        if definition.default_value().is_none() {
            if let Some(&agent) = self.agents()?.first() {
                return Err(SimError::MissingPropertyValue { agent, property });
            }
        }
        let now = self.now();
        self.data_manager_mut::<AgentPropertiesManager>()?.define(property, definition, now)?;
        debug!(%property, time = now, "property defined");
        self.publish(PropertyDefined { property })
    }

    /// Assign a value and publish a [`PropertyUpdate`].
    pub fn set_property(
        &mut self,
        agent: AgentIndex,
        property: PropertyId,
        value: impl Into<PropertyValue>,
    ) -> SimResult<()> {
        let value = value.into();
        self.require_agent(agent)?;
        let now = self.now();
        let manager = self.data_manager_mut::<AgentPropertiesManager>()?;
        let definition = manager.definition(property).ok_or(CoreError::UnknownProperty(property))?;
        if !definition.is_mutable() {
            return Err(SimError::ImmutableProperty(property));
        }
        definition.check(&value)?;
        let previous = manager
            .value(agent, property)?
            .ok_or(SimError::MissingPropertyValue { agent, property })?;
        manager.assign(agent, property, value.clone(), now)?;
        self.publish(PropertyUpdate { agent, property, previous, current: value })
    }

    /// Current value of a live agent's property.
    pub fn property_value(&self, agent: AgentIndex, property: PropertyId) -> SimResult<PropertyValue> {
        self.require_agent(agent)?;
        self.data_manager::<AgentPropertiesManager>()?
            .value(agent, property)?
            .ok_or(SimError::MissingPropertyValue { agent, property })
    }

    /// When the property was last assigned for `agent`.
    pub fn property_time(&self, agent: AgentIndex, property: PropertyId) -> SimResult<f64> {
        self.require_agent(agent)?;
        let manager = self.data_manager::<AgentPropertiesManager>()?;
        if manager.definition(property).is_none() {
            return Err(CoreError::UnknownProperty(property).into());
        }
        manager
            .times
            .get(&property)
            .map(|times| times.get_f64(agent))
            .ok_or(SimError::TimeNotTracked(property))
    }

    pub fn property_definition(&self, property: PropertyId) -> Option<&PropertyDefinition> {
        self.data_manager::<AgentPropertiesManager>()
            .ok()?
            .definition(property)
    }

    pub fn property_ids(&self) -> Vec<PropertyId> {
        self.data_manager::<AgentPropertiesManager>()
            .map(|m| m.property_ids().collect())
            .unwrap_or_default()
    }
}
