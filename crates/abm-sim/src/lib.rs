//! `abm-sim` — the simulation kernel.
//!
//! Ties the `abm-*` crates into one run: a [`Sim`] owns the clock, plan
//! queue, event bus, data managers and partitions; a [`SimBuilder`] loads
//! plugins in dependency order and hands each initializer a
//! [`PluginContext`].
//!
//! # Run loop
//!
//! ```text
//! build:  resolve plugin graph ──► run initializers in load order
//! run:    seal data-manager registry
//!         loop:
//!           ① halted?                      → stop (Halted)
//!           ② no active plan left?         → stop (Exhausted)
//!           ③ next plan beyond halt_time?  → stop (HaltTime)
//!           ④ pop plan, advance clock, execute
//!                 └─ publish(event)
//!                      ├─ refresh partitions sensitive to the event
//!                      └─ deliver to subscribers, depth-first
//!         flush output sink
//! ```
//!
//! # Built-in plugins
//!
//! | Plugin                        | Data manager               |
//! |-------------------------------|----------------------------|
//! | [`agents_plugin`]             | [`AgentsManager`]          |
//! | [`agent_properties_plugin`]   | [`AgentPropertiesManager`] |
//!
//! # Threading
//!
//! A `Sim` is single-threaded and not `Send`.  Plugins are `Send + Sync`
//! snapshots, so parallel experiments build one `Sim` per worker from a
//! shared plugin list.

pub mod agents;
pub mod builder;
pub mod context;
pub mod error;
pub mod observer;
pub mod output;
mod partitions;
pub mod properties;
pub mod sim;

#[cfg(test)]
mod tests;

pub use agents::{agents_plugin, AgentsManager, AgentsPluginData, AGENTS};
pub use builder::SimBuilder;
pub use context::{Initializer, PluginBuilderExt, PluginContext, SimPlugin};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, RunSummary, SimObserver, StopReason};
pub use output::{CollectingSink, OutputRecord, OutputSink};
pub use properties::{
    agent_properties_plugin, agent_property_update_label, property_update_label,
    AgentPropertiesManager, AgentPropertiesPluginData, AgentPropertiesPluginDataBuilder,
    PropertyDefined, AGENT_PROPERTIES, PROPERTY_UPDATE_BY_AGENT_AND_PROPERTY,
    PROPERTY_UPDATE_BY_PROPERTY,
};
pub use sim::{PlanFn, Sim};

// The types model code touches most, so plugins need only depend on `abm-sim`.
pub use abm_core::{
    AgentAdded, AgentIndex, AgentRemoved, Equality, Event, Label, PartitionId, PluginId,
    PropertyDefinition, PropertyId, PropertyUpdate, PropertyValue, SimConfig, ValueType,
};
pub use abm_event::{EventLabel, EventLabeler};
pub use abm_partition::{Filter, LabelSet, Labeler, Partition, Sensitivity};
pub use abm_plan::{PlanMode, PlanOwner};
pub use abm_plugin::{DataManager, Plugin, PluginData};
