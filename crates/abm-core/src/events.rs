//! The `Event` marker trait and the events published by the kernel's
//! built-in data managers.

use std::any::Any;
use std::fmt;

use crate::{AgentIndex, PropertyId, PropertyValue};

/// An immutable record of something that happened during a run.
///
/// Events are created by the data manager performing a mutation, delivered
/// synchronously to every matching subscriber, and then dropped.
pub trait Event: Any + fmt::Debug {}

/// A new agent now exists.  Published after its initial property values are
/// in place.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AgentAdded {
    pub agent: AgentIndex,
}

impl Event for AgentAdded {}

/// An agent has been removed.  Published after the index is marked removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AgentRemoved {
    pub agent: AgentIndex,
}

impl Event for AgentRemoved {}

/// A property value changed for one agent.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyUpdate {
    pub agent:    AgentIndex,
    pub property: PropertyId,
    pub previous: PropertyValue,
    pub current:  PropertyValue,
}

impl Event for PropertyUpdate {}
