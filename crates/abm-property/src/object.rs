//! Opaque object container.

use std::rc::Rc;

use abm_core::{AgentIndex, CoreResult, ObjectHandle, PropertyValue, ValueType};

use crate::container::{checked_slot, live_slots};
use crate::{PropertyContainer, RemovedIndices};

/// Object handles, one optional slot per index.
///
/// `None` slots read as the default; when the definition has no default an
/// unassigned slot reads as `None`.
pub struct ObjectContainer {
    default: Option<ObjectHandle>,
    values:  Vec<Option<ObjectHandle>>,
    removed: Rc<dyn RemovedIndices>,
}

impl ObjectContainer {
    pub fn new(default: Option<ObjectHandle>, removed: Rc<dyn RemovedIndices>) -> Self {
        Self { default, values: Vec::new(), removed }
    }
}

impl PropertyContainer for ObjectContainer {
    fn value_type(&self) -> ValueType {
        ValueType::Object
    }

    fn get(&self, index: AgentIndex) -> Option<PropertyValue> {
        self.values
            .get(index.index())
            .and_then(Option::as_ref)
            .or(self.default.as_ref())
            .cloned()
            .map(PropertyValue::Object)
    }

    fn set(&mut self, index: AgentIndex, value: PropertyValue) -> CoreResult<()> {
        ValueType::Object.check(&value)?;
        let i = checked_slot(index)?;
        if let PropertyValue::Object(handle) = value {
            if i >= self.values.len() {
                self.values.resize(i + 1, None);
            }
            self.values[i] = Some(handle);
        }
        Ok(())
    }

    fn ensure_capacity(&mut self, count: usize) {
        self.values.reserve(count.saturating_sub(self.values.len()));
    }

    fn capacity(&self) -> usize {
        self.values.capacity()
    }

    fn covered(&self) -> usize {
        self.values.len()
    }

    fn assigned_count(&self) -> usize {
        live_slots(self.values.len(), self.removed.as_ref())
    }
}
