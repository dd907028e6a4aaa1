//! Floating-point containers backed by a plain `Vec`.

use std::rc::Rc;

use abm_core::{AgentIndex, CoreResult, PropertyValue, ValueType};

use crate::container::{checked_slot, live_slots};
use crate::{PropertyContainer, RemovedIndices};

macro_rules! dense_container {
    ($(#[$attr:meta])* $name:ident, $prim:ty, $variant:ident, $get:ident, $set:ident) => {
        $(#[$attr])*
        pub struct $name {
            default: $prim,
            values:  Vec<$prim>,
            removed: Rc<dyn RemovedIndices>,
        }

        impl $name {
            pub fn new(default: $prim, removed: Rc<dyn RemovedIndices>) -> Self {
                Self { default, values: Vec::new(), removed }
            }

            #[inline]
            pub fn $get(&self, index: AgentIndex) -> $prim {
                self.values.get(index.index()).copied().unwrap_or(self.default)
            }

            pub fn $set(&mut self, index: AgentIndex, value: $prim) -> CoreResult<()> {
                let i = checked_slot(index)?;
                if i >= self.values.len() {
                    self.values.resize(i + 1, self.default);
                }
                self.values[i] = value;
                Ok(())
            }
        }

        impl PropertyContainer for $name {
            fn value_type(&self) -> ValueType {
                ValueType::$variant
            }

            fn get(&self, index: AgentIndex) -> Option<PropertyValue> {
                Some(PropertyValue::$variant(self.$get(index)))
            }

            fn set(&mut self, index: AgentIndex, value: PropertyValue) -> CoreResult<()> {
                ValueType::$variant.check(&value)?;
                match value {
                    PropertyValue::$variant(v) => self.$set(index, v),
                    _ => Ok(()),
                }
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
    };
}

dense_container! {
    /// 32-bit float property values.
    FloatContainer, f32, Float, get_f32, set_f32
}

dense_container! {
    /// 64-bit float property values.  Also backs assignment-time tracking.
    DoubleContainer, f64, Double, get_f64, set_f64
}
