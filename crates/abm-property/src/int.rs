//! Integer-backed containers.
//!
//! [`IntValueContainer`] stores `i64` values in the narrowest width that holds
//! every value assigned so far, promoting byte → short → int → long the first
//! time a wider value arrives.  Most integer properties in epidemiological
//! models (age groups, counts, enum ordinals) fit in a byte, so a population
//! of millions costs one byte per agent until proven otherwise.
//!
//! `IntContainer`, `LongContainer` and `EnumContainer` are typed facades that
//! translate between [`PropertyValue`] variants and the shared store.

use std::rc::Rc;

use abm_core::{AgentIndex, CoreResult, PropertyValue, ValueType};

use crate::container::{checked_slot, live_slots};
use crate::{PropertyContainer, RemovedIndices};

// ── Compacting store ──────────────────────────────────────────────────────────

#[derive(Debug)]
enum Store {
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
}

impl Store {
    fn for_value(v: i64) -> Self {
        if i8::try_from(v).is_ok() {
            Store::Byte(Vec::new())
        } else if i16::try_from(v).is_ok() {
            Store::Short(Vec::new())
        } else if i32::try_from(v).is_ok() {
            Store::Int(Vec::new())
        } else {
            Store::Long(Vec::new())
        }
    }

    fn len(&self) -> usize {
        match self {
            Store::Byte(v) => v.len(),
            Store::Short(v) => v.len(),
            Store::Int(v) => v.len(),
            Store::Long(v) => v.len(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Store::Byte(v) => v.capacity(),
            Store::Short(v) => v.capacity(),
            Store::Int(v) => v.capacity(),
            Store::Long(v) => v.capacity(),
        }
    }

    fn reserve(&mut self, additional: usize) {
        match self {
            Store::Byte(v) => v.reserve(additional),
            Store::Short(v) => v.reserve(additional),
            Store::Int(v) => v.reserve(additional),
            Store::Long(v) => v.reserve(additional),
        }
    }

    fn get(&self, i: usize) -> i64 {
        match self {
            Store::Byte(v) => i64::from(v[i]),
            Store::Short(v) => i64::from(v[i]),
            Store::Int(v) => i64::from(v[i]),
            Store::Long(v) => v[i],
        }
    }

    /// `true` if `value` fits the current width.
    fn fits(&self, value: i64) -> bool {
        match self {
            Store::Byte(_) => i8::try_from(value).is_ok(),
            Store::Short(_) => i16::try_from(value).is_ok(),
            Store::Int(_) => i32::try_from(value).is_ok(),
            Store::Long(_) => true,
        }
    }

    /// Widen to the narrowest width that holds `value`, copying every slot.
    fn promote_for(&mut self, value: i64) {
        let mut wider = Store::for_value(value);
        if wider.rank() <= self.rank() {
            return;
        }
        let len = self.len();
        wider.reserve(len);
        for i in 0..len {
            wider.push(self.get(i));
        }
        *self = wider;
    }

    fn rank(&self) -> u8 {
        match self {
            Store::Byte(_) => 0,
            Store::Short(_) => 1,
            Store::Int(_) => 2,
            Store::Long(_) => 3,
        }
    }

    // Callers guarantee `value` fits the current width.
    fn push(&mut self, value: i64) {
        match self {
            Store::Byte(v) => v.push(value as i8),
            Store::Short(v) => v.push(value as i16),
            Store::Int(v) => v.push(value as i32),
            Store::Long(v) => v.push(value),
        }
    }

    fn put(&mut self, i: usize, value: i64) {
        match self {
            Store::Byte(v) => v[i] = value as i8,
            Store::Short(v) => v[i] = value as i16,
            Store::Int(v) => v[i] = value as i32,
            Store::Long(v) => v[i] = value,
        }
    }
}

// ── IntValueContainer ─────────────────────────────────────────────────────────

/// Compacting `i64` storage with a default value.
pub struct IntValueContainer {
    default: i64,
    store:   Store,
    removed: Rc<dyn RemovedIndices>,
}

impl IntValueContainer {
    pub fn new(default: i64, removed: Rc<dyn RemovedIndices>) -> Self {
        Self { default, store: Store::for_value(default), removed }
    }

    #[inline]
    pub fn get_i64(&self, index: AgentIndex) -> i64 {
        let i = index.index();
        if i < self.store.len() { self.store.get(i) } else { self.default }
    }

    pub fn set_i64(&mut self, index: AgentIndex, value: i64) -> CoreResult<()> {
        let i = checked_slot(index)?;
        if !self.store.fits(value) {
            self.store.promote_for(value);
        }
        while self.store.len() <= i {
            self.store.push(self.default);
        }
        self.store.put(i, value);
        Ok(())
    }

    /// Width in bytes of the current backing store (1, 2, 4 or 8).
    pub fn width_bytes(&self) -> usize {
        1 << self.store.rank()
    }

    pub fn ensure_capacity(&mut self, count: usize) {
        self.store.reserve(count.saturating_sub(self.store.len()));
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn covered(&self) -> usize {
        self.store.len()
    }

    pub fn assigned_count(&self) -> usize {
        live_slots(self.store.len(), self.removed.as_ref())
    }
}

// ── Typed facades ─────────────────────────────────────────────────────────────

macro_rules! int_facade {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        pub struct $name {
            inner:      IntValueContainer,
            value_type: ValueType,
        }

        impl $name {
            /// The compacting store behind this container.
            pub fn inner(&self) -> &IntValueContainer {
                &self.inner
            }
        }

        impl PropertyContainer for $name {
            fn value_type(&self) -> ValueType {
                self.value_type
            }

            fn get(&self, index: AgentIndex) -> Option<PropertyValue> {
                Some(self.wrap(self.inner.get_i64(index)))
            }

            fn set(&mut self, index: AgentIndex, value: PropertyValue) -> CoreResult<()> {
                self.value_type.check(&value)?;
                match Self::unwrap(&value) {
                    Some(v) => self.inner.set_i64(index, v),
                    None => Ok(()),
                }
            }

            fn ensure_capacity(&mut self, count: usize) {
                self.inner.ensure_capacity(count);
            }

            fn capacity(&self) -> usize {
                self.inner.capacity()
            }

            fn covered(&self) -> usize {
                self.inner.covered()
            }

            fn assigned_count(&self) -> usize {
                self.inner.assigned_count()
            }
        }
    };
}

int_facade! {
    /// 32-bit integer property values.
    IntContainer
}

int_facade! {
    /// 64-bit integer property values.
    LongContainer
}

int_facade! {
    /// Enumerated property values, stored as ordinals.
    EnumContainer
}

impl IntContainer {
    pub fn new(default: i32, removed: Rc<dyn RemovedIndices>) -> Self {
        Self {
            inner:      IntValueContainer::new(i64::from(default), removed),
            value_type: ValueType::Int,
        }
    }

    fn wrap(&self, v: i64) -> PropertyValue {
        // Only `Int` values are ever stored.
        PropertyValue::Int(v as i32)
    }

    fn unwrap(value: &PropertyValue) -> Option<i64> {
        match value {
            PropertyValue::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl LongContainer {
    pub fn new(default: i64, removed: Rc<dyn RemovedIndices>) -> Self {
        Self {
            inner:      IntValueContainer::new(default, removed),
            value_type: ValueType::Long,
        }
    }

    fn wrap(&self, v: i64) -> PropertyValue {
        PropertyValue::Long(v)
    }

    fn unwrap(value: &PropertyValue) -> Option<i64> {
        match value {
            PropertyValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl EnumContainer {
    pub fn new(variants: u32, default: u32, removed: Rc<dyn RemovedIndices>) -> Self {
        Self {
            inner:      IntValueContainer::new(i64::from(default), removed),
            value_type: ValueType::Enum { variants },
        }
    }

    fn wrap(&self, v: i64) -> PropertyValue {
        PropertyValue::Enum(v as u32)
    }

    fn unwrap(value: &PropertyValue) -> Option<i64> {
        match value {
            PropertyValue::Enum(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}
