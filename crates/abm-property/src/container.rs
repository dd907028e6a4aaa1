//! The shared container contract and container construction.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use abm_core::{AgentIndex, CoreError, CoreResult, PropertyDefinition, PropertyValue, ValueType};

use crate::{
    BooleanContainer, DoubleContainer, EnumContainer, FloatContainer, IntContainer,
    LongContainer, ObjectContainer,
};

// ── Removed-index supplier ────────────────────────────────────────────────────

/// Read access to the set of agent indices that have been removed.
///
/// The agents data manager owns the writer side ([`RemovalLog`]); every
/// container holds a shared reader so its bookkeeping can discount slots that
/// belong to removed agents.
pub trait RemovedIndices {
    fn is_removed(&self, index: AgentIndex) -> bool;

    /// Number of removed indices strictly below `bound`.
    fn removed_below(&self, bound: usize) -> usize;
}

/// Supplier used by containers that are not attached to a population.
pub struct NoRemovals;

impl RemovedIndices for NoRemovals {
    fn is_removed(&self, _index: AgentIndex) -> bool {
        false
    }

    fn removed_below(&self, _bound: usize) -> usize {
        0
    }
}

/// Shared, single-threaded log of removed indices.
#[derive(Default)]
pub struct RemovalLog {
    removed: RefCell<FxHashSet<AgentIndex>>,
}

impl RemovalLog {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn record(&self, index: AgentIndex) {
        self.removed.borrow_mut().insert(index);
    }

    pub fn len(&self) -> usize {
        self.removed.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.borrow().is_empty()
    }
}

impl RemovedIndices for RemovalLog {
    fn is_removed(&self, index: AgentIndex) -> bool {
        self.removed.borrow().contains(&index)
    }

    fn removed_below(&self, bound: usize) -> usize {
        self.removed.borrow().iter().filter(|i| i.index() < bound).count()
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Storage of one property's values, indexed by [`AgentIndex`].
pub trait PropertyContainer {
    fn value_type(&self) -> ValueType;

    /// The value at `index`, or the fallback if it was never assigned.
    ///
    /// Returns `None` only for an unassigned slot of an object property whose
    /// definition has no default.
    fn get(&self, index: AgentIndex) -> Option<PropertyValue>;

    /// Store `value` at `index`, growing storage as needed.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` for the `INVALID` sentinel and `IncompatibleValue` if
    /// `value` does not match [`value_type`](Self::value_type).
    fn set(&mut self, index: AgentIndex, value: PropertyValue) -> CoreResult<()>;

    /// Reserve room for at least `count` indices.
    fn ensure_capacity(&mut self, count: usize);

    /// Forget `index`.  Non-clearing: the stored value stays in place and
    /// bookkeeping relies on the removed-index supplier, so this does no work.
    fn remove_id(&mut self, _index: AgentIndex) {}

    /// Number of indices storage can hold without reallocating.
    fn capacity(&self) -> usize;

    /// Number of index slots currently covered by storage.
    fn covered(&self) -> usize;

    /// Covered slots that do not belong to removed agents.
    fn assigned_count(&self) -> usize;
}

/// Construct the container matching `definition`'s value type.
///
/// `removed` supplies the removed indices of the population the container
/// belongs to; pass `Rc::new(NoRemovals)` for standalone use.
pub fn new_container(
    definition: &PropertyDefinition,
    removed: Rc<dyn RemovedIndices>,
) -> Box<dyn PropertyContainer> {
    let fallback = definition
        .default_value()
        .cloned()
        .or_else(|| definition.value_type().zero());

    match (definition.value_type(), fallback) {
        (ValueType::Bool, Some(PropertyValue::Bool(d))) => {
            Box::new(BooleanContainer::new(d, removed))
        }
        (ValueType::Int, Some(PropertyValue::Int(d))) => Box::new(IntContainer::new(d, removed)),
        (ValueType::Long, Some(PropertyValue::Long(d))) => {
            Box::new(LongContainer::new(d, removed))
        }
        (ValueType::Float, Some(PropertyValue::Float(d))) => {
            Box::new(FloatContainer::new(d, removed))
        }
        (ValueType::Double, Some(PropertyValue::Double(d))) => {
            Box::new(DoubleContainer::new(d, removed))
        }
        (ValueType::Enum { variants }, Some(PropertyValue::Enum(d))) => {
            Box::new(EnumContainer::new(variants, d, removed))
        }
        (_, Some(PropertyValue::Object(d))) => Box::new(ObjectContainer::new(Some(d), removed)),
        // Object without default, or (unreachable through a validated
        // definition) a mismatched fallback: start empty.
        _ => Box::new(ObjectContainer::new(None, removed)),
    }
}

/// Shared index validation.
#[inline]
pub(crate) fn checked_slot(index: AgentIndex) -> CoreResult<usize> {
    if index.is_valid() {
        Ok(index.index())
    } else {
        Err(CoreError::InvalidIndex(index))
    }
}

/// Covered slots minus removed slots.
#[inline]
pub(crate) fn live_slots(covered: usize, removed: &dyn RemovedIndices) -> usize {
    covered.saturating_sub(removed.removed_below(covered))
}
