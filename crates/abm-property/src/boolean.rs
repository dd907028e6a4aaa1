//! Bit-packed boolean container.

use std::rc::Rc;

use abm_core::{AgentIndex, CoreResult, PropertyValue, ValueType};

use crate::container::{checked_slot, live_slots};
use crate::{PropertyContainer, RemovedIndices};

const WORD_BITS: usize = 64;

/// Booleans packed 64 per word.
///
/// Invariant: every bit at or beyond `len` (inside or outside the allocated
/// words) reads as `default`, so growing only appends default-filled words.
pub struct BooleanContainer {
    default: bool,
    words:   Vec<u64>,
    len:     usize,
    removed: Rc<dyn RemovedIndices>,
}

impl BooleanContainer {
    pub fn new(default: bool, removed: Rc<dyn RemovedIndices>) -> Self {
        Self { default, words: Vec::new(), len: 0, removed }
    }

    #[inline]
    pub fn get_bool(&self, index: AgentIndex) -> bool {
        let i = index.index();
        if i >= self.len {
            return self.default;
        }
        self.words[i / WORD_BITS] & (1u64 << (i % WORD_BITS)) != 0
    }

    pub fn set_bool(&mut self, index: AgentIndex, value: bool) -> CoreResult<()> {
        let i = checked_slot(index)?;
        self.grow_to(i + 1);
        let mask = 1u64 << (i % WORD_BITS);
        let word = &mut self.words[i / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
        Ok(())
    }

    fn fill_word(&self) -> u64 {
        if self.default { u64::MAX } else { 0 }
    }

    fn grow_to(&mut self, len: usize) {
        if len <= self.len {
            return;
        }
        let needed = len.div_ceil(WORD_BITS);
        if needed > self.words.len() {
            let fill = self.fill_word();
            self.words.resize(needed, fill);
        }
        self.len = len;
    }
}

impl PropertyContainer for BooleanContainer {
    fn value_type(&self) -> ValueType {
        ValueType::Bool
    }

    fn get(&self, index: AgentIndex) -> Option<PropertyValue> {
        Some(PropertyValue::Bool(self.get_bool(index)))
    }

    fn set(&mut self, index: AgentIndex, value: PropertyValue) -> CoreResult<()> {
        ValueType::Bool.check(&value)?;
        match value {
            PropertyValue::Bool(b) => self.set_bool(index, b),
            _ => Ok(()),
        }
    }

    fn ensure_capacity(&mut self, count: usize) {
        let words = count.div_ceil(WORD_BITS);
        self.words.reserve(words.saturating_sub(self.words.len()));
    }

    fn capacity(&self) -> usize {
        self.words.capacity() * WORD_BITS
    }

    fn covered(&self) -> usize {
        self.len
    }

    fn assigned_count(&self) -> usize {
        live_slots(self.len, self.removed.as_ref())
    }
}
