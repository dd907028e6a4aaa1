//! Query keys.  `None` in a dimension matches every label.

use abm_core::Label;

use crate::error::{PartitionError, PartitionResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LabelSet(Vec<Option<Label>>);

impl LabelSet {
    /// Matches every bucket.
    pub fn any() -> Self {
        Self(Vec::new())
    }

    /// Every dimension fixed.
    pub fn exact(labels: impl IntoIterator<Item = Label>) -> Self {
        Self(labels.into_iter().map(Some).collect())
    }

    /// Fix or leave open each dimension in order; trailing dimensions not
    /// given are open.
    pub fn new(dimensions: Vec<Option<Label>>) -> Self {
        Self(dimensions)
    }

    /// Fix dimension `dimension`, widening the set with wildcards as needed.
    pub fn with(mut self, dimension: usize, label: impl Into<Label>) -> Self {
        if self.0.len() <= dimension {
            self.0.resize(dimension + 1, None);
        }
        self.0[dimension] = Some(label.into());
        self
    }

    pub(crate) fn check_arity(&self, expected: usize) -> PartitionResult<()> {
        if self.0.len() > expected {
            return Err(PartitionError::LabelArity { expected, got: self.0.len() });
        }
        Ok(())
    }

    /// The bucket key this set names, if it fixes every one of `dimensions`.
    pub(crate) fn exact_key(&self, dimensions: usize) -> Option<Vec<Label>> {
        if self.0.len() != dimensions {
            return None;
        }
        self.0.iter().cloned().collect()
    }

    pub(crate) fn matches(&self, key: &[Label]) -> bool {
        self.0
            .iter()
            .zip(key)
            .all(|(want, have)| want.as_ref().is_none_or(|w| w == have))
    }
}
