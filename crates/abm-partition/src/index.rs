//! `PartitionIndex<C>` — the bucketed membership of one partition.
//!
//! # Layout
//!
//! ```text
//! slots:   AgentIndex → Option<(key, position in bucket)>
//! buckets: key (Vec<Label>) → Vec<AgentIndex>
//! ```
//!
//! Moving an agent is O(1): `swap_remove` from its old bucket (patching the
//! position of the agent swapped into its place), push onto the new one.
//! A fully specified query is one hash probe; a query with open dimensions
//! scans bucket keys, never agents.

use std::any::{Any, TypeId};
use std::cell::Cell;

use abm_core::{AgentIndex, Label, SimRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::PartitionResult;
use crate::filter::Filter;
use crate::label_set::LabelSet;
use crate::labeler::Labeler;
use crate::sensitivity::Sensitivity;
use crate::view::PopulationView;

// ── Partition definition ──────────────────────────────────────────────────────

/// Labelers + filter.  With no labelers every member shares one bucket.
pub struct Partition<C> {
    labelers: Vec<Labeler<C>>,
    filter:   Filter<C>,
}

impl<C> Clone for Partition<C> {
    fn clone(&self) -> Self {
        Self { labelers: self.labelers.clone(), filter: self.filter.clone() }
    }
}

impl<C> std::fmt::Debug for Partition<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition")
            .field("labelers", &self.labelers)
            .field("filter", &self.filter)
            .finish()
    }
}

impl<C> Default for Partition<C> {
    fn default() -> Self {
        Self { labelers: Vec::new(), filter: Filter::True }
    }
}

impl<C> Partition<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labeler(mut self, labeler: Labeler<C>) -> Self {
        self.labelers.push(labeler);
        self
    }

    pub fn with_filter(mut self, filter: Filter<C>) -> Self {
        self.filter = filter;
        self
    }

    pub fn labelers(&self) -> &[Labeler<C>] {
        &self.labelers
    }

    pub fn filter(&self) -> &Filter<C> {
        &self.filter
    }
}

/// Result of evaluating one agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Excluded,
    Member(Vec<Label>),
}

// ── Index ─────────────────────────────────────────────────────────────────────

struct Slot {
    key:      Vec<Label>,
    position: usize,
}

pub struct PartitionIndex<C> {
    definition:    Partition<C>,
    sensitivities: Vec<Sensitivity>,
    slots:         Vec<Option<Slot>>,
    buckets:       FxHashMap<Vec<Label>, Vec<AgentIndex>>,
    members:       usize,
    /// Agent evaluations since construction.
    evaluations:   Cell<u64>,
}

impl<C> std::fmt::Debug for PartitionIndex<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionIndex")
            .field("definition", &self.definition)
            .field("members", &self.members)
            .field("buckets", &self.buckets.len())
            .field("evaluations", &self.evaluations.get())
            .finish()
    }
}

impl<C: PopulationView + 'static> PartitionIndex<C> {
    /// Validate `definition` and evaluate every live agent once.
    pub fn build(definition: Partition<C>, view: &C) -> PartitionResult<Self> {
        for labeler in &definition.labelers {
            labeler.validate(view)?;
        }
        definition.filter.validate(view)?;

        let mut sensitivities = definition.filter.sensitivities();
        for labeler in &definition.labelers {
            sensitivities.extend(labeler.sensitivities().iter().cloned());
        }

        let mut index = Self {
            definition,
            sensitivities,
            slots: Vec::new(),
            buckets: FxHashMap::default(),
            members: 0,
            evaluations: Cell::new(0),
        };
        let agents = view.agent_indices()?;
        index.slots.reserve(agents.last().map_or(0, |a| a.index() + 1));
        for agent in agents {
            let outcome = index.evaluate(view, agent)?;
            index.apply(agent, outcome);
        }
        debug!(
            members = index.members,
            buckets = index.buckets.len(),
            evaluations = index.evaluations.get(),
            "partition built"
        );
        Ok(index)
    }

    // ── Updates ───────────────────────────────────────────────────────────

    /// Where `agent` belongs now.  Reads only.
    pub fn evaluate(&self, view: &C, agent: AgentIndex) -> PartitionResult<Outcome> {
        self.evaluations.set(self.evaluations.get() + 1);
        if !self.definition.filter.evaluate(view, agent) {
            return Ok(Outcome::Excluded);
        }
        let key = self
            .definition
            .labelers
            .iter()
            .map(|l| l.label(view, agent))
            .collect::<PartitionResult<Vec<Label>>>()?;
        Ok(Outcome::Member(key))
    }

    /// Move `agent` to where `outcome` says.  Returns whether anything
    /// changed.
    pub fn apply(&mut self, agent: AgentIndex, outcome: Outcome) -> bool {
        let target = match outcome {
            Outcome::Excluded => None,
            Outcome::Member(key) => Some(key),
        };
        if self.label_of(agent) == target.as_deref() {
            return false;
        }
        self.detach(agent);
        if let Some(key) = target {
            self.attach(agent, key);
        }
        true
    }

    /// Drop `agent` from the partition.  Returns whether it was a member.
    pub fn remove(&mut self, agent: AgentIndex) -> bool {
        self.detach(agent)
    }

    fn detach(&mut self, agent: AgentIndex) -> bool {
        let Some(slot) = self.slots.get_mut(agent.index()).and_then(Option::take) else {
            return false;
        };
        if let Some(bucket) = self.buckets.get_mut(&slot.key) {
            bucket.swap_remove(slot.position);
            if let Some(&moved) = bucket.get(slot.position) {
                if let Some(Some(s)) = self.slots.get_mut(moved.index()) {
                    s.position = slot.position;
                }
            }
            if bucket.is_empty() {
                self.buckets.remove(&slot.key);
            }
        }
        self.members -= 1;
        true
    }

    fn attach(&mut self, agent: AgentIndex, key: Vec<Label>) {
        let bucket = self.buckets.entry(key.clone()).or_default();
        let position = bucket.len();
        bucket.push(agent);
        if self.slots.len() <= agent.index() {
            self.slots.resize_with(agent.index() + 1, || None);
        }
        self.slots[agent.index()] = Some(Slot { key, position });
        self.members += 1;
    }

    // ── Event routing ─────────────────────────────────────────────────────

    /// Event types this partition must hear about, besides agent addition
    /// and removal.
    pub fn event_types(&self) -> Vec<TypeId> {
        let mut types: Vec<TypeId> = self.sensitivities.iter().map(|s| s.event_type()).collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    /// Agents whose outcome `event` may have changed.
    pub fn affected(&self, event_type: TypeId, event: &dyn Any) -> Vec<AgentIndex> {
        let mut agents: Vec<AgentIndex> = self
            .sensitivities
            .iter()
            .filter(|s| s.event_type() == event_type)
            .filter_map(|s| s.extract(event))
            .collect();
        agents.sort_unstable();
        agents.dedup();
        agents
    }

    // ── Queries ───────────────────────────────────────────────────────────

    fn matching_buckets(
        &self,
        labels: &LabelSet,
    ) -> PartitionResult<Vec<(&Vec<Label>, &Vec<AgentIndex>)>> {
        labels.check_arity(self.definition.labelers.len())?;
        if let Some(key) = labels.exact_key(self.definition.labelers.len()) {
            return Ok(self.buckets.get_key_value(&key).into_iter().collect());
        }
        Ok(self.buckets.iter().filter(|(key, _)| labels.matches(key)).collect())
    }

    /// Members matching `labels`, ascending.
    pub fn members(&self, labels: &LabelSet) -> PartitionResult<Vec<AgentIndex>> {
        let mut out: Vec<AgentIndex> = self
            .matching_buckets(labels)?
            .into_iter()
            .flat_map(|(_, bucket)| bucket.iter().copied())
            .collect();
        out.sort_unstable();
        Ok(out)
    }

    /// Members matching `labels` that also pass `filter`.
    pub fn query(
        &self,
        view: &C,
        labels: &LabelSet,
        filter: Option<&Filter<C>>,
    ) -> PartitionResult<Vec<AgentIndex>> {
        let mut members = self.members(labels)?;
        if let Some(filter) = filter {
            filter.validate(view)?;
            members.retain(|&a| filter.evaluate(view, a));
        }
        Ok(members)
    }

    pub fn count(&self, labels: &LabelSet) -> PartitionResult<usize> {
        Ok(self.matching_buckets(labels)?.iter().map(|(_, b)| b.len()).sum())
    }

    pub fn contains(&self, agent: AgentIndex, labels: &LabelSet) -> PartitionResult<bool> {
        labels.check_arity(self.definition.labelers.len())?;
        Ok(self.label_of(agent).is_some_and(|key| labels.matches(key)))
    }

    /// A uniformly chosen member matching `labels`, never `exclude`.
    pub fn sample(
        &self,
        labels: &LabelSet,
        exclude: Option<AgentIndex>,
        rng: &mut SimRng,
    ) -> PartitionResult<Option<AgentIndex>> {
        let buckets = self.matching_buckets(labels)?;
        let total: usize = buckets.iter().map(|(_, b)| b.len()).sum();

        // Linear position of the excluded agent across the matching buckets.
        let skip = exclude
            .and_then(|a| self.slot(a))
            .filter(|slot| labels.matches(&slot.key))
            .map(|slot| {
                let before: usize = buckets
                    .iter()
                    .take_while(|(key, _)| **key != slot.key)
                    .map(|(_, b)| b.len())
                    .sum();
                before + slot.position
            });

        let Some(mut r) = rng.index(total - usize::from(skip.is_some())) else {
            return Ok(None);
        };
        if skip.is_some_and(|s| r >= s) {
            r += 1;
        }
        for (_, bucket) in buckets {
            if r < bucket.len() {
                return Ok(Some(bucket[r]));
            }
            r -= bucket.len();
        }
        Ok(None)
    }

    fn slot(&self, agent: AgentIndex) -> Option<&Slot> {
        self.slots.get(agent.index()).and_then(Option::as_ref)
    }

    /// The bucket key of a member, `None` for non-members.
    pub fn label_of(&self, agent: AgentIndex) -> Option<&[Label]> {
        self.slot(agent).map(|s| s.key.as_slice())
    }

    pub fn definition(&self) -> &Partition<C> {
        &self.definition
    }

    pub fn len(&self) -> usize {
        self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }
}
