//! `PlanQueue<T>` — time-ordered queue of deferred work.
//!
//! # Layout
//!
//! A `BinaryHeap` holds only the ordering keys; the payloads live in a map
//! keyed by `PlanId`.  Cancelling removes the map entry and leaves the key
//! behind, which `pop_next` discards when it surfaces.  This keeps `cancel`
//! O(1) and `pop_next` amortised O(log P).
//!
//! # Passive plans
//!
//! A passive plan runs only while at least one active plan is still
//! pending.  Once every remaining plan is passive the queue reports itself
//! exhausted, so observers (reports) never keep a simulation alive.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use abm_core::{ActorId, PlanId};
use rustc_hash::FxHashMap;

use crate::error::{PlanError, PlanResult};

// ── Owner / mode ──────────────────────────────────────────────────────────────

/// Who scheduled a plan.  Reports share the actor id space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlanOwner {
    Actor(ActorId),
    Report(ActorId),
    Kernel,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlanMode {
    Active,
    Passive,
}

/// A plan popped from the queue, ready to execute.
#[derive(Debug)]
pub struct Plan<T> {
    pub id:       PlanId,
    pub time:     f64,
    pub priority: i32,
    pub owner:    PlanOwner,
    pub mode:     PlanMode,
    pub payload:  T,
}

// ── Ordering key ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct Key {
    time:     f64,
    priority: i32,
    id:       PlanId,
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.priority.cmp(&other.priority))
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

struct Pending<T> {
    owner:   PlanOwner,
    mode:    PlanMode,
    payload: T,
}

// ── PlanQueue ─────────────────────────────────────────────────────────────────

pub struct PlanQueue<T> {
    heap:    BinaryHeap<Reverse<Key>>,
    pending: FxHashMap<PlanId, Pending<T>>,
    /// Pending plans in `PlanMode::Active`.
    active:  usize,
    /// Time of the most recently popped plan; earlier times are rejected.
    now:     f64,
    /// Doubles as the insertion sequence.
    next_id: u64,
}

impl<T> Default for PlanQueue<T> {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl<T> PlanQueue<T> {
    pub fn new(start_time: f64) -> Self {
        Self {
            heap:    BinaryHeap::new(),
            pending: FxHashMap::default(),
            active:  0,
            now:     start_time,
            next_id: 0,
        }
    }

    /// Schedule `payload` at `time`.
    ///
    /// `time` may equal the current time; plans scheduled from inside a plan
    /// at the current time run after every plan already queued for it with
    /// the same priority.
    pub fn schedule(
        &mut self,
        time: f64,
        priority: i32,
        owner: PlanOwner,
        mode: PlanMode,
        payload: T,
    ) -> PlanResult<PlanId> {
        if !time.is_finite() {
            return Err(PlanError::InvalidTime(time));
        }
        if time < self.now {
            return Err(PlanError::PastTime { now: self.now, requested: time });
        }

        let id = PlanId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Key { time, priority, id }));
        self.pending.insert(id, Pending { owner, mode, payload });
        if mode == PlanMode::Active {
            self.active += 1;
        }
        Ok(id)
    }

    /// Cancel a pending plan.
    ///
    /// Returns `false` for a plan that already ran, was already cancelled,
    /// or never existed; nothing else happens in that case.
    pub fn cancel(&mut self, id: PlanId) -> bool {
        match self.pending.remove(&id) {
            Some(p) => {
                if p.mode == PlanMode::Active {
                    self.active -= 1;
                }
                true
            }
            None => false,
        }
    }

    /// Remove and return the next plan, advancing the queue's time to it.
    ///
    /// Returns `None` when no active plan remains.
    pub fn pop_next(&mut self) -> Option<Plan<T>> {
        if self.active == 0 {
            return None;
        }
        while let Some(Reverse(key)) = self.heap.pop() {
            let Some(p) = self.pending.remove(&key.id) else {
                continue; // cancelled
            };
            if p.mode == PlanMode::Active {
                self.active -= 1;
            }
            self.now = key.time;
            return Some(Plan {
                id:       key.id,
                time:     key.time,
                priority: key.priority,
                owner:    p.owner,
                mode:     p.mode,
                payload:  p.payload,
            });
        }
        None
    }

    /// Time of the plan `pop_next` would return, without removing it.
    pub fn next_time(&mut self) -> Option<f64> {
        if self.active == 0 {
            return None;
        }
        while let Some(&Reverse(key)) = self.heap.peek() {
            if self.pending.contains_key(&key.id) {
                return Some(key.time);
            }
            self.heap.pop();
        }
        None
    }

    /// Drop every pending plan.  The current time is kept.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
        self.active = 0;
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_pending(&self, id: PlanId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn owner(&self, id: PlanId) -> Option<PlanOwner> {
        self.pending.get(&id).map(|p| p.owner)
    }

    /// Pending plans, passive ones included.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.active
    }

    /// Plans ever scheduled.
    pub fn scheduled_total(&self) -> u64 {
        self.next_id
    }
}
