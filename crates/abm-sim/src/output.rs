//! Output records and the sink they are released into.
//!
//! Plans call [`Sim::release_output`][crate::Sim::release_output]; the kernel
//! stamps the record with the run's scenario, replication and current time
//! and hands it to the configured sink.  Sinks are shared by every run of an
//! experiment, so they are `Send + Sync` and take `&self`.  A sink that can
//! fail stores its first error for the caller to collect afterwards.

use std::sync::Mutex;

use abm_core::{ReplicationId, ScenarioId};

#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    pub scenario:    ScenarioId,
    pub replication: ReplicationId,
    pub time:        f64,
    /// Which report produced the record.
    pub source:      &'static str,
    pub values:      Vec<String>,
}

pub trait OutputSink: Send + Sync {
    fn accept(&self, record: OutputRecord);

    /// Called when a run finishes.
    fn flush(&self) {}
}

/// Keeps every record in memory, in arrival order.
#[derive(Default)]
pub struct CollectingSink {
    records: Mutex<Vec<OutputRecord>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the records collected so far.
    pub fn take(&self) -> Vec<OutputRecord> {
        match self.records.lock() {
            Ok(mut records) => std::mem::take(&mut *records),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map_or(0, |r| r.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for CollectingSink {
    fn accept(&self, record: OutputRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}
