//! CSV output sink.

use std::fs::File;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use abm_sim::{OutputRecord, OutputSink};
use csv::{Writer, WriterBuilder};

use crate::{ExperimentError, ExperimentResult};

/// Writes every output record as one CSV row:
/// `scenario, replication, time, source, values…`.
///
/// Records from concurrent runs interleave; each row carries its run's ids.
/// Write errors cannot surface through [`OutputSink::accept`], so the first
/// one is kept and returned by [`CsvSink::finish`].
pub struct CsvSink {
    writer: Mutex<Writer<File>>,
    error:  Mutex<Option<ExperimentError>>,
}

impl CsvSink {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: &Path) -> ExperimentResult<Self> {
        let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(["scenario", "replication", "time", "source", "values"])?;
        Ok(Self { writer: Mutex::new(writer), error: Mutex::new(None) })
    }

    fn keep_first(&self, error: impl Into<ExperimentError>) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error.into());
        }
    }

    /// Flush and report the first write error, if any.
    pub fn finish(&self) -> ExperimentResult<()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner).flush()?;
        match self.error.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl OutputSink for CsvSink {
    fn accept(&self, record: OutputRecord) {
        let mut row = Vec::with_capacity(4 + record.values.len());
        row.push(record.scenario.0.to_string());
        row.push(record.replication.0.to_string());
        row.push(record.time.to_string());
        row.push(record.source.to_string());
        row.extend(record.values);

        let result = self.writer.lock().unwrap_or_else(PoisonError::into_inner).write_record(&row);
        if let Err(e) = result {
            self.keep_first(e);
        }
    }

    fn flush(&self) {
        let result = self.writer.lock().unwrap_or_else(PoisonError::into_inner).flush();
        if let Err(e) = result {
            self.keep_first(e);
        }
    }
}
