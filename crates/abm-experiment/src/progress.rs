//! Progress log: one `scenario<TAB>replication` line per completed run.
//!
//! A crash can leave a partial last line behind.  Reading keeps the longest
//! prefix of well-formed, newline-terminated lines and truncates the file to
//! it, so appending resumes on a clean line boundary.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use abm_core::{ReplicationId, ScenarioId};
use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use tracing::{info, warn};

use crate::ExperimentResult;

pub type RunKey = (ScenarioId, ReplicationId);

pub struct ProgressLog {
    path:   PathBuf,
    writer: Mutex<Writer<File>>,
}

impl ProgressLog {
    /// Start a fresh log at `path`, discarding any previous content.
    pub fn create(path: &Path) -> ExperimentResult<Self> {
        let file = File::create(path)?;
        Ok(Self::from_file(path, file))
    }

    /// Open the log at `path` for appending and return the runs it already
    /// records.  A missing file is an empty log.
    pub fn resume(path: &Path) -> ExperimentResult<(Self, BTreeSet<RunKey>)> {
        let completed = read_completed(path)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(path = %path.display(), completed = completed.len(), "progress log resumed");
        Ok((Self::from_file(path, file), completed))
    }

    fn from_file(path: &Path, file: File) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(file);
        Self { path: path.to_path_buf(), writer: Mutex::new(writer) }
    }

    /// Append one completed run.  The line is flushed before returning.
    pub fn record(&self, scenario: ScenarioId, replication: ReplicationId) -> ExperimentResult<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_record([scenario.0.to_string(), replication.0.to_string()])?;
        writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Runs recorded in the log at `path`, truncating any malformed tail.
pub fn read_completed(path: &Path) -> ExperimentResult<BTreeSet<RunKey>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let mut record = StringRecord::new();
    let mut completed = BTreeSet::new();
    let mut valid_end = 0usize;
    while let Ok(true) = reader.read_record(&mut record) {
        let end = reader.position().byte() as usize;
        let terminated = end > 0 && bytes.get(end - 1) == Some(&b'\n');
        match parse(&record) {
            Some(key) if terminated => {
                completed.insert(key);
                valid_end = end;
            }
            _ => break,
        }
    }

    if valid_end < bytes.len() {
        warn!(
            path = %path.display(),
            kept = valid_end,
            dropped = bytes.len() - valid_end,
            "malformed progress log tail truncated"
        );
        OpenOptions::new().write(true).open(path)?.set_len(valid_end as u64)?;
    }
    Ok(completed)
}

fn parse(record: &StringRecord) -> Option<RunKey> {
    if record.len() != 2 {
        return None;
    }
    let scenario = record.get(0)?.trim().parse().ok()?;
    let replication = record.get(1)?.trim().parse().ok()?;
    Some((ScenarioId(scenario), ReplicationId(replication)))
}
