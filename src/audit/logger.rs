//! Audit logger for append-only audit log
//!
//! Each entry is written as a single JSON line and flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ListError, ListResult};
use crate::list::EntityList;
use crate::models::{EntityId, EntityKind};

use super::entry::AuditEntry;
use super::trail;

/// Handles writing audit entries to the audit log file
///
/// The log file uses a line-delimited JSON format (JSONL) where each line
/// is a complete JSON object representing one audit entry.
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    fn open_for_append(&self) -> ListResult<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| ListError::Io(format!("Failed to open audit log: {}", e)))
    }

    /// Append one entry
    pub fn log(&self, entry: &AuditEntry) -> ListResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append several entries, flushing once at the end
    pub fn log_batch(&self, entries: &[AuditEntry]) -> ListResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut file = self.open_for_append()?;
        for entry in entries {
            let json = serde_json::to_string(entry)
                .map_err(|e| ListError::Json(format!("Failed to serialize audit entry: {}", e)))?;

            writeln!(file, "{}", json)
                .map_err(|e| ListError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        file.flush()
            .map_err(|e| ListError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Append the audit trail of an UPDATE or DIFF list
    ///
    /// Returns the number of entries written.
    pub fn record<K: EntityKind>(&self, changes: &EntityList<K>) -> ListResult<usize> {
        let entries = trail(changes)?;
        self.log_batch(&entries)?;
        debug!(kind = K::KIND_NAME, entries = entries.len(), "Recorded audit trail");
        Ok(entries.len())
    }

    /// Read all audit entries, oldest first
    ///
    /// Blank lines are skipped; a malformed line fails with its line number.
    pub fn read_all(&self) -> ListResult<Vec<AuditEntry>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ListError::Io(format!("Failed to open audit log: {}", e)))?;

        BufReader::new(file)
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|(index, line)| {
                let line = line.map_err(|e| {
                    ListError::Io(format!("Failed to read audit log line {}: {}", index + 1, e))
                })?;
                serde_json::from_str(&line).map_err(|e| {
                    ListError::Json(format!("Bad audit entry at line {}: {}", index + 1, e))
                })
            })
            .collect()
    }

    /// Every entry recorded for one item, oldest first
    pub fn history(&self, kind: &str, id: EntityId) -> ListResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        entries.retain(|e| e.kind == kind && e.entity_id == id);
        Ok(entries)
    }

    /// Read the most recent N entries from the log
    pub fn read_recent(&self, count: usize) -> ListResult<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;
        let start = entries.len().saturating_sub(count);
        Ok(entries.split_off(start))
    }

    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
