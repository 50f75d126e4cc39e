//! Dedup ledger: which source transactions have already been posted
//!
//! # Invariants
//!
//! - An entry exists only for a transaction that was posted successfully
//! - Entries older than the retention window are pruned every cycle
//! - The on-disk snapshot is replaced atomically; a failed write leaves the
//!   previous snapshot intact

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Transaction ID → time first posted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupLedger {
    #[serde(rename = "processed_tx_ids", default)]
    entries: HashMap<String, DateTime<Utc>>,
}

impl DedupLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `tx_id` has been posted
    pub fn contains(&self, tx_id: &str) -> bool {
        self.entries.contains_key(tx_id)
    }

    /// Record `tx_id` as posted at `now`, overwriting any earlier entry
    pub fn record(&mut self, tx_id: impl Into<String>, now: DateTime<Utc>) {
        self.entries.insert(tx_id.into(), now);
    }

    /// When `tx_id` was first recorded
    pub fn first_seen(&self, tx_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(tx_id).copied()
    }

    /// Copy without the entries first seen before `now - retention`
    pub fn pruned(&self, now: DateTime<Utc>, retention: Duration) -> Self {
        let cutoff = now - retention;
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, first_seen)| **first_seen >= cutoff)
                .map(|(id, first_seen)| (id.clone(), *first_seen))
                .collect(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Durable home of the ledger snapshot
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Store backed by the JSON file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot; empty when none exists.
    ///
    /// A snapshot that exists but does not parse is an error, never an
    /// empty ledger.
    pub fn load(&self) -> Result<DedupLedger> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger snapshot found, starting empty");
                return Ok(DedupLedger::new());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let ledger: DedupLedger =
            serde_json::from_slice(&data).map_err(|e| Error::LedgerCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), entries = ledger.len(), "Loaded ledger snapshot");
        Ok(ledger)
    }

    /// Replace the snapshot with `ledger`, creating the directory if needed
    pub fn persist(&self, ledger: &DedupLedger) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.persist_error(e))?;

        let data = serde_json::to_vec_pretty(ledger)?;

        // Write beside the target so the rename stays on one filesystem
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.persist_error(e))?;
        tmp.write_all(&data).map_err(|e| self.persist_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.persist_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.persist_error(e.error))?;

        debug!(path = %self.path.display(), entries = ledger.len(), "Persisted ledger snapshot");
        Ok(())
    }

    fn persist_error(&self, err: std::io::Error) -> Error {
        Error::Persist {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}
