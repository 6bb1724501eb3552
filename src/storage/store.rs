//! JSON file backing for the bonus ledger.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;

use super::ledger::{BonusLedger, LedgerWrite};
use crate::error::{QueueError, Result};
use crate::id::PlayerId;

/// Loads and rewrites the ledger file.
///
/// Writes are full rewrites through a temp file in the same directory followed
/// by an atomic rename, so a crash leaves either the old or the new file. The
/// last written revision is tracked so a late writer holding an older copy of
/// the map never replaces a newer file.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    last_written: Mutex<Option<u64>>,
}

impl LedgerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_written: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger for startup. Never fails.
    ///
    /// - file absent: empty ledger, written out immediately
    /// - file unreadable or unparseable: empty ledger in memory, error logged,
    ///   file left untouched until the next mutation overwrites it
    pub fn load(&self) -> BonusLedger {
        match self.try_load() {
            Ok(Some(ledger)) => {
                log::info!("Loaded bonus ledger from {} ({} players)", self.path.display(), ledger.len());
                ledger
            }
            Ok(None) => {
                let ledger = BonusLedger::new();
                log::info!("No bonus ledger at {}, creating empty one", self.path.display());
                self.commit_or_log(&ledger.snapshot());
                ledger
            }
            Err(e) => {
                log::error!("Failed to load bonus ledger {}, starting empty: {}", self.path.display(), e);
                BonusLedger::new()
            }
        }
    }

    /// Read and parse the ledger file. `Ok(None)` when the file does not exist.
    pub fn try_load(&self) -> Result<Option<BonusLedger>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| QueueError::LedgerCorrupt(format!("{}: {}", self.path.display(), e)))?;
        let points = parse_points(&content)
            .map_err(|reason| QueueError::LedgerCorrupt(format!("{}: {}", self.path.display(), reason)))?;

        Ok(Some(BonusLedger::from_points(points)))
    }

    /// Atomically replace the file with `write`'s contents.
    ///
    /// A write older than the last one committed is skipped.
    pub fn commit(&self, write: &LedgerWrite) -> Result<()> {
        let mut last_written = self.last_written.lock().unwrap_or_else(PoisonError::into_inner);
        if last_written.is_some_and(|last| last > write.revision) {
            log::debug!(
                "Skipping stale ledger write (revision {}, last {:?})",
                write.revision, *last_written
            );
            return Ok(());
        }

        let contents = serde_json::to_vec_pretty(&write.points)?;
        self.atomic_write(&contents)
            .map_err(|e| QueueError::LedgerPersist(format!("{}: {}", self.path.display(), e)))?;

        *last_written = Some(write.revision);
        Ok(())
    }

    /// Commit, logging and swallowing any failure. In-memory state stays
    /// authoritative; the next mutation tries again with the full map.
    pub fn commit_or_log(&self, write: &LedgerWrite) -> bool {
        match self.commit(write) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to persist bonus ledger (revision {}): {}", write.revision, e);
                false
            }
        }
    }

    fn atomic_write(&self, data: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(data)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn parse_points(content: &str) -> std::result::Result<HashMap<PlayerId, i64>, String> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let raw: Option<BTreeMap<String, i64>> = serde_json::from_str(content).map_err(|e| e.to_string())?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            key.parse::<PlayerId>()
                .map(|player| (player, value))
                .map_err(|e| format!("invalid player id {:?}: {}", key, e))
        })
        .collect()
}
