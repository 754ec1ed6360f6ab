//! JSON-lines change log
//!
//! When a log destination is configured, every change the engine records
//! is appended to it as one JSON object per line and flushed immediately.
//! Seeded files are written first, one `seeded` line each. The log is an
//! audit trail only; the engine never reads it back.
//!
//! ```text
//! {"event":"seeded","path":"/srv/a.txt","hash":"2cf2...","user":"alice","timestamp":"..."}
//! {"event":"modified","path":"/srv/a.txt","previous_hash":"2cf2...","hash":"b94d...","user":"alice","timestamp":"..."}
//! ```

use crate::error::Result;
use crate::observer::ChangeObserver;
use crate::store::TrackingStore;
use crate::types::ChangeEvent;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Append-only change log observer
pub struct ChangeLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl ChangeLog {
    /// Open (or create) the log file for appending
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Change log opened at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event and flush
    pub fn append(&self, event: &ChangeEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    /// Read every event from a change log file
    ///
    /// Lines that do not parse are skipped with a warning, so a log cut
    /// short by a crash can still be inspected.
    pub fn read_events(path: &Path) -> Result<Vec<ChangeEvent>> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping malformed change log line {}: {}", number + 1, e),
            }
        }
        Ok(events)
    }
}

impl ChangeObserver for ChangeLog {
    fn on_seeded(&self, store: &TrackingStore) -> Result<()> {
        let mut seeded = store.snapshot();
        seeded.sort_by(|a, b| a.path.cmp(&b.path));
        for file in &seeded {
            self.append(&ChangeEvent::seeded(file))?;
        }
        Ok(())
    }

    fn on_change(&self, event: &ChangeEvent, _store: &TrackingStore) -> Result<()> {
        self.append(event)
    }
}
