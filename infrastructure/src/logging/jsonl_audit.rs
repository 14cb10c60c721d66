//! JSONL file writer for audit events.
//!
//! Each [`AuditEvent`] is serialized as a single JSON line carrying `type`,
//! `run_id` and `timestamp` next to the event fields, appended to the file
//! via a buffered writer. Dead-letter alerts are written as `ALERT` lines.

use sixhats_application::AuditSink;
use sixhats_domain::{AuditEvent, RunId};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Append-only JSONL audit sink shared by every run.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and
/// on `Drop`.
pub struct JsonlAuditSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditSink {
    /// Open (or create) the log at `path`, creating parent directories.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(
                    "Could not create audit log directory {}: {}",
                    parent.display(),
                    e
                );
                return None;
            }
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, record: &serde_json::Value) {
        let Ok(line) = serde_json::to_string(record) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                warn!("Audit log write to {} failed: {}", self.path.display(), e);
            }
        }
    }
}

impl AuditSink for JsonlAuditSink {
    fn emit(&self, run_id: &RunId, event: &AuditEvent) {
        let record = serde_json::json!({
            "type": event.event_type,
            "run_id": run_id,
            "timestamp": event.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "event_id": event.event_id,
            "role": event.role,
            "actor": event.actor,
            "data": event.data,
        });
        self.write_line(&record);
    }

    fn alert(&self, run_id: &RunId, context: &str) {
        let record = serde_json::json!({
            "type": "ALERT",
            "run_id": run_id,
            "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "context": context,
        });
        self.write_line(&record);
    }
}

impl Drop for JsonlAuditSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
