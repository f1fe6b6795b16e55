//! Append-only audit trail of LLM traffic
//!
//! Line-delimited JSON events `{tick, event_type, data}`. The file is
//! rotated to a `.1` sibling once it grows past the configured threshold;
//! one rotated generation is kept.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::Tick;

#[derive(Serialize)]
struct AuditEvent<'a> {
    tick: Tick,
    event_type: &'a str,
    data: serde_json::Value,
}

pub struct AuditLog {
    path: PathBuf,
    rotate_bytes: u64,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>, rotate_bytes: u64) -> Self {
        Self {
            path: path.into(),
            rotate_bytes,
        }
    }

    /// Append one event, rotating first if the file is over the threshold
    pub fn append(&self, tick: Tick, event_type: &str, data: serde_json::Value) -> Result<()> {
        self.rotate_if_needed()?;
        let mut file = self.open()?;
        let event = AuditEvent {
            tick,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn open(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }

    fn rotate_if_needed(&self) -> Result<()> {
        let size = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size < self.rotate_bytes {
            return Ok(());
        }
        let mut rotated = self.path.clone().into_os_string();
        rotated.push(".1");
        std::fs::rename(&self.path, PathBuf::from(rotated))?;
        tracing::info!(path = %self.path.display(), size, "rotated audit log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&path, 1024 * 1024);

        log.append(3, "llm_request", json!({"prompt": "hi"})).unwrap();
        log.append(3, "llm_response", json!({"response": "MOVE N"}))
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["tick"], 3);
        assert_eq!(first["event_type"], "llm_request");
        assert_eq!(first["data"]["prompt"], "hi");
    }

    #[test]
    fn test_rotation_past_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&path, 64);

        for tick in 0..20 {
            log.append(tick, "llm_request", json!({"prompt": "padding padding"}))
                .unwrap();
        }

        let rotated = dir.path().join("audit.jsonl.1");
        assert!(rotated.exists());
        // Active file was restarted after the rotation.
        assert!(std::fs::metadata(&path).unwrap().len() < 1024);
    }
}
