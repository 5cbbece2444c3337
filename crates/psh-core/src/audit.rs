use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::error::ExecutionError;
use crate::target::Target;

/// Append-only record of every remote command, whatever its outcome.
pub trait AuditSink: Send + Sync {
    fn record(&self, target: &Target, command: &str, error: Option<&ExecutionError>);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub ip: String,
    pub name: String,
    pub command: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn new(run_id: Uuid, target: &Target, command: &str, error: Option<&ExecutionError>) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id,
            ip: target.ip.clone(),
            name: target.display_name().to_string(),
            command: command.to_string(),
            status: if error.is_some() { "failure" } else { "success" }.to_string(),
            error: error.map(|e| e.to_string()),
        }
    }
}

/// JSON-lines audit file shared by all branches of one run.
pub struct JsonlAuditLog {
    path: PathBuf,
    run_id: Uuid,
    file: Mutex<File>,
}

impl JsonlAuditLog {
    pub fn open(path: &Path) -> Result<Self, std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            run_id: Uuid::new_v4(),
            file: Mutex::new(file),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, target: &Target, command: &str, error: Option<&ExecutionError>) {
        let record = AuditRecord::new(self.run_id, target, command, error);
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize audit record: {}", e);
                return;
            }
        };

        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(file, "{}", line) {
            warn!("Failed to append to audit log {}: {}", self.path.display(), e);
        }
    }
}

/// Discards everything.
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _target: &Target, _command: &str, _error: Option<&ExecutionError>) {}
}

/// Read back a JSON-lines audit file, skipping lines that fail to parse.
pub fn read_records(path: &Path) -> Result<Vec<AuditRecord>, std::io::Error> {
    let data = std::fs::read_to_string(path)?;
    Ok(data
        .lines()
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect())
}
