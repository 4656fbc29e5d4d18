//! Status reporting
//!
//! The provisioning agent learns about the outcome of a command only by
//! polling `<status folder>/<seq>.status`. The file holds a one element JSON
//! array in the agent's status format and is rewritten on every state change.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::fs::atomic_write;
use crate::telemetry::LogContext;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Status codes understood by the provisioning agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    Transitioning,
    Success,
    Error,
}

/// Outcome of the current invocation as seen by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub status: StatusCode,
    /// Label of the command, e.g. `Enable`
    pub operation: String,
    /// Empty on success, failure detail otherwise
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusRecord {
    pub fn new(status: StatusCode, operation: &str, message: &str) -> Self {
        Self {
            status,
            operation: operation.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Render the record in the agent's on-disk format
    pub fn to_document(&self) -> StatusDocument {
        vec![StatusItem {
            version: 1,
            timestamp_utc: self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            status: StatusBody {
                operation: self.operation.clone(),
                status: self.status,
                formatted_message: FormattedMessage {
                    lang: "en".to_string(),
                    message: self.message.clone(),
                },
            },
        }]
    }
}

pub type StatusDocument = Vec<StatusItem>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusItem {
    pub version: u32,
    #[serde(rename = "timestampUTC")]
    pub timestamp_utc: String,
    pub status: StatusBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub operation: String,
    pub status: StatusCode,
    pub formatted_message: FormattedMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedMessage {
    pub lang: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("failed to write status file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize status: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sink for status records
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait StatusReporter {
    /// Persist `record` as the current status of request `seq`.
    fn write(&self, seq: u64, record: &StatusRecord) -> Result<(), StatusError>;
}

/// Writes `<seq>.status` files into the agent's status folder
#[derive(Debug, Clone)]
pub struct FileStatusReporter {
    status_folder: PathBuf,
}

impl FileStatusReporter {
    pub fn new(status_folder: &Path) -> Self {
        Self {
            status_folder: status_folder.to_path_buf(),
        }
    }

    pub fn status_path(&self, seq: u64) -> PathBuf {
        self.status_folder.join(format!("{seq}.status"))
    }
}

impl StatusReporter for FileStatusReporter {
    fn write(&self, seq: u64, record: &StatusRecord) -> Result<(), StatusError> {
        let path = self.status_path(seq);
        let body = serde_json::to_vec(&record.to_document())?;
        atomic_write(&path, &body).map_err(|source| StatusError::Io { path, source })
    }
}

/// Report `record`, logging instead of failing when the write does not succeed.
///
/// The orchestrator has its own timeout for handlers that never report, so a
/// lost status write must not change the outcome of the invocation.
pub fn report(reporter: &dyn StatusReporter, seq: u64, record: &StatusRecord, log: &LogContext) {
    let _span = log.span().entered();
    match reporter.write(seq, record) {
        Ok(()) => info!(status = ?record.status, "Reported status"),
        Err(e) => error!(status = ?record.status, error = %e, "Failed to report status"),
    }
}
