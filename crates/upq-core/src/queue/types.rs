//! Types used by the upload queue.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Job identifier, assigned at enqueue time and stable for the job's lifetime.
pub type JobId = u64;

/// Lifecycle state of one upload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Uploading,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// True for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Byte payload of an upload: a file on disk or an in-memory buffer.
#[derive(Debug, Clone)]
pub enum FilePayload {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
}

/// Handle to one uploadable file. Immutable once enqueued.
#[derive(Debug, Clone)]
pub struct FileRef {
    /// File name as it will be sent to the server.
    pub name: String,
    /// Size in bytes (part of the dedup identity key).
    pub size: u64,
    pub payload: FilePayload,
}

impl FileRef {
    /// Builds a FileRef from a file on disk, reading its size from metadata.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow::anyhow!("path has no file name: {}", path.display()))?;
        let size = std::fs::metadata(path)?.len();
        Ok(Self {
            name,
            size,
            payload: FilePayload::Path(path.to_path_buf()),
        })
    }

    /// Builds a FileRef from an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            name: name.into(),
            size,
            payload: FilePayload::Bytes(Arc::new(bytes)),
        }
    }
}

/// Descriptor for a file stored by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Access URL for the stored file.
    pub url: String,
    #[serde(default, alias = "originalName")]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
}

impl UploadedFile {
    /// Placeholder descriptor used when the server response omits one.
    pub fn placeholder(file: &FileRef) -> Self {
        Self {
            url: "#".to_string(),
            filename: file.name.clone(),
            size: file.size,
        }
    }
}

/// Tracked state of one file's upload attempt.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub file: FileRef,
    pub status: JobStatus,
    /// Percentage 0-100; meaningful only while `Uploading`, frozen at 100 on
    /// `Completed`.
    pub progress: u8,
    /// Present only when `Failed`.
    pub error: Option<String>,
    /// Present only when `Completed`.
    pub result: Option<UploadedFile>,
}

impl JobRecord {
    pub fn new(id: JobId, file: FileRef) -> Self {
        Self {
            id,
            file,
            status: JobStatus::Queued,
            progress: 0,
            error: None,
            result: None,
        }
    }
}

/// Partial update applied through the store's single mutation path.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub error: Option<Option<String>>,
    pub result: Option<Option<UploadedFile>>,
}

/// Immutable ordered view of the queue (insertion order, oldest first),
/// published to consumers on every mutation.
#[derive(Debug, Clone, Default)]
pub struct QueueSnapshot {
    pub jobs: Vec<JobRecord>,
    /// Jobs currently `Uploading`.
    pub active: usize,
    /// Session error log (append-only, dismissable as a whole).
    pub errors: Vec<String>,
    /// Job ids currently marked for bulk action.
    pub selected: HashSet<JobId>,
}

impl QueueSnapshot {
    /// True when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.active == 0
            && !self
                .jobs
                .iter()
                .any(|j| j.status == JobStatus::Queued || j.status == JobStatus::Uploading)
    }
}
