//! Upload execution: one transfer per job, reporting progress and a terminal
//! outcome.
//!
//! The executor's contract guarantees an `Outcome` for every invocation —
//! success or failure, never a fault that escapes to the scheduler.

pub(crate) mod error;
mod http;

pub use error::UploadError;
pub use http::CurlUploadExecutor;

use std::sync::Arc;

use async_trait::async_trait;

use crate::queue::{JobRecord, UploadedFile};

/// Progress callback contract: `(bytes_sent, bytes_total)`. The scheduler
/// converts these to a percentage and forwards it into the queue store.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Terminal result of one upload attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Transfer succeeded; carries the remote descriptor for the stored file.
    Completed(UploadedFile),
    Failed(UploadError),
}

/// Performs the transfer of one job to the remote service.
#[async_trait]
pub trait UploadExecutor: Send + Sync + 'static {
    /// Transmits `job.file` to the upload endpoint, emitting progress updates
    /// while the transfer is in flight. Must always resolve to an `Outcome`.
    async fn run(&self, job: JobRecord, progress: ProgressFn) -> Outcome;
}
