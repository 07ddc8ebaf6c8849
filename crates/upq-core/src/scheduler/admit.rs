//! Admission selection: which queued jobs take the free slots.

use crate::queue::{JobRecord, JobStatus};

/// Selects up to `slots` queued jobs in queue order (oldest first). There is
/// no priority field; FIFO fairness is the whole policy.
pub(crate) fn select_batch(jobs: &[JobRecord], slots: usize) -> Vec<JobRecord> {
    jobs.iter()
        .filter(|j| j.status == JobStatus::Queued)
        .take(slots)
        .cloned()
        .collect()
}
