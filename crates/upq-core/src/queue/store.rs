//! The queue store: single owner of all job records.
//!
//! Mutations are serialized behind one mutex so no consumer can observe a
//! torn state. Every mutation publishes a fresh snapshot on a watch channel
//! (for the presentation layer) and wakes the scheduler. The scheduler and
//! the executor never hold records; they mutate by id through this path, and
//! an update for an id that was removed meanwhile is a harmless no-op.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{watch, Notify};

use super::dedup;
use super::types::{
    FileRef, JobId, JobPatch, JobRecord, JobStatus, QueueSnapshot, UploadedFile,
};

struct Inner {
    jobs: Vec<JobRecord>,
    selected: HashSet<JobId>,
    errors: Vec<String>,
    next_id: JobId,
}

pub struct QueueStore {
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<QueueSnapshot>,
    wake: Arc<Notify>,
}

impl QueueStore {
    pub fn new() -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(QueueSnapshot::default());
        Arc::new(Self {
            inner: Mutex::new(Inner {
                jobs: Vec::new(),
                selected: HashSet::new(),
                errors: Vec::new(),
                next_id: 1,
            }),
            snapshot_tx,
            wake: Arc::new(Notify::new()),
        })
    }

    /// Wake token the scheduler awaits on. Notifications coalesce, so a burst
    /// of mutations triggers at most one extra scheduling pass.
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Subscribe to queue snapshots. The receiver sees the state as of every
    /// mutation, in order.
    pub fn subscribe(&self) -> watch::Receiver<QueueSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current immutable view: jobs in insertion order, active count, error
    /// log, selection.
    pub fn snapshot(&self) -> QueueSnapshot {
        build_snapshot(&self.inner.lock().expect("queue store poisoned"))
    }

    fn publish(&self, inner: &MutexGuard<'_, Inner>) {
        let _ = self.snapshot_tx.send(build_snapshot(inner));
        self.wake.notify_one();
    }

    /// Runs the dedup filter over `candidates` and appends the accepted ones
    /// as fresh `Queued` records. Returns the ids of the admitted jobs.
    pub fn enqueue(&self, candidates: Vec<FileRef>) -> Vec<JobId> {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let accepted = dedup::accept(candidates, &inner.jobs);
        let mut ids = Vec::with_capacity(accepted.len());
        for file in accepted {
            let id = inner.next_id;
            inner.next_id += 1;
            tracing::debug!(id, name = %file.name, size = file.size, "job enqueued");
            inner.jobs.push(JobRecord::new(id, file));
            ids.push(id);
        }
        self.publish(&inner);
        ids
    }

    /// Appends pre-built records without dedup. Ids must be unique; intended
    /// for callers that ran the filter themselves.
    pub fn append(&self, jobs: Vec<JobRecord>) {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        inner.jobs.extend(jobs);
        self.publish(&inner);
    }

    /// Applies a partial update to one record. Returns false (and changes
    /// nothing) when the id is no longer in the queue.
    pub fn update(&self, id: JobId, patch: JobPatch) -> bool {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let Some(job) = inner.jobs.iter_mut().find(|j| j.id == id) else {
            return false;
        };
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(progress) = patch.progress {
            job.progress = progress;
        }
        if let Some(error) = patch.error {
            job.error = error;
        }
        if let Some(result) = patch.result {
            job.result = result;
        }
        self.publish(&inner);
        true
    }

    /// Admits a job into a concurrency slot: `Queued -> Uploading`, progress 0.
    /// Returns false if the job is gone or not currently queued.
    pub fn mark_uploading(&self, id: JobId) -> bool {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let Some(job) = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Queued)
        else {
            return false;
        };
        job.status = JobStatus::Uploading;
        job.progress = 0;
        self.publish(&inner);
        true
    }

    /// Records transfer progress. Only applies while the job is `Uploading`,
    /// and never moves progress backwards within an attempt.
    pub fn update_progress(&self, id: JobId, percent: u8) {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let Some(job) = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Uploading)
        else {
            return;
        };
        if percent <= job.progress {
            return;
        }
        job.progress = percent.min(100);
        self.publish(&inner);
    }

    /// Terminal success for one attempt. No-op if the job was removed.
    pub fn complete(&self, id: JobId, result: UploadedFile) -> bool {
        self.update(
            id,
            JobPatch {
                status: Some(JobStatus::Completed),
                progress: Some(100),
                error: Some(None),
                result: Some(Some(result)),
            },
        )
    }

    /// Terminal failure for one attempt: marks the record and appends to the
    /// session error log. No-op (and no log entry) if the job was removed.
    pub fn fail(&self, id: JobId, message: String) -> bool {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let Some(job) = inner.jobs.iter_mut().find(|j| j.id == id) else {
            return false;
        };
        job.status = JobStatus::Failed;
        job.error = Some(message.clone());
        job.result = None;
        let entry = format!("Failed to upload {}: {}", job.file.name, message);
        tracing::warn!(id, "{}", entry);
        inner.errors.push(entry);
        self.publish(&inner);
        true
    }

    /// Retry: `Failed -> Queued` with progress and error cleared. A new
    /// attempt, not a mutation of the previous one; does not re-enter the
    /// dedup filter. Returns false unless the job exists and is `Failed`.
    pub fn retry(&self, id: JobId) -> bool {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let Some(job) = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.status == JobStatus::Failed)
        else {
            return false;
        };
        job.status = JobStatus::Queued;
        job.progress = 0;
        job.error = None;
        self.publish(&inner);
        true
    }

    /// Bulk retry over the selection: every selected `Failed` job is
    /// re-queued; selected jobs in other states are unaffected. Returns the
    /// number of jobs re-queued.
    pub fn retry_selected(&self) -> usize {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let selected = inner.selected.clone();
        let mut count = 0;
        for job in inner.jobs.iter_mut() {
            if selected.contains(&job.id) && job.status == JobStatus::Failed {
                job.status = JobStatus::Queued;
                job.progress = 0;
                job.error = None;
                count += 1;
            }
        }
        if count > 0 {
            self.publish(&inner);
        }
        count
    }

    /// Removes one record outright, regardless of status. An in-flight
    /// transfer is not cancelled; its eventual outcome will miss and no-op.
    pub fn remove(&self, id: JobId) -> bool {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let before = inner.jobs.len();
        inner.jobs.retain(|j| j.id != id);
        if inner.jobs.len() == before {
            return false;
        }
        inner.selected.remove(&id);
        self.publish(&inner);
        true
    }

    /// Removes every record matching the predicate. Returns how many were
    /// removed. Selection membership is pruned along with the records.
    pub fn remove_where(&self, pred: impl Fn(&JobRecord) -> bool) -> usize {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let before = inner.jobs.len();
        let mut removed = Vec::new();
        inner.jobs.retain(|j| {
            if pred(j) {
                removed.push(j.id);
                false
            } else {
                true
            }
        });
        for id in &removed {
            inner.selected.remove(id);
        }
        let count = before - inner.jobs.len();
        if count > 0 {
            self.publish(&inner);
        }
        count
    }

    /// Removes every selected record.
    pub fn remove_selected(&self) -> usize {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        let selected = std::mem::take(&mut inner.selected);
        let before = inner.jobs.len();
        inner.jobs.retain(|j| !selected.contains(&j.id));
        let count = before - inner.jobs.len();
        self.publish(&inner);
        count
    }

    /// Toggles bulk-selection membership for an existing job. Returns whether
    /// the id is selected after the call; ids not in the queue stay out.
    pub fn toggle_selection(&self, id: JobId) -> bool {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        if !inner.jobs.iter().any(|j| j.id == id) {
            return false;
        }
        let now_selected = if inner.selected.remove(&id) {
            false
        } else {
            inner.selected.insert(id);
            true
        };
        self.publish(&inner);
        now_selected
    }

    /// Clears the session error log (the dismissable banner).
    pub fn dismiss_errors(&self) {
        let mut inner = self.inner.lock().expect("queue store poisoned");
        inner.errors.clear();
        self.publish(&inner);
    }
}

fn build_snapshot(inner: &Inner) -> QueueSnapshot {
    QueueSnapshot {
        jobs: inner.jobs.clone(),
        active: inner
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Uploading)
            .count(),
        errors: inner.errors.clone(),
        selected: inner.selected.clone(),
    }
}
