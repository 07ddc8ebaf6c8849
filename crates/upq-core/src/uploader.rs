//! Consumer-facing surface of the upload queue.
//!
//! `UploadQueue` wires the store and scheduler together and exposes the
//! operations a presentation layer needs: enqueue, retry, removal, bulk
//! selection, error-banner dismissal, and a reactive snapshot stream.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::executor::UploadExecutor;
use crate::queue::{FileRef, JobId, QueueSnapshot, QueueStore};
use crate::scheduler::{Scheduler, SchedulerConfig};

pub struct UploadQueue {
    store: Arc<QueueStore>,
    task: JoinHandle<()>,
}

impl UploadQueue {
    /// Builds the queue and spawns its scheduler onto the current runtime.
    /// The scheduler task is aborted when the queue is dropped; in-flight
    /// transfers run to completion but their outcomes go nowhere.
    pub fn spawn(executor: Arc<dyn UploadExecutor>, cfg: SchedulerConfig) -> Self {
        let store = QueueStore::new();
        let scheduler = Scheduler::new(Arc::clone(&store), executor, cfg);
        let task = tokio::spawn(scheduler.run());
        Self { store, task }
    }

    /// Admits a batch of dropped files through the dedup filter. Returns the
    /// ids of the jobs actually created; duplicates are silently dropped.
    pub fn enqueue(&self, files: Vec<FileRef>) -> Vec<JobId> {
        self.store.enqueue(files)
    }

    /// Re-queues one failed job for a fresh attempt.
    pub fn retry(&self, id: JobId) -> bool {
        self.store.retry(id)
    }

    /// Re-queues every selected job that is currently failed.
    pub fn retry_selected(&self) -> usize {
        self.store.retry_selected()
    }

    /// Removes one job regardless of status. Does not cancel an in-flight
    /// transfer; a later outcome for the removed job is a no-op.
    pub fn remove(&self, id: JobId) -> bool {
        self.store.remove(id)
    }

    /// Removes every selected job.
    pub fn remove_selected(&self) -> usize {
        self.store.remove_selected()
    }

    /// Toggles bulk-selection membership; returns whether the id is selected
    /// after the call.
    pub fn toggle_selection(&self, id: JobId) -> bool {
        self.store.toggle_selection(id)
    }

    /// Clears the aggregate error banner.
    pub fn dismiss_errors(&self) {
        self.store.dismiss_errors()
    }

    /// Current consistent view of the queue.
    pub fn snapshot(&self) -> QueueSnapshot {
        self.store.snapshot()
    }

    /// Reactive snapshot stream; receives the state after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<QueueSnapshot> {
        self.store.subscribe()
    }

    /// Resolves once nothing is queued or in flight. Failed jobs count as
    /// settled: they are only re-queued by explicit retry.
    pub async fn wait_idle(&self) {
        let mut rx = self.store.subscribe();
        loop {
            if rx.borrow().is_idle() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for UploadQueue {
    fn drop(&mut self) {
        self.task.abort();
    }
}
