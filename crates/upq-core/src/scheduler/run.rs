//! The scheduling loop: wakes, passes, dispatch, and outcome routing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::UpqConfig;
use crate::executor::{Outcome, ProgressFn, UploadExecutor};
use crate::queue::{JobId, JobRecord, QueueStore};

use super::{admit, progress};

/// Scheduler tuning knobs, usually derived from [`UpqConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Admission ceiling: maximum jobs `Uploading` at once.
    pub ceiling: usize,
    /// Defensive delay before the pass that follows a failed attempt.
    pub pass_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ceiling: 2,
            pass_delay: Duration::from_millis(300),
        }
    }
}

impl From<&UpqConfig> for SchedulerConfig {
    fn from(cfg: &UpqConfig) -> Self {
        Self {
            ceiling: cfg.max_concurrent_uploads.max(1),
            pass_delay: Duration::from_millis(cfg.pass_delay_ms),
        }
    }
}

/// Whether an admission pass is currently being computed. Passes never
/// overlap; an overlapping wake waits for the next loop turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassState {
    Idle,
    Running,
}

struct Settled {
    id: JobId,
    outcome: Outcome,
}

/// The admission-control loop. Owns the only mutable scheduling state:
/// the in-flight count and the pass guard. Nothing outside this task touches
/// either.
pub struct Scheduler {
    store: Arc<QueueStore>,
    executor: Arc<dyn UploadExecutor>,
    cfg: SchedulerConfig,
    active: usize,
    state: PassState,
    /// Earliest instant the next pass may run; set after a failed attempt.
    cooldown_until: Option<Instant>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    settled_rx: mpsc::UnboundedReceiver<Settled>,
}

impl Scheduler {
    pub fn new(
        store: Arc<QueueStore>,
        executor: Arc<dyn UploadExecutor>,
        cfg: SchedulerConfig,
    ) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            store,
            executor,
            cfg,
            active: 0,
            state: PassState::Idle,
            cooldown_until: None,
            settled_tx,
            settled_rx,
        }
    }

    /// Runs until aborted. Reacts to store wakes (enqueue, retry, removal,
    /// bulk ops) and to settling transfers; each reaction ends in at most one
    /// admission pass.
    pub async fn run(mut self) {
        let wake = self.store.wake_handle();
        // Initial pass picks up anything enqueued before the task started.
        self.pass();
        loop {
            tokio::select! {
                _ = wake.notified() => self.pass(),
                settled = self.settled_rx.recv() => {
                    // The scheduler holds its own sender, so recv() only
                    // returns None if the channel is closed externally.
                    let Some(s) = settled else { break };
                    self.on_settled(s);
                }
            }
        }
    }

    /// One admission pass: compute free slots, admit queued jobs FIFO, mark
    /// them `Uploading` before anything is dispatched, then dispatch.
    fn pass(&mut self) {
        if self.state == PassState::Running {
            return;
        }
        self.state = PassState::Running;
        self.pass_inner();
        self.state = PassState::Idle;
    }

    fn pass_inner(&mut self) {
        if let Some(until) = self.cooldown_until {
            let now = Instant::now();
            if now < until {
                // Defensive delay after a failure: re-wake when it elapses
                // instead of admitting in a tight loop.
                let wake = self.store.wake_handle();
                let dur = until - now;
                tokio::spawn(async move {
                    tokio::time::sleep(dur).await;
                    wake.notify_one();
                });
                return;
            }
            self.cooldown_until = None;
        }

        let slots = self.cfg.ceiling.saturating_sub(self.active);
        if slots == 0 {
            return;
        }
        let snapshot = self.store.snapshot();
        let batch = admit::select_batch(&snapshot.jobs, slots);
        if batch.is_empty() {
            return;
        }
        // Claim every slot before the first dispatch so a wake delivered
        // mid-pass cannot double-admit a job.
        let mut admitted = Vec::with_capacity(batch.len());
        for job in batch {
            if self.store.mark_uploading(job.id) {
                self.active += 1;
                admitted.push(job);
            }
        }
        for job in admitted {
            tracing::debug!(id = job.id, name = %job.file.name, "upload admitted");
            self.dispatch(job);
        }
    }

    /// Spawns the executor task for one admitted job. Tasks are independent
    /// and unordered relative to each other.
    fn dispatch(&self, job: JobRecord) {
        let id = job.id;
        let store = Arc::clone(&self.store);
        let reporter: ProgressFn = Arc::new(move |sent, total| {
            store.update_progress(id, progress::percent(sent, total));
        });
        let executor = Arc::clone(&self.executor);
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let outcome = executor.run(job, reporter).await;
            let _ = settled_tx.send(Settled { id, outcome });
        });
    }

    /// Routes one transfer outcome into the store, frees its slot, and runs
    /// the follow-up pass: immediately after a success (the freed slot
    /// refills within one pass), behind the defensive cooldown after a
    /// failure.
    fn on_settled(&mut self, settled: Settled) {
        self.active = self.active.saturating_sub(1);
        match settled.outcome {
            Outcome::Completed(result) => {
                if !self.store.complete(settled.id, result) {
                    tracing::debug!(id = settled.id, "outcome for removed job dropped");
                }
            }
            Outcome::Failed(err) => {
                self.cooldown_until = Some(Instant::now() + self.cfg.pass_delay);
                if !self.store.fail(settled.id, err.to_string()) {
                    tracing::debug!(id = settled.id, "failure for removed job dropped");
                }
            }
        }
        self.pass();
    }
}
