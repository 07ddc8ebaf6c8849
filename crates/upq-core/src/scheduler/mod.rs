//! Admission-control scheduler.
//!
//! A single task owns the admission decision: it reacts to queue wakes and
//! transfer outcomes, admits queued jobs FIFO up to the concurrency ceiling,
//! and dispatches one executor task per admitted job. Only transfers run
//! concurrently; every admission decision is made against a consistent
//! snapshot of the store.

mod admit;
mod progress;
mod run;

pub use progress::percent;
pub use run::{Scheduler, SchedulerConfig};
