//! In-memory upload queue: job records, dedup admission, and the store.
//!
//! The store is the single source of truth for job state. Every mutation goes
//! through its serialized path, publishes a fresh snapshot for consumers, and
//! wakes the scheduler.

pub mod dedup;
pub mod store;
pub mod types;

pub use dedup::{identity_key, IdentityKey};
pub use store::QueueStore;
pub use types::{
    FilePayload, FileRef, JobId, JobPatch, JobRecord, JobStatus, QueueSnapshot, UploadedFile,
};
