pub mod config;
pub mod logging;

pub mod executor;
pub mod queue;
pub mod remote;
pub mod scheduler;
pub mod uploader;
