//! `upq upload` – push a batch of files through the bounded queue.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use upq_core::config::UpqConfig;
use upq_core::executor::CurlUploadExecutor;
use upq_core::queue::{FileRef, JobStatus, QueueSnapshot};
use upq_core::scheduler::SchedulerConfig;
use upq_core::uploader::UploadQueue;

const PROGRESS_INTERVAL_MS: u64 = 250;

pub async fn run_upload(cfg: &UpqConfig, paths: &[PathBuf], jobs: Option<usize>) -> Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = FileRef::from_path(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        files.push(file);
    }

    let mut sched_cfg = SchedulerConfig::from(cfg);
    if let Some(n) = jobs {
        sched_cfg.ceiling = n.max(1);
    }

    let executor = Arc::new(CurlUploadExecutor::new(cfg));
    let queue = UploadQueue::spawn(executor, sched_cfg);

    let requested = files.len();
    let admitted = queue.enqueue(files).len();
    if admitted < requested {
        println!("skipped {} duplicate file(s)", requested - admitted);
    }
    tracing::info!(admitted, ceiling = sched_cfg.ceiling, "upload batch started");

    let mut rx = queue.subscribe();
    let mut last_print = Instant::now();
    loop {
        let snap = rx.borrow_and_update().clone();
        let idle = snap.is_idle();
        if idle || last_print.elapsed().as_millis() as u64 >= PROGRESS_INTERVAL_MS {
            print_progress(&snap);
            last_print = Instant::now();
        }
        if idle {
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
    println!();

    let snap = queue.snapshot();
    let mut failed = 0usize;
    for job in &snap.jobs {
        match job.status {
            JobStatus::Completed => {
                let url = job.result.as_ref().map(|r| r.url.as_str()).unwrap_or("#");
                println!("  {}  ok  {}", job.file.name, url);
            }
            JobStatus::Failed => {
                failed += 1;
                let cause = job.error.as_deref().unwrap_or("upload failed");
                println!("  {}  FAILED  {}", job.file.name, cause);
            }
            _ => {}
        }
    }

    if !snap.errors.is_empty() {
        eprintln!("Upload errors:");
        for entry in &snap.errors {
            eprintln!("  - {}", entry);
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} upload(s) failed", failed, snap.jobs.len());
    }
    Ok(())
}

fn print_progress(snap: &QueueSnapshot) {
    let done = snap
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Completed)
        .count();
    let failed = snap
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Failed)
        .count();
    let queued = snap
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Queued)
        .count();
    let uploading: Vec<String> = snap
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Uploading)
        .map(|j| format!("{} {}%", j.file.name, j.progress))
        .collect();
    print!(
        "\r  {} done, {} failed, {} queued, {} active  {}        ",
        done,
        failed,
        queued,
        snap.active,
        uploading.join("  ")
    );
    use std::io::Write;
    let _ = std::io::stdout().flush();
}
