//! End-to-end tests: real multipart transfers through the curl executor
//! against a local upload server.

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use upq_core::executor::CurlUploadExecutor;
use upq_core::queue::{FileRef, JobStatus};
use upq_core::scheduler::SchedulerConfig;
use upq_core::uploader::UploadQueue;

use common::upload_server::{self, UploadServerOptions};

fn queue_for(endpoint: &str, ceiling: usize) -> UploadQueue {
    let executor = Arc::new(CurlUploadExecutor::with_endpoint(endpoint));
    let cfg = SchedulerConfig {
        ceiling,
        pass_delay: Duration::from_millis(20),
    };
    UploadQueue::spawn(executor, cfg)
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_uploads_complete_within_the_ceiling() {
    let (endpoint, stats) = upload_server::start(UploadServerOptions {
        delay: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let queue = queue_for(&endpoint, 2);

    queue.enqueue(vec![
        FileRef::from_bytes("a.bin", vec![1; 64]),
        FileRef::from_bytes("b.bin", vec![2; 128]),
        FileRef::from_bytes("c.bin", vec![3; 256]),
    ]);
    queue.wait_idle().await;

    let snap = queue.snapshot();
    assert_eq!(snap.jobs.len(), 3);
    for job in &snap.jobs {
        assert_eq!(job.status, JobStatus::Completed, "job {} should complete", job.file.name);
        let result = job.result.as_ref().expect("completed job carries a descriptor");
        assert_eq!(result.url, "/files/1");
        assert_eq!(job.progress, 100);
    }
    assert_eq!(stats.requests(), 3);
    assert!(
        stats.high_water() <= 2,
        "server observed {} concurrent uploads, ceiling is 2",
        stats.high_water()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn uploads_from_disk_paths_complete() {
    let (endpoint, stats) = upload_server::start(UploadServerOptions::default());
    let queue = queue_for(&endpoint, 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(&[7u8; 512]).unwrap();
    drop(f);

    let ids = queue.enqueue(vec![FileRef::from_path(&path).unwrap()]);
    assert_eq!(ids.len(), 1);
    queue.wait_idle().await;

    let snap = queue.snapshot();
    assert_eq!(snap.jobs[0].status, JobStatus::Completed);
    assert_eq!(snap.jobs[0].file.name, "report.pdf");
    assert_eq!(snap.jobs[0].file.size, 512);
    assert_eq!(stats.requests(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_drop_uploads_once() {
    let (endpoint, stats) = upload_server::start(UploadServerOptions::default());
    let queue = queue_for(&endpoint, 2);

    queue.enqueue(vec![FileRef::from_bytes("same.txt", vec![9; 32])]);
    queue.enqueue(vec![FileRef::from_bytes("same.txt", vec![9; 32])]);
    queue.wait_idle().await;

    assert_eq!(queue.snapshot().jobs.len(), 1);
    assert_eq!(stats.requests(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_rejection_surfaces_the_structured_message() {
    let (endpoint, _stats) = upload_server::start(UploadServerOptions {
        reject_names: vec!["evil.bin".to_string()],
        reject_message: "virus detected".to_string(),
        ..Default::default()
    });
    let queue = queue_for(&endpoint, 2);

    queue.enqueue(vec![
        FileRef::from_bytes("evil.bin", vec![0; 16]),
        FileRef::from_bytes("fine.bin", vec![0; 24]),
    ]);
    queue.wait_idle().await;

    let snap = queue.snapshot();
    let evil = snap.jobs.iter().find(|j| j.file.name == "evil.bin").unwrap();
    let fine = snap.jobs.iter().find(|j| j.file.name == "fine.bin").unwrap();
    assert_eq!(evil.status, JobStatus::Failed);
    assert_eq!(evil.error.as_deref(), Some("virus detected"));
    assert_eq!(fine.status, JobStatus::Completed, "a failed job blocks nobody");
    assert_eq!(snap.errors.len(), 1);
    assert!(snap.errors[0].contains("evil.bin"));
    assert!(snap.errors[0].contains("virus detected"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_descriptor_falls_back_to_placeholder() {
    let (endpoint, _stats) = upload_server::start(UploadServerOptions {
        omit_descriptor: true,
        ..Default::default()
    });
    let queue = queue_for(&endpoint, 1);

    queue.enqueue(vec![FileRef::from_bytes("noresp.dat", vec![5; 40])]);
    queue.wait_idle().await;

    let job = &queue.snapshot().jobs[0];
    assert_eq!(job.status, JobStatus::Completed);
    let result = job.result.as_ref().unwrap();
    assert_eq!(result.url, "#");
    assert_eq!(result.filename, "noresp.dat");
    assert_eq!(result.size, 40);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_yields_transport_failure() {
    // Bind then drop a listener so the port is very likely closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = format!("http://127.0.0.1:{}/api/upload", port);
    let queue = queue_for(&endpoint, 1);

    queue.enqueue(vec![FileRef::from_bytes("lost.bin", vec![0; 8])]);
    queue.wait_idle().await;

    let snap = queue.snapshot();
    assert_eq!(snap.jobs[0].status, JobStatus::Failed);
    assert!(snap.jobs[0].error.is_some(), "transport failures carry a message");
    assert_eq!(snap.errors.len(), 1);
}
