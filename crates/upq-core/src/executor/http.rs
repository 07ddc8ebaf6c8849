//! Multipart upload over libcurl.
//!
//! One Easy transfer per job, run on the blocking pool; libcurl's progress
//! callback feeds the scheduler's progress contract while the transfer is in
//! flight.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::UpqConfig;
use crate::queue::{FilePayload, FileRef, JobRecord, UploadedFile};

use super::error::{classify_response, UploadError};
use super::{Outcome, ProgressFn, UploadExecutor};

/// Production executor: `POST {server}/api/upload`, multipart field `files`.
#[derive(Debug, Clone)]
pub struct CurlUploadExecutor {
    endpoint: String,
    connect_timeout: Duration,
    transfer_timeout: Duration,
}

impl CurlUploadExecutor {
    pub fn new(cfg: &UpqConfig) -> Self {
        Self {
            endpoint: format!("{}/api/upload", cfg.server_url.trim_end_matches('/')),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs),
        }
    }

    /// Executor pointed at an explicit endpoint URL (tests, ad-hoc servers).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(15),
            transfer_timeout: Duration::from_secs(3600),
        }
    }
}

#[async_trait]
impl UploadExecutor for CurlUploadExecutor {
    async fn run(&self, job: JobRecord, progress: ProgressFn) -> Outcome {
        let endpoint = self.endpoint.clone();
        let connect_timeout = self.connect_timeout;
        let transfer_timeout = self.transfer_timeout;
        let result = tokio::task::spawn_blocking(move || {
            match try_transfer(
                &endpoint,
                &job.file,
                connect_timeout,
                transfer_timeout,
                progress,
            ) {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failed(e),
            }
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(UploadError::Transport(format!("upload task join: {}", e))),
        }
    }
}

fn try_transfer(
    endpoint: &str,
    file: &FileRef,
    connect_timeout: Duration,
    transfer_timeout: Duration,
    progress: ProgressFn,
) -> Result<Outcome, UploadError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(endpoint)?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(transfer_timeout)?;
    easy.progress(true)?;

    let mut form = curl::easy::Form::new();
    {
        let mut part = form.part("files");
        match &file.payload {
            FilePayload::Path(path) => {
                part.file(path).filename(&file.name);
            }
            FilePayload::Bytes(bytes) => {
                part.buffer(&file.name, bytes.as_ref().clone());
            }
        }
        part.add()?;
    }
    easy.httppost(form)?;

    let mut body = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.progress_function(move |_dltotal, _dlnow, ultotal, ulnow| {
            progress(ulnow as u64, ultotal as u64);
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if (200..300).contains(&code) {
        Ok(Outcome::Completed(parse_success(&body, file)))
    } else {
        Err(classify_response(code, &body))
    }
}

#[derive(Debug, Default, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    files: Vec<UploadedFile>,
}

/// First descriptor from the response `files` array, or a locally synthesized
/// placeholder when the response omits one.
fn parse_success(body: &[u8], file: &FileRef) -> UploadedFile {
    serde_json::from_slice::<UploadResponse>(body)
        .ok()
        .and_then(|r| r.files.into_iter().next())
        .unwrap_or_else(|| UploadedFile::placeholder(file))
}
