//! Client for the remote file service's browsing surface.
//!
//! Listing and deletion live outside the scheduler: they back the file
//! browser, not the upload queue. Calls use the same libcurl-on-blocking-pool
//! arrangement as the upload executor.

pub mod types;

pub use types::{FileListing, Pagination, RemoteFile};

use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::UpqConfig;
use crate::executor::error::classify_response;

#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    connect_timeout: Duration,
    transfer_timeout: Duration,
}

impl RemoteClient {
    pub fn new(cfg: &UpqConfig) -> Self {
        Self {
            base_url: cfg.server_url.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs),
        }
    }

    /// `GET /api/files?page&limit&search` — paginated listing.
    pub async fn list_files(
        &self,
        page: u64,
        limit: u64,
        search: Option<&str>,
    ) -> Result<FileListing> {
        let mut url = format!("{}/api/files?page={}&limit={}", self.base_url, page, limit);
        if let Some(term) = search {
            url.push_str("&search=");
            url.push_str(&percent_encode(term));
        }
        let body = self.request("GET", url).await?;
        serde_json::from_slice(&body).context("malformed file listing response")
    }

    /// `DELETE /api/files/{id}` — deletes one stored file.
    pub async fn delete_file(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/files/{}", self.base_url, percent_encode(id));
        self.request("DELETE", url).await?;
        Ok(())
    }

    async fn request(&self, method: &'static str, url: String) -> Result<Vec<u8>> {
        let connect_timeout = self.connect_timeout;
        let transfer_timeout = self.transfer_timeout;
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let mut easy = curl::easy::Easy::new();
            easy.url(&url).context("invalid URL")?;
            easy.connect_timeout(connect_timeout)?;
            easy.timeout(transfer_timeout)?;
            if method != "GET" {
                easy.custom_request(method)?;
            }

            let mut body = Vec::new();
            {
                let mut transfer = easy.transfer();
                transfer.write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })?;
                transfer
                    .perform()
                    .with_context(|| format!("{} {} failed", method, url))?;
            }

            let code = easy.response_code().context("no response code")?;
            if !(200..300).contains(&code) {
                anyhow::bail!("{}", classify_response(code, &body));
            }
            Ok(body)
        })
        .await
        .context("remote request task join")?
    }
}

/// Minimal percent-encoding for query/path components (space and URL
/// metacharacters only; the server tolerates the rest).
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            '+' => out.push_str("%2B"),
            '=' => out.push_str("%3D"),
            '/' => out.push_str("%2F"),
            c => out.push(c),
        }
    }
    out
}
