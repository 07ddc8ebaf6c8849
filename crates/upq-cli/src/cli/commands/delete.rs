//! `upq delete` – delete one stored file by id.

use anyhow::Result;

use upq_core::config::UpqConfig;
use upq_core::remote::RemoteClient;

pub async fn run_delete(cfg: &UpqConfig, id: &str) -> Result<()> {
    let client = RemoteClient::new(cfg);
    client.delete_file(id).await?;
    println!("deleted {}", id);
    Ok(())
}
