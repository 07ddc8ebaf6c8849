use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/upq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpqConfig {
    /// Base URL of the upload service (e.g. "http://localhost:3000").
    pub server_url: String,
    /// Maximum number of uploads in flight at once (the admission ceiling).
    pub max_concurrent_uploads: usize,
    /// Delay in milliseconds before re-running a scheduling pass after a
    /// failed upload, so instantly-failing endpoints don't spin the loop.
    #[serde(default = "default_pass_delay_ms")]
    pub pass_delay_ms: u64,
    /// Connect timeout for each transfer, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Overall timeout for each transfer, in seconds.
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u64,
}

fn default_pass_delay_ms() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_transfer_timeout_secs() -> u64 {
    3600
}

impl Default for UpqConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            max_concurrent_uploads: 2,
            pass_delay_ms: default_pass_delay_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            transfer_timeout_secs: default_transfer_timeout_secs(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("upq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<UpqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = UpqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: UpqConfig = toml::from_str(&data)?;
    Ok(cfg)
}
