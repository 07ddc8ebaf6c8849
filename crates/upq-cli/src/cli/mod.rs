//! CLI for the UPQ upload queue manager.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use upq_core::config;

use commands::{run_completions, run_delete, run_list, run_upload};

/// Top-level CLI for the UPQ upload queue manager.
#[derive(Debug, Parser)]
#[command(name = "upq")]
#[command(about = "UPQ: concurrent upload queue manager", long_about = None)]
pub struct Cli {
    /// Override the server base URL from the config file.
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload one or more files through the bounded queue.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Run up to N uploads concurrently (overrides the config ceiling).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// List files stored on the server.
    List {
        /// Page number (1-based).
        #[arg(long, default_value = "1")]
        page: u64,

        /// Results per page.
        #[arg(long, default_value = "10")]
        limit: u64,

        /// Filter by name or type.
        #[arg(long)]
        search: Option<String>,
    },

    /// Delete a stored file by its id.
    Delete {
        /// Remote file identifier.
        id: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let mut cfg = config::load_or_init()?;
        if let Some(server) = cli.server {
            cfg.server_url = server;
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Upload { paths, jobs } => run_upload(&cfg, &paths, jobs).await?,
            CliCommand::List { page, limit, search } => {
                run_list(&cfg, page, limit, search.as_deref()).await?;
            }
            CliCommand::Delete { id } => run_delete(&cfg, &id).await?,
            CliCommand::Completions { .. } => unreachable!("handled above"),
        }

        Ok(())
    }
}
