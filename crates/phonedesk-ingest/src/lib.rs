//! Phonedesk ingest library
//!
//! Files phone-equipment requests from an upstream PostgreSQL table as
//! service-desk tickets, once per distinct request.
//!
//! # Pipeline
//!
//! - **Source** ([`source`]): pages the request table in a stable order
//! - **Fingerprint** ([`fingerprint`]): content hash of each row plus the
//!   persistent set of hashes already filed
//! - **Normalize** ([`normalize`]): maps free-text form answers to the
//!   service desk's option codes
//! - **Submit** ([`submit`]): files one ticket per request
//! - **Driver** ([`driver`]): ties the above together page by page and
//!   persists confirmed fingerprints after every page
//!
//! # Example
//!
//! ```no_run
//! use phonedesk_ingest::driver::{BatchDriver, DriverOptions};
//! use phonedesk_ingest::fingerprint::FingerprintStore;
//! use phonedesk_ingest::source::MemoryRowSource;
//! use phonedesk_ingest::submit::DryRunClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = MemoryRowSource::new(Vec::new());
//!     let store = FingerprintStore::new("fingerprints.json");
//!     let mut driver = BatchDriver::new(source, DryRunClient, store, DriverOptions::default());
//!     let summary = driver.run().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod normalize;
pub mod record;
pub mod source;
pub mod submit;

// Re-export commonly used types
pub use config::IngestConfig;
pub use driver::{BatchDriver, BatchOutcome, DriverOptions, RunAborted, RunStatus, RunSummary};
pub use error::{NormalizeError, PipelineError, SourceError, StoreError};
pub use record::RawRecord;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Phonedesk - file phone equipment requests as service desk tickets
#[derive(Parser, Debug)]
#[command(name = "phonedesk")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fingerprint store file (overrides PHONEDESK_STORE_PATH)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// File a ticket for every request row not filed before
    Run {
        /// Fetch, fingerprint and normalize only; never submit or persist
        #[arg(long)]
        dry_run: bool,

        /// Rows per page (overrides PHONEDESK_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Check the source connection and count rows not filed yet
    Check,

    /// Inspect the fingerprint store
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
}

/// Fingerprint store subcommands
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Show version, fingerprint count and last run
    Show,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "phonedesk",
            "run",
            "--dry-run",
            "--page-size",
            "250",
            "--store",
            "/tmp/fp.json",
        ])
        .unwrap();

        assert_eq!(cli.store, Some(PathBuf::from("/tmp/fp.json")));
        match cli.command {
            Commands::Run { dry_run, page_size } => {
                assert!(dry_run);
                assert_eq!(page_size, Some(250));
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_store_show() {
        let cli = Cli::try_parse_from(["phonedesk", "-v", "store", "show"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Store {
                command: StoreCommand::Show
            }
        ));
    }
}
