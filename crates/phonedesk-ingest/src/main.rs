//! Phonedesk - main entry point

use anyhow::Result;
use clap::Parser;
use phonedesk_common::logging::{init_logging, LogConfig, LogLevel};
use phonedesk_ingest::{commands, Cli, Commands, IngestConfig, StoreCommand};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // LOG_* and service settings may live in .env
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("phonedesk")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring invalid LOG_* settings: {:#}", e);
            log_config
        },
    };

    // A run should not fail because logging could not be set up
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    match execute_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

/// Execute the CLI command
async fn execute_command(cli: Cli) -> Result<()> {
    let mut config = IngestConfig::from_env()?;

    if let Some(store) = cli.store {
        config.run.store_path = store;
    }

    match cli.command {
        Commands::Run { dry_run, page_size } => {
            if let Some(page_size) = page_size {
                config.run.page_size = page_size;
                config.validate()?;
            }
            commands::run::run(&config, dry_run).await?;
        },
        Commands::Check => {
            commands::check::run(&config).await?;
        },
        Commands::Store {
            command: StoreCommand::Show,
        } => {
            commands::store::show(&config)?;
        },
    }

    Ok(())
}
