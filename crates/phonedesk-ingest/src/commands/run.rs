//! `phonedesk run` command implementation
//!
//! Files tickets for every new request row.

use crate::config::IngestConfig;
use crate::driver::{BatchDriver, RunSummary};
use crate::fingerprint::FingerprintStore;
use crate::source::PgRowSource;
use crate::submit::{DryRunClient, RetryingClient, ServiceDeskClient};
use anyhow::{Context, Result};
use tracing::info;

/// Run the pipeline once; prints the summary line whether or not the run aborts
pub async fn run(config: &IngestConfig, dry_run: bool) -> Result<RunSummary> {
    let source = PgRowSource::connect_lazy(&config.source_config())
        .context("Invalid source configuration")?;
    let store = FingerprintStore::new(&config.run.store_path);

    let result = if dry_run {
        info!("Dry run: nothing will be submitted or persisted");
        BatchDriver::new(source, DryRunClient, store, config.driver_options(false))
            .run()
            .await
    } else {
        let desk = config.service_desk_config()?;
        let client = ServiceDeskClient::new(desk).context("Failed to build HTTP client")?;
        let client = RetryingClient::new(client, config.retry_policy())
            .with_attempt_timeout(config.submit_timeout());
        BatchDriver::new(source, client, store, config.driver_options(true))
            .run()
            .await
    };

    match result {
        Ok(summary) => {
            println!("{}", summary);
            Ok(summary)
        },
        Err(aborted) => {
            println!("{}", aborted.summary);
            Err(aborted.into())
        },
    }
}
