//! `phonedesk check` command implementation
//!
//! Connects to the source, counts its rows and how many of them have not
//! been filed yet, and reports whether the service desk is configured.

use crate::config::IngestConfig;
use crate::error::SourceError;
use crate::fingerprint::{Fingerprint, FingerprintSet, FingerprintStore};
use crate::source::{PgRowSource, RowSource};
use anyhow::{Context, Result};

/// Rows seen during a check scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCount {
    pub scanned: usize,
    pub filed: usize,
    pub pending: usize,
}

/// Check connectivity and pending work
pub async fn run(config: &IngestConfig) -> Result<PendingCount> {
    let mut source = PgRowSource::connect_lazy(&config.source_config())
        .context("Invalid source configuration")?;

    let total = source
        .count()
        .await
        .context("Could not reach the source database")?;
    println!("Source:       {} ({} rows)", source.table(), total);

    let known = FingerprintStore::new(&config.run.store_path)
        .load()
        .context("Could not load the fingerprint store")?;
    println!(
        "Store:        {} ({} fingerprints)",
        config.run.store_path.display(),
        known.len()
    );

    let counts = count_pending(&mut source, &known, config.run.page_size)
        .await
        .context("Failed to scan the source")?;
    println!("Pending:      {} of {} rows", counts.pending, counts.scanned);

    match config.service_desk_config() {
        Ok(desk) => println!("Service desk: {}", desk.base_url),
        Err(e) => println!("Service desk: not configured ({})", e),
    }

    Ok(counts)
}

/// Scan every page and split rows into already-filed and pending
pub async fn count_pending<S: RowSource>(
    source: &mut S,
    known: &FingerprintSet,
    page_size: usize,
) -> Result<PendingCount, SourceError> {
    let mut counts = PendingCount::default();

    loop {
        let page = source.next_page(page_size).await?;
        for record in &page {
            counts.scanned += 1;
            if known.contains(&Fingerprint::compute(record)) {
                counts.filed += 1;
            } else {
                counts.pending += 1;
            }
        }
        if page.len() < page_size {
            return Ok(counts);
        }
    }
}
