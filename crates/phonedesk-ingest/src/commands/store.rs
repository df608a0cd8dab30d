//! `phonedesk store` command implementation

use crate::config::IngestConfig;
use crate::fingerprint::FingerprintStore;
use anyhow::{Context, Result};

/// Print version, fingerprint count and last run of the store
pub fn show(config: &IngestConfig) -> Result<()> {
    let store = FingerprintStore::new(&config.run.store_path);
    let set = store
        .load()
        .with_context(|| format!("Could not load {}", store.path().display()))?;

    println!("Path:         {}", store.path().display());
    println!("Version:      {}", set.version());
    println!("Fingerprints: {}", set.len());
    match set.last_run() {
        Some(at) => println!("Last run:     {}", at.to_rfc3339()),
        None => println!("Last run:     never"),
    }

    Ok(())
}
