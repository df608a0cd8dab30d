//! Durable fingerprint set
//!
//! One JSON file holds every fingerprint that was ever filed successfully:
//!
//! ```json
//! { "version": 1, "hashes": ["9f86d0…", "…"], "last_run": "2026-10-19T06:00:00Z" }
//! ```
//!
//! The set only grows. Writes replace the file atomically, so a crash while
//! saving leaves the previous complete file in place.

use super::{Fingerprint, FINGERPRINT_SCHEMA_VERSION};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use phonedesk_common::digest::is_sha256_hex;
use phonedesk_common::state_file::{atomic_write_json, read_json};
use phonedesk_common::PhonedeskError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// In-memory view of the persisted store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintSet {
    version: u32,
    hashes: BTreeSet<Fingerprint>,
    last_run: Option<DateTime<Utc>>,
}

impl FingerprintSet {
    /// Empty set tagged with the current schema version
    pub fn new() -> Self {
        Self {
            version: FINGERPRINT_SCHEMA_VERSION,
            hashes: BTreeSet::new(),
            last_run: None,
        }
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.hashes.contains(fingerprint)
    }

    /// Add one fingerprint; returns whether it was new
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.hashes.insert(fingerprint)
    }

    /// Add confirmed fingerprints; returns how many were new
    pub fn merge<I>(&mut self, fingerprints: I) -> usize
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        fingerprints
            .into_iter()
            .filter(|fp| self.hashes.insert(fp.clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.hashes.iter()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}

impl Default for FingerprintSet {
    fn default() -> Self {
        Self::new()
    }
}

// Lenient on-disk shape: any field may be missing or malformed in a damaged file
#[derive(Deserialize)]
struct StoredSet {
    version: u32,
    #[serde(default)]
    hashes: Vec<String>,
    #[serde(default)]
    last_run: Option<DateTime<Utc>>,
}

/// File-backed fingerprint store
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted set.
    ///
    /// A missing file is an empty store. A file that is not valid JSON of the
    /// expected shape is reported as corrupt, copied aside to `<file>.corrupt`,
    /// and treated as empty. A different schema version or an I/O failure
    /// other than "not found" is an error.
    pub fn load(&self) -> Result<FingerprintSet, StoreError> {
        let stored: Option<StoredSet> = match read_json(&self.path) {
            Ok(stored) => stored,
            Err(PhonedeskError::Serialization(e)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Fingerprint store is corrupt, starting from an empty set"
                );
                self.preserve_corrupt_copy();
                return Ok(FingerprintSet::new());
            },
            Err(source) => {
                return Err(StoreError::Unreadable {
                    path: self.path.clone(),
                    source,
                })
            },
        };

        let Some(stored) = stored else {
            info!(path = %self.path.display(), "No fingerprint store yet, starting empty");
            return Ok(FingerprintSet::new());
        };

        if stored.version != FINGERPRINT_SCHEMA_VERSION {
            return Err(StoreError::VersionMismatch {
                path: self.path.clone(),
                found: stored.version,
                expected: FINGERPRINT_SCHEMA_VERSION,
            });
        }

        let total = stored.hashes.len();
        let hashes: BTreeSet<Fingerprint> = stored
            .hashes
            .into_iter()
            .filter(|h| is_sha256_hex(h))
            .map(|h| Fingerprint::from_hex(h.to_ascii_lowercase()))
            .collect();

        if hashes.len() < total {
            warn!(
                path = %self.path.display(),
                dropped = total - hashes.len(),
                "Ignored malformed or duplicate entries in fingerprint store"
            );
        }

        debug!(
            path = %self.path.display(),
            fingerprints = hashes.len(),
            last_run = ?stored.last_run,
            "Loaded fingerprint store"
        );

        Ok(FingerprintSet {
            version: stored.version,
            hashes,
            last_run: stored.last_run,
        })
    }

    /// Stamp `last_run` and atomically overwrite the store file
    pub fn save(&self, set: &mut FingerprintSet) -> Result<(), StoreError> {
        set.last_run = Some(Utc::now());

        atomic_write_json(&self.path, set).map_err(|source| StoreError::Persist {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            path = %self.path.display(),
            fingerprints = set.len(),
            "Persisted fingerprint store"
        );
        Ok(())
    }

    fn preserve_corrupt_copy(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".corrupt");

        if let Err(e) = std::fs::copy(&self.path, &backup) {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Could not keep a copy of the corrupt fingerprint store"
            );
        }
    }
}
