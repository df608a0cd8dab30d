//! Record fingerprints for cross-run deduplication
//!
//! A fingerprint is the SHA-256 of a fixed, ordered subset of a record's
//! columns joined by [`FINGERPRINT_DELIMITER`]. It is not the primary key:
//! editing any designated column after submission produces a new fingerprint,
//! and the record is filed again.
//!
//! The field list and delimiter are part of the persisted store format. Any
//! change to either must bump [`FINGERPRINT_SCHEMA_VERSION`].

pub mod store;

use crate::record::{columns, RawRecord};
use phonedesk_common::digest::sha256_joined;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use store::{FingerprintSet, FingerprintStore};

/// Version tag written into the store; bump on any change below
pub const FINGERPRINT_SCHEMA_VERSION: u32 = 1;

/// ASCII unit separator, never present in form input
pub const FINGERPRINT_DELIMITER: char = '\u{1f}';

/// Designated columns, in hashing order: identity, request content, creation time.
///
/// `created_at` comes from the row itself; if the upstream table rewrites it on
/// update, fingerprints churn and requests are re-filed.
pub const FINGERPRINT_FIELDS: [&str; 11] = [
    columns::NAME,
    columns::EMAIL,
    columns::PHONE,
    columns::DEPARTMENT,
    columns::COST_CENTER,
    columns::INSTALLATION_TYPE,
    columns::EQUIPMENT,
    columns::USAGE_TYPE,
    columns::ENDING_DATE,
    columns::NEEDED_BY,
    columns::CREATED_AT,
];

/// Hex SHA-256 identifying one logical request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a record. Absent or NULL designated columns hash as "".
    pub fn compute(record: &RawRecord) -> Self {
        let parts = FINGERPRINT_FIELDS
            .iter()
            .map(|column| record.text(column).unwrap_or_default());
        Self(sha256_joined(parts, FINGERPRINT_DELIMITER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`Fingerprint::compute`]
pub fn compute(record: &RawRecord) -> Fingerprint {
    Fingerprint::compute(record)
}
