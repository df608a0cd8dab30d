//! Phonedesk Common Library
//!
//! Shared utilities and error handling for the phonedesk workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`PhonedeskError`] and the crate [`Result`] alias
//! - **Digests**: SHA-256 helpers used for record fingerprints
//! - **State Files**: atomic JSON persistence for small durable blobs
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use phonedesk_common::digest::sha256_joined;
//!
//! let fingerprint = sha256_joined(["Jane Smith", "jane.smith@company.com"], '\u{1f}');
//! assert_eq!(fingerprint.len(), 64);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod digest;
pub mod error;
pub mod logging;
pub mod state_file;

// Re-export commonly used types
pub use error::{PhonedeskError, Result};
