//! Ticket submission
//!
//! [`SubmissionClient`] is the seam between the batch driver and the remote
//! service desk. Clients classify every attempt into an [`Outcome`]; they never
//! return errors, so a single bad record cannot stop a run.

pub mod retry;
pub mod service_desk;

use crate::normalize::NormalizedRequest;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub use retry::{RetryPolicy, RetryingClient};
pub use service_desk::{ServiceDeskClient, ServiceDeskConfig};

/// Result of one submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Ticket filed; `id` is the remote identifier (issue key)
    Created { id: String },
    /// The service answered with a non-2xx status. Permanent for this run.
    Rejected { status: u16, body: String },
    /// No usable answer: connect failure, timeout, broken response
    TransportError(String),
}

impl Outcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created { .. })
    }

    /// Only transport errors may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::TransportError(_))
    }
}

/// Files one request with the remote system
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome;
}

#[async_trait]
impl<T: SubmissionClient + ?Sized> SubmissionClient for Arc<T> {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        (**self).submit(request).await
    }
}

#[async_trait]
impl<T: SubmissionClient + ?Sized> SubmissionClient for Box<T> {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        (**self).submit(request).await
    }
}

/// Logs the request and reports it as created without any network call
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunClient;

/// Identifier reported by [`DryRunClient`]
pub const DRY_RUN_ID: &str = "DRY-RUN";

#[async_trait]
impl SubmissionClient for DryRunClient {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        info!(
            summary = %request.summary(),
            installation_type = ?request.installation_type,
            equipment = ?request.equipment,
            usage_type = ?request.usage_type,
            ending_date = ?request.ending_date,
            needed_by = %request.needed_by,
            "Dry run: would file request"
        );
        Outcome::Created {
            id: DRY_RUN_ID.to_string(),
        }
    }
}
