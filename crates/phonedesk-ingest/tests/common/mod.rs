//! Shared fixtures for phonedesk integration tests
//!
//! - request rows that normalize cleanly
//! - a recording submission client with scripted rejections
//! - row sources that fail, hang, or run a hook before serving a page

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use phonedesk_ingest::error::SourceError;
use phonedesk_ingest::normalize::NormalizedRequest;
use phonedesk_ingest::record::RawRecord;
use phonedesk_ingest::source::{MemoryRowSource, RowSource};
use phonedesk_ingest::submit::{Outcome, SubmissionClient};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,phonedesk_ingest=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A request row that normalizes without errors; `n` makes it unique
pub fn request_row(n: usize) -> RawRecord {
    RawRecord::from_pairs([
        ("id", serde_json::json!(n)),
        ("name", serde_json::json!(format!("Requester {}", n))),
        ("job_title", serde_json::json!("Analyst")),
        ("phone", serde_json::json!(format!("555-{:04}", n))),
        ("email", serde_json::json!(format!("requester{}@company.com", n))),
        ("department", serde_json::json!("Finance")),
        ("cost_center", serde_json::json!("FI-100")),
        (
            "installation_type",
            serde_json::json!("New extension including new cabling and socket"),
        ),
        ("equipment", serde_json::json!("Handset speaker phone; Cordless headset")),
        ("usage_type", serde_json::json!("Permanent")),
        ("needed_by", serde_json::json!("2024-04-08")),
        ("comments", serde_json::json!("")),
        ("created_at", serde_json::json!("2024-03-01T09:30:00")),
    ])
}

pub fn request_rows(n: usize) -> Vec<RawRecord> {
    (0..n).map(request_row).collect()
}

/// Records every submission; requesters listed in `reject` get a 400
#[derive(Default)]
pub struct RecordingClient {
    submitted: Mutex<Vec<String>>,
    reject: HashSet<String>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            submitted: Mutex::new(Vec::new()),
            reject: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Requester names in submission order, rejected ones included
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl SubmissionClient for RecordingClient {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(request.name.clone());

        if self.reject.contains(&request.name) {
            Outcome::Rejected {
                status: 400,
                body: r#"{"errorMessage":"invalid field"}"#.to_string(),
            }
        } else {
            Outcome::Created {
                id: format!("PHONE-{}", submitted.len()),
            }
        }
    }
}

/// Never answers
pub struct HangingClient;

#[async_trait]
impl SubmissionClient for HangingClient {
    async fn submit(&self, _request: &NormalizedRequest) -> Outcome {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Outcome::TransportError("unreachable".to_string())
    }
}

/// Stalls on the first attempt for each requester, then files on the next
pub struct FlakyClient {
    first_attempt: Duration,
    seen: Mutex<HashSet<String>>,
    calls: Mutex<usize>,
}

impl FlakyClient {
    /// First attempt fails with a transport error after `delay`
    pub fn failing_after(delay: Duration) -> Self {
        Self {
            first_attempt: delay,
            seen: Mutex::new(HashSet::new()),
            calls: Mutex::new(0),
        }
    }

    /// First attempt never answers
    pub fn hanging_once() -> Self {
        Self::failing_after(Duration::from_secs(3600))
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SubmissionClient for FlakyClient {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        *self.calls.lock().unwrap() += 1;
        let first = self.seen.lock().unwrap().insert(request.name.clone());
        if first {
            tokio::time::sleep(self.first_attempt).await;
            return Outcome::TransportError("connection reset".to_string());
        }
        Outcome::Created {
            id: format!("PHONE-{}", request.name),
        }
    }
}

/// What a [`ScriptedSource`] does on a given page request
pub enum PageFault {
    Fail,
    Hang,
}

/// Memory source that misbehaves on one page request and can run a hook first
pub struct ScriptedSource {
    inner: MemoryRowSource,
    calls: usize,
    fault_on_call: Option<(usize, PageFault)>,
    before_first_page: Option<Box<dyn FnOnce() + Send>>,
}

impl ScriptedSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            inner: MemoryRowSource::new(records),
            calls: 0,
            fault_on_call: None,
            before_first_page: None,
        }
    }

    /// Misbehave on page request `call` (1-based)
    pub fn fault_on(mut self, call: usize, fault: PageFault) -> Self {
        self.fault_on_call = Some((call, fault));
        self
    }

    pub fn before_first_page(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.before_first_page = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl RowSource for ScriptedSource {
    async fn next_page(&mut self, page_size: usize) -> Result<Vec<RawRecord>, SourceError> {
        self.calls += 1;

        if let Some(hook) = self.before_first_page.take() {
            hook();
        }

        match &self.fault_on_call {
            Some((call, PageFault::Fail)) if *call == self.calls => {
                Err(SourceError::Database(sqlx::Error::PoolTimedOut))
            },
            Some((call, PageFault::Hang)) if *call == self.calls => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            },
            _ => self.inner.next_page(page_size).await,
        }
    }
}
