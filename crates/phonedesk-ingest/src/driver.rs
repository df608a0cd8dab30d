//! Batch driver
//!
//! Pulls the source page by page and walks every record through
//! fingerprint filter, normalization and submission:
//!
//! ```text
//! Fetching -> Filtering -> Normalizing -> Submitting -> Persisting -> (Fetching | Done)
//! ```
//!
//! Fingerprints are recorded only after the remote system confirmed the
//! ticket, and the store is written after every page. A crash therefore
//! loses at most the confirmations of the page in flight, and a rerun only
//! files what was never confirmed.

use crate::error::{PipelineError, SourceError};
use crate::fingerprint::{Fingerprint, FingerprintSet, FingerprintStore};
use crate::normalize::{normalize, NormalizedRequest};
use crate::record::{columns, RawRecord};
use crate::source::RowSource;
use crate::submit::{Outcome, SubmissionClient};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

// ============================================================================
// Driver Constants
// ============================================================================

/// Default records per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Default bound on one page fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound on one submission
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for one run
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub page_size: usize,
    pub fetch_timeout: Duration,
    pub submit_timeout: Duration,
    /// Write the fingerprint store after each page; off for dry runs
    pub persist: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            persist: true,
        }
    }
}

/// Where the driver currently is in its page cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Fetching,
    Filtering,
    Normalizing,
    Submitting,
    Persisting,
    Done,
    Aborted,
}

impl DriverState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverState::Fetching => "fetching",
            DriverState::Filtering => "filtering",
            DriverState::Normalizing => "normalizing",
            DriverState::Submitting => "submitting",
            DriverState::Persisting => "persisting",
            DriverState::Done => "done",
            DriverState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Done | DriverState::Aborted)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts reported at the end of every run, including aborted ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub pages: usize,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl RunSummary {
    /// Records seen across all processed pages
    pub fn total(&self) -> usize {
        self.submitted + self.skipped + self.failed
    }

    pub fn log(&self) {
        match self.status {
            RunStatus::Completed => info!(
                submitted = self.submitted,
                skipped = self.skipped,
                failed = self.failed,
                pages = self.pages,
                elapsed_ms = self.elapsed.as_millis() as u64,
                status = %self.status,
                "Run finished"
            ),
            RunStatus::Aborted => error!(
                submitted = self.submitted,
                skipped = self.skipped,
                failed = self.failed,
                pages = self.pages,
                elapsed_ms = self.elapsed.as_millis() as u64,
                status = %self.status,
                "Run finished"
            ),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {}: {} submitted, {} skipped, {} failed across {} page(s) in {:.1}s",
            self.status,
            self.submitted,
            self.skipped,
            self.failed,
            self.pages,
            self.elapsed.as_secs_f64()
        )
    }
}

/// A fatal error together with the partial counts reached before it
#[derive(Error, Debug)]
#[error("Run aborted: {error}")]
pub struct RunAborted {
    pub summary: RunSummary,
    #[source]
    pub error: PipelineError,
}

/// Tally of one page plus the fingerprints it confirmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub submitted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Fingerprints of records the remote system accepted, in hash order
    pub confirmed: Vec<Fingerprint>,
}

impl BatchOutcome {
    pub fn records(&self) -> usize {
        self.submitted + self.skipped + self.failed
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: usize,
    skipped: usize,
    failed: usize,
    pages: usize,
}

impl Counters {
    fn fold(&mut self, batch: &BatchOutcome) {
        self.submitted += batch.submitted;
        self.skipped += batch.skipped;
        self.failed += batch.failed;
        self.pages += 1;
    }

    fn finish(&self, elapsed: Duration, status: RunStatus) -> RunSummary {
        RunSummary {
            submitted: self.submitted,
            skipped: self.skipped,
            failed: self.failed,
            pages: self.pages,
            elapsed,
            status,
        }
    }
}

/// Sequential page-at-a-time pipeline over a row source and a submission client
pub struct BatchDriver<S, C> {
    source: S,
    client: C,
    store: FingerprintStore,
    options: DriverOptions,
    state: DriverState,
}

impl<S: RowSource, C: SubmissionClient> BatchDriver<S, C> {
    pub fn new(source: S, client: C, store: FingerprintStore, options: DriverOptions) -> Self {
        Self {
            source,
            client,
            store,
            options,
            state: DriverState::Fetching,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until the source is exhausted or a fatal error occurs.
    ///
    /// The summary is logged in both cases; on abort it travels inside
    /// [`RunAborted`] with the counts reached so far.
    pub async fn run(&mut self) -> Result<RunSummary, RunAborted> {
        let started = Instant::now();
        let mut counters = Counters::default();

        info!(
            page_size = self.options.page_size,
            store = %self.store.path().display(),
            persist = self.options.persist,
            "Starting run"
        );

        let result = self.run_pages(&mut counters).await;
        let elapsed = started.elapsed();

        match result {
            Ok(()) => {
                self.state = DriverState::Done;
                let summary = counters.finish(elapsed, RunStatus::Completed);
                summary.log();
                Ok(summary)
            },
            Err(error) => {
                self.state = DriverState::Aborted;
                error!(error = %error, "Run aborted");
                let summary = counters.finish(elapsed, RunStatus::Aborted);
                summary.log();
                Err(RunAborted { summary, error })
            },
        }
    }

    async fn run_pages(&mut self, counters: &mut Counters) -> Result<(), PipelineError> {
        let mut known = self.store.load().map_err(PipelineError::StoreLoad)?;
        info!(fingerprints = known.len(), "Loaded fingerprint store");

        loop {
            self.state = DriverState::Fetching;
            let page = self.fetch_page().await?;
            if page.is_empty() {
                debug!(pages = counters.pages, "Source exhausted");
                return Ok(());
            }

            let page_len = page.len();
            let batch = self.process_page(&page, &known).await;
            counters.fold(&batch);

            self.state = DriverState::Persisting;
            let added = known.merge(batch.confirmed.iter().cloned());
            if self.options.persist {
                self.store
                    .save(&mut known)
                    .map_err(PipelineError::StorePersistFailure)?;
            }

            info!(
                page = counters.pages,
                records = page_len,
                submitted = batch.submitted,
                skipped = batch.skipped,
                failed = batch.failed,
                new_fingerprints = added,
                "Page complete"
            );

            if page_len < self.options.page_size {
                return Ok(());
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<Vec<RawRecord>, PipelineError> {
        let limit = self.options.fetch_timeout;
        match timeout(limit, self.source.next_page(self.options.page_size)).await {
            Ok(page) => Ok(page?),
            Err(_) => Err(SourceError::Timeout(limit).into()),
        }
    }

    async fn process_page(&mut self, page: &[RawRecord], known: &FingerprintSet) -> BatchOutcome {
        let mut batch = BatchOutcome::default();
        // Identical rows within one page are filed once
        let mut staged = BTreeSet::new();

        for record in page {
            self.state = DriverState::Filtering;
            let fingerprint = Fingerprint::compute(record);
            let record_id = record.text(columns::ID);

            if known.contains(&fingerprint) || staged.contains(&fingerprint) {
                batch.skipped += 1;
                debug!(fingerprint = %fingerprint.short(), record_id = ?record_id, "Already filed, skipping");
                continue;
            }

            self.state = DriverState::Normalizing;
            let request = match normalize(record) {
                Ok(request) => request,
                Err(e) => {
                    batch.failed += 1;
                    warn!(
                        fingerprint = %fingerprint.short(),
                        record_id = ?record_id,
                        error = %e,
                        "Record could not be normalized"
                    );
                    continue;
                },
            };

            self.state = DriverState::Submitting;
            match self.submit(&request).await {
                Outcome::Created { id } => {
                    batch.submitted += 1;
                    debug!(
                        fingerprint = %fingerprint.short(),
                        record_id = ?record_id,
                        issue = %id,
                        "Submitted"
                    );
                    staged.insert(fingerprint);
                },
                Outcome::Rejected { status, body } => {
                    batch.failed += 1;
                    warn!(
                        fingerprint = %fingerprint.short(),
                        record_id = ?record_id,
                        status,
                        body = %body,
                        "Submission rejected"
                    );
                },
                Outcome::TransportError(message) => {
                    batch.failed += 1;
                    warn!(
                        fingerprint = %fingerprint.short(),
                        record_id = ?record_id,
                        error = %message,
                        "Submission failed"
                    );
                },
            }
        }

        batch.confirmed = staged.into_iter().collect();
        batch
    }

    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        let limit = self.options.submit_timeout;
        match timeout(limit, self.client.submit(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Outcome::TransportError(format!("submission timed out after {:?}", limit)),
        }
    }
}
