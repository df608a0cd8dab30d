//! Configuration management

use crate::driver::{DriverOptions, DEFAULT_PAGE_SIZE};
use crate::source::postgres::{DEFAULT_ORDER_COLUMN, DEFAULT_SOURCE_TABLE};
use crate::source::SourceConfig;
use crate::submit::{RetryPolicy, ServiceDeskConfig};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Ingest Configuration Constants
// ============================================================================

/// Default source connection string for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/phonedesk";

/// Default database connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default page fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Default submission timeout in seconds.
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;

/// Default fingerprint store location.
pub const DEFAULT_STORE_PATH: &str = "phonedesk-fingerprints.json";

/// Default submission attempts (1 = no retry).
pub const DEFAULT_SUBMIT_MAX_ATTEMPTS: u32 = 1;

/// Default first retry delay in milliseconds.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Ingest configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub source: SourceSettings,
    pub service_desk: ServiceDeskSettings,
    pub run: RunSettings,
}

/// Upstream database settings
#[derive(Clone)]
pub struct SourceSettings {
    pub url: String,
    pub table: String,
    pub order_by: String,
    pub connect_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSettings")
            .field("url", &"<redacted>")
            .field("table", &self.table)
            .field("order_by", &self.order_by)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .finish()
    }
}

/// Service desk settings; only required when tickets are actually filed
#[derive(Clone, Default)]
pub struct ServiceDeskSettings {
    pub url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub service_desk_id: Option<String>,
    pub request_type_id: Option<String>,
    pub timeout_secs: u64,
}

impl fmt::Debug for ServiceDeskSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDeskSettings")
            .field("url", &self.url)
            .field("email", &self.email)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("service_desk_id", &self.service_desk_id)
            .field("request_type_id", &self.request_type_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Run-level settings
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub store_path: PathBuf,
    pub page_size: usize,
    pub submit_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl IngestConfig {
    /// Read configuration from environment variables and defaults.
    ///
    /// `.env` is loaded once by the binary before logging starts.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = IngestConfig {
            source: SourceSettings {
                url: std::env::var("DB_CREDENTIALS")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                table: std::env::var("PHONEDESK_SOURCE_TABLE")
                    .unwrap_or_else(|_| DEFAULT_SOURCE_TABLE.to_string()),
                order_by: std::env::var("PHONEDESK_SOURCE_ORDER_BY")
                    .unwrap_or_else(|_| DEFAULT_ORDER_COLUMN.to_string()),
                connect_timeout_secs: env_parse(
                    "PHONEDESK_CONNECT_TIMEOUT_SECS",
                    DEFAULT_CONNECT_TIMEOUT_SECS,
                )?,
                fetch_timeout_secs: env_parse(
                    "PHONEDESK_FETCH_TIMEOUT_SECS",
                    DEFAULT_FETCH_TIMEOUT_SECS,
                )?,
            },
            service_desk: ServiceDeskSettings {
                url: env_opt("JIRA_URL"),
                email: env_opt("JIRA_EMAIL"),
                api_token: env_opt("JIRA_API_TOKEN"),
                service_desk_id: env_opt("SERVICE_DESK_ID"),
                request_type_id: env_opt("REQUEST_TYPE_ID"),
                timeout_secs: env_parse(
                    "PHONEDESK_SUBMIT_TIMEOUT_SECS",
                    DEFAULT_SUBMIT_TIMEOUT_SECS,
                )?,
            },
            run: RunSettings {
                store_path: std::env::var("PHONEDESK_STORE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH)),
                page_size: env_parse("PHONEDESK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
                submit_max_attempts: env_parse(
                    "PHONEDESK_SUBMIT_MAX_ATTEMPTS",
                    DEFAULT_SUBMIT_MAX_ATTEMPTS,
                )?,
                retry_base_delay_ms: env_parse(
                    "PHONEDESK_RETRY_BASE_DELAY_MS",
                    DEFAULT_RETRY_BASE_DELAY_MS,
                )?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source.url.is_empty() {
            anyhow::bail!("DB_CREDENTIALS cannot be empty");
        }

        if self.run.page_size == 0 {
            anyhow::bail!("Page size must be greater than 0");
        }

        if self.source.fetch_timeout_secs == 0 || self.service_desk.timeout_secs == 0 {
            anyhow::bail!("Fetch and submit timeouts must be greater than 0");
        }

        if self.run.submit_max_attempts == 0 {
            anyhow::bail!("PHONEDESK_SUBMIT_MAX_ATTEMPTS must be at least 1");
        }

        if self.run.store_path.as_os_str().is_empty() {
            anyhow::bail!("Fingerprint store path cannot be empty");
        }

        if self.run.submit_max_attempts > 1 {
            tracing::warn!(
                attempts = self.run.submit_max_attempts,
                "Submission retries enabled; a retried timeout can file a duplicate ticket"
            );
        }

        Ok(())
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            url: self.source.url.clone(),
            table: self.source.table.clone(),
            order_by: self.source.order_by.clone(),
            connect_timeout: Duration::from_secs(self.source.connect_timeout_secs),
        }
    }

    /// Service desk connection, failing with every missing variable named
    pub fn service_desk_config(&self) -> anyhow::Result<ServiceDeskConfig> {
        let desk = &self.service_desk;
        let missing: Vec<&str> = [
            ("JIRA_URL", &desk.url),
            ("JIRA_EMAIL", &desk.email),
            ("JIRA_API_TOKEN", &desk.api_token),
            ("SERVICE_DESK_ID", &desk.service_desk_id),
            ("REQUEST_TYPE_ID", &desk.request_type_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            anyhow::bail!(
                "Service desk is not configured; set {}",
                missing.join(", ")
            );
        }

        Ok(ServiceDeskConfig {
            base_url: desk.url.clone().unwrap_or_default(),
            email: desk.email.clone().unwrap_or_default(),
            api_token: desk.api_token.clone().unwrap_or_default(),
            service_desk_id: desk.service_desk_id.clone().unwrap_or_default(),
            request_type_id: desk.request_type_id.clone().unwrap_or_default(),
            timeout: self.submit_timeout(),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.run.submit_max_attempts,
            Duration::from_millis(self.run.retry_base_delay_ms),
        )
    }

    /// Bound on one submission attempt
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.service_desk.timeout_secs)
    }

    /// Driver tunables; the submit deadline spans every retry attempt
    pub fn driver_options(&self, persist: bool) -> DriverOptions {
        DriverOptions {
            page_size: self.run.page_size,
            fetch_timeout: Duration::from_secs(self.source.fetch_timeout_secs),
            submit_timeout: self.retry_policy().budget(self.submit_timeout()),
            persist,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: SourceSettings {
                url: DEFAULT_DATABASE_URL.to_string(),
                table: DEFAULT_SOURCE_TABLE.to_string(),
                order_by: DEFAULT_ORDER_COLUMN.to_string(),
                connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
                fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            service_desk: ServiceDeskSettings {
                timeout_secs: DEFAULT_SUBMIT_TIMEOUT_SECS,
                ..ServiceDeskSettings::default()
            },
            run: RunSettings {
                store_path: PathBuf::from(DEFAULT_STORE_PATH),
                page_size: DEFAULT_PAGE_SIZE,
                submit_max_attempts: DEFAULT_SUBMIT_MAX_ATTEMPTS,
                retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            },
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", raw, key, e)),
        Err(_) => Ok(default),
    }
}
