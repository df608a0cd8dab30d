//! Configuration loading from environment variables
//!
//! These tests mutate the process environment, so every one runs `#[serial]`.

use phonedesk_ingest::config::{IngestConfig, DEFAULT_STORE_PATH};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const VARS: &[&str] = &[
    "DB_CREDENTIALS",
    "PHONEDESK_SOURCE_TABLE",
    "PHONEDESK_SOURCE_ORDER_BY",
    "PHONEDESK_CONNECT_TIMEOUT_SECS",
    "PHONEDESK_FETCH_TIMEOUT_SECS",
    "JIRA_URL",
    "JIRA_EMAIL",
    "JIRA_API_TOKEN",
    "SERVICE_DESK_ID",
    "REQUEST_TYPE_ID",
    "PHONEDESK_SUBMIT_TIMEOUT_SECS",
    "PHONEDESK_STORE_PATH",
    "PHONEDESK_PAGE_SIZE",
    "PHONEDESK_SUBMIT_MAX_ATTEMPTS",
    "PHONEDESK_RETRY_BASE_DELAY_MS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    clear_env();

    let config = IngestConfig::from_env().unwrap();

    assert_eq!(config.source.table, "phonerequest");
    assert_eq!(config.source.order_by, "id");
    assert_eq!(config.run.page_size, 1000);
    assert_eq!(config.run.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    assert_eq!(config.run.submit_max_attempts, 1);
    assert!(config.service_desk.url.is_none());
    assert!(config.service_desk_config().is_err());
}

#[test]
#[serial]
fn test_config_from_env() {
    clear_env();
    env::set_var("DB_CREDENTIALS", "postgresql://svc:pw@db:5432/forms");
    env::set_var("PHONEDESK_SOURCE_TABLE", "intake.phonerequest");
    env::set_var("PHONEDESK_PAGE_SIZE", "250");
    env::set_var("PHONEDESK_STORE_PATH", "/var/lib/phonedesk/fp.json");
    env::set_var("PHONEDESK_SUBMIT_TIMEOUT_SECS", "12");
    env::set_var("PHONEDESK_SUBMIT_MAX_ATTEMPTS", "3");
    env::set_var("PHONEDESK_RETRY_BASE_DELAY_MS", "250");
    env::set_var("JIRA_URL", "https://desk.company.com");
    env::set_var("JIRA_EMAIL", "bot@company.com");
    env::set_var("JIRA_API_TOKEN", "token-123");
    env::set_var("SERVICE_DESK_ID", "4");
    env::set_var("REQUEST_TYPE_ID", "37");

    let config = IngestConfig::from_env().unwrap();

    assert_eq!(config.source_config().table, "intake.phonerequest");
    assert_eq!(config.run.page_size, 250);
    assert_eq!(
        config.run.store_path,
        PathBuf::from("/var/lib/phonedesk/fp.json")
    );

    let desk = config.service_desk_config().unwrap();
    assert_eq!(desk.base_url, "https://desk.company.com");
    assert_eq!(desk.service_desk_id, "4");
    assert_eq!(desk.request_type_id, "37");
    assert_eq!(desk.timeout, Duration::from_secs(12));

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.base_delay, Duration::from_millis(250));

    clear_env();
}

#[test]
#[serial]
fn test_config_rejects_unparsable_number() {
    clear_env();
    env::set_var("PHONEDESK_PAGE_SIZE", "a thousand");

    let err = IngestConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("PHONEDESK_PAGE_SIZE"));

    clear_env();
}

#[test]
#[serial]
fn test_config_rejects_zero_page_size() {
    clear_env();
    env::set_var("PHONEDESK_PAGE_SIZE", "0");

    assert!(IngestConfig::from_env().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_blank_service_desk_values_count_as_missing() {
    clear_env();
    env::set_var("JIRA_URL", "https://desk.company.com");
    env::set_var("JIRA_EMAIL", "   ");

    let config = IngestConfig::from_env().unwrap();
    let err = config.service_desk_config().unwrap_err().to_string();
    assert!(err.contains("JIRA_EMAIL"));
    assert!(!err.contains("JIRA_URL"));

    clear_env();
}

#[test]
#[serial]
fn test_from_env_does_not_read_dotenv_file() {
    clear_env();
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "PHONEDESK_PAGE_SIZE=7\n").unwrap();

    let previous = env::current_dir().unwrap();
    env::set_current_dir(dir.path()).unwrap();
    let config = IngestConfig::from_env();
    env::set_current_dir(previous).unwrap();

    assert_eq!(config.unwrap().run.page_size, 1000);
    assert!(env::var("PHONEDESK_PAGE_SIZE").is_err());
}
