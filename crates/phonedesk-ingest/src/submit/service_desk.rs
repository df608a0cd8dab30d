//! Jira Service Management request client
//!
//! Files one customer request per call through
//! `POST {base}/rest/servicedeskapi/request`, answering the phone equipment
//! form by question id.

use super::{Outcome, SubmissionClient};
use crate::normalize::NormalizedRequest;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

// ============================================================================
// Service Desk Constants
// ============================================================================

/// Path of the create-request endpoint, relative to the site URL
pub const CREATE_REQUEST_PATH: &str = "/rest/servicedeskapi/request";

/// Longest response body kept in a rejection outcome
pub const MAX_REJECTION_BODY_CHARS: usize = 2048;

/// Form question ids of the phone equipment request form
pub mod questions {
    pub const NAME: &str = "199";
    pub const JOB_TITLE: &str = "200";
    pub const PHONE: &str = "201";
    pub const EMAIL: &str = "202";
    pub const DEPARTMENT: &str = "203";
    pub const COST_CENTER: &str = "204";
    pub const INSTALLATION_TYPE: &str = "157";
    pub const EQUIPMENT: &str = "159";
    pub const USAGE_TYPE: &str = "205";
    pub const ENDING_DATE: &str = "197";
    pub const NEEDED_BY: &str = "206";
    pub const COMMENTS: &str = "189";
}

/// Connection settings for one service desk and request type
#[derive(Clone)]
pub struct ServiceDeskConfig {
    /// Site URL, e.g. `https://example.atlassian.net`
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub service_desk_id: String,
    pub request_type_id: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl fmt::Debug for ServiceDeskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDeskConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("service_desk_id", &self.service_desk_id)
            .field("request_type_id", &self.request_type_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    service_desk_id: &'a str,
    request_type_id: &'a str,
    request_field_values: RequestFieldValues,
    form: Form<'a>,
}

#[derive(Serialize)]
struct RequestFieldValues {
    summary: String,
    description: String,
}

#[derive(Serialize)]
struct Form<'a> {
    answers: BTreeMap<&'static str, Answer<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Answer<'a> {
    Text(&'a str),
    Choices(&'a [&'static str]),
    Date(&'a str),
}

/// HTTP client for the service desk API
pub struct ServiceDeskClient {
    client: Client,
    config: ServiceDeskConfig,
}

impl ServiceDeskClient {
    pub fn new(config: ServiceDeskConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn request_url(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), CREATE_REQUEST_PATH)
    }

    /// Customer-facing link for a created issue
    pub fn browse_url(&self, issue_key: &str) -> String {
        format!("{}/browse/{}", self.config.base_url.trim_end_matches('/'), issue_key)
    }

    /// JSON body for one request
    pub fn build_payload(&self, request: &NormalizedRequest) -> Value {
        let mut answers = BTreeMap::new();
        answers.insert(questions::NAME, Answer::Text(&request.name));
        answers.insert(questions::JOB_TITLE, Answer::Text(&request.job_title));
        answers.insert(questions::PHONE, Answer::Text(&request.phone));
        answers.insert(questions::EMAIL, Answer::Text(&request.email));
        answers.insert(questions::DEPARTMENT, Answer::Text(&request.department));
        answers.insert(questions::COST_CENTER, Answer::Text(&request.cost_center));
        answers.insert(
            questions::INSTALLATION_TYPE,
            Answer::Choices(&request.installation_type),
        );
        if !request.equipment.is_empty() {
            answers.insert(questions::EQUIPMENT, Answer::Choices(&request.equipment));
        }
        answers.insert(questions::USAGE_TYPE, Answer::Choices(&request.usage_type));
        if let Some(ref ending_date) = request.ending_date {
            answers.insert(questions::ENDING_DATE, Answer::Date(ending_date));
        }
        answers.insert(questions::NEEDED_BY, Answer::Date(&request.needed_by));
        answers.insert(questions::COMMENTS, Answer::Text(&request.comments));

        let body = CreateRequest {
            service_desk_id: &self.config.service_desk_id,
            request_type_id: &self.config.request_type_id,
            request_field_values: RequestFieldValues {
                summary: request.summary(),
                description: request.description(),
            },
            form: Form { answers },
        };

        // Plain strings and maps only; serialization cannot fail
        serde_json::to_value(body).unwrap_or(Value::Null)
    }
}

#[async_trait]
impl SubmissionClient for ServiceDeskClient {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        let response = self
            .client
            .post(self.request_url())
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .header(ACCEPT, "application/json")
            .json(&self.build_payload(request))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return Outcome::TransportError(describe_transport_error(&e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                // The ticket exists even though the body was lost
                warn!(status = status.as_u16(), error = %e, "Created request but could not read response body");
                String::new()
            },
            Err(e) => return Outcome::TransportError(describe_transport_error(&e)),
        };

        if !status.is_success() {
            return Outcome::Rejected {
                status: status.as_u16(),
                body: truncate(&body, MAX_REJECTION_BODY_CHARS),
            };
        }

        match issue_identifier(&body) {
            Some(id) => {
                info!(issue = %id, url = %self.browse_url(&id), "Request created");
                Outcome::Created { id }
            },
            None => {
                warn!(
                    status = status.as_u16(),
                    "Request created but response carried no issue key"
                );
                Outcome::Created {
                    id: "<unknown>".to_string(),
                }
            },
        }
    }
}

/// `issueKey`, falling back to `issueId`, from a create response body
fn issue_identifier(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match (value.get("issueKey"), value.get("issueId")) {
        (Some(Value::String(key)), _) if !key.is_empty() => Some(key.clone()),
        (_, Some(Value::String(id))) if !id.is_empty() => Some(id.clone()),
        (_, Some(Value::Number(id))) => Some(id.to_string()),
        _ => None,
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn client() -> ServiceDeskClient {
        ServiceDeskClient::new(ServiceDeskConfig {
            base_url: "https://desk.example.com/".to_string(),
            email: "bot@example.com".to_string(),
            api_token: "secret-token".to_string(),
            service_desk_id: "4".to_string(),
            request_type_id: "37".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn request(ending_date: Option<&str>) -> NormalizedRequest {
        NormalizedRequest {
            name: "Jane Smith".to_string(),
            job_title: "Product Manager".to_string(),
            phone: "555-9876".to_string(),
            email: "jane.smith@company.com".to_string(),
            department: "Product Development".to_string(),
            cost_center: "PD-2024-001".to_string(),
            installation_type: vec!["160"],
            equipment: vec!["164", "165"],
            usage_type: vec![if ending_date.is_some() { "183" } else { "184" }],
            ending_date: ending_date.map(str::to_string),
            needed_by: "2024-04-08".to_string(),
            comments: "Temporary equipment for remote office".to_string(),
        }
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let client = client();
        assert_eq!(
            client.request_url(),
            "https://desk.example.com/rest/servicedeskapi/request"
        );
        assert_eq!(
            client.browse_url("PHONE-12"),
            "https://desk.example.com/browse/PHONE-12"
        );
    }

    #[test]
    fn test_payload_shape() {
        let payload = client().build_payload(&request(Some("2024-06-30")));

        assert_eq!(payload["serviceDeskId"], "4");
        assert_eq!(payload["requestTypeId"], "37");
        assert_eq!(
            payload["requestFieldValues"]["summary"],
            "Phone equipment order - Jane Smith"
        );
        assert_eq!(
            payload["requestFieldValues"]["description"],
            "Equipment request for Jane Smith in Product Development"
        );

        let answers = &payload["form"]["answers"];
        assert_eq!(answers["199"]["text"], "Jane Smith");
        assert_eq!(answers["204"]["text"], "PD-2024-001");
        assert_eq!(answers["157"]["choices"], serde_json::json!(["160"]));
        assert_eq!(answers["159"]["choices"], serde_json::json!(["164", "165"]));
        assert_eq!(answers["205"]["choices"], serde_json::json!(["183"]));
        assert_eq!(answers["197"]["date"], "2024-06-30");
        assert_eq!(answers["206"]["date"], "2024-04-08");
        assert_eq!(answers["189"]["text"], "Temporary equipment for remote office");
    }

    #[test]
    fn test_payload_omits_ending_date_for_permanent_use() {
        let payload = client().build_payload(&request(None));
        assert!(payload["form"]["answers"].get("197").is_none());
        assert_eq!(payload["form"]["answers"]["205"]["choices"], serde_json::json!(["184"]));
    }

    #[test]
    fn test_issue_identifier() {
        assert_eq!(
            issue_identifier(r#"{"issueId":"10010","issueKey":"PHONE-7"}"#).as_deref(),
            Some("PHONE-7")
        );
        assert_eq!(issue_identifier(r#"{"issueId":"10010"}"#).as_deref(), Some("10010"));
        assert_eq!(issue_identifier(r#"{"issueId":10010}"#).as_deref(), Some("10010"));
        assert_eq!(issue_identifier("not json"), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", client().config);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
