//! HTTP access to the FHIR server.

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::bundle::Bundle;

/// Outcome of requesting a single search page.
#[derive(Debug, Clone)]
pub enum Page {
    /// The server answered with a success status and a Bundle body.
    Bundle(Bundle),

    /// The server answered with a non-success status.
    Failed {
        status: u16,
        /// OperationOutcome diagnostics, or the raw body when there are none.
        message: String,
    },
}

/// Capability to GET one page of a FHIR search.
///
/// Transport failures (connection, TLS, unreadable body) are errors; a response
/// with a non-success status is a [`Page::Failed`] value.
#[async_trait]
pub trait FhirTransport: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<Page>;
}

/// What FhirClient needs to set the Authorization header
#[derive(Debug, Clone)]
pub enum AuthHeader {
    Basic { username: String, password: String },
    Bearer { token: String },
}

/// reqwest-backed [`FhirTransport`].
pub struct FhirClient {
    http: reqwest::Client,
    auth: Option<AuthHeader>,
}

impl FhirClient {
    pub fn new(auth: Option<AuthHeader>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("octofhir-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, auth })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url);
        match &self.auth {
            Some(AuthHeader::Basic { username, password }) => {
                req = req.basic_auth(username, Some(password));
            }
            Some(AuthHeader::Bearer { token }) => {
                req = req.bearer_auth(token);
            }
            None => {}
        }
        req.header("Accept", "application/fhir+json")
    }
}

#[async_trait]
impl FhirTransport for FhirClient {
    async fn get_page(&self, url: &str) -> Result<Page> {
        let resp = self.request(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Ok(Page::Failed {
                status: status.as_u16(),
                message: failure_message(&body),
            });
        }

        let bundle: Bundle = serde_json::from_str(&body)?;
        Ok(Page::Bundle(bundle))
    }
}

/// Prefer OperationOutcome diagnostics over the raw response body.
fn failure_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body)
        && json.get("resourceType").and_then(|v| v.as_str()) == Some("OperationOutcome")
        && let Some(issues) = json.get("issue").and_then(|v| v.as_array())
    {
        let msgs: Vec<&str> = issues
            .iter()
            .filter_map(|i| i.get("diagnostics").and_then(|d| d.as_str()))
            .collect();
        if !msgs.is_empty() {
            return msgs.join("; ");
        }
    }
    body.to_string()
}
