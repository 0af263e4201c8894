//! Paginated retrieval of all entries for one resource type.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::Result;
use crate::client::{FhirTransport, Page};
use crate::config::ServerSettings;
use crate::resource::ResourceKind;

/// Why pagination for a resource type ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no `next` link.
    Exhausted,
    /// A page request returned a non-success status.
    HttpStatus(u16),
    /// The configured page limit was reached.
    PageLimit(usize),
    /// A `next` link pointed at a page already requested in this fetch.
    LinkCycle,
}

impl StopReason {
    /// Whether every page the server offered was retrieved.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exhausted => write!(f, "complete"),
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
            Self::PageLimit(limit) => write!(f, "page limit {limit}"),
            Self::LinkCycle => write!(f, "link cycle"),
        }
    }
}

/// Entries accumulated across all pages of one search.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub resource: ResourceKind,
    /// Entries in page order, then in-page order.
    pub entries: Vec<Value>,
    /// Number of successfully retrieved pages.
    pub pages: usize,
    pub stop_reason: StopReason,
}

/// Walks search Bundles via their `next` links.
pub struct ResourceFetcher {
    transport: Arc<dyn FhirTransport>,
    base_url: String,
    include_format_param: bool,
    max_pages: Option<usize>,
}

impl ResourceFetcher {
    /// Create a fetcher for the server described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed.
    pub fn new(transport: Arc<dyn FhirTransport>, settings: &ServerSettings) -> Result<Self> {
        Url::parse(&settings.base_url)?;
        Ok(Self {
            transport,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            include_format_param: settings.include_format_param,
            max_pages: settings.max_pages,
        })
    }

    /// URL of the first search page for `resource`.
    pub fn initial_url(&self, resource: ResourceKind, page_size: u32) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, resource.as_str()))?;
        {
            let mut query = url.query_pairs_mut();
            if self.include_format_param {
                query.append_pair("_format", "json");
            }
            query.append_pair("_count", &page_size.to_string());
        }
        Ok(url)
    }

    /// Fetch every entry of `resource`, following `next` links.
    ///
    /// A page with a non-success status ends pagination; the entries gathered so
    /// far are returned rather than an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a request cannot be sent or a success body is not a Bundle.
    pub async fn fetch(&self, resource: ResourceKind, page_size: u32) -> Result<FetchResult> {
        let mut next = Some(self.initial_url(resource, page_size)?.to_string());
        let mut visited = HashSet::new();
        let mut entries = Vec::new();
        let mut pages = 0usize;

        let stop_reason = loop {
            let Some(url) = next.take() else {
                break StopReason::Exhausted;
            };
            if let Some(limit) = self.max_pages
                && pages >= limit
            {
                tracing::warn!(
                    resource_type = %resource,
                    pages,
                    "Page limit reached, stopping pagination"
                );
                break StopReason::PageLimit(limit);
            }
            if !visited.insert(url.clone()) {
                tracing::warn!(
                    resource_type = %resource,
                    url = %url,
                    "Next link repeats an earlier page, stopping pagination"
                );
                break StopReason::LinkCycle;
            }

            tracing::debug!(resource_type = %resource, url = %url, "Fetching page");

            match self.transport.get_page(&url).await? {
                Page::Bundle(bundle) => {
                    pages += 1;
                    next = bundle.next_link().map(str::to_string);
                    tracing::debug!(
                        resource_type = %resource,
                        page = pages,
                        entries = bundle.entry.len(),
                        "Page received"
                    );
                    entries.extend(bundle.entry);
                }
                Page::Failed { status, message } => {
                    tracing::warn!(
                        resource_type = %resource,
                        status,
                        message = %message,
                        "Failed to fetch page, keeping partial results"
                    );
                    break StopReason::HttpStatus(status);
                }
            }
        };

        tracing::info!(
            resource_type = %resource,
            pages,
            entries = entries.len(),
            stop_reason = %stop_reason,
            "Fetch finished"
        );

        Ok(FetchResult {
            resource,
            entries,
            pages,
            stop_reason,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bundle::{Bundle, BundleLink};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages by exact URL and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pages: HashMap<String, Page>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn with_page(mut self, url: &str, page: Page) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }
    }

    #[async_trait]
    impl FhirTransport for ScriptedTransport {
        async fn get_page(&self, url: &str) -> Result<Page> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(self.pages.get(url).cloned().unwrap_or(Page::Failed {
                status: 404,
                message: format!("no page scripted for {url}"),
            }))
        }
    }

    pub(crate) fn page(ids: &[&str], next: Option<&str>) -> Page {
        Page::Bundle(Bundle {
            entry: ids
                .iter()
                .map(|id| json!({"resource": {"resourceType": "Patient", "id": id}}))
                .collect(),
            link: next
                .map(|url| {
                    vec![BundleLink {
                        relation: Some("next".into()),
                        url: Some(url.into()),
                    }]
                })
                .unwrap_or_default(),
        })
    }

    fn settings(max_pages: Option<usize>) -> ServerSettings {
        ServerSettings {
            base_url: "http://fhir.test/baseR4/".into(),
            max_pages,
            ..ServerSettings::default()
        }
    }

    const FIRST: &str = "http://fhir.test/baseR4/Patient?_format=json&_count=2";

    fn ids(result: &FetchResult) -> Vec<&str> {
        result
            .entries
            .iter()
            .map(|e| e["resource"]["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_initial_url() {
        let fetcher =
            ResourceFetcher::new(Arc::new(ScriptedTransport::default()), &settings(None)).unwrap();
        assert_eq!(
            fetcher
                .initial_url(ResourceKind::Patient, 2)
                .unwrap()
                .as_str(),
            FIRST
        );

        let no_format = ServerSettings {
            include_format_param: false,
            ..settings(None)
        };
        let fetcher =
            ResourceFetcher::new(Arc::new(ScriptedTransport::default()), &no_format).unwrap();
        assert_eq!(
            fetcher
                .initial_url(ResourceKind::Observation, 100)
                .unwrap()
                .as_str(),
            "http://fhir.test/baseR4/Observation?_count=100"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let bad = ServerSettings {
            base_url: "not a url".into(),
            ..ServerSettings::default()
        };
        assert!(ResourceFetcher::new(Arc::new(ScriptedTransport::default()), &bad).is_err());
    }

    #[tokio::test]
    async fn test_follows_next_links_in_order() {
        let transport = ScriptedTransport::default()
            .with_page(FIRST, page(&["1", "2"], Some("http://fhir.test/p2")))
            .with_page("http://fhir.test/p2", page(&["3", "4"], Some("http://fhir.test/p3")))
            .with_page("http://fhir.test/p3", page(&["5"], None));
        let fetcher = ResourceFetcher::new(Arc::new(transport), &settings(None)).unwrap();

        let result = fetcher.fetch(ResourceKind::Patient, 2).await.unwrap();

        assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(result.pages, 3);
        assert_eq!(result.stop_reason, StopReason::Exhausted);
        assert!(result.stop_reason.is_complete());
    }

    #[tokio::test]
    async fn test_failure_mid_sequence_keeps_partial_results() {
        let transport = ScriptedTransport::default()
            .with_page(FIRST, page(&["1", "2"], Some("http://fhir.test/p2")))
            .with_page("http://fhir.test/p2", page(&["3", "4"], Some("http://fhir.test/p3")))
            .with_page("http://fhir.test/p3", page(&["5", "6"], Some("http://fhir.test/p4")))
            .with_page(
                "http://fhir.test/p4",
                Page::Failed {
                    status: 500,
                    message: "boom".into(),
                },
            )
            .with_page("http://fhir.test/p5", page(&["never"], None));
        let transport = Arc::new(transport);
        let fetcher = ResourceFetcher::new(transport.clone(), &settings(None)).unwrap();

        let result = fetcher.fetch(ResourceKind::Patient, 2).await.unwrap();

        assert_eq!(ids(&result), vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(result.pages, 3);
        assert_eq!(result.stop_reason, StopReason::HttpStatus(500));
        assert_eq!(transport.requests.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_first_page_failure_returns_empty() {
        let transport = ScriptedTransport::default().with_page(
            FIRST,
            Page::Failed {
                status: 401,
                message: "unauthorized".into(),
            },
        );
        let fetcher = ResourceFetcher::new(Arc::new(transport), &settings(None)).unwrap();

        let result = fetcher.fetch(ResourceKind::Patient, 2).await.unwrap();

        assert!(result.entries.is_empty());
        assert_eq!(result.pages, 0);
        assert_eq!(result.stop_reason, StopReason::HttpStatus(401));
    }

    #[tokio::test]
    async fn test_link_cycle_is_detected() {
        let transport = ScriptedTransport::default()
            .with_page(FIRST, page(&["1"], Some("http://fhir.test/p2")))
            .with_page("http://fhir.test/p2", page(&["2"], Some(FIRST)));
        let fetcher = ResourceFetcher::new(Arc::new(transport), &settings(None)).unwrap();

        let result = fetcher.fetch(ResourceKind::Patient, 2).await.unwrap();

        assert_eq!(ids(&result), vec!["1", "2"]);
        assert_eq!(result.stop_reason, StopReason::LinkCycle);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let transport = ScriptedTransport::default()
            .with_page(FIRST, page(&["1"], Some("http://fhir.test/p2")))
            .with_page("http://fhir.test/p2", page(&["2"], Some("http://fhir.test/p3")))
            .with_page("http://fhir.test/p3", page(&["3"], None));
        let fetcher = ResourceFetcher::new(Arc::new(transport), &settings(Some(2))).unwrap();

        let result = fetcher.fetch(ResourceKind::Patient, 2).await.unwrap();

        assert_eq!(ids(&result), vec!["1", "2"]);
        assert_eq!(result.stop_reason, StopReason::PageLimit(2));
        assert!(!result.stop_reason.is_complete());
    }
}
