//! Minimal model of a FHIR search Bundle.
//!
//! Only the parts needed for paging are typed; entries stay as raw JSON so that
//! transformers decide for themselves what is present.

use serde::Deserialize;
use serde_json::Value;

/// One page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bundle {
    /// Raw bundle entries, each normally wrapping a `resource`.
    #[serde(default)]
    pub entry: Vec<Value>,

    /// Paging links (`self`, `next`, `previous`, ...).
    #[serde(default)]
    pub link: Vec<BundleLink>,
}

/// A link on a Bundle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleLink {
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Bundle {
    /// URL of the first link whose relation is `next`.
    pub fn next_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation.as_deref() == Some("next"))
            .and_then(|l| l.url.as_deref())
    }
}
