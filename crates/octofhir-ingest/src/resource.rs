//! The FHIR resource kinds handled by the ingestion pipeline.

use serde::{Deserialize, Serialize};

use crate::Error;

/// A FHIR resource type that is extracted into its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Patient,
    Encounter,
    Condition,
    Observation,
}

impl ResourceKind {
    /// Default processing order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Patient,
        ResourceKind::Encounter,
        ResourceKind::Observation,
        ResourceKind::Condition,
    ];

    /// The FHIR resource type name, used as the REST path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Encounter => "Encounter",
            Self::Condition => "Condition",
            Self::Observation => "Observation",
        }
    }

    /// Object name the table is published under unless configured otherwise.
    pub fn default_object_name(&self) -> &'static str {
        match self {
            Self::Patient => "patients_data.csv",
            Self::Encounter => "encounters_data.csv",
            Self::Condition => "conditions_data.csv",
            Self::Observation => "observations_data.csv",
        }
    }

    /// Parse a resource kind, ignoring ASCII case.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::Config(format!(
                    "Unsupported resource type: {s}. Expected one of Patient, Encounter, Condition, Observation"
                ))
            })
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}
