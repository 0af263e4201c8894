use octofhir_ingest::{IngestConfig, ResourceKind};
use octofhir_ingest::transform::columns;

use crate::output::schema_table;

/// Schema tables, each titled with the object name the configuration assigns.
pub fn render(cfg: &IngestConfig, resource: Option<ResourceKind>) -> Vec<String> {
    let kinds = match resource {
        Some(kind) => vec![kind],
        None => ResourceKind::ALL.to_vec(),
    };
    kinds
        .into_iter()
        .map(|kind| schema_table(kind, cfg.objects.name_for(kind), &columns(kind)))
        .collect()
}

pub fn schema(cfg: &IngestConfig, resource: Option<ResourceKind>) {
    for table in render(cfg, resource) {
        println!("{table}");
    }
}
