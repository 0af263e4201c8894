use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_ingest::{
    FhirClient, IngestConfig, Pipeline, ResourceFetcher, StoragePublisher, build_object_store,
};

use crate::output::{print_success, print_warning, report_table};

pub async fn run(cfg: &IngestConfig) -> Result<()> {
    let auth = cfg.server.auth.as_ref().map(|a| a.to_auth_header());
    let client = FhirClient::new(auth).context("failed to build HTTP client")?;
    let fetcher = ResourceFetcher::new(Arc::new(client), &cfg.server)
        .context("invalid FHIR server settings")?;
    let store = build_object_store(&cfg.storage)
        .with_context(|| format!("failed to open {} storage", cfg.storage.backend))?;
    let publisher = StoragePublisher::new(store, cfg.storage.bucket.clone());

    println!(
        "{}: {}  {}: {} ({})",
        "Server".cyan(),
        cfg.server.base_url,
        "Bucket".cyan(),
        cfg.storage.bucket,
        cfg.storage.backend
    );

    let report = Pipeline::new(fetcher, publisher, cfg.run_plan(), cfg.server.page_size)
        .run()
        .await
        .context("ingestion aborted")?;

    println!("{}", report_table(&report));
    if report.is_complete() {
        print_success(&format!(
            "Data ingestion complete in {:.1}s",
            report.elapsed.as_secs_f64()
        ));
    } else {
        print_warning("Some resource types stopped before the last page; their tables are partial");
    }
    Ok(())
}
