use colored::Colorize;
use octofhir_ingest::{ColumnInfo, ResourceKind, RunReport};
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn report_table(report: &RunReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Resource", "Pages", "Rows", "Stopped", "Object", "Bytes"]);
    for r in &report.resources {
        builder.push_record([
            r.resource.to_string(),
            r.pages.to_string(),
            r.object.rows.to_string(),
            r.stop_reason.to_string(),
            format!("{}/{}", r.object.bucket, r.object.object_name),
            r.object.bytes.to_string(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn schema_table(resource: ResourceKind, object_name: &str, columns: &[ColumnInfo]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Column", "Type", "Source"]);
    for col in columns {
        builder.push_record([
            col.name.clone(),
            col.col_type.to_string(),
            col.description.clone().unwrap_or_else(|| "-".into()),
        ]);
    }
    format!(
        "{} ({})\n{}",
        resource.as_str().cyan(),
        object_name,
        builder.build().with(Style::rounded())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_ingest::transform::columns;

    #[test]
    fn test_schema_table_lists_every_column() {
        let rendered = schema_table(
            ResourceKind::Encounter,
            "encounters_data.csv",
            &columns(ResourceKind::Encounter),
        );
        for name in ["id", "patient_id", "start", "end", "location"] {
            assert!(rendered.contains(name), "missing {name}");
        }
        assert!(rendered.contains("encounters_data.csv"));
    }

    #[test]
    fn test_empty_report_has_only_header() {
        let rendered = report_table(&RunReport::default());
        assert!(rendered.contains("Resource"));
        assert!(!rendered.contains("fhir001"));
    }
}
