//! Per-resource mapping from Bundle entries to flat tables.
//!
//! Every transformer is pure: one row per entry, in input order, with the
//! kind's fixed schema. Missing data never fails a row; it leaves the field null.

use serde_json::Value;

use crate::column::{ColumnInfo, ColumnType};
use crate::field::{join_text, reference_id, scalar, text};
use crate::resource::ResourceKind;
use crate::table::{FlatRecord, Table};

/// Column schema for a resource kind.
pub fn columns(resource: ResourceKind) -> Vec<ColumnInfo> {
    let spec: &[(&str, ColumnType, &str)] = match resource {
        ResourceKind::Patient => &[
            ("id", ColumnType::String, "id"),
            ("family_name", ColumnType::String, "name[0].family"),
            ("given_name", ColumnType::String, "name[0].given (space separated)"),
            ("gender", ColumnType::String, "gender"),
            ("birthDate", ColumnType::Date, "birthDate"),
            ("address", ColumnType::String, "address[0].line[0]"),
            ("city", ColumnType::String, "address[0].city"),
            ("state", ColumnType::String, "address[0].state"),
            ("country", ColumnType::String, "address[0].country"),
        ],
        ResourceKind::Encounter => &[
            ("id", ColumnType::String, "id"),
            ("patient_id", ColumnType::String, "subject.reference (id part)"),
            ("start", ColumnType::DateTime, "period.start"),
            ("end", ColumnType::DateTime, "period.end"),
            (
                "location",
                ColumnType::String,
                "location[*].location.display (comma separated)",
            ),
        ],
        ResourceKind::Condition => &[
            ("id", ColumnType::String, "id"),
            ("patient_id", ColumnType::String, "subject.reference (id part)"),
            ("code", ColumnType::String, "code.text"),
            ("clinical_status", ColumnType::String, "clinicalStatus.text"),
            ("verification_status", ColumnType::String, "verificationStatus.text"),
            ("onset_date", ColumnType::DateTime, "onsetDateTime"),
        ],
        ResourceKind::Observation => &[
            ("id", ColumnType::String, "id"),
            ("status", ColumnType::String, "status"),
            ("code", ColumnType::String, "code.text"),
            ("value", ColumnType::Decimal, "valueQuantity.value"),
            ("unit", ColumnType::String, "valueQuantity.unit"),
            ("effective_start", ColumnType::DateTime, "effectivePeriod.start"),
            ("effective_end", ColumnType::DateTime, "effectivePeriod.end"),
        ],
    };

    spec.iter()
        .map(|(name, col_type, source)| {
            ColumnInfo::new(*name, *col_type).with_description(*source)
        })
        .collect()
}

/// Transform entries of the given kind.
pub fn transform(resource: ResourceKind, entries: &[Value]) -> Table {
    match resource {
        ResourceKind::Patient => transform_patients(entries),
        ResourceKind::Encounter => transform_encounters(entries),
        ResourceKind::Condition => transform_conditions(entries),
        ResourceKind::Observation => transform_observations(entries),
    }
}

pub fn transform_patients(entries: &[Value]) -> Table {
    assemble(ResourceKind::Patient, entries, |patient| {
        FlatRecord::new()
            .with("id", scalar(patient, "id"))
            .with("family_name", scalar(patient, "name.0.family"))
            .with("given_name", join_text(patient, "name.0.given", "", " "))
            .with("gender", scalar(patient, "gender"))
            .with("birthDate", scalar(patient, "birthDate"))
            .with("address", scalar(patient, "address.0.line.0"))
            .with("city", scalar(patient, "address.0.city"))
            .with("state", scalar(patient, "address.0.state"))
            .with("country", scalar(patient, "address.0.country"))
    })
}

pub fn transform_encounters(entries: &[Value]) -> Table {
    assemble(ResourceKind::Encounter, entries, |encounter| {
        FlatRecord::new()
            .with("id", scalar(encounter, "id"))
            .with("patient_id", subject_id(encounter))
            .with("start", scalar(encounter, "period.start"))
            .with("end", scalar(encounter, "period.end"))
            .with("location", join_text(encounter, "location", "location.display", ", "))
    })
}

pub fn transform_conditions(entries: &[Value]) -> Table {
    assemble(ResourceKind::Condition, entries, |condition| {
        FlatRecord::new()
            .with("id", scalar(condition, "id"))
            .with("patient_id", subject_id(condition))
            .with("code", scalar(condition, "code.text"))
            .with("clinical_status", scalar(condition, "clinicalStatus.text"))
            .with("verification_status", scalar(condition, "verificationStatus.text"))
            .with("onset_date", scalar(condition, "onsetDateTime"))
    })
}

pub fn transform_observations(entries: &[Value]) -> Table {
    assemble(ResourceKind::Observation, entries, |observation| {
        FlatRecord::new()
            .with("id", scalar(observation, "id"))
            .with("status", scalar(observation, "status"))
            .with("code", scalar(observation, "code.text"))
            .with("value", scalar(observation, "valueQuantity.value"))
            .with("unit", scalar(observation, "valueQuantity.unit"))
            .with("effective_start", scalar(observation, "effectivePeriod.start"))
            .with("effective_end", scalar(observation, "effectivePeriod.end"))
    })
}

fn assemble(
    resource: ResourceKind,
    entries: &[Value],
    extract: impl Fn(&Value) -> FlatRecord,
) -> Table {
    let empty = Value::Object(Default::default());
    let mut table = Table::new(resource, columns(resource));
    for entry in entries {
        let body = entry.get("resource").unwrap_or(&empty);
        table.push(&extract(body));
    }
    table
}

fn subject_id(resource: &Value) -> Option<String> {
    text(resource, "subject.reference").map(|r| reference_id(r).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(resource: Value) -> Value {
        json!({"fullUrl": "http://fhir.test/x", "resource": resource})
    }

    #[test]
    fn test_patient_full_row() {
        let table = transform_patients(&[entry(json!({
            "resourceType": "Patient",
            "id": "p1",
            "name": [{"family": "Doe", "given": ["Jane", "Marie"]}, {"family": "Other"}],
            "gender": "female",
            "birthDate": "1990-01-01",
            "address": [{
                "line": ["1 Main St", "Apt 2"],
                "city": "Springfield",
                "state": "IL",
                "country": "US"
            }]
        }))]);

        assert_eq!(
            table.data[0],
            vec![
                json!("p1"),
                json!("Doe"),
                json!("Jane Marie"),
                json!("female"),
                json!("1990-01-01"),
                json!("1 Main St"),
                json!("Springfield"),
                json!("IL"),
                json!("US"),
            ]
        );
    }

    #[test]
    fn test_patient_without_name_or_address_is_null() {
        let table = transform_patients(&[entry(json!({"id": "p2", "gender": "male", "name": []}))]);

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.value(0, "family_name"), Some(&Value::Null));
        assert_eq!(table.value(0, "given_name"), Some(&Value::Null));
        assert_eq!(table.value(0, "address"), Some(&Value::Null));
        assert_eq!(table.value(0, "country"), Some(&Value::Null));
        assert_eq!(table.value(0, "gender"), Some(&json!("male")));
    }

    #[test]
    fn test_encounter_row() {
        let table = transform_encounters(&[entry(json!({
            "id": "e1",
            "subject": {"reference": "Patient/123"},
            "period": {"start": "2024-01-01T10:00:00Z", "end": "2024-01-01T11:00:00Z"},
            "location": [
                {"location": {"display": "Ward 1"}},
                {"location": {"display": "ICU"}}
            ]
        }))]);

        assert_eq!(
            table.data[0],
            vec![
                json!("e1"),
                json!("123"),
                json!("2024-01-01T10:00:00Z"),
                json!("2024-01-01T11:00:00Z"),
                json!("Ward 1, ICU"),
            ]
        );
    }

    #[test]
    fn test_encounter_location_without_display_leaves_empty_part() {
        let table = transform_encounters(&[
            entry(json!({
                "id": "e1",
                "location": [
                    {"location": {"display": "Ward 1"}},
                    {"location": {"reference": "Location/9"}},
                    {"location": {"display": "ICU"}}
                ]
            })),
            entry(json!({"id": "e2", "location": []})),
            entry(json!({"id": "e3"})),
        ]);

        assert_eq!(table.value(0, "location"), Some(&json!("Ward 1, , ICU")));
        assert_eq!(table.value(1, "location"), Some(&Value::Null));
        assert_eq!(table.value(2, "location"), Some(&Value::Null));
    }

    #[test]
    fn test_dangling_reference_kept_as_is() {
        let table = transform_conditions(&[entry(json!({
            "id": "c1",
            "subject": {"reference": "Patient/does-not-exist"}
        }))]);
        assert_eq!(table.value(0, "patient_id"), Some(&json!("does-not-exist")));

        let table = transform_conditions(&[entry(json!({"id": "c2"}))]);
        assert_eq!(table.value(0, "patient_id"), Some(&Value::Null));
    }

    #[test]
    fn test_condition_row() {
        let table = transform_conditions(&[entry(json!({
            "id": "c1",
            "subject": {"reference": "Patient/p1"},
            "code": {"text": "Hypertension", "coding": [{"code": "38341003"}]},
            "clinicalStatus": {"text": "Active"},
            "verificationStatus": {"text": "Confirmed"},
            "onsetDateTime": "2019-06-01"
        }))]);

        assert_eq!(
            table.data[0],
            vec![
                json!("c1"),
                json!("p1"),
                json!("Hypertension"),
                json!("Active"),
                json!("Confirmed"),
                json!("2019-06-01"),
            ]
        );
    }

    #[test]
    fn test_observation_keeps_raw_quantity() {
        let table = transform_observations(&[entry(json!({
            "id": "o1",
            "status": "final",
            "code": {"text": "Heart rate"},
            "valueQuantity": {"value": 72, "unit": "beats/minute"},
            "effectivePeriod": {"start": "2024-02-01T08:00:00Z"}
        }))]);

        assert_eq!(
            table.data[0],
            vec![
                json!("o1"),
                json!("final"),
                json!("Heart rate"),
                json!(72),
                json!("beats/minute"),
                json!("2024-02-01T08:00:00Z"),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_row_count_and_schema_for_every_kind() {
        let entries = vec![
            entry(json!({"id": "a"})),
            json!({"search": {"mode": "match"}}),
            entry(json!({"id": "c", "unexpected": {"deep": [1, 2]}})),
        ];

        for kind in ResourceKind::ALL {
            let table = transform(kind, &entries);
            assert_eq!(table.resource, kind);
            assert_eq!(table.row_count(), entries.len());
            assert_eq!(table.columns, columns(kind));
            assert!(table.data.iter().all(|row| row.len() == table.columns.len()));
            assert_eq!(table.value(0, "id"), Some(&json!("a")));
            assert_eq!(table.value(1, "id"), Some(&Value::Null));
        }
    }

    #[test]
    fn test_schemas() {
        let names = |kind| -> Vec<String> { columns(kind).into_iter().map(|c| c.name).collect() };
        assert_eq!(
            names(ResourceKind::Patient),
            vec![
                "id",
                "family_name",
                "given_name",
                "gender",
                "birthDate",
                "address",
                "city",
                "state",
                "country"
            ]
        );
        assert_eq!(
            names(ResourceKind::Encounter),
            vec!["id", "patient_id", "start", "end", "location"]
        );
        assert_eq!(
            names(ResourceKind::Condition),
            vec![
                "id",
                "patient_id",
                "code",
                "clinical_status",
                "verification_status",
                "onset_date"
            ]
        );
        assert_eq!(
            names(ResourceKind::Observation),
            vec![
                "id",
                "status",
                "code",
                "value",
                "unit",
                "effective_start",
                "effective_end"
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let table = transform(ResourceKind::Encounter, &[]);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns.len(), 5);
    }
}
