//! CSV output writer for extracted tables.

use std::io::Write;

use serde_json::Value;

use crate::Result;
use crate::table::Table;

/// Writes tables as comma-separated text with a header row.
#[derive(Debug, Clone, Default)]
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write the table to the output.
    pub fn write(&self, table: &Table, output: &mut dyn Write) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(output);

        writer.write_record(table.column_names())?;

        for row in &table.data {
            writer.write_record(row.iter().map(json_value_to_csv_string))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Serialize the table to an in-memory UTF-8 buffer.
    pub fn to_bytes(&self, table: &Table) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(table, &mut buf)?;
        Ok(buf)
    }
}

/// Convert a JSON value to a CSV-appropriate string.
fn json_value_to_csv_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Transformers only emit scalars
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
