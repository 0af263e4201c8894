//! Flat records and the tables they are assembled into.

use indexmap::IndexMap;
use serde_json::Value;

use crate::column::ColumnInfo;
use crate::resource::ResourceKind;

/// One extracted row, keyed by column name.
///
/// Fields that were never set are absent and become `null` once the record is
/// pushed into a [`Table`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: IndexMap<String, Value>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field; `None` leaves it absent.
    pub fn set(&mut self, name: &str, value: Option<impl Into<Value>>) -> &mut Self {
        match value {
            Some(v) => {
                self.fields.insert(name.to_string(), v.into());
            }
            None => {
                self.fields.shift_remove(name);
            }
        }
        self
    }

    /// Builder form of [`FlatRecord::set`].
    pub fn with(mut self, name: &str, value: Option<impl Into<Value>>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Rows of one resource kind under a fixed column schema.
#[derive(Debug, Clone)]
pub struct Table {
    pub resource: ResourceKind,

    /// Column schema, in output order.
    pub columns: Vec<ColumnInfo>,

    /// Row data in arrival order, one value per column.
    pub data: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given schema.
    pub fn new(resource: ResourceKind, columns: Vec<ColumnInfo>) -> Self {
        Self {
            resource,
            columns,
            data: Vec::new(),
        }
    }

    /// Append a record, aligned to the schema.
    ///
    /// Columns the record lacks are `null`; fields outside the schema are dropped.
    pub fn push(&mut self, record: &FlatRecord) {
        let row = self
            .columns
            .iter()
            .map(|c| record.get(&c.name).cloned().unwrap_or(Value::Null))
            .collect();
        self.data.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c.name == column)?;
        self.data.get(row)?.get(index)
    }
}
