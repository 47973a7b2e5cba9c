use std::collections::HashMap;

use crate::{FieldValue, RawRecord};

/// Named numeric columns computed for a single record before column alignment.
///
/// A frame starts out holding the record's numeric fields and is extended by each pipeline stage.
/// String fields never become columns: they only feed encoders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    columns: HashMap<String, f64>,
}

impl FeatureFrame {
    /// Create an empty frame.
    pub fn new() -> FeatureFrame {
        FeatureFrame::default()
    }

    /// Seed a frame with every numeric (number or boolean) field of `record`.
    pub fn from_record(record: &RawRecord) -> FeatureFrame {
        let columns = record
            .iter()
            .filter_map(|(field, value)| match value {
                FieldValue::Number(_) | FieldValue::Boolean(_) => {
                    value.as_number().map(|n| (field.to_owned(), n))
                }
                FieldValue::String(_) | FieldValue::Null => None,
            })
            .collect();

        FeatureFrame { columns }
    }

    /// Set a column, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: f64) {
        self.columns.insert(column.into(), value);
    }

    /// Value of a column.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.get(column).copied()
    }

    /// Whether a column has been produced.
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column has been produced.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
