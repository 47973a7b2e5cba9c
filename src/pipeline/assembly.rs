//! Fourth pipeline stage: selection of feature columns in model order.
use std::sync::Arc;

use serde::Serialize;

use crate::{Error, Result};

use super::FeatureFrame;

/// Value used for a feature column that no pipeline stage produced.
pub const MISSING_COLUMN_DEFAULT: f64 = 0.0;

/// A fixed-width feature vector positionally aligned to the model's feature columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    #[serde(skip)]
    columns: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Feature column names, in the same order as [`FeatureVector::values()`].
    pub fn columns(&self) -> &Arc<[String]> {
        &self.columns
    }

    /// Values in column order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the vector, returning its values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Value of a named column.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// Iterate over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows of feature vectors sharing the same column layout. This is what models consume.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Arc<[String]>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create an empty matrix with the given column layout.
    pub fn new(columns: Arc<[String]>) -> FeatureMatrix {
        FeatureMatrix {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The vector must share this matrix's column layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArtifact`] if the vector was assembled against different columns.
    pub fn push(&mut self, vector: FeatureVector) -> Result<()> {
        if vector.columns != self.columns {
            return Err(Error::InvalidArtifact(
                "feature vector columns do not match matrix columns".to_owned(),
            ));
        }
        self.rows.push(vector.values);
        Ok(())
    }

    /// Build a matrix from raw rows. Intended for models and tests that work positionally.
    pub fn from_rows(columns: Arc<[String]>, rows: Vec<Vec<f64>>) -> FeatureMatrix {
        FeatureMatrix { columns, rows }
    }

    /// Column names shared by all rows.
    pub fn columns(&self) -> &Arc<[String]> {
        &self.columns
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }
}

impl From<FeatureVector> for FeatureMatrix {
    fn from(vector: FeatureVector) -> Self {
        FeatureMatrix {
            columns: vector.columns,
            rows: vec![vector.values],
        }
    }
}

/// Last pipeline stage: select `columns` from `frame` in order.
///
/// Columns the frame lacks are filled with [`MISSING_COLUMN_DEFAULT`] unless `strict` is set, in
/// which case the first missing column is reported.
pub(crate) fn align(
    frame: &FeatureFrame,
    columns: &Arc<[String]>,
    strict: bool,
) -> Result<FeatureVector> {
    let values = columns
        .iter()
        .map(|column| match frame.get(column) {
            Some(value) => Ok(value),
            None if strict => Err(Error::MissingFeatureColumn(column.clone())),
            None => Ok(MISSING_COLUMN_DEFAULT),
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(FeatureVector {
        columns: columns.clone(),
        values,
    })
}
