//! Linear regression.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, FeatureMatrix, Result};

use super::{check_width, ModelError, RegressionModel};

/// Serialized form of a linear model: coefficients are keyed by feature column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelSpec {
    /// Bias term.
    pub intercept: f64,
    /// Weight per feature column name.
    #[serde(default)]
    pub coefficients: BTreeMap<String, f64>,
}

/// `intercept + Σ weight_i · x_i`, with weights resolved positionally against the bundle's feature
/// columns. Columns without a coefficient have weight `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    intercept: f64,
    weights: Vec<f64>,
}

impl LinearModel {
    /// Resolve named coefficients against `feature_cols`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArtifact`] if a coefficient names a column the bundle does not
    /// produce.
    pub fn build(spec: LinearModelSpec, feature_cols: &[String]) -> Result<LinearModel> {
        let mut weights = vec![0.0; feature_cols.len()];
        for (name, coefficient) in spec.coefficients {
            let index = feature_cols
                .iter()
                .position(|col| *col == name)
                .ok_or_else(|| {
                    Error::InvalidArtifact(format!(
                        "linear model coefficient {name:?} is not a feature column"
                    ))
                })?;
            weights[index] = coefficient;
        }

        Ok(LinearModel {
            intercept: spec.intercept,
            weights,
        })
    }

    /// Bias term.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Weights in feature column order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn score(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl RegressionModel for LinearModel {
    fn predict(&self, features: &FeatureMatrix) -> std::result::Result<Vec<f64>, ModelError> {
        check_width(self.weights.len(), features)?;
        Ok(features.rows().iter().map(|row| self.score(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{LinearModel, LinearModelSpec};
    use crate::{model::RegressionModel, Error, FeatureMatrix};

    fn cols() -> Arc<[String]> {
        ["total_events", "country_mean_revenue", "platform_encoded"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn scores_rows_positionally() {
        let model = LinearModel::build(
            LinearModelSpec {
                intercept: 0.5,
                coefficients: [
                    ("platform_encoded".to_owned(), 2.0),
                    ("total_events".to_owned(), 0.25),
                ]
                .into(),
            },
            &cols(),
        )
        .unwrap();

        assert_eq!(model.weights(), [0.25, 0.0, 2.0]);

        let matrix = FeatureMatrix::from_rows(
            cols(),
            vec![vec![4.0, 10.0, 1.0], vec![0.0, 0.0, -1.0]],
        );
        assert_eq!(model.predict(&matrix).unwrap(), vec![3.5, -1.5]);
    }

    #[test]
    fn rejects_unknown_coefficient() {
        let result = LinearModel::build(
            LinearModelSpec {
                intercept: 0.0,
                coefficients: [("os_version".to_owned(), 1.0)].into(),
            },
            &cols(),
        );

        assert!(matches!(result, Err(Error::InvalidArtifact(_))));
    }

    #[test]
    fn empty_matrix_yields_no_outputs() {
        let model = LinearModel::build(
            LinearModelSpec {
                intercept: 1.0,
                coefficients: Default::default(),
            },
            &cols(),
        )
        .unwrap();

        assert!(model
            .predict(&FeatureMatrix::new(cols()))
            .unwrap()
            .is_empty());
    }
}
