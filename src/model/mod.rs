//! Regression models consumed by the [`Predictor`](crate::Predictor).
//!
//! Any type implementing [`RegressionModel`] can back a predictor. Two implementations can be
//! loaded from `model.json`: [`LinearModel`] and [`TreeEnsemble`].
mod linear;
mod tree;

pub use linear::{LinearModel, LinearModelSpec};
pub use tree::{Node, Tree, TreeEnsemble};

use serde::{Deserialize, Serialize};

use crate::{Error, FeatureMatrix, Result};

/// Enum representing possible failures while invoking a model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ModelError {
    /// The feature matrix width does not match what the model was built for.
    #[error("expected {expected} features, found {found}")]
    FeatureCountMismatch {
        /// Width the model expects.
        expected: usize,
        /// Width of the supplied matrix.
        found: usize,
    },

    /// The model returned fewer outputs than rows.
    #[error("model returned {found} outputs for {expected} rows")]
    OutputCountMismatch {
        /// Number of rows in the feature matrix.
        expected: usize,
        /// Number of outputs returned.
        found: usize,
    },

    /// Model-specific failure.
    #[error("{0}")]
    Custom(String),
}

/// A trained regression model.
///
/// Implementations must be pure with respect to their inputs: the same matrix always yields the
/// same outputs. They are shared between threads, hence the `Send + Sync` bound.
pub trait RegressionModel: Send + Sync {
    /// Predict one value per row of `features`.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model cannot score the matrix. The error is reported to the
    /// caller of the affected prediction, never replaced by a default value.
    fn predict(&self, features: &FeatureMatrix) -> std::result::Result<Vec<f64>, ModelError>;
}

impl<F> RegressionModel for F
where
    F: Fn(&FeatureMatrix) -> std::result::Result<Vec<f64>, ModelError> + Send + Sync,
{
    fn predict(&self, features: &FeatureMatrix) -> std::result::Result<Vec<f64>, ModelError> {
        self(features)
    }
}

/// Contents of `model.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// `{"type": "linear", ...}`
    Linear(LinearModelSpec),
    /// `{"type": "tree_ensemble", ...}`
    TreeEnsemble(TreeEnsemble),
}

impl ModelSpec {
    /// Parse `model.json` contents.
    pub fn from_json(bytes: &[u8]) -> Result<ModelSpec> {
        serde_json::from_slice(bytes).map_err(|err| Error::parse("model.json", err))
    }

    /// Validate the model against the bundle's feature columns and build it.
    pub fn build(self, feature_cols: &[String]) -> Result<Box<dyn RegressionModel>> {
        match self {
            ModelSpec::Linear(spec) => Ok(Box::new(LinearModel::build(spec, feature_cols)?)),
            ModelSpec::TreeEnsemble(ensemble) => {
                Ok(Box::new(ensemble.validate(feature_cols.len())?))
            }
        }
    }
}

fn check_width(expected: usize, features: &FeatureMatrix) -> std::result::Result<(), ModelError> {
    if features.n_cols() != expected {
        return Err(ModelError::FeatureCountMismatch {
            expected,
            found: features.n_cols(),
        });
    }
    match features.rows().iter().find(|row| row.len() != expected) {
        Some(row) => Err(ModelError::FeatureCountMismatch {
            expected,
            found: row.len(),
        }),
        None => Ok(()),
    }
}
