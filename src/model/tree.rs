//! Gradient-boosted regression trees.
use serde::{Deserialize, Serialize};

use crate::{Error, FeatureMatrix, Result};

use super::{check_width, ModelError, RegressionModel};

/// A decision tree node. Children are referenced by index into [`Tree::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Internal node: rows with `x[feature] < threshold` go `left`, others go `right`. Missing
    /// values (NaN) follow `default_left`.
    Split {
        /// Index into the feature row.
        feature: usize,
        /// Split point.
        threshold: f64,
        /// Node index taken when `x < threshold`.
        left: usize,
        /// Node index taken otherwise.
        right: usize,
        /// Branch taken by NaN. Defaults to `true`.
        #[serde(default = "default_left")]
        default_left: bool,
    },
    /// Terminal node contributing `value` to the ensemble sum.
    Leaf {
        /// Leaf output.
        value: f64,
    },
}

fn default_left() -> bool {
    true
}

/// A single regression tree. The root is `nodes[0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Nodes, each child after its parent.
    pub nodes: Vec<Node>,
}

impl Tree {
    fn eval(&self, row: &[f64]) -> std::result::Result<f64, ModelError> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                }) => {
                    let x = *row.get(*feature).ok_or(ModelError::FeatureCountMismatch {
                        expected: feature + 1,
                        found: row.len(),
                    })?;
                    idx = if x.is_nan() {
                        if *default_left {
                            *left
                        } else {
                            *right
                        }
                    } else if x < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => break,
            }
        }
        Err(ModelError::Custom("malformed decision tree".to_owned()))
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_owned());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {idx} splits on feature {feature}, but there are only {n_features}"
                    ));
                }
                // Children must come after their parent, which rules out cycles.
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Gradient-boosted regression trees: `base_score + Σ tree(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Constant added to every prediction.
    pub base_score: f64,
    /// Boosted trees.
    pub trees: Vec<Tree>,
    /// Expected row width, known once the ensemble is validated against a bundle.
    #[serde(skip)]
    n_features: Option<usize>,
}

impl TreeEnsemble {
    /// Create an ensemble that has not been validated against feature columns yet.
    pub fn new(base_score: f64, trees: Vec<Tree>) -> TreeEnsemble {
        TreeEnsemble {
            base_score,
            trees,
            n_features: None,
        }
    }

    /// Check tree structure against the number of feature columns and fix the expected row width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArtifact`] for empty trees, out-of-range feature indices, or child
    /// references that do not point forward.
    pub fn validate(mut self, n_features: usize) -> Result<TreeEnsemble> {
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|reason| Error::InvalidArtifact(format!("tree {i}: {reason}")))?;
        }
        self.n_features = Some(n_features);
        Ok(self)
    }
}

impl RegressionModel for TreeEnsemble {
    fn predict(&self, features: &FeatureMatrix) -> std::result::Result<Vec<f64>, ModelError> {
        if let Some(n_features) = self.n_features {
            check_width(n_features, features)?;
        }

        features
            .rows()
            .iter()
            .map(|row| {
                self.trees
                    .iter()
                    .try_fold(self.base_score, |sum, tree| Ok(sum + tree.eval(row)?))
            })
            .collect()
    }
}
