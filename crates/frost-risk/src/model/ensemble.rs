//! Gradient-boosted tree ensemble stored as JSON.
//!
//! Layout follows a binary `GradientBoostingClassifier` with log-loss: the raw
//! score is `init_score + learning_rate * Σ tree(x)` in log-odds, and the
//! positive-class probability is its logistic. Each tree is a flat node array;
//! a split sends `x[feature] <= threshold` left, everything else right.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Scorer, ScorerKind};
use crate::error::{Result, RiskError};

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("n_features must be positive")]
    NoFeatures,
    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },
    #[error("tree {tree} node {node} splits on feature {feature}, model has {n_features}")]
    FeatureOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
        n_features: usize,
    },
    #[error("tree {tree} node {node} points to child {child}, which is not a later node")]
    BadChild { tree: usize, node: usize, child: usize },
    #[error("non-finite value in tree {tree} node {node}")]
    NonFinite { tree: usize, node: usize },
    #[error("non-finite learning_rate or init_score")]
    NonFiniteParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Leaf value reached by `features`.
    ///
    /// A tree built in code may skip [`TreeEnsemble::validate`], so a dangling
    /// child, a missing feature or a walk longer than the tree is an error.
    fn leaf_value(&self, features: &[f64]) -> Result<f64> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| RiskError::inference(format!("tree has no node {idx}")))?;
            match *node {
                Node::Leaf { value } => return Ok(value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(feature).ok_or_else(|| {
                        RiskError::inference(format!(
                            "node {idx} splits on missing feature {feature}"
                        ))
                    })?;
                    idx = if *value <= threshold { left } else { right };
                }
            }
        }
        Err(RiskError::inference("tree walk did not reach a leaf"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub model_id: String,
    pub n_features: usize,
    pub learning_rate: f64,
    /// Prior log-odds of the positive class.
    pub init_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn from_json(json: &str) -> Result<Self, EnsembleError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| RiskError::model_load(path, e))?;
        Self::from_json(&json).map_err(|e| RiskError::model_load(path, e))
    }

    /// Check every split references a real feature and a later node, so
    /// traversal can neither index out of bounds nor cycle.
    pub fn validate(&self) -> Result<(), EnsembleError> {
        if self.n_features == 0 {
            return Err(EnsembleError::NoFeatures);
        }
        if !self.learning_rate.is_finite() || !self.init_score.is_finite() {
            return Err(EnsembleError::NonFiniteParams);
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(EnsembleError::EmptyTree { tree: tree_idx });
            }
            for (node_idx, node) in tree.nodes.iter().enumerate() {
                match *node {
                    Node::Leaf { value } if !value.is_finite() => {
                        return Err(EnsembleError::NonFinite {
                            tree: tree_idx,
                            node: node_idx,
                        });
                    }
                    Node::Leaf { .. } => {}
                    Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if feature >= self.n_features {
                            return Err(EnsembleError::FeatureOutOfRange {
                                tree: tree_idx,
                                node: node_idx,
                                feature,
                                n_features: self.n_features,
                            });
                        }
                        if threshold.is_nan() {
                            return Err(EnsembleError::NonFinite {
                                tree: tree_idx,
                                node: node_idx,
                            });
                        }
                        for child in [left, right] {
                            if child <= node_idx || child >= tree.nodes.len() {
                                return Err(EnsembleError::BadChild {
                                    tree: tree_idx,
                                    node: node_idx,
                                    child,
                                });
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Raw log-odds for one sample.
    pub fn decision_function(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(RiskError::ShapeMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        let mut boost = 0.0;
        for tree in &self.trees {
            boost += tree.leaf_value(features)?;
        }
        Ok(self.init_score + self.learning_rate * boost)
    }

    /// Probability of the positive class for one sample.
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        self.decision_function(features).map(sigmoid)
    }
}

impl Scorer for TreeEnsemble {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Probabilistic
    }

    fn score(&mut self, features: &[f64]) -> Result<f64> {
        self.predict_proba(features)
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
