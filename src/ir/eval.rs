//! Reference evaluation of an ensemble in the fixed-point domain.
//!
//! Mirrors what every emitted backend computes: the accumulator starts at
//! zero, each included tree routes `feature <= threshold` to its yes-branch,
//! and leaf contributions are added with saturation.

use crate::error::{ConvertError, Result};
use crate::fixed::Fixed;
use crate::ir::{Node, NodeId, Tree, TreeEnsemble};

/// Leaf contribution of a single tree.
pub fn eval_tree(tree: &Tree, features: &[Fixed]) -> Fixed {
    let mut id = NodeId::ROOT;
    loop {
        match tree.node(id) {
            Node::Leaf { value } => return *value,
            Node::Split {
                feature,
                threshold,
                yes,
                no,
            } => {
                id = if features[feature.index].le(*threshold) {
                    *yes
                } else {
                    *no
                };
            }
        }
    }
}

/// Sum of the first `tree_limit` trees.
///
/// `features` must hold exactly `feature_count()` values; padding short
/// inputs is the caller's job.
pub fn predict(ensemble: &TreeEnsemble, features: &[Fixed], tree_limit: usize) -> Result<Fixed> {
    if tree_limit == 0 || tree_limit > ensemble.len() {
        return Err(ConvertError::InvalidTreeLimit {
            requested: tree_limit,
            available: ensemble.len(),
        });
    }
    if features.len() != ensemble.feature_count() {
        return Err(ConvertError::InvalidInput(format!(
            "expected {} features, got {}",
            ensemble.feature_count(),
            features.len()
        )));
    }
    Ok(ensemble.trees[..tree_limit]
        .iter()
        .fold(Fixed::ZERO, |acc, tree| acc.saturating_add(eval_tree(tree, features))))
}

/// Contribution of every tree, in order. Useful for inspecting how a
/// prediction builds up.
pub fn contributions(ensemble: &TreeEnsemble, features: &[Fixed]) -> Result<Vec<Fixed>> {
    if features.len() != ensemble.feature_count() {
        return Err(ConvertError::InvalidInput(format!(
            "expected {} features, got {}",
            ensemble.feature_count(),
            features.len()
        )));
    }
    Ok(ensemble
        .trees
        .iter()
        .map(|tree| eval_tree(tree, features))
        .collect())
}
