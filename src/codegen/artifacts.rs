//! Derived, human-facing outputs: the feature map, an instruction dump of
//! the trees, and a fingerprint of the ensemble. None of these are needed
//! to run the emitted code.

use std::fmt::Write;

use serde::Serialize;

use crate::ir::{Node, NodeId, Tree, TreeEnsemble};

#[derive(Debug, Serialize)]
struct FeatureEntry<'a> {
    index: usize,
    name: &'a str,
    referenced: bool,
}

/// One `index name` line per declared feature; `*` marks features that
/// some split reads.
pub fn feature_map(ensemble: &TreeEnsemble) -> String {
    let referenced: Vec<usize> = ensemble
        .referenced_features()
        .into_iter()
        .map(|f| f.index)
        .collect();
    let mut out = String::new();
    for (index, name) in ensemble.features.names().iter().enumerate() {
        let mark = if referenced.binary_search(&index).is_ok() {
            " *"
        } else {
            ""
        };
        let _ = writeln!(out, "{} {}{}", index, name, mark);
    }
    out
}

/// The feature map as a JSON array of `{index, name, referenced}`.
pub fn feature_map_json(ensemble: &TreeEnsemble) -> serde_json::Result<String> {
    let referenced = ensemble.referenced_features();
    let entries: Vec<FeatureEntry> = ensemble
        .features
        .names()
        .iter()
        .enumerate()
        .map(|(index, name)| FeatureEntry {
            index,
            name,
            referenced: referenced.iter().any(|f| f.index == index),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

fn dump_tree(tree: &Tree, out: &mut String) {
    let mut stack = vec![(NodeId::ROOT, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let indent = "  ".repeat(depth + 1);
        let source = tree.source_id(id);
        match tree.node(id) {
            Node::Split {
                feature,
                threshold,
                yes,
                no,
            } => {
                let _ = writeln!(
                    out,
                    "{}[{}] {} (#{}) <= {} ? [{}] : [{}]",
                    indent,
                    source,
                    feature.name,
                    feature.index,
                    threshold,
                    tree.source_id(*yes),
                    tree.source_id(*no)
                );
                stack.push((*no, depth + 1));
                stack.push((*yes, depth + 1));
            }
            Node::Leaf { value } => {
                let _ = writeln!(out, "{}[{}] leaf {}", indent, source, value);
            }
        }
    }
}

/// Readable listing of the first `tree_limit` trees (all when `None`),
/// with quantized values and dump node ids in brackets.
pub fn instruction_dump(ensemble: &TreeEnsemble, tree_limit: Option<usize>) -> String {
    let limit = tree_limit.unwrap_or(ensemble.len()).min(ensemble.len());
    let mut out = String::new();
    for (i, tree) in ensemble.trees[..limit].iter().enumerate() {
        let _ = writeln!(
            out,
            "tree {}: {} splits, {} leaves, depth {}",
            i,
            tree.split_count(),
            tree.leaf_count(),
            tree.depth()
        );
        dump_tree(tree, &mut out);
    }
    out
}

/// BLAKE3 of the feature universe and the full instruction dump, hex
/// encoded. Two ensembles with the same fingerprint emit the same code.
pub fn fingerprint(ensemble: &TreeEnsemble) -> String {
    let mut hasher = blake3::Hasher::new();
    for name in ensemble.features.names() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.update(instruction_dump(ensemble, None).as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// First 16 hex digits of [`fingerprint`].
pub fn short_fingerprint(ensemble: &TreeEnsemble) -> String {
    let mut full = fingerprint(ensemble);
    full.truncate(16);
    full
}
