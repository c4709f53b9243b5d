//! Tree IR builder: raw per-tree dumps → validated node arenas.
//!
//! Node ids in a dump are arbitrary; the builder walks from dump id 0 and
//! lays nodes out in preorder, yes-branch first, so arena slot 0 is the root
//! and branch order is preserved. Thresholds and leaf values are quantized
//! and feature names resolved on the way in.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::fixed::quantize;
use crate::ir::{FeatureUniverse, Node, NodeId, Tree, TreeEnsemble};
use crate::model::RawNode;

/// What a raw node turned out to be after field validation.
enum Shape<'a> {
    Split {
        feature: &'a str,
        threshold: f64,
        yes: u32,
        no: u32,
    },
    Leaf(f64),
}

fn classify(tree: usize, raw: &RawNode) -> Result<Shape<'_>> {
    let err = |reason: String| ConvertError::malformed(tree, Some(raw.id), reason);

    let has_predicate = raw.feature.is_some() || raw.threshold.is_some();
    let has_children = raw.yes.is_some() || raw.no.is_some();

    match (has_predicate, has_children, raw.leaf) {
        (false, false, Some(value)) => {
            if !value.is_finite() {
                return Err(err(format!("leaf value {} is not finite", value)));
            }
            Ok(Shape::Leaf(value))
        }
        (false, false, None) => Err(err("node has neither a split nor a leaf value".to_string())),
        (_, _, Some(_)) => Err(err("node has both a leaf value and a split".to_string())),
        (false, true, None) => Err(err("node declares children but no split predicate".to_string())),
        (true, false, None) => Err(err("node declares a split predicate but no children".to_string())),
        (true, true, None) => {
            let (feature, threshold) = match (&raw.feature, raw.threshold) {
                (Some(f), Some(t)) => (f.as_str(), t),
                (None, _) => return Err(err("split predicate has no feature".to_string())),
                (_, None) => return Err(err("split predicate has no threshold".to_string())),
            };
            if !threshold.is_finite() {
                return Err(err(format!("threshold {} is not finite", threshold)));
            }
            match (raw.yes, raw.no) {
                (Some(yes), Some(no)) => Ok(Shape::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                }),
                _ => Err(err("split node must have exactly two children".to_string())),
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Branch {
    Yes,
    No,
}

struct Layout<'a> {
    tree: usize,
    raw: HashMap<u32, &'a RawNode>,
    universe: &'a FeatureUniverse,
    /// Arena slot per dump id, set once the node has been placed.
    placed: HashMap<u32, NodeId>,
    nodes: Vec<Node>,
    source_ids: Vec<u32>,
}

impl<'a> Layout<'a> {
    /// Place the tree under dump id 0 in preorder, yes-branch first.
    ///
    /// Walks with an explicit stack, so a chain of any length needs no
    /// more call depth than a stump.
    fn place_all(&mut self) -> Result<()> {
        // (dump id, dump id of the parent, parent slot and branch to link)
        let mut pending: Vec<(u32, Option<u32>, Option<(NodeId, Branch)>)> = vec![(0, None, None)];
        while let Some((id, parent, link)) = pending.pop() {
            let (slot, children) = self.place(id, parent)?;
            if let Some((at, branch)) = link {
                if let Node::Split { yes, no, .. } = &mut self.nodes[at.index()] {
                    match branch {
                        Branch::Yes => *yes = slot,
                        Branch::No => *no = slot,
                    }
                }
            }
            if let Some((yes, no)) = children {
                pending.push((no, Some(id), Some((slot, Branch::No))));
                pending.push((yes, Some(id), Some((slot, Branch::Yes))));
            }
        }
        Ok(())
    }

    /// Place one node. A split comes back with its dump children still to
    /// place; its arena links are filled in as they are.
    fn place(&mut self, id: u32, parent: Option<u32>) -> Result<(NodeId, Option<(u32, u32)>)> {
        let raw = match self.raw.get(&id) {
            Some(raw) => *raw,
            None => {
                return Err(ConvertError::malformed(
                    self.tree,
                    parent,
                    format!("child id {} does not resolve to a node in this tree", id),
                ))
            }
        };
        if self.placed.contains_key(&id) {
            return Err(ConvertError::malformed(
                self.tree,
                Some(id),
                "node is reachable from more than one parent".to_string(),
            ));
        }

        let (node, children) = match classify(self.tree, raw)? {
            Shape::Leaf(value) => (
                Node::Leaf {
                    value: quantize(value),
                },
                None,
            ),
            Shape::Split {
                feature,
                threshold,
                yes,
                no,
            } => {
                if yes == no {
                    return Err(ConvertError::malformed(
                        self.tree,
                        Some(id),
                        format!("yes and no branches both point to node {}", yes),
                    ));
                }
                let feature = self.universe.resolve(feature, self.tree, id)?;
                // the root can never be a child, so it marks an unset link
                let node = Node::Split {
                    feature,
                    threshold: quantize(threshold),
                    yes: NodeId::ROOT,
                    no: NodeId::ROOT,
                };
                (node, Some((yes, no)))
            }
        };

        let slot = NodeId(self.nodes.len() as u32);
        self.placed.insert(id, slot);
        self.nodes.push(node);
        self.source_ids.push(id);
        Ok((slot, children))
    }
}

/// Build one tree from its raw dump. `tree` is the ensemble position, used
/// in error reports.
pub fn build_tree(tree: usize, raw: &[RawNode], universe: &FeatureUniverse) -> Result<Tree> {
    let mut by_id: HashMap<u32, &RawNode> = HashMap::with_capacity(raw.len());
    for node in raw {
        if by_id.insert(node.id, node).is_some() {
            return Err(ConvertError::malformed(
                tree,
                Some(node.id),
                "duplicate node id".to_string(),
            ));
        }
    }
    if !by_id.contains_key(&0) {
        return Err(ConvertError::malformed(
            tree,
            None,
            "missing root node 0".to_string(),
        ));
    }

    let mut layout = Layout {
        tree,
        raw: by_id,
        universe,
        placed: HashMap::with_capacity(raw.len()),
        nodes: Vec::with_capacity(raw.len()),
        source_ids: Vec::with_capacity(raw.len()),
    };
    layout.place_all()?;

    if layout.placed.len() != raw.len() {
        let mut orphans: Vec<u32> = raw
            .iter()
            .map(|n| n.id)
            .filter(|id| !layout.placed.contains_key(id))
            .collect();
        orphans.sort_unstable();
        return Err(ConvertError::malformed(
            tree,
            Some(orphans[0]),
            format!("node is not reachable from the root ({} unreachable)", orphans.len()),
        ));
    }

    let Layout {
        nodes, source_ids, ..
    } = layout;
    let built = Tree::from_parts(nodes, source_ids);
    debug_assert_eq!(built.leaf_count(), built.split_count() + 1);
    Ok(built)
}

/// Build every tree in dump order. The first failure aborts the whole
/// ensemble.
pub fn build_ensemble(dumps: &[Vec<RawNode>], features: FeatureUniverse) -> Result<TreeEnsemble> {
    let mut trees = Vec::with_capacity(dumps.len());
    for (i, raw) in dumps.iter().enumerate() {
        let tree = build_tree(i, raw, &features)?;
        debug!(
            tree = i,
            splits = tree.split_count(),
            depth = tree.depth(),
            "built tree"
        );
        trees.push(tree);
    }
    Ok(TreeEnsemble { trees, features })
}

#[cfg(test)]
mod tests;
