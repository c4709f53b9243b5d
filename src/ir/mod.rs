//! Tree-ensemble intermediate representation.
//!
//! Each tree is an arena of nodes addressed by a local `NodeId`. Children
//! are referenced by index into the owning tree's arena, so no subtree can
//! be shared between trees or between two parents of the same tree. The
//! root is always arena slot 0.
//!
//! Trees are produced once by [`builder`] and are read-only afterwards.

pub mod builder;
pub mod eval;
pub mod features;

use crate::fixed::Fixed;

pub use builder::{build_ensemble, build_tree};
pub use features::FeatureUniverse;

/// Index into a tree's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A feature reference after resolution: the canonical declared name and
/// its dense array index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    pub name: String,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// `feature <= threshold` takes `yes`, otherwise `no`.
    Split {
        feature: FeatureRef,
        threshold: Fixed,
        yes: NodeId,
        no: NodeId,
    },
    Leaf {
        value: Fixed,
    },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// One decision tree. `source_ids[i]` is the dump's node id for arena slot `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
    source_ids: Vec<u32>,
}

impl Tree {
    pub(crate) fn from_parts(nodes: Vec<Node>, source_ids: Vec<u32>) -> Self {
        debug_assert_eq!(nodes.len(), source_ids.len());
        Tree { nodes, source_ids }
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node id as it appeared in the raw dump.
    pub fn source_id(&self, id: NodeId) -> u32 {
        self.source_ids[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn split_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_leaf()).count()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Longest root-to-leaf path, counted in split nodes.
    pub fn depth(&self) -> usize {
        // preorder: both children sit after their parent
        let mut below = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate().rev() {
            if let Node::Split { yes, no, .. } = node {
                below[i] = 1 + below[yes.index()].max(below[no.index()]);
            }
        }
        below.first().copied().unwrap_or(0)
    }
}

/// Ordered trees plus the feature universe they were resolved against.
///
/// Tree order is evaluation order; any prefix of `trees` is itself a valid
/// (truncated) ensemble.
#[derive(Clone, Debug)]
pub struct TreeEnsemble {
    pub trees: Vec<Tree>,
    pub features: FeatureUniverse,
}

impl TreeEnsemble {
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Features referenced by any split, ordered by index.
    pub fn referenced_features(&self) -> Vec<FeatureRef> {
        let mut seen = std::collections::BTreeMap::new();
        for tree in &self.trees {
            for node in tree.nodes() {
                if let Node::Split { feature, .. } = node {
                    seen.entry(feature.index).or_insert_with(|| feature.clone());
                }
            }
        }
        seen.into_values().collect()
    }
}
