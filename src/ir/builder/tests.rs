use super::*;
use crate::fixed::Fixed;

fn universe() -> FeatureUniverse {
    FeatureUniverse::indexed(116)
}

fn stump() -> Vec<RawNode> {
    vec![
        RawNode::split(0, "f5", 0.3, 1, 2),
        RawNode::leaf(1, -0.1),
        RawNode::leaf(2, 0.2),
    ]
}

fn expect_malformed(raw: &[RawNode]) -> (Option<u32>, String) {
    match build_tree(4, raw, &universe()) {
        Err(ConvertError::MalformedTree { tree, node, reason }) => {
            assert_eq!(tree, 4);
            (node, reason)
        }
        Err(other) => panic!("expected MalformedTree, got {}", other),
        Ok(_) => panic!("expected MalformedTree, got a tree"),
    }
}

#[test]
fn test_build_stump() {
    let tree = build_tree(0, &stump(), &universe()).unwrap();
    assert_eq!(tree.len(), 3);
    match tree.root() {
        Node::Split {
            feature,
            threshold,
            yes,
            no,
        } => {
            assert_eq!(feature.index, 5);
            assert_eq!(feature.name, "f5");
            assert_eq!(*threshold, Fixed(3_000_000_000));
            assert_eq!(
                tree.node(*yes),
                &Node::Leaf {
                    value: Fixed(-1_000_000_000)
                }
            );
            assert_eq!(
                tree.node(*no),
                &Node::Leaf {
                    value: Fixed(2_000_000_000)
                }
            );
        }
        other => panic!("root should be a split, got {:?}", other),
    }
}

#[test]
fn test_preorder_layout_keeps_branch_order() {
    // dump ids deliberately out of order, yes-branch has the larger id
    let raw = vec![
        RawNode::leaf(4, 0.4),
        RawNode::split(0, "f1", 1.0, 2, 1),
        RawNode::leaf(1, 0.1),
        RawNode::split(2, "f2", 2.0, 3, 4),
        RawNode::leaf(3, 0.3),
    ];
    let tree = build_tree(0, &raw, &universe()).unwrap();
    let order: Vec<u32> = (0..tree.len())
        .map(|i| tree.source_id(NodeId(i as u32)))
        .collect();
    assert_eq!(order, vec![0, 2, 3, 4, 1]);

    match tree.root() {
        Node::Split { yes, no, .. } => {
            assert_eq!(tree.source_id(*yes), 2);
            assert_eq!(tree.source_id(*no), 1);
        }
        _ => panic!("root should be a split"),
    }
    assert_eq!(tree.depth(), 2);
}

#[test]
fn test_full_binary_invariant() {
    let raw = vec![
        RawNode::split(0, "f34", 12.0, 1, 2),
        RawNode::split(1, "f22", 0.845, 3, 4),
        RawNode::split(2, "f71", 11.0, 5, 6),
        RawNode::leaf(3, 0.022),
        RawNode::split(4, "f85", 1.03, 7, 8),
        RawNode::leaf(5, 0.021),
        RawNode::leaf(6, 0.019),
        RawNode::leaf(7, 0.0216),
        RawNode::leaf(8, 0.0177),
    ];
    let tree = build_tree(0, &raw, &universe()).unwrap();
    assert_eq!(tree.split_count(), 4);
    assert_eq!(tree.leaf_count(), tree.split_count() + 1);
}

#[test]
fn test_single_leaf_tree() {
    let tree = build_tree(0, &[RawNode::leaf(0, 0.5)], &universe()).unwrap();
    assert_eq!(tree.split_count(), 0);
    assert_eq!(tree.leaf_count(), 1);
    assert_eq!(tree.depth(), 0);
}

#[test]
fn test_dangling_child_rejected() {
    let raw = vec![
        RawNode::split(0, "f5", 0.3, 1, 7),
        RawNode::leaf(1, -0.1),
        RawNode::leaf(2, 0.2),
    ];
    let (node, reason) = expect_malformed(&raw);
    assert_eq!(node, Some(0));
    assert!(reason.contains("child id 7"), "{}", reason);
}

#[test]
fn test_children_without_predicate() {
    let mut raw = stump();
    raw[0].feature = None;
    raw[0].threshold = None;
    let (node, reason) = expect_malformed(&raw);
    assert_eq!(node, Some(0));
    assert!(reason.contains("no split predicate"));
}

#[test]
fn test_predicate_without_children() {
    let mut raw = stump();
    raw[0].yes = None;
    raw[0].no = None;
    let (_, reason) = expect_malformed(&raw);
    assert!(reason.contains("no children"));
}

#[test]
fn test_single_child_rejected() {
    let mut raw = stump();
    raw[0].no = None;
    let (_, reason) = expect_malformed(&raw);
    assert!(reason.contains("exactly two children"));
}

#[test]
fn test_missing_root() {
    let raw = vec![RawNode::leaf(1, 0.1)];
    let (node, reason) = expect_malformed(&raw);
    assert_eq!(node, None);
    assert!(reason.contains("missing root"));
}

#[test]
fn test_unreachable_node() {
    let mut raw = stump();
    raw.push(RawNode::leaf(9, 1.0));
    let (node, reason) = expect_malformed(&raw);
    assert_eq!(node, Some(9));
    assert!(reason.contains("not reachable"));
}

#[test]
fn test_shared_subtree_rejected() {
    let raw = vec![
        RawNode::split(0, "f1", 1.0, 1, 2),
        RawNode::split(1, "f2", 1.0, 3, 4),
        RawNode::split(2, "f3", 1.0, 3, 5),
        RawNode::leaf(3, 0.1),
        RawNode::leaf(4, 0.2),
        RawNode::leaf(5, 0.3),
    ];
    let (node, reason) = expect_malformed(&raw);
    assert_eq!(node, Some(3));
    assert!(reason.contains("more than one parent"));
}

#[test]
fn test_cycle_rejected() {
    let raw = vec![
        RawNode::split(0, "f1", 1.0, 1, 2),
        RawNode::split(1, "f2", 1.0, 0, 2),
        RawNode::leaf(2, 0.2),
    ];
    let (_, reason) = expect_malformed(&raw);
    assert!(reason.contains("more than one parent"));
}

#[test]
fn test_duplicate_id_and_non_finite_values() {
    let mut raw = stump();
    raw.push(RawNode::leaf(2, 0.9));
    let (node, reason) = expect_malformed(&raw);
    assert_eq!(node, Some(2));
    assert!(reason.contains("duplicate"));

    let mut raw = stump();
    raw[1].leaf = Some(f64::NAN);
    let (_, reason) = expect_malformed(&raw);
    assert!(reason.contains("not finite"));

    let mut raw = stump();
    raw[0].threshold = Some(f64::INFINITY);
    let (_, reason) = expect_malformed(&raw);
    assert!(reason.contains("not finite"));
}

#[test]
fn test_leaf_with_split_rejected() {
    let mut raw = stump();
    raw[0].leaf = Some(1.0);
    let (_, reason) = expect_malformed(&raw);
    assert!(reason.contains("both"));
}

#[test]
fn test_unknown_feature_aborts_ensemble() {
    let good = stump();
    let mut bad = stump();
    bad[0].feature = Some("f200".to_string());
    let err = build_ensemble(&[good, bad], universe()).unwrap_err();
    match err {
        ConvertError::UnknownFeature { tree, node, .. } => {
            assert_eq!(tree, 1);
            assert_eq!(node, 0);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_ensemble_keeps_order_and_features() {
    let dumps = vec![stump(), vec![RawNode::leaf(0, 0.5)], stump()];
    let ensemble = build_ensemble(&dumps, universe()).unwrap();
    assert_eq!(ensemble.len(), 3);
    assert_eq!(ensemble.feature_count(), 116);
    assert!(ensemble.trees[1].root().is_leaf());
    let referenced = ensemble.referenced_features();
    assert_eq!(referenced.len(), 1);
    assert_eq!(referenced[0].index, 5);
}

/// Split chain: every yes-branch is a leaf, every no-branch the next split.
fn chain(splits: u32) -> Vec<RawNode> {
    let mut raw = Vec::with_capacity(2 * splits as usize + 1);
    for k in 0..splits {
        raw.push(RawNode::split(2 * k, "f0", k as f64, 2 * k + 1, 2 * k + 2));
        raw.push(RawNode::leaf(2 * k + 1, 0.001));
    }
    raw.push(RawNode::leaf(2 * splits, -0.001));
    raw
}

#[test]
fn test_deep_chain_builds() {
    let tree = build_tree(0, &chain(10_000), &universe()).unwrap();
    assert_eq!(tree.split_count(), 10_000);
    assert_eq!(tree.depth(), 10_000);
    // preorder: the deepest split's children come last
    assert_eq!(tree.source_id(NodeId(tree.len() as u32 - 1)), 20_000);
    match tree.node(NodeId(1)) {
        Node::Leaf { value } => assert_eq!(*value, Fixed(10_000_000)),
        other => panic!("yes-branch of the root should be a leaf, got {:?}", other),
    }
}
