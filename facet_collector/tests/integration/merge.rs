/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use facet_collector::{
    CollectorConfig, CollectorError, CollectorTree, CollectorType, FloatOps, IntegerOps,
    NodeState, StatName, Statistic, StatsType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::helpers::{filled, init_tracing, list_config};

fn pre_aggregated(rows: &[(&str, i64, u64)]) -> CollectorTree<IntegerOps> {
    let mut tree = CollectorTree::new(list_config(StatsType::Basic)).unwrap();
    let root = tree.root();
    tree.init_new_list(root, rows.len()).unwrap();
    for &(key, sum, n) in rows {
        tree.add(root, Some(key), sum, n).unwrap();
    }
    tree.close_new_list(root).unwrap();
    tree
}

fn sum_and_n(tree: &CollectorTree<IntegerOps>, key: &str) -> (i64, u64) {
    let item = tree.item(tree.root(), Some(key)).unwrap().unwrap();
    match (item.statistic(&StatName::Sum), item.statistic(&StatName::N)) {
        (Statistic::Primary(Some(sum)), Statistic::Count(n)) => (sum, n),
        other => panic!("unexpected statistics for {key}: {other:?}"),
    }
}

#[test]
fn pre_aggregated_basic_merge() {
    init_tracing();
    let mut tree = pre_aggregated(&[("x", 5, 2)]);
    let root = tree.root();
    tree.merge(root, pre_aggregated(&[("x", 7, 3)]), true).unwrap();
    assert_eq!(sum_and_n(&tree, "x"), (12, 5));
}

#[test]
fn merge_order_does_not_matter() {
    let parts = [
        &[("a", 1, 1), ("b", 2, 2)][..],
        &[("b", 3, 1), ("c", 4, 4)][..],
        &[("a", 5, 5), ("c", 6, 1)][..],
    ];

    let mut forward = pre_aggregated(parts[0]);
    let root = forward.root();
    forward.merge(root, pre_aggregated(parts[1]), true).unwrap();
    forward.merge(root, pre_aggregated(parts[2]), true).unwrap();

    let mut backward = pre_aggregated(parts[2]);
    let mut inner = pre_aggregated(parts[1]);
    let inner_root = inner.root();
    inner.merge(inner_root, pre_aggregated(parts[0]), true).unwrap();
    let root = backward.root();
    backward.merge(root, inner, true).unwrap();

    for key in ["a", "b", "c"] {
        assert_eq!(sum_and_n(&forward, key), sum_and_n(&backward, key), "key {key}");
    }
    assert_eq!(sum_and_n(&forward, "b"), (5, 3));
}

#[test]
fn advanced_extrema_merge() {
    let config = || list_config(StatsType::Advanced);
    let mut tree = filled::<FloatOps>(config(), &[("k", vec![2.0, 8.0])]);
    let other = filled::<FloatOps>(config(), &[("k", vec![-1.0, 3.0])]);
    let root = tree.root();
    tree.merge(root, other, true).unwrap();

    let item = tree.item(root, Some("k")).unwrap().unwrap();
    assert!(matches!(item.statistic(&StatName::Min), Statistic::Primary(Some(min)) if min == -1.0));
    assert!(matches!(item.statistic(&StatName::Max), Statistic::Primary(Some(max)) if max == 8.0));
    assert!(matches!(item.statistic(&StatName::N), Statistic::Count(4)));
}

#[rstest]
#[case::precision(list_config(StatsType::Full))]
#[case::collector_type(CollectorConfig::new(CollectorType::Data, StatsType::Basic))]
fn mismatched_kinds_are_rejected(#[case] config: CollectorConfig) {
    let mut tree = pre_aggregated(&[("x", 1, 1)]);
    let root = tree.root();
    let other = CollectorTree::<IntegerOps>::new(config).unwrap();
    assert!(matches!(
        tree.merge(root, other, true),
        Err(CollectorError::KindMismatch { .. })
    ));
    // the failed merge leaves the tree untouched
    assert_eq!(tree.node_count(), 1);
    assert_eq!(sum_and_n(&tree, "x"), (1, 1));
}

#[test]
fn merging_into_a_closed_tree_reopens_it() {
    let mut tree = pre_aggregated(&[("a", 1, 1)]);
    let root = tree.root();
    tree.get_result(root).unwrap();
    assert_eq!(tree.state(root), Ok(NodeState::Closed));

    tree.merge(root, pre_aggregated(&[("a", 2, 1), ("b", 1, 1)]), true)
        .unwrap();
    assert_eq!(tree.state(root), Ok(NodeState::Idle));
    let result = tree.get_result(root).unwrap();
    assert_eq!(result.list().len(), 2);
    assert_eq!(result.get("a").unwrap().source_number(), 2);
}

fn two_level(rows: &[(&str, &str, i64)]) -> CollectorTree<IntegerOps> {
    let config = list_config(StatsType::Basic)
        .with_sub(CollectorConfig::new(CollectorType::List, StatsType::Basic));
    let mut tree = CollectorTree::new(config).unwrap();
    let root = tree.root();
    tree.init_new_list(root, rows.len()).unwrap();
    for &(outer, inner, value) in rows {
        let sub = tree.add(root, Some(outer), value, 1).unwrap().unwrap();
        tree.add(sub, Some(inner), value, 1).unwrap();
    }
    tree.close_new_list(root).unwrap();
    tree
}

#[test]
fn nested_levels_merge_recursively() {
    let mut tree = two_level(&[("red", "small", 1), ("red", "large", 5)]);
    let root = tree.root();
    let red = tree.item(root, Some("red")).unwrap().unwrap().sub().unwrap();
    tree.merge(root, two_level(&[("blue", "small", 2), ("red", "small", 3)]), true)
        .unwrap();

    assert_eq!(tree.keys(root).unwrap(), ["blue", "red"]);
    // a handle taken before the merge sees the merged keys
    assert_eq!(tree.keys(red).unwrap(), ["large", "small"]);
    let small = tree.item(red, Some("small")).unwrap().unwrap();
    assert!(matches!(small.statistic(&StatName::Sum), Statistic::Primary(Some(4))));
    assert_eq!(small.source_number(), 2);
}

/// One key at the top, and one value on every level below it.
fn one_key(config: CollectorConfig, key: &str) -> CollectorTree<IntegerOps> {
    let mut tree = CollectorTree::new(config).unwrap();
    let root = tree.root();
    tree.init_new_list(root, 1).unwrap();
    let mut next = tree.add(root, Some(key), 1, 1).unwrap();
    while let Some(sub) = next {
        let keyed = tree.config(sub).unwrap().collector_type() == CollectorType::List;
        next = tree.add(sub, keyed.then_some("inner"), 1, 1).unwrap();
    }
    tree.close_new_list(root).unwrap();
    tree
}

#[rstest]
#[case::missing_level(
    list_config(StatsType::Basic),
    list_config(StatsType::Basic).with_sub(CollectorConfig::new(CollectorType::Data, StatsType::Basic)),
    CollectorError::NestingMismatch { into_levels: 1, from_levels: 2 },
)]
#[case::extra_level(
    list_config(StatsType::Basic).with_sub(list_config(StatsType::Basic)),
    list_config(StatsType::Basic),
    CollectorError::NestingMismatch { into_levels: 2, from_levels: 1 },
)]
#[case::nested_kind(
    list_config(StatsType::Basic).with_sub(list_config(StatsType::Basic)),
    list_config(StatsType::Basic).with_sub(CollectorConfig::new(CollectorType::Data, StatsType::Basic)),
    CollectorError::KindMismatch {
        into_collector: CollectorType::List,
        into_stats: StatsType::Basic,
        from_collector: CollectorType::Data,
        from_stats: StatsType::Basic,
    },
)]
fn nested_shapes_must_match(
    #[case] into: CollectorConfig,
    #[case] from: CollectorConfig,
    #[case] expected: CollectorError,
) {
    let mut tree = one_key(into, "x");
    let nodes = tree.node_count();
    let root = tree.root();

    assert_eq!(tree.merge(root, one_key(from, "y"), true), Err(expected));
    assert_eq!(tree.keys(root).unwrap(), ["x"]);
    assert_eq!(tree.node_count(), nodes);
}
