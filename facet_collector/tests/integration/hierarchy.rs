/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Nested collectors and their handles.

use std::collections::BTreeSet;

use facet_collector::{
    CollectorConfig, CollectorError, CollectorTree, CollectorType, IntegerOps, NodeState,
    StatName, Statistic, StatsType,
};
use pretty_assertions::assert_eq;

use crate::helpers::{init_tracing, list_config, page_keys};

/// color -> size -> single data slot
fn three_levels() -> CollectorConfig {
    list_config(StatsType::Basic).with_sub(
        list_config(StatsType::Advanced)
            .with_sub(CollectorConfig::new(CollectorType::Data, StatsType::Full)),
    )
}

#[test]
fn handles_of_coalesced_keys_redirect() {
    init_tracing();
    let config = list_config(StatsType::Basic).with_sub(list_config(StatsType::Basic));
    let mut tree = CollectorTree::<IntegerOps>::new(config).unwrap();
    let root = tree.root();
    tree.init_new_list(root, 3).unwrap();
    let first = tree.add(root, Some("b"), 1, 1).unwrap().unwrap();
    tree.add(first, Some("x"), 1, 1).unwrap();
    tree.add(root, Some("a"), 1, 1).unwrap();
    let second = tree.add(root, Some("b"), 1, 1).unwrap().unwrap();
    tree.add(second, Some("y"), 1, 1).unwrap();
    assert_ne!(first, second);
    tree.close_new_list(root).unwrap();

    assert_eq!(tree.resolve(second), tree.resolve(first));
    assert_eq!(tree.keys(second).unwrap(), ["x", "y"]);
    let b = tree.item(root, Some("b")).unwrap().unwrap();
    assert_eq!(b.source_number(), 2);
    assert_eq!(tree.resolve(b.sub().unwrap()), tree.resolve(first));
}

#[test]
fn results_close_every_level() {
    let mut tree = CollectorTree::<IntegerOps>::new(three_levels()).unwrap();
    let root = tree.root();
    tree.init_new_list(root, 2).unwrap();
    for (color, size, weight) in [("red", "large", 7), ("blue", "small", 1), ("red", "small", 2)] {
        let sizes = tree.add(root, Some(color), weight, 1).unwrap().unwrap();
        let slot = tree.add(sizes, Some(size), weight, 1).unwrap().unwrap();
        tree.add(slot, None, weight, 1).unwrap();
    }

    let result = tree.get_result(root).unwrap();
    assert_eq!(page_keys(result), ["blue", "red"]);
    let red_sizes = result.get("red").unwrap().sub().unwrap();
    assert_eq!(tree.state(red_sizes), Ok(NodeState::Closed));

    let sizes = tree.get_result(red_sizes).unwrap();
    assert_eq!(page_keys(sizes), ["large", "small"]);
    let large = sizes.get("large").unwrap().sub().unwrap();
    let data = tree.get_result(large).unwrap().data().unwrap();
    assert!(matches!(data.statistic(&StatName::Max), Statistic::Primary(Some(7))));
    assert_eq!(tree.node_count(), 1 + 2 + 3);
}

#[test]
fn adding_to_a_key_reopens_its_closed_sub_collector() {
    let config = list_config(StatsType::Basic).with_sub(list_config(StatsType::Basic));
    let mut tree = CollectorTree::<IntegerOps>::new(config).unwrap();
    let root = tree.root();
    tree.init_new_list(root, 1).unwrap();
    let sub = tree.add(root, Some("a"), 1, 1).unwrap().unwrap();
    tree.add(sub, Some("x"), 1, 1).unwrap();
    assert_eq!(tree.get_result(sub).unwrap().list().len(), 1);
    assert_eq!(tree.add(sub, Some("y"), 1, 1), Err(CollectorError::Closed));

    assert_eq!(tree.add(root, Some("a"), 1, 1), Ok(Some(sub)));
    assert_eq!(tree.state(sub), Ok(NodeState::Staging));
    tree.add(sub, Some("y"), 1, 1).unwrap();
    tree.close_new_list(root).unwrap();
    assert_eq!(tree.keys(sub).unwrap(), ["x", "y"]);
}

#[test]
fn reducing_keys_frees_whole_subtrees() {
    let mut tree = CollectorTree::<IntegerOps>::new(three_levels()).unwrap();
    let root = tree.root();
    tree.init_new_list(root, 2).unwrap();
    let mut slots = Vec::new();
    for color in ["blue", "green", "red"] {
        let sizes = tree.add(root, Some(color), 1, 1).unwrap().unwrap();
        let slot = tree.add(sizes, Some("small"), 1, 1).unwrap().unwrap();
        tree.add(slot, None, 1, 1).unwrap();
        slots.push((sizes, slot));
    }
    tree.close_new_list(root).unwrap();
    assert_eq!(tree.node_count(), 7);

    tree.reduce_to_keys(root, &BTreeSet::from(["green".to_owned()]))
        .unwrap();
    assert_eq!(tree.keys(root).unwrap(), ["green"]);
    assert_eq!(tree.node_count(), 3);
    let (blue_sizes, blue_slot) = slots[0];
    assert_eq!(tree.state(blue_sizes), Err(CollectorError::StaleHandle));
    assert_eq!(tree.state(blue_slot), Err(CollectorError::StaleHandle));
    let (green_sizes, _) = slots[1];
    assert_eq!(tree.keys(green_sizes).unwrap(), ["small"]);
}

#[test]
fn sub_levels_are_validated_with_the_root() {
    let config = list_config(StatsType::Basic).with_sub(
        list_config(StatsType::Basic).with_stats_items(vec![StatName::N, StatName::Kurtosis]),
    );
    assert!(matches!(
        CollectorTree::<IntegerOps>::new(config),
        Err(CollectorError::UnsupportedStatistic(_))
    ));
}
