/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use facet_collector::{
    CollectorConfig, CollectorTree, CollectorType, FloatOps, IntegerOps, SortDirection, SortType,
    StatName, StatsType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::helpers::{filled, list_config, page_keys};

/// a:5, b:4, c:4, d:4, e:1 values, summed.
fn counted(config: CollectorConfig) -> CollectorTree<IntegerOps> {
    filled(
        config,
        &[
            ("a", vec![1; 5]),
            ("b", vec![1; 4]),
            ("c", vec![1; 4]),
            ("d", vec![1; 4]),
            ("e", vec![1]),
        ],
    )
}

fn by_n(direction: SortDirection) -> CollectorConfig {
    list_config(StatsType::Basic).with_sort(SortType::Stat(StatName::N), direction)
}

#[rstest]
#[case::tie_at_the_end(0, 2, &["a", "b", "c", "d"], Some("e"))]
#[case::tie_at_the_start(2, 1, &["b", "c", "d"], Some("e"))]
#[case::no_tie(0, 1, &["a"], Some("b"))]
#[case::past_the_end(9, 3, &[], None)]
#[case::unbounded(3, usize::MAX, &["b", "c", "d", "e"], None)]
fn pages_never_split_ties(
    #[case] start: usize,
    #[case] number: usize,
    #[case] expected: &[&str],
    #[case] end_key: Option<&str>,
) {
    let mut tree = counted(by_n(SortDirection::Desc).with_page(start, Some(number)));
    let root = tree.root();
    let result = tree.get_result(root).unwrap();
    assert_eq!(page_keys(result), expected);
    assert_eq!(result.end_key(), end_key);
    assert_eq!(result.start_key(), expected.first().copied());
    assert_eq!(result.full_list().len(), 5);
}

#[test]
fn ties_break_by_ascending_key_in_both_directions() {
    let mut tree = counted(by_n(SortDirection::Asc));
    let root = tree.root();
    assert_eq!(page_keys(tree.get_result(root).unwrap()), ["e", "b", "c", "d", "a"]);

    let mut tree = counted(by_n(SortDirection::Desc));
    let root = tree.root();
    assert_eq!(page_keys(tree.get_result(root).unwrap()), ["a", "b", "c", "d", "e"]);
}

#[test]
fn key_order_follows_the_direction() {
    let config = list_config(StatsType::Basic).with_sort(SortType::Key, SortDirection::Desc);
    let mut tree = counted(config);
    let root = tree.root();
    assert_eq!(page_keys(tree.get_result(root).unwrap()), ["e", "d", "c", "b", "a"]);
}

#[rstest]
#[case(SortDirection::Asc)]
#[case(SortDirection::Desc)]
fn undefined_values_sort_last(#[case] direction: SortDirection) {
    let config = list_config(StatsType::Advanced)
        .with_sort(SortType::Stat(StatName::Mean), direction);
    let mut tree = CollectorTree::<FloatOps>::new(config).unwrap();
    let root = tree.root();
    tree.init_new_list(root, 3).unwrap();
    tree.error(root, Some("empty"), "bad value", 1).unwrap();
    tree.add_values(root, Some("high"), &[9.0]).unwrap();
    tree.add_values(root, Some("low"), &[1.0, 2.0]).unwrap();
    tree.close_new_list(root).unwrap();

    let result = tree.get_result(root).unwrap();
    let keys = page_keys(result);
    assert_eq!(keys.last(), Some(&"empty"));
    assert!(!result.list()[2].sort_value().unwrap().is_defined());
    let expected = match direction {
        SortDirection::Asc => ["low", "high"],
        SortDirection::Desc => ["high", "low"],
    };
    assert_eq!(keys[..2], expected);
}

#[test]
fn data_results_expose_the_single_item() {
    let mut tree = CollectorTree::<IntegerOps>::new(CollectorConfig::new(
        CollectorType::Data,
        StatsType::Basic,
    ))
    .unwrap();
    let root = tree.root();
    tree.init_new_list(root, 1).unwrap();
    tree.add(root, None, 10, 4).unwrap();
    let result = tree.get_result(root).unwrap();
    let item = result.data().unwrap();
    assert_eq!(item.key(), "");
    assert_eq!(item.stats().n(), 4);
    assert_eq!(result.collector_type(), CollectorType::Data);
}

#[test]
fn list_results_have_no_data_item() {
    let mut tree = counted(list_config(StatsType::Basic));
    let root = tree.root();
    assert!(tree.get_result(root).unwrap().data().is_none());
}
