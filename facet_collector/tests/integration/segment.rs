/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! The segment top-K boundary protocol, driven through the tree.

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use facet_collector::{
    CollectorConfig, CollectorError, CollectorTree, FloatOps, IntegerOps, SegmentMode,
    SegmentScope, SortDirection, SortType, StatName, StatsType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::helpers::{Segments, estimate_boundary, exact_totals, init_tracing, keys_passing, list_config};

fn segmented(mode: SegmentMode) -> CollectorConfig {
    list_config(StatsType::Basic)
        .with_sort(SortType::Stat(StatName::Sum), mode.direction())
        .with_segment_mode(mode)
}

fn segments(rows: &[&[(&str, i64)]]) -> Segments {
    rows.iter()
        .map(|segment| {
            segment
                .iter()
                .map(|&(key, value)| (key.to_owned(), value))
                .collect::<BTreeMap<_, _>>()
        })
        .collect()
}

#[test]
fn two_pass_protocol_finds_the_exact_top_keys() {
    init_tracing();
    // "spread" is never a local favourite but has the second best total
    let data = segments(&[
        &[("a", 50), ("spread", 30), ("x", 1)],
        &[("b", 45), ("spread", 30), ("y", 2)],
        &[("c", 40), ("spread", 30), ("a", 5)],
    ]);
    let totals = exact_totals(&data);
    assert_eq!(totals["spread"], 90);

    let boundary = estimate_boundary(&data, 2);
    let accepted = keys_passing(&data, boundary);
    assert!(accepted.contains("a"), "{accepted:?}");
    assert!(accepted.contains("spread"), "{accepted:?}");
    assert!(!accepted.contains("x"));
    assert!(!accepted.contains("y"));
}

#[test]
fn required_keys_pass_a_full_top_list() {
    let two = NonZeroU64::new(2).unwrap();
    let mut tree = CollectorTree::<IntegerOps>::new(segmented(SegmentMode::SortDesc)).unwrap();
    let root = tree.root();
    tree.init_new_segment_list(root, 1, &SegmentScope::new("s1", two))
        .unwrap();
    assert!(tree.validate_segment_value(root, "a", 10, 1, two, false).unwrap());
    tree.init_new_segment_list(root, 1, &SegmentScope::new("s2", two))
        .unwrap();
    assert!(tree.validate_segment_value(root, "b", 10, 1, two, false).unwrap());
    tree.recompute_segment_keys(root).unwrap();

    assert_eq!(tree.segment_recompute_keys(root, "s2").unwrap(), ["a"]);
    tree.init_new_segment_list(root, 1, &SegmentScope::new("s2", two))
        .unwrap();
    // "a" is worse than the kept value of s2 but now required
    assert!(tree.validate_segment_value(root, "a", 1, 1, two, true).unwrap());
    assert!(!tree.validate_segment_value(root, "z", 1, 1, two, true).unwrap());
    assert!(tree.validate_segment_value(root, "a", 1, 1, two, false).unwrap());
    assert!(tree.segment_recompute_keys(root, "s2").unwrap().is_empty());
}

#[rstest]
#[case(SegmentMode::SortAsc)]
#[case(SegmentMode::SortDesc)]
#[case(SegmentMode::BoundaryAsc)]
#[case(SegmentMode::BoundaryDesc)]
fn zero_top_k_accepts_nothing(#[case] mode: SegmentMode) {
    let one = NonZeroU64::MIN;
    let mut tree = CollectorTree::<FloatOps>::new(segmented(mode)).unwrap();
    let root = tree.root();
    let scope = SegmentScope::new("s", one).with_boundary("0");
    tree.init_new_segment_list(root, 0, &scope).unwrap();
    assert!(!tree.validate_segment_value(root, "a", 1.0, 0, one, false).unwrap());
}

#[test]
fn validation_needs_a_current_segment() {
    let mut tree = CollectorTree::<IntegerOps>::new(segmented(SegmentMode::SortDesc)).unwrap();
    let root = tree.root();
    assert_eq!(
        tree.validate_segment_value(root, "a", 1, 1, NonZeroU64::MIN, false),
        Err(CollectorError::NoCurrentSegment)
    );
}

#[test]
fn boundary_modes_need_a_boundary() {
    let mut tree = CollectorTree::<IntegerOps>::new(segmented(SegmentMode::BoundaryAsc)).unwrap();
    let root = tree.root();
    let scope = SegmentScope::new("s", NonZeroU64::MIN);
    assert_eq!(
        tree.init_new_segment_list(root, 0, &scope),
        Err(CollectorError::MissingBoundary {
            segment: "s".to_owned()
        })
    );
    // nothing was opened
    assert_eq!(tree.add(root, Some("a"), 1, 1), Err(CollectorError::NoStagingList));
}

#[test]
fn segment_modes_need_an_additive_sort() {
    let config = list_config(StatsType::Advanced)
        .with_sort(SortType::Stat(StatName::Max), SortDirection::Desc)
        .with_segment_mode(SegmentMode::SortDesc);
    assert!(matches!(
        CollectorTree::<IntegerOps>::new(config),
        Err(CollectorError::UnsupportedSort(_))
    ));
}

#[test]
fn per_segment_trees_merge_their_registries() {
    let three = NonZeroU64::new(3).unwrap();
    let data = segments(&[
        &[("a", 9), ("b", 1)],
        &[("b", 8), ("c", 2)],
        &[("c", 7), ("a", 1)],
    ]);

    let mut merged: Option<CollectorTree<IntegerOps>> = None;
    for (i, segment) in data.iter().enumerate() {
        let mut tree = CollectorTree::new(segmented(SegmentMode::SortDesc)).unwrap();
        let root = tree.root();
        tree.init_new_segment_list(root, segment.len(), &SegmentScope::new(format!("s{i}"), three))
            .unwrap();
        for (key, &value) in segment {
            if tree
                .validate_segment_value(root, key, value, 1, three, false)
                .unwrap()
            {
                tree.add(root, Some(key.as_str()), value, 1).unwrap();
            }
        }
        tree.close_new_list(root).unwrap();
        match &mut merged {
            Some(into) => {
                let root = into.root();
                into.merge(root, tree, true).unwrap();
            }
            None => merged = Some(tree),
        }
    }

    let mut tree = merged.unwrap();
    let root = tree.root();
    tree.recompute_segment_keys(root).unwrap();
    let accepted: Vec<&str> = tree
        .accepted_segment_keys(root)
        .unwrap()
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(accepted, ["a", "b", "c"]);
    assert_eq!(tree.segment_recompute_keys(root, "s0").unwrap(), ["b", "c"]);
    assert_eq!(tree.segment_boundary(root, "s1"), Ok(Some(2)));
}
