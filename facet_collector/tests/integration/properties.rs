/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Property-based tests for the collector tree using `proptest`.

#[cfg(not(miri))]
mod proptests {
    use std::collections::BTreeMap;

    use facet_collector::{
        CollectorTree, FloatOps, IntegerOps, SortDirection, SortType, StatName, Statistic,
        StatsType,
    };

    use crate::helpers::{Segments, estimate_boundary, exact_totals, keys_passing, list_config};

    fn key(i: u8) -> String {
        format!("k{i:02}")
    }

    /// Adds every row in batches of `batch` values, in the given order.
    fn batched(rows: &[(u8, i64)], batch: usize) -> CollectorTree<IntegerOps> {
        let mut tree = CollectorTree::new(list_config(StatsType::Basic)).unwrap();
        let root = tree.root();
        for chunk in rows.chunks(batch.max(1)) {
            tree.init_new_list(root, chunk.len()).unwrap();
            for &(k, value) in chunk {
                tree.add(root, Some(key(k).as_str()), value, 1).unwrap();
            }
            tree.close_new_list(root).unwrap();
        }
        tree
    }

    fn expected_totals(rows: &[(u8, i64)]) -> BTreeMap<String, (i64, u64)> {
        let mut totals = BTreeMap::new();
        for &(k, value) in rows {
            let entry: &mut (i64, u64) = totals.entry(key(k)).or_default();
            entry.0 += value;
            entry.1 += 1;
        }
        totals
    }

    fn actual_totals(tree: &CollectorTree<IntegerOps>) -> BTreeMap<String, (i64, u64)> {
        let root = tree.root();
        tree.keys(root)
            .unwrap()
            .iter()
            .map(|k| {
                let item = tree.item(root, Some(k.as_str())).unwrap().unwrap();
                let Statistic::Primary(Some(sum)) = item.statistic(&StatName::Sum) else {
                    panic!("sum of {k} should be defined");
                };
                (k.clone(), (sum, item.stats().n()))
            })
            .collect()
    }

    fn as_f64(statistic: Statistic<FloatOps>) -> f64 {
        match statistic {
            Statistic::Count(n) => n as f64,
            Statistic::Primary(value) => value.unwrap_or(f64::NAN),
            Statistic::Secondary(value) => value,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    fn close_enough(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
    }

    proptest::proptest! {
        #[test]
        fn prop_batches_keep_keys_sorted_and_counted(
            rows in proptest::collection::vec((0u8..12, -100i64..100), 1..120),
            batch in 1usize..20,
        ) {
            let tree = batched(&rows, batch);
            let keys = tree.keys(tree.root()).unwrap();
            assert!(keys.windows(2).all(|pair| pair[0] < pair[1]), "{keys:?}");
            assert_eq!(actual_totals(&tree), expected_totals(&rows));
        }

        #[test]
        fn prop_merge_adds_counts_and_sums(
            left in proptest::collection::vec((0u8..10, -50i64..50), 0..60),
            right in proptest::collection::vec((0u8..10, -50i64..50), 0..60),
        ) {
            let mut tree = batched(&left, 7);
            let root = tree.root();
            tree.merge(root, batched(&right, 5), true).unwrap();

            let all: Vec<(u8, i64)> = left.iter().chain(&right).copied().collect();
            assert_eq!(actual_totals(&tree), expected_totals(&all));
        }

        #[test]
        fn prop_advanced_agrees_with_full(
            values in proptest::collection::vec(0.1f64..100.0, 1..50),
        ) {
            let build = |stats_type| {
                let mut tree = CollectorTree::<FloatOps>::new(list_config(stats_type)).unwrap();
                let root = tree.root();
                tree.init_new_list(root, 1).unwrap();
                tree.add_values(root, Some("k"), &values).unwrap();
                tree.close_new_list(root).unwrap();
                tree.item(root, Some("k")).unwrap().unwrap()
            };
            let advanced = build(StatsType::Advanced);
            let full = build(StatsType::Full);

            for name in [
                StatName::N,
                StatName::Sum,
                StatName::SumSq,
                StatName::Min,
                StatName::Max,
                StatName::Mean,
                StatName::Variance,
                StatName::PopulationVariance,
                StatName::StandardDeviation,
                StatName::GeometricMean,
                StatName::QuadraticMean,
            ] {
                let (a, f) = (as_f64(advanced.statistic(&name)), as_f64(full.statistic(&name)));
                assert!(close_enough(a, f), "{name}: advanced {a}, full {f}");
            }
        }

        #[test]
        fn prop_top_k_keys_survive_pruning(
            segments in proptest::collection::vec(
                proptest::collection::btree_map(0u8..12, 0i64..1000, 0..8),
                1..=5,
            ),
            top_k in 1usize..=4,
        ) {
            let segments: Segments = segments
                .into_iter()
                .map(|segment| segment.into_iter().map(|(k, v)| (key(k), v)).collect())
                .collect();
            let totals = exact_totals(&segments);
            let mut ranked: Vec<i64> = totals.values().copied().collect();
            ranked.sort_unstable_by(|a, b| b.cmp(a));
            let kth = ranked.get(top_k - 1).copied().unwrap_or(0);

            let boundary = estimate_boundary(&segments, top_k);
            assert!(boundary <= kth, "estimate {boundary} above the exact {kth}");
            let accepted = keys_passing(&segments, boundary);
            for (k, &total) in &totals {
                if total >= kth {
                    assert!(accepted.contains(k), "{k} with total {total} was pruned");
                }
            }
        }

        #[test]
        fn prop_pages_cover_the_window_and_keep_ties(
            counts in proptest::collection::vec(1usize..4, 1..12),
            start in 0usize..14,
            number in 1usize..5,
        ) {
            let config = list_config(StatsType::Basic)
                .with_sort(SortType::Stat(StatName::N), SortDirection::Desc)
                .with_page(start, Some(number));
            let mut tree = CollectorTree::<IntegerOps>::new(config).unwrap();
            let root = tree.root();
            tree.init_new_list(root, counts.len()).unwrap();
            for (i, &count) in counts.iter().enumerate() {
                tree.add_values(root, Some(key(i as u8).as_str()), &vec![1; count]).unwrap();
            }
            tree.close_new_list(root).unwrap();

            let result = tree.get_result(root).unwrap();
            let full: Vec<(&str, u64)> = result
                .full_list()
                .iter()
                .map(|item| (item.key(), item.stats().n()))
                .collect();
            let page: Vec<&str> = result.list().iter().map(|item| item.key()).collect();
            let window_end = start.saturating_add(number).min(full.len());
            let window = &full[start.min(full.len())..window_end];

            if window.is_empty() {
                assert!(page.is_empty());
            } else {
                let first = full
                    .iter()
                    .position(|&(k, _)| k == page[0])
                    .unwrap();
                let last = first + page.len() - 1;
                let covered: Vec<&str> = full[first..=last].iter().map(|&(k, _)| k).collect();
                assert_eq!(covered, page);
                assert!(first <= start && last + 1 >= window_end);
                if first > 0 {
                    assert_ne!(full[first - 1].1, full[first].1);
                }
                if let Some(next) = full.get(last + 1) {
                    assert_ne!(next.1, full[last].1);
                }
            }
        }
    }
}
