/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Debug invariant checks for the collector tree.
//!
//! These run after every [`CollectorTree::close_new_list`] in debug builds,
//! and in release builds with the `unittest` feature.

use numeric_ops::NumericOps;

use super::CollectorTree;
use crate::arena::CollectorIndex;
use crate::config::CollectorType;
use crate::node::DATA_KEY;

impl<O: NumericOps> CollectorTree<O> {
    /// Verify the committed state of every node reachable from the root.
    ///
    /// Panics with a descriptive message if any invariant is violated.
    pub fn check_tree_invariants(&self) {
        self.check_node_invariants(self.root);
    }

    /// Check the committed columns of `idx` and, recursively, of its
    /// sub-collectors.
    pub(crate) fn check_node_invariants(&self, idx: CollectorIndex) {
        let node = match self.nodes.get(idx) {
            Ok(node) => node,
            Err(err) => panic!("collector {idx:?} does not resolve: {err}"),
        };
        let columns = &node.columns;
        let len = columns.len();

        for (name, column_len) in [
            ("source_numbers", columns.source_numbers.len()),
            ("error_numbers", columns.error_numbers.len()),
            ("errors", columns.errors.len()),
            ("subs", columns.subs.len()),
            ("stats", columns.stats.len()),
        ] {
            assert_eq!(
                column_len, len,
                "column {name} of collector {idx:?} has {column_len} rows, keys have {len}"
            );
        }

        assert!(
            columns.is_strictly_sorted(),
            "keys of collector {idx:?} are not strictly sorted: {:?}",
            columns.keys,
        );

        if node.config.collector_type() == CollectorType::Data {
            assert!(
                columns.keys.iter().all(|key| key == DATA_KEY),
                "data collector {idx:?} holds a named key: {:?}",
                columns.keys,
            );
        }

        let has_sub = node.config.sub().is_some();
        for (key, sub) in columns.keys.iter().zip(&columns.subs) {
            assert_eq!(
                sub.is_some(),
                has_sub,
                "key {key:?} of collector {idx:?}: sub-collector present = {}, configured = {has_sub}",
                sub.is_some(),
            );
        }

        let stats_type = node.config.stats_type();
        for (key, stats) in columns.keys.iter().zip(&columns.stats) {
            assert_eq!(
                stats.stats_type(),
                stats_type,
                "key {key:?} of collector {idx:?} accumulates with the wrong precision",
            );
        }

        for sub in columns.subs() {
            self.check_node_invariants(sub);
        }
    }
}
