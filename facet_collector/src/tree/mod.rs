/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! The collector tree.
//!
//! The implementation is split into sub-modules by concern:
//! - [`insert`]: batches of values (`init_new_list`, `add`, `error`)
//! - [`close`]: committing batches and building results
//! - [`merge`]: folding nodes and whole trees together
//! - [`segment`]: the top-K segment protocol

mod close;
mod insert;
#[cfg(any(debug_assertions, feature = "unittest"))]
mod invariants;
mod merge;
mod segment;

pub use insert::NOT_A_NUMBER;

use std::sync::Arc;

use numeric_ops::NumericOps;

use crate::arena::{CollectorIndex, NodeArena};
use crate::config::{CollectorConfig, StatName};
use crate::error::Result;
use crate::item::Item;
use crate::node::{CollectorNode, NodeState};
use crate::stats::Statistic;

/// A hierarchy of collectors sharing one arena.
///
/// The root collector aggregates values by key (or into a single slot); when
/// its configuration declares a nested level, every key owns a
/// sub-collector of that shape, addressed by a [`CollectorIndex`] handed
/// out by [`CollectorTree::add`].
///
/// A tree is driven in batches: [`init_new_list`](Self::init_new_list)
/// opens one, [`add`](Self::add) and [`error`](Self::error) fill it in
/// roughly sorted key order, [`close_new_list`](Self::close_new_list)
/// commits it. [`get_result`](Self::get_result) finalizes a node into a
/// sorted, paginated [`CollectorResult`](crate::CollectorResult).
///
/// # Arena Storage
///
/// Every node lives in one arena. Handles are generational: a handle to a
/// node that was dropped by [`reduce_to_keys`](Self::reduce_to_keys) is
/// reported as stale, and a handle to a node that was merged into another
/// resolves to the merged node.
#[derive(Debug)]
pub struct CollectorTree<O: NumericOps> {
    root: CollectorIndex,
    nodes: NodeArena<O>,
}

impl<O: NumericOps> CollectorTree<O> {
    /// A tree with an empty, idle root collector.
    pub fn new(config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        let mut nodes = NodeArena::default();
        let root = nodes.insert(CollectorNode::new(Arc::new(config)));
        Ok(Self { root, nodes })
    }

    pub const fn root(&self) -> CollectorIndex {
        self.root
    }

    /// Number of live collectors in the tree.
    pub const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The live collector `idx` stands for, following merge redirects.
    pub fn resolve(&self, idx: CollectorIndex) -> Result<CollectorIndex> {
        self.nodes.resolve(idx)
    }

    pub fn state(&self, idx: CollectorIndex) -> Result<NodeState> {
        Ok(self.nodes.get(idx)?.state())
    }

    pub fn config(&self, idx: CollectorIndex) -> Result<&Arc<CollectorConfig>> {
        Ok(&self.nodes.get(idx)?.config)
    }

    /// Committed keys, in order. Keys added to an open batch are not
    /// included until it is closed.
    pub fn keys(&self, idx: CollectorIndex) -> Result<&[String]> {
        Ok(&self.nodes.get(idx)?.columns.keys)
    }

    /// Snapshot of the committed state of `key` without closing the node.
    /// Data collectors take `None`.
    pub fn item(&self, idx: CollectorIndex, key: Option<&str>) -> Result<Option<Item<O>>> {
        let node = self.nodes.get(idx)?;
        let key = node.slot_key(key)?;
        Ok(node
            .columns
            .position(key)
            .map(|slot| Item::from_columns(&node.columns, slot, &node.config)))
    }

    /// One committed statistic of `key`, if the key exists.
    pub fn statistic(
        &self,
        idx: CollectorIndex,
        key: Option<&str>,
        name: &StatName,
    ) -> Result<Option<Statistic<O>>> {
        Ok(self.item(idx, key)?.map(|item| item.statistic(name)))
    }

    /// Create a detached node for a nested level.
    fn create_node(&mut self, config: Arc<CollectorConfig>) -> CollectorIndex {
        self.nodes.insert(CollectorNode::new(config))
    }

    /// Drop `idx` and everything below it from the arena.
    fn free_subtree(&mut self, idx: CollectorIndex) {
        let mut pending = vec![idx];
        while let Some(idx) = pending.pop() {
            if let Some(node) = self.nodes.remove(idx) {
                pending.extend(node.subs());
            }
        }
    }
}
