/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Committing batches, compacting keys and finalizing results.

use std::collections::BTreeSet;
use std::sync::Arc;

use numeric_ops::NumericOps;
use tracing::debug;

use super::CollectorTree;
use crate::arena::CollectorIndex;
use crate::error::{CollectorError, Result};
use crate::item::Item;
use crate::node::NodeState;
use crate::result::CollectorResult;
use crate::segment::SegmentRegistry;

impl<O: NumericOps> CollectorTree<O> {
    /// Commit the open batch of `idx` and of every sub-collector it opened.
    ///
    /// Keys that arrived out of order are folded together here, merging
    /// their sub-collectors pairwise.
    pub fn close_new_list(&mut self, idx: CollectorIndex) -> Result<()> {
        let idx = self.nodes.resolve_mut(idx)?;
        let node = self.nodes.get_mut(idx)?;
        node.staging_mut()?;
        let Some(staging) = node.staging.take() else {
            return Err(CollectorError::NoStagingList);
        };
        node.columns = staging.commit();

        let pairs = if node.columns.is_strictly_sorted() {
            Vec::new()
        } else {
            let before = node.columns.len();
            let pairs = node.columns.coalesce()?;
            debug!(
                before,
                after = node.columns.len(),
                "coalesced out of order keys"
            );
            pairs
        };
        let subs: Vec<CollectorIndex> = node.columns.subs().collect();

        for (into, from) in pairs {
            self.merge_nodes(into, from, true)?;
        }
        for sub in subs {
            if self.nodes.get(sub)?.state() == NodeState::Staging {
                self.close_new_list(sub)?;
            }
        }

        #[cfg(any(debug_assertions, feature = "unittest"))]
        self.check_node_invariants(idx);
        Ok(())
    }

    /// Finalize `idx` and everything below it.
    ///
    /// An open batch is committed first. Once a segment registry has fixed
    /// its accepted keys, only those keys make it into the result. Closing
    /// a closed node does nothing.
    pub fn close(&mut self, idx: CollectorIndex) -> Result<()> {
        let idx = self.nodes.resolve_mut(idx)?;
        match self.nodes.get(idx)?.state() {
            NodeState::Closed => return Ok(()),
            NodeState::Staging => self.close_new_list(idx)?,
            NodeState::Idle => {}
        }

        let node = self.nodes.get(idx)?;
        let config = Arc::clone(&node.config);
        let accepted = node.segment.as_ref().and_then(SegmentRegistry::fixed_keys);
        let mut items: Vec<Item<O>> = Vec::with_capacity(node.columns.len());
        let mut pairs = Vec::new();
        for (slot, key) in node.columns.keys.iter().enumerate() {
            if accepted.is_some_and(|keys| !keys.contains(key)) {
                continue;
            }
            let item = Item::from_columns(&node.columns, slot, &config);
            match items.last_mut() {
                Some(last) if last.key() == item.key() => {
                    last.add(&item)?;
                    if let (Some(into), Some(from)) = (last.sub(), item.sub()) {
                        pairs.push((into, from));
                    }
                }
                _ => items.push(item),
            }
        }

        for (into, from) in pairs {
            self.merge_nodes(into, from, true)?;
        }
        for sub in items.iter().filter_map(Item::sub) {
            self.close(sub)?;
        }
        self.nodes.get_mut(idx)?.result = Some(CollectorResult::new(&config, items));
        Ok(())
    }

    /// The sorted, paginated result of `idx`, closing it first if needed.
    pub fn get_result(&mut self, idx: CollectorIndex) -> Result<&CollectorResult<O>> {
        self.close(idx)?;
        let Some(result) = &self.nodes.get(idx)?.result else {
            unreachable!("a closed collector always holds a result");
        };
        Ok(result)
    }

    /// Keep only `keys` in `idx`, freeing the sub-collectors of every
    /// dropped key. An open batch is committed first.
    pub fn reduce_to_keys(&mut self, idx: CollectorIndex, keys: &BTreeSet<String>) -> Result<()> {
        let idx = self.nodes.resolve_mut(idx)?;
        match self.nodes.get(idx)?.state() {
            NodeState::Closed => return Err(CollectorError::Closed),
            NodeState::Staging => self.close_new_list(idx)?,
            NodeState::Idle => {}
        }

        let columns = &mut self.nodes.get_mut(idx)?.columns;
        let before = columns.len();
        let dropped = columns.retain(|key| keys.contains(key));
        debug!(before, after = columns.len(), "reduced collector keys");
        for sub in dropped {
            self.free_subtree(sub);
        }
        Ok(())
    }
}
