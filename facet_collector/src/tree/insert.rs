/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Write path: opening a batch and adding values and errors to it.
//!
//! Values are expected in roughly ascending key order. Each call resolves
//! the key against the committed columns by replaying them into the stage
//! up to the key, so a sorted batch costs one pass over the committed keys.
//! Out of order keys still work; [`CollectorTree::close_new_list`] folds
//! the duplicates they leave behind.

use std::sync::Arc;

use numeric_ops::NumericOps;

use super::CollectorTree;
use crate::arena::CollectorIndex;
use crate::error::{CollectorError, Result};
use crate::node::NodeState;
use crate::stats::Accumulator;

/// Error message recorded for values that do not parse.
pub const NOT_A_NUMBER: &str = "not a number";

impl<O: NumericOps> CollectorTree<O> {
    /// Open a batch on `idx`, reserving room for `capacity_hint` new keys.
    ///
    /// Opening a node that already has an open batch keeps that batch.
    pub fn init_new_list(&mut self, idx: CollectorIndex, capacity_hint: usize) -> Result<()> {
        let node = self.nodes.get_mut(idx)?;
        if node.state() == NodeState::Closed {
            return Err(CollectorError::Closed);
        }
        node.open(capacity_hint);
        Ok(())
    }

    /// Add a pre-aggregated `(sum, n)` for `key`.
    ///
    /// List collectors take `Some(key)`, data collectors `None`. Returns
    /// the key's sub-collector, opened and ready for values, when the
    /// collector has a nested level.
    pub fn add(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        sum: O::T1,
        n: u64,
    ) -> Result<Option<CollectorIndex>> {
        let stats_type = self.nodes.get(idx)?.config.stats_type();
        let incoming = Accumulator::from_sum(stats_type, sum, n)?;
        self.add_accumulator(idx, key, &incoming)
    }

    /// Add individual observations for `key`.
    pub fn add_values(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        values: &[O::T1],
    ) -> Result<Option<CollectorIndex>> {
        let stats_type = self.nodes.get(idx)?.config.stats_type();
        let incoming = Accumulator::from_values(stats_type, values);
        self.add_accumulator(idx, key, &incoming)
    }

    /// Parse `text` as one value of `key`. Text that does not parse as the
    /// tree's value kind is counted as a [`NOT_A_NUMBER`] error instead.
    pub fn add_text(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        text: &str,
    ) -> Result<Option<CollectorIndex>> {
        match O::parse1(text) {
            Some(value) => self.add(idx, key, value, 1),
            None => self.error(idx, key, NOT_A_NUMBER, 1),
        }
    }

    /// Count `count` occurrences of `message` against `key`.
    ///
    /// The key is created with an empty accumulator if it has no values yet.
    pub fn error(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        message: &str,
        count: u64,
    ) -> Result<Option<CollectorIndex>> {
        let idx = self.nodes.resolve_mut(idx)?;
        let node = self.nodes.get_mut(idx)?;
        let key = node.slot_key(key)?;
        let stats_type = node.config.stats_type();
        let staging = node.staging_mut()?;
        let (slot, _) = staging.resolve(key, stats_type);
        let columns = staging.next_mut();
        columns.add_error(slot, message, count);
        let sub = columns.subs[slot];
        self.touch_sub(idx, slot, sub)
    }

    /// Double the capacity of the open batch of `idx`.
    pub fn increase_new_list_size(&mut self, idx: CollectorIndex) -> Result<()> {
        self.nodes.get_mut(idx)?.staging_mut()?.increase_size();
        Ok(())
    }

    fn add_accumulator(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        incoming: &Accumulator<O>,
    ) -> Result<Option<CollectorIndex>> {
        let idx = self.nodes.resolve_mut(idx)?;
        let node = self.nodes.get_mut(idx)?;
        let key = node.slot_key(key)?;
        let stats_type = node.config.stats_type();
        let staging = node.staging_mut()?;
        let (slot, existing) = staging.resolve(key, stats_type);
        let columns = staging.next_mut();
        columns.set_value(slot, incoming, existing)?;
        let sub = columns.subs[slot];
        self.touch_sub(idx, slot, sub)
    }

    /// Make sure the staged row at `slot` of `idx` has an open
    /// sub-collector when the node has a nested level.
    fn touch_sub(
        &mut self,
        idx: CollectorIndex,
        slot: usize,
        sub: Option<CollectorIndex>,
    ) -> Result<Option<CollectorIndex>> {
        let Some(sub_config) = self.nodes.get(idx)?.config.sub().map(Arc::clone) else {
            return Ok(None);
        };
        let sub = match sub {
            Some(sub) => self.nodes.resolve_mut(sub)?,
            None => {
                let sub = self.create_node(sub_config);
                self.nodes.get_mut(idx)?.staging_mut()?.next_mut().subs[slot] = Some(sub);
                sub
            }
        };
        let node = self.nodes.get_mut(sub)?;
        node.result = None;
        node.open(0);
        Ok(Some(sub))
    }
}
