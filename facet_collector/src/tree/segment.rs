/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Segment top-K operations on a collector.
//!
//! See [`crate::segment`] for the protocol itself. Every operation here
//! fails with [`CollectorError::SegmentRegistrationInactive`] on a node
//! configured without a segment mode.

use std::collections::BTreeSet;
use std::num::NonZeroU64;

use numeric_ops::NumericOps;

use super::CollectorTree;
use crate::arena::CollectorIndex;
use crate::config::SegmentScope;
use crate::error::{CollectorError, Result};
use crate::node::NodeState;
use crate::segment::SegmentRegistry;

impl<O: NumericOps> CollectorTree<O> {
    fn registry(&self, idx: CollectorIndex) -> Result<&SegmentRegistry<O>> {
        self.nodes
            .get(idx)?
            .segment
            .as_ref()
            .ok_or(CollectorError::SegmentRegistrationInactive)
    }

    fn registry_mut(&mut self, idx: CollectorIndex) -> Result<&mut SegmentRegistry<O>> {
        self.nodes
            .get_mut(idx)?
            .segment
            .as_mut()
            .ok_or(CollectorError::SegmentRegistrationInactive)
    }

    /// [`init_new_list`](Self::init_new_list) for the segment described by
    /// `scope`, which becomes the current segment of `idx`.
    pub fn init_new_segment_list(
        &mut self,
        idx: CollectorIndex,
        capacity_hint: usize,
        scope: &SegmentScope,
    ) -> Result<()> {
        if self.state(idx)? == NodeState::Closed {
            return Err(CollectorError::Closed);
        }
        self.registry_mut(idx)?.begin_segment(scope)?;
        self.init_new_list(idx, capacity_hint)
    }

    /// Whether `value` of `key` in the current segment may matter for the
    /// best `top_k` keys. Unless `test` is set, an accepted value is
    /// recorded.
    pub fn validate_segment_value(
        &mut self,
        idx: CollectorIndex,
        key: &str,
        value: O::T1,
        top_k: usize,
        segment_number: NonZeroU64,
        test: bool,
    ) -> Result<bool> {
        self.registry_mut(idx)?
            .validate(key, value, top_k, segment_number, test)
    }

    /// Fix the accepted keys from everything recorded so far.
    pub fn recompute_segment_keys(&mut self, idx: CollectorIndex) -> Result<()> {
        self.registry_mut(idx)?.recompute_keys();
        Ok(())
    }

    /// Accepted keys `segment` has no value recorded for yet.
    pub fn segment_recompute_keys(&self, idx: CollectorIndex, segment: &str) -> Result<Vec<String>> {
        Ok(self.registry(idx)?.recompute_keys_for(segment))
    }

    /// Like [`segment_recompute_keys`](Self::segment_recompute_keys), but
    /// hands the work-list over to the caller.
    pub fn take_segment_recompute_keys(
        &mut self,
        idx: CollectorIndex,
        segment: &str,
    ) -> Result<BTreeSet<String>> {
        Ok(self.registry_mut(idx)?.take_recompute_keys(segment))
    }

    pub fn check_existence_necessary_keys(&self, idx: CollectorIndex) -> Result<bool> {
        Ok(self.registry(idx)?.necessary_keys_exist())
    }

    /// Accept the keys of the current segment that pass its boundary.
    pub fn close_segment_key_value_registration(&mut self, idx: CollectorIndex) -> Result<()> {
        self.registry_mut(idx)?.close_registration()
    }

    /// [`reduce_to_keys`](Self::reduce_to_keys) with the accepted keys.
    /// Nothing happens until the accepted keys are fixed.
    pub fn reduce_to_segment_keys(&mut self, idx: CollectorIndex) -> Result<()> {
        let Some(keys) = self.registry(idx)?.fixed_keys().cloned() else {
            return Ok(());
        };
        self.reduce_to_keys(idx, &keys)
    }

    /// Current boundary of `segment`.
    pub fn segment_boundary(&self, idx: CollectorIndex, segment: &str) -> Result<Option<O::T1>> {
        Ok(self.registry(idx)?.boundary(segment))
    }

    /// The accepted keys, once fixed.
    pub fn accepted_segment_keys(&self, idx: CollectorIndex) -> Result<Option<&BTreeSet<String>>> {
        Ok(self.registry(idx)?.fixed_keys())
    }
}
