/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! A single level of a collector tree.

use std::collections::HashMap;
use std::sync::Arc;

use numeric_ops::NumericOps;

use crate::arena::CollectorIndex;
use crate::columns::{KeyColumns, StagedColumns};
use crate::config::{CollectorConfig, CollectorType};
use crate::error::{CollectorError, Result};
use crate::result::CollectorResult;
use crate::segment::SegmentRegistry;

/// Key of the single slot of a [`CollectorType::Data`] node.
pub(crate) const DATA_KEY: &str = "";

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Committed columns only.
    Idle,
    /// A batch is open; values may be added.
    Staging,
    /// A result has been built. Only a merge reopens the node.
    Closed,
}

#[derive(Debug)]
pub(crate) struct CollectorNode<O: NumericOps> {
    pub(crate) config: Arc<CollectorConfig>,
    pub(crate) columns: KeyColumns<O>,
    pub(crate) staging: Option<StagedColumns<O>>,
    pub(crate) result: Option<CollectorResult<O>>,
    pub(crate) segment: Option<SegmentRegistry<O>>,
}

impl<O: NumericOps> CollectorNode<O> {
    pub(crate) fn new(config: Arc<CollectorConfig>) -> Self {
        let segment = config.segment_mode().map(SegmentRegistry::new);
        Self {
            config,
            columns: KeyColumns::default(),
            staging: None,
            result: None,
            segment,
        }
    }

    pub(crate) const fn state(&self) -> NodeState {
        if self.result.is_some() {
            NodeState::Closed
        } else if self.staging.is_some() {
            NodeState::Staging
        } else {
            NodeState::Idle
        }
    }

    /// The slot key for an upcoming value, checked against the node's shape.
    pub(crate) fn slot_key<'k>(&self, key: Option<&'k str>) -> Result<&'k str> {
        match (self.config.collector_type(), key) {
            (CollectorType::List, Some(key)) => Ok(key),
            (CollectorType::List, None) => Err(CollectorError::MissingKey),
            (CollectorType::Data, None) => Ok(DATA_KEY),
            (CollectorType::Data, Some(key)) => Err(CollectorError::UnexpectedKey(key.to_owned())),
        }
    }

    /// Open a batch on top of the committed columns.
    pub(crate) fn open(&mut self, capacity_hint: usize) {
        if self.staging.is_none() {
            let committed = std::mem::take(&mut self.columns);
            self.staging = Some(StagedColumns::open(committed, capacity_hint));
        }
    }

    /// The open batch, or [`CollectorError::NoStagingList`]. Closed nodes
    /// report [`CollectorError::Closed`].
    pub(crate) fn staging_mut(&mut self) -> Result<&mut StagedColumns<O>> {
        if self.result.is_some() {
            return Err(CollectorError::Closed);
        }
        self.staging.as_mut().ok_or(CollectorError::NoStagingList)
    }

    /// Sub-collectors in the committed columns and in the open batch.
    pub(crate) fn subs(&self) -> Vec<CollectorIndex> {
        let mut subs: Vec<CollectorIndex> = self.columns.subs().collect();
        if let Some(staging) = &self.staging {
            subs.extend(staging.subs());
        }
        subs
    }

    /// Nodes merge when every level, from this one down, agrees on collector
    /// type and precision, and both configs nest equally deep.
    pub(crate) fn check_mergeable(&self, other: &Self) -> Result<()> {
        let (mut into, mut from) = (self.config.as_ref(), other.config.as_ref());
        loop {
            let (into_collector, into_stats) = (into.collector_type(), into.stats_type());
            let (from_collector, from_stats) = (from.collector_type(), from.stats_type());
            if into_collector != from_collector || into_stats != from_stats {
                return Err(CollectorError::KindMismatch {
                    into_collector,
                    into_stats,
                    from_collector,
                    from_stats,
                });
            }
            match (into.sub(), from.sub()) {
                (Some(into_sub), Some(from_sub)) => (into, from) = (&**into_sub, &**from_sub),
                (None, None) => return Ok(()),
                _ => {
                    return Err(CollectorError::NestingMismatch {
                        into_levels: self.config.levels(),
                        from_levels: other.config.levels(),
                    });
                }
            }
        }
    }

    pub(crate) fn remap_handles(&mut self, mapping: &HashMap<CollectorIndex, CollectorIndex>) {
        self.columns.remap_handles(mapping);
        if let Some(staging) = &mut self.staging {
            staging.remap_handles(mapping);
        }
        if let Some(result) = &mut self.result {
            result.remap_handles(mapping);
        }
    }
}
