/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Folding collectors into each other.
//!
//! Merging node `from` into node `into` replays every committed row of
//! `from` into a batch on `into`, so the usual slot resolution takes care
//! of new and shared keys alike. Shared keys with sub-collectors on both
//! sides recurse. Afterwards the slot of `from` redirects to `into`: handles
//! to `from` that callers still hold keep working.

use numeric_ops::NumericOps;
use tracing::trace;

use super::CollectorTree;
use crate::arena::CollectorIndex;
use crate::error::{CollectorError, Result};
use crate::node::NodeState;

impl<O: NumericOps> CollectorTree<O> {
    /// Merge the root of `other` into `idx`.
    ///
    /// The nodes of `other` move into this tree. With `bump_source_number`
    /// the source counts of shared keys add up; without it they keep the
    /// count of `idx`.
    pub fn merge(
        &mut self,
        idx: CollectorIndex,
        other: Self,
        bump_source_number: bool,
    ) -> Result<()> {
        let into = self.nodes.resolve_mut(idx)?;
        self.nodes
            .get(into)?
            .check_mergeable(other.nodes.get(other.root)?)?;

        let imported = other.nodes.len();
        let mapping = self.nodes.absorb(other.nodes);
        let from = mapping
            .get(&other.root)
            .copied()
            .ok_or(CollectorError::StaleHandle)?;
        trace!(imported, ?into, ?from, "imported collector tree");
        self.merge_nodes(into, from, bump_source_number)
    }

    /// Merge node `from` into node `into`, both of this tree.
    ///
    /// An open batch on `into` stays open with the rows of `from` added to
    /// it; otherwise the rows are committed right away. A closed `into` is
    /// reopened.
    pub fn merge_nodes(
        &mut self,
        into: CollectorIndex,
        from: CollectorIndex,
        bump_source_number: bool,
    ) -> Result<()> {
        let into = self.nodes.resolve_mut(into)?;
        let from = self.nodes.resolve_mut(from)?;
        if into == from {
            return Ok(());
        }
        self.nodes
            .get(into)?
            .check_mergeable(self.nodes.get(from)?)?;
        if self.nodes.get(from)?.state() == NodeState::Staging {
            self.close_new_list(from)?;
        }
        trace!(?into, ?from, "merging collector nodes");

        let source = self.nodes.redirect(from, into)?;
        let target = self.nodes.get_mut(into)?;
        target.result = None;
        let was_staging = target.staging.is_some();
        target.open(source.columns.len());
        if let Some(theirs) = source.segment {
            match &mut target.segment {
                Some(ours) => ours.merge(theirs),
                None => target.segment = Some(theirs),
            }
        }

        let staging = target.staging_mut()?;
        let mut pairs = Vec::new();
        for entry in source.columns.into_entries() {
            pairs.extend(staging.stage_entry(entry, bump_source_number)?);
        }
        if !was_staging {
            self.close_new_list(into)?;
        }
        for (into, from) in pairs {
            self.merge_nodes(into, from, bump_source_number)?;
        }
        Ok(())
    }
}
