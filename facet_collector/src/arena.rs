/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Arena storage for collector nodes.
//!
//! A newtype over a [`SlotMap`] addressed by [`CollectorIndex`]. Keys carry a
//! version, so handles to a removed node are detected on lookup instead of
//! silently reaching whatever node reuses the slot.
//!
//! A slot can also hold a redirect. When one node is merged into another,
//! the source slot keeps pointing at the target, and every outstanding
//! handle to the source resolves to the merged node. Mutable resolution
//! compresses redirect chains so repeated lookups stay cheap.

use std::collections::HashMap;

use numeric_ops::NumericOps;
use slotmap::{SlotMap, new_key_type};

use crate::error::{CollectorError, Result};
use crate::node::CollectorNode;

new_key_type! {
    struct NodeKey;
}

/// Handle to a collector node inside a [`CollectorTree`](crate::CollectorTree).
///
/// Wraps a versioned slot key. It stays valid while other nodes come and
/// go, and keeps resolving after its node was merged into another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CollectorIndex(NodeKey);

#[derive(Debug)]
enum Slot<O: NumericOps> {
    Live(Box<CollectorNode<O>>),
    Redirect(CollectorIndex),
}

#[derive(Debug)]
pub(crate) struct NodeArena<O: NumericOps> {
    slots: SlotMap<NodeKey, Slot<O>>,
    live: usize,
}

impl<O: NumericOps> Default for NodeArena<O> {
    fn default() -> Self {
        Self {
            slots: SlotMap::with_key(),
            live: 0,
        }
    }
}

impl<O: NumericOps> NodeArena<O> {
    /// Number of live nodes, redirects not included.
    pub(crate) const fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn insert(&mut self, node: CollectorNode<O>) -> CollectorIndex {
        self.live += 1;
        CollectorIndex(self.slots.insert(Slot::Live(Box::new(node))))
    }

    /// Follow redirects to the live node `idx` stands for.
    pub(crate) fn resolve(&self, mut idx: CollectorIndex) -> Result<CollectorIndex> {
        for _ in 0..=self.slots.len() {
            match self.slots.get(idx.0) {
                Some(Slot::Live(_)) => return Ok(idx),
                Some(Slot::Redirect(target)) => idx = *target,
                None => break,
            }
        }
        Err(CollectorError::StaleHandle)
    }

    /// [`Self::resolve`], pointing every redirect on the way directly at the
    /// live node.
    pub(crate) fn resolve_mut(&mut self, idx: CollectorIndex) -> Result<CollectorIndex> {
        let root = self.resolve(idx)?;
        let mut current = idx;
        while current != root {
            let Some(Slot::Redirect(target)) = self.slots.get_mut(current.0) else {
                break;
            };
            current = std::mem::replace(target, root);
        }
        Ok(root)
    }

    pub(crate) fn get(&self, idx: CollectorIndex) -> Result<&CollectorNode<O>> {
        let idx = self.resolve(idx)?;
        match self.slots.get(idx.0) {
            Some(Slot::Live(node)) => Ok(node),
            _ => Err(CollectorError::StaleHandle),
        }
    }

    pub(crate) fn get_mut(&mut self, idx: CollectorIndex) -> Result<&mut CollectorNode<O>> {
        let idx = self.resolve_mut(idx)?;
        match self.slots.get_mut(idx.0) {
            Some(Slot::Live(node)) => Ok(node),
            _ => Err(CollectorError::StaleHandle),
        }
    }

    /// Take the live node at `from` out of the arena, leaving a redirect to
    /// `into` behind.
    pub(crate) fn redirect(
        &mut self,
        from: CollectorIndex,
        into: CollectorIndex,
    ) -> Result<CollectorNode<O>> {
        let from = self.resolve_mut(from)?;
        let slot = self
            .slots
            .get_mut(from.0)
            .ok_or(CollectorError::StaleHandle)?;
        match std::mem::replace(slot, Slot::Redirect(into)) {
            Slot::Live(node) => {
                self.live -= 1;
                Ok(*node)
            }
            previous => {
                *slot = previous;
                Err(CollectorError::StaleHandle)
            }
        }
    }

    /// Free the live node behind `idx`. Its handles, and handles redirected
    /// to it, become stale.
    pub(crate) fn remove(&mut self, idx: CollectorIndex) -> Option<CollectorNode<O>> {
        let idx = self.resolve_mut(idx).ok()?;
        let Slot::Live(node) = self.slots.remove(idx.0)? else {
            return None;
        };
        self.live -= 1;
        Some(*node)
    }

    /// Move every node and redirect of `other` into this arena.
    ///
    /// Returns the mapping from `other`'s handles to the new ones. Handles
    /// stored inside the moved nodes are rewritten through the same mapping.
    pub(crate) fn absorb(&mut self, other: Self) -> HashMap<CollectorIndex, CollectorIndex> {
        let mut mapping = HashMap::with_capacity(other.slots.len());
        let mut moved = Vec::with_capacity(other.slots.len());
        self.live += other.live;
        for (key, slot) in other.slots {
            let new = CollectorIndex(self.slots.insert(slot));
            mapping.insert(CollectorIndex(key), new);
            moved.push(new);
        }

        for idx in moved {
            let dangling = match self.slots.get_mut(idx.0) {
                Some(Slot::Live(node)) => {
                    node.remap_handles(&mapping);
                    false
                }
                Some(Slot::Redirect(target)) => match mapping.get(target) {
                    Some(new_target) => {
                        *target = *new_target;
                        false
                    }
                    // dangling in `other` already
                    None => true,
                },
                None => false,
            };
            if dangling {
                self.slots.remove(idx.0);
            }
        }
        mapping
    }
}
