/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Per-key column storage and the staging buffer that rebuilds it.
//!
//! A node keeps one row per key, split into parallel columns that are always
//! the same length. While a batch of values is being added, the committed
//! columns are replayed in key order into a fresh set of columns
//! ([`StagedColumns`]); new keys are slotted in where they belong. Committing
//! the stage swaps the fresh columns in.

use std::collections::{BTreeMap, HashMap, VecDeque};

use itertools::izip;
use numeric_ops::NumericOps;

use crate::arena::CollectorIndex;
use crate::config::StatsType;
use crate::error::Result;
use crate::stats::Accumulator;

/// One row of [`KeyColumns`].
#[derive(Debug, Clone)]
pub(crate) struct KeyEntry<O: NumericOps> {
    pub(crate) key: String,
    pub(crate) source_number: u64,
    pub(crate) error_number: u64,
    pub(crate) errors: BTreeMap<String, u64>,
    pub(crate) sub: Option<CollectorIndex>,
    pub(crate) stats: Accumulator<O>,
}

impl<O: NumericOps> KeyEntry<O> {
    fn empty(key: &str, stats_type: StatsType) -> Self {
        Self {
            key: key.to_owned(),
            source_number: 1,
            error_number: 0,
            errors: BTreeMap::new(),
            sub: None,
            stats: Accumulator::zero(stats_type),
        }
    }
}

/// Parallel per-key columns, sorted by key once committed.
#[derive(Debug, Clone)]
pub(crate) struct KeyColumns<O: NumericOps> {
    pub(crate) keys: Vec<String>,
    pub(crate) source_numbers: Vec<u64>,
    pub(crate) error_numbers: Vec<u64>,
    pub(crate) errors: Vec<BTreeMap<String, u64>>,
    pub(crate) subs: Vec<Option<CollectorIndex>>,
    pub(crate) stats: Vec<Accumulator<O>>,
}

impl<O: NumericOps> Default for KeyColumns<O> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<O: NumericOps> KeyColumns<O> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            source_numbers: Vec::with_capacity(capacity),
            error_numbers: Vec::with_capacity(capacity),
            errors: Vec::with_capacity(capacity),
            subs: Vec::with_capacity(capacity),
            stats: Vec::with_capacity(capacity),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    /// Grow every column by the same amount.
    pub(crate) fn reserve(&mut self, additional: usize) {
        self.keys.reserve(additional);
        self.source_numbers.reserve(additional);
        self.error_numbers.reserve(additional);
        self.errors.reserve(additional);
        self.subs.reserve(additional);
        self.stats.reserve(additional);
    }

    pub(crate) fn push(&mut self, entry: KeyEntry<O>) -> usize {
        self.keys.push(entry.key);
        self.source_numbers.push(entry.source_number);
        self.error_numbers.push(entry.error_number);
        self.errors.push(entry.errors);
        self.subs.push(entry.sub);
        self.stats.push(entry.stats);
        self.keys.len() - 1
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = KeyEntry<O>> {
        izip!(
            self.keys,
            self.source_numbers,
            self.error_numbers,
            self.errors,
            self.subs,
            self.stats
        )
        .map(
            |(key, source_number, error_number, errors, sub, stats)| KeyEntry {
                key,
                source_number,
                error_number,
                errors,
                sub,
                stats,
            },
        )
    }

    /// Index of `key`. Only meaningful on committed columns.
    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.keys
            .binary_search_by(|slot_key| slot_key.as_str().cmp(key))
            .ok()
    }

    /// Store `incoming` in `slot`: merged into what is there when `existing`,
    /// replacing it otherwise.
    pub(crate) fn set_value(
        &mut self,
        slot: usize,
        incoming: &Accumulator<O>,
        existing: bool,
    ) -> Result<()> {
        if existing {
            self.stats[slot].merge(incoming)
        } else {
            self.stats[slot] = incoming.clone();
            Ok(())
        }
    }

    pub(crate) fn add_error(&mut self, slot: usize, message: &str, count: u64) {
        self.error_numbers[slot] += count;
        *self.errors[slot].entry(message.to_owned()).or_default() += count;
    }

    pub(crate) fn is_strictly_sorted(&self) -> bool {
        self.keys.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Fold `entry`, a row for the key at `slot`, into that row.
    ///
    /// Returns the pair of sub-collectors that still has to be merged when
    /// both rows carry one.
    pub(crate) fn absorb(
        &mut self,
        slot: usize,
        entry: KeyEntry<O>,
        bump_source_number: bool,
    ) -> Result<Option<(CollectorIndex, CollectorIndex)>> {
        self.stats[slot].merge(&entry.stats)?;
        self.error_numbers[slot] += entry.error_number;
        for (message, count) in entry.errors {
            *self.errors[slot].entry(message).or_default() += count;
        }
        if bump_source_number {
            self.source_numbers[slot] += entry.source_number;
        }
        Ok(match (self.subs[slot], entry.sub) {
            (Some(into), Some(from)) if into != from => Some((into, from)),
            (None, from) => {
                self.subs[slot] = from;
                None
            }
            _ => None,
        })
    }

    /// Sort by key and merge rows sharing a key.
    ///
    /// Returns the sub-collector pairs the merged rows leave to be merged.
    pub(crate) fn coalesce(&mut self) -> Result<Vec<(CollectorIndex, CollectorIndex)>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, key) in self.keys.iter().enumerate() {
            groups.entry(key.clone()).or_default().push(index);
        }
        let mut entries: Vec<Option<KeyEntry<O>>> =
            std::mem::take(self).into_entries().map(Some).collect();
        let mut pairs = Vec::new();
        let mut columns = Self::with_capacity(groups.len());
        for indices in groups.into_values() {
            let mut group = indices.into_iter().filter_map(|index| entries[index].take());
            let Some(first) = group.next() else {
                continue;
            };
            let slot = columns.push(first);
            for duplicate in group {
                pairs.extend(columns.absorb(slot, duplicate, true)?);
            }
        }
        *self = columns;
        Ok(pairs)
    }

    /// Keep the rows whose key passes `keep`, returning the sub-collectors
    /// of the dropped rows.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<CollectorIndex> {
        let mut dropped = Vec::new();
        let mut columns = Self::with_capacity(self.len());
        for entry in std::mem::take(self).into_entries() {
            if keep(&entry.key) {
                columns.push(entry);
            } else {
                dropped.extend(entry.sub);
            }
        }
        *self = columns;
        dropped
    }

    pub(crate) fn subs(&self) -> impl Iterator<Item = CollectorIndex> + '_ {
        self.subs.iter().flatten().copied()
    }

    pub(crate) fn remap_handles(&mut self, mapping: &HashMap<CollectorIndex, CollectorIndex>) {
        for sub in self.subs.iter_mut().flatten() {
            if let Some(new) = mapping.get(sub) {
                *sub = *new;
            }
        }
    }
}

/// Where [`StagedColumns::locate`] found a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Located {
    /// The key staged last.
    Current(usize),
    /// A committed key, just moved into the stage.
    Drained(usize),
    /// Not present.
    Missing,
}

/// The committed columns being rebuilt while a batch is added.
///
/// `previous` holds committed rows not yet replayed, `position` counts the
/// replayed ones. Rows arrive in `next` in key order as long as the batch is
/// sorted; an out of order batch leaves duplicates for
/// [`KeyColumns::coalesce`].
#[derive(Debug)]
pub(crate) struct StagedColumns<O: NumericOps> {
    previous: VecDeque<KeyEntry<O>>,
    position: usize,
    next: KeyColumns<O>,
    current: Option<usize>,
}

impl<O: NumericOps> StagedColumns<O> {
    pub(crate) fn open(committed: KeyColumns<O>, capacity_hint: usize) -> Self {
        let next = KeyColumns::with_capacity(committed.len() + capacity_hint);
        Self {
            previous: committed.into_entries().collect(),
            position: 0,
            next,
            current: None,
        }
    }

    pub(crate) const fn next(&self) -> &KeyColumns<O> {
        &self.next
    }

    pub(crate) const fn next_mut(&mut self) -> &mut KeyColumns<O> {
        &mut self.next
    }

    /// Number of committed rows replayed so far.
    pub(crate) const fn position(&self) -> usize {
        self.position
    }

    /// Double the capacity of every staged column.
    pub(crate) fn increase_size(&mut self) {
        let target = self.next.capacity().max(1) * 2;
        self.next.reserve(target - self.next.len());
    }

    fn stage(&mut self, entry: KeyEntry<O>) -> usize {
        if self.next.len() == self.next.capacity() {
            self.increase_size();
        }
        let slot = self.next.push(entry);
        self.current = Some(slot);
        slot
    }

    /// Replay committed rows up to `key` and report where `key` is.
    pub(crate) fn locate(&mut self, key: &str) -> Located {
        if let Some(current) = self.current
            && self.next.keys[current] == key
        {
            return Located::Current(current);
        }
        while let Some(front) = self.previous.front()
            && front.key.as_str() <= key
        {
            let Some(entry) = self.previous.pop_front() else {
                break;
            };
            self.position += 1;
            let found = entry.key == key;
            let slot = self.stage(entry);
            if found {
                return Located::Drained(slot);
            }
        }
        Located::Missing
    }

    /// The slot for `key`, created empty if missing. Returns the slot and
    /// whether it already held data.
    pub(crate) fn resolve(&mut self, key: &str, stats_type: StatsType) -> (usize, bool) {
        match self.locate(key) {
            Located::Current(slot) => (slot, true),
            Located::Drained(slot) => {
                self.next.source_numbers[slot] += 1;
                (slot, true)
            }
            Located::Missing => (self.stage(KeyEntry::empty(key, stats_type)), false),
        }
    }

    /// Put a whole row in the stage, folding it into an existing row for the
    /// same key.
    pub(crate) fn stage_entry(
        &mut self,
        entry: KeyEntry<O>,
        bump_source_number: bool,
    ) -> Result<Option<(CollectorIndex, CollectorIndex)>> {
        let slot = match self.locate(&entry.key) {
            Located::Current(slot) | Located::Drained(slot) => slot,
            Located::Missing => {
                self.stage(entry);
                return Ok(None);
            }
        };
        self.next.absorb(slot, entry, bump_source_number)
    }

    /// Replay the remaining committed rows and hand over the new columns.
    pub(crate) fn commit(mut self) -> KeyColumns<O> {
        self.next.reserve(self.previous.len());
        for entry in self.previous.drain(..) {
            self.next.push(entry);
        }
        self.next
    }

    /// Every sub-collector handle held by the stage, replayed or not.
    pub(crate) fn subs(&self) -> impl Iterator<Item = CollectorIndex> + '_ {
        self.next
            .subs()
            .chain(self.previous.iter().filter_map(|entry| entry.sub))
    }

    pub(crate) fn remap_handles(&mut self, mapping: &HashMap<CollectorIndex, CollectorIndex>) {
        self.next.remap_handles(mapping);
        for entry in &mut self.previous {
            if let Some(sub) = entry.sub.as_mut()
                && let Some(new) = mapping.get(sub)
            {
                *sub = *new;
            }
        }
    }
}
