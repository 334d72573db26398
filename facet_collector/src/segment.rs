/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Bookkeeping for top-K pruning across independently scanned segments.
//!
//! A query that only wants the best K keys by an additive statistic does not
//! need every key of every segment. In a first pass ([`SegmentMode::SortAsc`]
//! or [`SegmentMode::SortDesc`]) each segment only records values that make
//! its local top K. From the worst kept value of each segment a conservative
//! boundary on totals is derived, and every recorded key passing it becomes
//! a candidate. Segments that have no value recorded for a candidate are
//! asked to look it up.
//!
//! A second pass ([`SegmentMode::BoundaryAsc`] or
//! [`SegmentMode::BoundaryDesc`]) receives a boundary from the caller and
//! records every value passing it.

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU64;

use numeric_ops::NumericOps;
use tracing::debug;

use crate::comparator::{at_least_as_good, positive_difference};
use crate::config::{SegmentBoundary, SegmentMode, SegmentScope, SortDirection};
use crate::error::{CollectorError, Result};

#[derive(Debug, Clone)]
struct SegmentState<O: NumericOps> {
    /// Recorded values by key.
    key_values: BTreeMap<String, O::T1>,
    boundary: Option<O::T1>,
    /// Best recorded values first, at most K of them.
    top: Vec<O::T1>,
    /// Worst value in `top`.
    last: Option<O::T1>,
    segment_number: NonZeroU64,
}

impl<O: NumericOps> SegmentState<O> {
    fn new(segment_number: NonZeroU64) -> Self {
        Self {
            key_values: BTreeMap::new(),
            boundary: None,
            top: Vec::new(),
            last: None,
            segment_number,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SegmentRegistry<O: NumericOps> {
    mode: SegmentMode,
    current: Option<String>,
    segments: BTreeMap<String, SegmentState<O>>,
    /// Keys accepted over all segments.
    keys: BTreeSet<String>,
    keys_fixed: bool,
    /// Per segment, the accepted keys it has no value recorded for.
    recompute: BTreeMap<String, BTreeSet<String>>,
}

impl<O: NumericOps> SegmentRegistry<O> {
    pub(crate) const fn new(mode: SegmentMode) -> Self {
        Self {
            mode,
            current: None,
            segments: BTreeMap::new(),
            keys: BTreeSet::new(),
            keys_fixed: false,
            recompute: BTreeMap::new(),
        }
    }

    const fn direction(&self) -> SortDirection {
        self.mode.direction()
    }

    /// Boundary on totals implied by a segment's worst kept value.
    ///
    /// Ascending: no other segment can do better than `last`, so a total
    /// can be at most `last * n`. Descending: a key beating the K-th total
    /// must reach `last / n` in at least one segment.
    fn boundary_for_segment(
        direction: SortDirection,
        last: O::T1,
        segment_number: NonZeroU64,
    ) -> O::T1 {
        match direction {
            SortDirection::Asc => O::multiply1(last, segment_number.get()),
            SortDirection::Desc => O::quotient1(last, segment_number),
        }
    }

    fn current_state(&mut self) -> Result<(&str, &mut SegmentState<O>)> {
        let name = self.current.as_deref().ok_or(CollectorError::NoCurrentSegment)?;
        let state = self
            .segments
            .get_mut(name)
            .ok_or(CollectorError::NoCurrentSegment)?;
        Ok((name, state))
    }

    /// Make `scope` the current segment. Boundary modes parse the scope's
    /// boundary; a total over all segments is spread evenly over them for
    /// descending sorts.
    pub(crate) fn begin_segment(&mut self, scope: &SegmentScope) -> Result<()> {
        let boundary = if self.mode.is_boundary() {
            let boundary = scope
                .boundary
                .as_ref()
                .ok_or_else(|| CollectorError::MissingBoundary {
                    segment: scope.name.clone(),
                })?;
            let (text, total) = match boundary {
                SegmentBoundary::Segment(text) => (text, false),
                SegmentBoundary::Total(text) => (text, true),
            };
            let value = O::parse1(text).ok_or_else(|| CollectorError::InvalidBoundary {
                value: text.clone(),
                kind: O::KIND,
            })?;
            Some(match self.direction() {
                SortDirection::Desc if total => O::quotient1(value, scope.number),
                _ => value,
            })
        } else {
            None
        };

        let state = self
            .segments
            .entry(scope.name.clone())
            .or_insert_with(|| SegmentState::new(scope.number));
        state.segment_number = scope.number;
        if boundary.is_some() {
            state.boundary = boundary;
        }
        self.current = Some(scope.name.clone());
        Ok(())
    }

    pub(crate) fn validate(
        &mut self,
        key: &str,
        value: O::T1,
        top_k: usize,
        segment_number: NonZeroU64,
        test: bool,
    ) -> Result<bool> {
        let direction = self.direction();
        let boundary_mode = self.mode.is_boundary();
        let required = self.keys.contains(key);
        let (name, state) = self.current_state()?;
        if top_k == 0 {
            return Ok(false);
        }
        let accepted = required
            || if boundary_mode {
                state
                    .boundary
                    .is_none_or(|boundary| at_least_as_good::<O>(value, boundary, direction))
            } else {
                state.top.len() < top_k
                    || state
                        .last
                        .is_none_or(|last| at_least_as_good::<O>(value, last, direction))
            };
        if !accepted || test {
            return Ok(accepted);
        }

        let name = name.to_owned();
        state.segment_number = segment_number;
        let newly_recorded = state.key_values.insert(key.to_owned(), value).is_none();
        if !boundary_mode && newly_recorded {
            let at = state
                .top
                .partition_point(|&kept| at_least_as_good::<O>(kept, value, direction));
            state.top.insert(at, value);
            state.top.truncate(top_k);
            state.last = state.top.last().copied();
            state.boundary = state
                .last
                .map(|last| Self::boundary_for_segment(direction, last, segment_number));
        }
        if let Some(pending) = self.recompute.get_mut(&name) {
            pending.remove(key);
        }
        Ok(true)
    }

    /// Boundary of `segment` corrected for what the other segments may add.
    ///
    /// Descending sorts add, for every other segment, how far that
    /// segment's boundary lies above this one.
    fn computed_boundary(&self, segment: &str, boundary: O::T1) -> O::T1 {
        match self.direction() {
            SortDirection::Asc => boundary,
            SortDirection::Desc => self
                .segments
                .iter()
                .filter(|(name, _)| name.as_str() != segment)
                .filter_map(|(_, other)| other.boundary)
                .fold(boundary, |total, other| {
                    O::add11(total, positive_difference::<O>(other, boundary))
                }),
        }
    }

    /// Fix the set of accepted keys from every segment's recorded values and
    /// queue the lookups segments still owe for them.
    pub(crate) fn recompute_keys(&mut self) {
        let direction = self.direction();
        if !self.mode.is_boundary() {
            let boundaries: Vec<(String, Option<O::T1>)> = self
                .segments
                .iter()
                .map(|(name, state)| {
                    let boundary = state
                        .last
                        .map(|last| Self::boundary_for_segment(direction, last, state.segment_number));
                    (name.clone(), boundary)
                })
                .collect();
            for (name, boundary) in boundaries {
                if let Some(state) = self.segments.get_mut(&name) {
                    state.boundary = boundary;
                }
            }
        }

        let mut accepted = Vec::new();
        for (name, state) in &self.segments {
            let cutoff = match state.boundary {
                Some(boundary) if !self.mode.is_boundary() => {
                    Some(self.computed_boundary(name, boundary))
                }
                boundary => boundary,
            };
            debug!(segment = %name, boundary = ?state.boundary, computed = ?cutoff, "segment boundary");
            accepted.extend(
                state
                    .key_values
                    .iter()
                    .filter(|&(_, &value)| {
                        cutoff.is_none_or(|cutoff| at_least_as_good::<O>(value, cutoff, direction))
                    })
                    .map(|(key, _)| key.clone()),
            );
        }
        self.keys.extend(accepted);

        self.recompute = self
            .segments
            .iter()
            .map(|(name, state)| {
                let missing = self
                    .keys
                    .iter()
                    .filter(|key| !state.key_values.contains_key(key.as_str()))
                    .cloned()
                    .collect();
                (name.clone(), missing)
            })
            .collect();
        self.keys_fixed = true;
        debug!(
            keys = self.keys.len(),
            pending = self.recompute.values().map(BTreeSet::len).sum::<usize>(),
            "recomputed segment keys"
        );
    }

    pub(crate) fn recompute_keys_for(&self, segment: &str) -> Vec<String> {
        self.recompute
            .get(segment)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn take_recompute_keys(&mut self, segment: &str) -> BTreeSet<String> {
        self.recompute.remove(segment).unwrap_or_default()
    }

    pub(crate) fn necessary_keys_exist(&self) -> bool {
        self.recompute.values().all(BTreeSet::is_empty)
    }

    /// Accept the current segment's recorded keys that pass its boundary.
    pub(crate) fn close_registration(&mut self) -> Result<()> {
        let direction = self.direction();
        let (_, state) = self.current_state()?;
        let passing: Vec<String> = state
            .key_values
            .iter()
            .filter(|&(_, &value)| {
                state
                    .boundary
                    .is_none_or(|boundary| at_least_as_good::<O>(value, boundary, direction))
            })
            .map(|(key, _)| key.clone())
            .collect();
        self.keys.extend(passing);
        self.keys_fixed = true;
        Ok(())
    }

    /// The accepted keys, once fixed.
    pub(crate) fn fixed_keys(&self) -> Option<&BTreeSet<String>> {
        self.keys_fixed.then_some(&self.keys)
    }

    pub(crate) fn boundary(&self, segment: &str) -> Option<O::T1> {
        self.segments.get(segment).and_then(|state| state.boundary)
    }

    /// Union with the registry of a merged node.
    pub(crate) fn merge(&mut self, other: Self) {
        let direction = self.direction();
        for (name, theirs) in other.segments {
            let Some(ours) = self.segments.get_mut(&name) else {
                self.segments.insert(name, theirs);
                continue;
            };
            let limit = ours.top.len().max(theirs.top.len());
            for (key, value) in theirs.key_values {
                ours.key_values.entry(key).or_insert(value);
            }
            ours.top.extend(theirs.top);
            ours.top
                .sort_by(|a, b| direction.apply(O::compare1(*a, *b)));
            ours.top.truncate(limit);
            ours.last = ours.top.last().copied();
            // the less selective boundary wins
            let worse: fn(O::T1, O::T1) -> O::T1 = match direction {
                SortDirection::Asc => O::max11,
                SortDirection::Desc => O::min11,
            };
            ours.boundary = O::lift11(ours.boundary, theirs.boundary, worse)
                .or(ours.boundary)
                .or(theirs.boundary);
        }
        self.keys.extend(other.keys);
        self.keys_fixed |= other.keys_fixed;
        for (name, pending) in other.recompute {
            self.recompute.entry(name).or_default().extend(pending);
        }
        for (name, pending) in &mut self.recompute {
            if let Some(state) = self.segments.get(name) {
                pending.retain(|key| !state.key_values.contains_key(key));
            }
        }
        if self.current.is_none() {
            self.current = other.current;
        }
    }
}
