/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Structural errors of the collector.
//!
//! Data problems of individual keys are never errors: they are counted with
//! [`CollectorTree::error`](crate::CollectorTree::error). The variants below
//! describe contract violations by the caller. None of them is retryable;
//! the unit of work that triggered one has to be restarted.

use numeric_ops::ValueKind;
use thiserror::Error;

use crate::config::{CollectorType, StatsType};

/// Errors returned by collector operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectorError {
    /// Two nodes with different shapes were asked to merge.
    #[error(
        "cannot merge a {from_collector}/{from_stats} collector into a {into_collector}/{into_stats} collector"
    )]
    KindMismatch {
        into_collector: CollectorType,
        into_stats: StatsType,
        from_collector: CollectorType,
        from_stats: StatsType,
    },

    /// Two nodes whose configs nest a different number of levels were asked
    /// to merge.
    #[error("cannot merge a collector of {from_levels} levels into one of {into_levels} levels")]
    NestingMismatch {
        into_levels: usize,
        from_levels: usize,
    },

    /// Two trees of different value kinds were asked to merge.
    #[error("cannot merge {from} values into a collector of {into} values")]
    ValueKindMismatch { into: ValueKind, from: ValueKind },

    /// The node has been finalized; only a merge may reopen it.
    #[error("collector is closed")]
    Closed,

    /// `add`/`error` was called without a prior `init_new_list`.
    #[error("collector has no open staging list")]
    NoStagingList,

    /// A list collector was given no key.
    #[error("list collector requires a key")]
    MissingKey,

    /// A data collector was given a key.
    #[error("data collector does not accept keys, got {0:?}")]
    UnexpectedKey(String),

    /// A boundary segment mode was initialized without a boundary.
    #[error("segment {segment:?} requires a boundary")]
    MissingBoundary { segment: String },

    /// The boundary text is not a value of the collector's kind.
    #[error("boundary {value:?} is not a valid {kind} value")]
    InvalidBoundary { value: String, kind: ValueKind },

    /// Unknown statistic name, or one the precision cannot compute.
    #[error("unsupported statistic: {0}")]
    UnsupportedStatistic(String),

    /// Unknown sort type, or one the configuration cannot sort on.
    #[error("unsupported sort: {0}")]
    UnsupportedSort(String),

    /// Unknown collector or stats type name.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The input shape is not supported by the precision.
    #[error("{stats} statistics cannot take a pre-aggregated sum of {n} values")]
    UnsupportedInput { stats: StatsType, n: u64 },

    /// Segment protocol operation on a node without segment registration.
    #[error("segment registration is not active")]
    SegmentRegistrationInactive,

    /// Segment protocol operation before any segment list was initialized.
    #[error("no current segment")]
    NoCurrentSegment,

    /// The handle refers to a node that no longer exists.
    #[error("stale collector handle")]
    StaleHandle,
}

/// Result alias for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;
