/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Histogram of raw values.
//!
//! Missing bounds are taken from the observed minimum and maximum. The bucket
//! width is rounded up to a short decimal (one digit beyond the width's
//! leading digit, whole numbers for integer values) so that labels neither
//! overlap nor need long fractions; the bucket count is then derived from the
//! rounded width. Integer ranges are discrete, so `end` is inclusive.

use numeric_ops::{NumericOps, ValueKind};
use serde::Serialize;

use crate::config::{DistributionParams, MAX_DISTRIBUTION_BUCKETS};

const DEFAULT_BUCKETS: usize = 10;

/// One interval of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// `[lower,upper)`, or `[lower,max]` for a last bucket holding the maximum.
    pub label: String,
    pub count: u64,
}

/// Rounded bucket width and the number of decimals needed to print it.
fn snap_width(raw: f64, integer: bool) -> (f64, usize) {
    if integer {
        return (raw.ceil().max(1.0), 0);
    }
    let decimals = (1.0 - raw.log10().floor()).max(0.0) as usize;
    let factor = 10f64.powi(decimals as i32);
    ((raw * factor).ceil() / factor, decimals)
}

pub(crate) fn buckets<O: NumericOps>(values: &[O::T1], params: &DistributionParams) -> Vec<Bucket> {
    let integer = O::KIND == ValueKind::Integer;
    let observed = values.iter().map(|&value| O::to_f64(value));
    let (min, max) = observed.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (Some(start), Some(end)) = (
        params.start.or((min <= max).then_some(min)),
        params.end.or((min <= max).then_some(max)),
    ) else {
        return Vec::new();
    };
    let (start, end) = if integer {
        (start.ceil(), end.floor())
    } else {
        (start, end)
    };
    let span = if integer { end + 1.0 - start } else { end - start };
    if !span.is_finite() || span < 0.0 || (integer && span == 0.0) {
        return Vec::new();
    }

    let raw = match (params.step, params.number) {
        (Some(step), _) if step > 0.0 => step,
        (_, number) => span / number.unwrap_or(DEFAULT_BUCKETS).max(1) as f64,
    };
    let (mut width, mut decimals) = if raw > 0.0 {
        snap_width(raw, integer)
    } else {
        (1.0, 0)
    };
    if span / width > MAX_DISTRIBUTION_BUCKETS as f64 {
        (width, decimals) = snap_width(span / MAX_DISTRIBUTION_BUCKETS as f64, integer);
    }
    let number = ((span / width).ceil() as usize).max(1);

    let mut rows = O::create_matrix1(number);
    for &value in values {
        let v = O::to_f64(value);
        if v < start || v > end {
            continue;
        }
        let bucket = (((v - start) / width).floor() as usize).min(number - 1);
        rows[bucket].push(value);
    }

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let lower = start + index as f64 * width;
            let upper = lower + width;
            let last = index + 1 == number;
            let label = match row.iter().map(|&value| O::to_f64(value)).reduce(f64::max) {
                Some(max) if last => format!("[{lower:.decimals$},{max:.decimals$}]"),
                _ => format!("[{lower:.decimals$},{upper:.decimals$})"),
            };
            Bucket {
                label,
                count: row.len() as u64,
            }
        })
        .collect()
}
