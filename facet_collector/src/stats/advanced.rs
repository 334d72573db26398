/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use numeric_ops::NumericOps;

use super::{Moments, Statistic};
use crate::config::StatName;

/// Streaming moments: everything but order statistics, in constant space.
///
/// `min` and `max` sit at [`NumericOps::plus_infinity1`] and
/// [`NumericOps::minus_infinity1`] while `n == 0`, and render as `None`.
#[derive(Debug, Clone, Copy)]
pub struct Advanced<O: NumericOps> {
    pub sum: O::T1,
    pub sum_sq: O::T1,
    pub sum_log: O::T2,
    pub min: O::T1,
    pub max: O::T1,
    pub n: u64,
}

impl<O: NumericOps> Default for Advanced<O> {
    fn default() -> Self {
        Self {
            sum: O::zero1(),
            sum_sq: O::zero1(),
            sum_log: O::zero2(),
            min: O::plus_infinity1(),
            max: O::minus_infinity1(),
            n: 0,
        }
    }
}

impl<O: NumericOps> Advanced<O> {
    pub fn from_values(values: &[O::T1]) -> Self {
        let mut advanced = Self::default();
        for &value in values {
            advanced.sum = O::add11(advanced.sum, value);
            advanced.sum_sq = O::add11(advanced.sum_sq, O::product11(value, value));
            advanced.sum_log = O::add22(advanced.sum_log, O::log1(value));
            advanced.min = O::min11(advanced.min, value);
            advanced.max = O::max11(advanced.max, value);
        }
        advanced.n = values.len() as u64;
        advanced
    }

    pub fn merge(&mut self, other: &Self) {
        self.sum = O::add11(self.sum, other.sum);
        self.sum_sq = O::add11(self.sum_sq, other.sum_sq);
        self.sum_log = O::add22(self.sum_log, other.sum_log);
        self.min = O::min11(self.min, other.min);
        self.max = O::max11(self.max, other.max);
        self.n += other.n;
    }

    const fn moments(&self) -> Moments<O> {
        Moments {
            sum: self.sum,
            sum_sq: self.sum_sq,
            sum_log: self.sum_log,
            n: self.n,
        }
    }

    fn observed(&self, value: O::T1) -> Option<O::T1> {
        (self.n > 0).then_some(value)
    }

    pub fn statistic(&self, name: &StatName) -> Statistic<O> {
        match name {
            StatName::Min => Statistic::Primary(self.observed(self.min)),
            StatName::Max => Statistic::Primary(self.observed(self.max)),
            name => self
                .moments()
                .statistic(name)
                .unwrap_or(Statistic::Unsupported),
        }
    }
}
