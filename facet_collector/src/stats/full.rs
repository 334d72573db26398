/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use numeric_ops::NumericOps;

use super::{Moments, Statistic, count2, distribution};
use crate::config::StatName;

/// Every raw value. Merging concatenates.
#[derive(Debug, Clone)]
pub struct Full<O: NumericOps> {
    pub values: Vec<O::T1>,
}

impl<O: NumericOps> Default for Full<O> {
    fn default() -> Self {
        Self {
            values: O::create_vector1(0),
        }
    }
}

impl<O: NumericOps> Full<O> {
    pub fn from_values(values: &[O::T1]) -> Self {
        let mut copy = O::create_vector1(values.len());
        copy.copy_from_slice(values);
        Self { values: copy }
    }

    pub fn n(&self) -> u64 {
        self.values.len() as u64
    }

    pub fn merge(&mut self, other: &Self) {
        self.values.extend_from_slice(&other.values);
    }

    fn moments(&self) -> Moments<O> {
        let mut moments = Moments {
            sum: O::zero1(),
            sum_sq: O::zero1(),
            sum_log: O::zero2(),
            n: self.n(),
        };
        for &value in &self.values {
            moments.sum = O::add11(moments.sum, value);
            moments.sum_sq = O::add11(moments.sum_sq, O::product11(value, value));
            moments.sum_log = O::add22(moments.sum_log, O::log1(value));
        }
        moments
    }

    fn sorted(&self) -> Vec<O::T1> {
        let mut sorted = O::create_vector1(self.values.len());
        sorted.copy_from_slice(&self.values);
        sorted.sort_by(|a, b| O::compare1(*a, *b));
        sorted
    }

    fn median(&self) -> O::T2 {
        let sorted = self.sorted();
        let middle = sorted.len() / 2;
        match sorted.len() {
            0 => O::nan2(),
            len if len % 2 == 1 => O::to_t2(sorted[middle]),
            _ => O::divide2(
                O::add22(O::to_t2(sorted[middle - 1]), O::to_t2(sorted[middle])),
                2,
            ),
        }
    }

    /// `x - mean` for every value.
    fn deltas(&self, mean: O::T2) -> Vec<O::T2> {
        let mut deltas = O::create_vector2(self.values.len());
        for (delta, &value) in deltas.iter_mut().zip(&self.values) {
            *delta = O::subtract22(O::to_t2(value), mean);
        }
        deltas
    }

    /// Sum of `delta^power`.
    fn central_sum(deltas: &[O::T2], power: u32) -> O::T2 {
        deltas.iter().fold(O::zero2(), |acc, &delta| {
            let term = (1..power).fold(delta, |term, _| O::product22(term, delta));
            O::add22(acc, term)
        })
    }

    /// Adjusted sample skewness, `NaN` below three values.
    fn skewness(&self) -> O::T2 {
        let n = self.n();
        if n < 3 {
            return O::nan2();
        }
        let moments = self.moments();
        let variance = moments.variance();
        if O::compare2(variance, O::zero2()).is_eq() {
            return O::zero2();
        }
        let mean = moments.mean();
        let cubes = Self::central_sum(&self.deltas(mean), 3);
        let standard_deviation = O::sqrt2(variance);
        let scale = O::divide22(count2::<O>(n), product2::<O>(&[n - 1, n - 2]));
        O::product22(
            scale,
            O::divide22(cubes, O::product22(variance, standard_deviation)),
        )
    }

    /// Sample excess kurtosis, `NaN` below four values.
    fn kurtosis(&self) -> O::T2 {
        let n = self.n();
        if n < 4 {
            return O::nan2();
        }
        let moments = self.moments();
        let variance = moments.variance();
        if O::compare2(variance, O::zero2()).is_eq() {
            return O::zero2();
        }
        let mean = moments.mean();
        let fourths = Self::central_sum(&self.deltas(mean), 4);
        let scale = O::divide22(
            product2::<O>(&[n, n + 1]),
            product2::<O>(&[n - 1, n - 2, n - 3]),
        );
        let term = O::product22(
            scale,
            O::divide22(fourths, O::product22(variance, variance)),
        );
        let correction = O::divide22(
            product2::<O>(&[3, n - 1, n - 1]),
            product2::<O>(&[n - 2, n - 3]),
        );
        O::subtract22(term, correction)
    }

    fn extreme(&self, pick: fn(O::T1, O::T1) -> O::T1) -> Option<O::T1> {
        self.values.iter().copied().reduce(pick)
    }

    pub fn statistic(&self, name: &StatName) -> Statistic<O> {
        match name {
            StatName::Min => Statistic::Primary(self.extreme(O::min11)),
            StatName::Max => Statistic::Primary(self.extreme(O::max11)),
            StatName::Median => Statistic::Secondary(self.median()),
            StatName::Skewness => Statistic::Secondary(self.skewness()),
            StatName::Kurtosis => Statistic::Secondary(self.kurtosis()),
            StatName::Distribution(params) => {
                Statistic::Distribution(distribution::buckets::<O>(&self.values, params))
            }
            name => self
                .moments()
                .statistic(name)
                .unwrap_or(Statistic::Unsupported),
        }
    }
}

/// Product of counts, multiplied in the secondary kind.
fn product2<O: NumericOps>(factors: &[u64]) -> O::T2 {
    factors
        .iter()
        .map(|&factor| count2::<O>(factor))
        .fold(count2::<O>(1), O::product22)
}
