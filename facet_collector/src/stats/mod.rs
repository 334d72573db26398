/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Streaming statistics at three precisions.
//!
//! Each key of a collector owns one [`Accumulator`]. Its variant is fixed by
//! the collector's [`StatsType`] and never changes:
//!
//! - [`Basic`] keeps a sum and a count;
//! - [`Advanced`] keeps the moments needed for O(1) variance, geometric and
//!   quadratic means, plus minimum and maximum;
//! - [`Full`] keeps every raw value, which makes exact order statistics
//!   (median, distribution) available.
//!
//! Merging two accumulators of the same variant is exact for everything the
//! variant can compute.

mod advanced;
mod basic;
mod distribution;
mod full;

pub use advanced::Advanced;
pub use basic::Basic;
pub use distribution::Bucket;
pub use full::Full;

use numeric_ops::NumericOps;

use crate::config::{StatName, StatsType};
use crate::error::{CollectorError, Result};

/// The value of one statistic, typed by the class of the statistic.
#[derive(Debug, Clone)]
pub enum Statistic<O: NumericOps> {
    /// A number of values.
    Count(u64),
    /// A primary value; `None` when nothing was observed.
    Primary(Option<O::T1>),
    /// A derived value; `NaN` when undefined.
    Secondary(O::T2),
    /// Bucket counts.
    Distribution(Vec<Bucket>),
    /// The accumulator's precision cannot compute this statistic.
    Unsupported,
}

/// Per-key statistics state.
#[derive(Debug, Clone)]
pub enum Accumulator<O: NumericOps> {
    Basic(Basic<O>),
    Advanced(Advanced<O>),
    Full(Full<O>),
}

impl<O: NumericOps> Accumulator<O> {
    /// An accumulator that has seen nothing. Minimum and maximum start at
    /// their identities so that a later merge is unaffected.
    pub fn zero(stats_type: StatsType) -> Self {
        match stats_type {
            StatsType::Basic => Self::Basic(Basic::default()),
            StatsType::Advanced => Self::Advanced(Advanced::default()),
            StatsType::Full => Self::Full(Full::default()),
        }
    }

    /// An accumulator holding the given raw values.
    pub fn from_values(stats_type: StatsType, values: &[O::T1]) -> Self {
        match stats_type {
            StatsType::Basic => Self::Basic(Basic::from_values(values)),
            StatsType::Advanced => Self::Advanced(Advanced::from_values(values)),
            StatsType::Full => Self::Full(Full::from_values(values)),
        }
    }

    /// An accumulator for `n` values that sum up to `sum`.
    ///
    /// Only [`StatsType::Basic`] can take a sum of more than one value; the
    /// other precisions need the values themselves. For them `n == 1` is a
    /// single value and `n == 0` is an empty accumulator.
    pub fn from_sum(stats_type: StatsType, sum: O::T1, n: u64) -> Result<Self> {
        match (stats_type, n) {
            (StatsType::Basic, _) => Ok(Self::Basic(Basic { sum, n })),
            (_, 0) => Ok(Self::zero(stats_type)),
            (_, 1) => Ok(Self::from_values(stats_type, &[sum])),
            _ => Err(CollectorError::UnsupportedInput {
                stats: stats_type,
                n,
            }),
        }
    }

    pub const fn stats_type(&self) -> StatsType {
        match self {
            Self::Basic(_) => StatsType::Basic,
            Self::Advanced(_) => StatsType::Advanced,
            Self::Full(_) => StatsType::Full,
        }
    }

    /// Number of values folded into this accumulator.
    pub fn n(&self) -> u64 {
        match self {
            Self::Basic(basic) => basic.n,
            Self::Advanced(advanced) => advanced.n,
            Self::Full(full) => full.n(),
        }
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        match (self, other) {
            (Self::Basic(a), Self::Basic(b)) => a.merge(b),
            (Self::Advanced(a), Self::Advanced(b)) => a.merge(b),
            (Self::Full(a), Self::Full(b)) => a.merge(b),
            (this, other) => {
                return Err(CollectorError::UnsupportedInput {
                    stats: this.stats_type(),
                    n: other.n(),
                });
            }
        }
        Ok(())
    }

    pub fn statistic(&self, name: &StatName) -> Statistic<O> {
        match self {
            Self::Basic(basic) => basic.statistic(name),
            Self::Advanced(advanced) => advanced.statistic(name),
            Self::Full(full) => full.statistic(name),
        }
    }
}

/// Moment based statistics shared by [`Advanced`] and [`Full`].
#[derive(Debug, Clone, Copy)]
struct Moments<O: NumericOps> {
    sum: O::T1,
    sum_sq: O::T1,
    sum_log: O::T2,
    n: u64,
}

impl<O: NumericOps> Moments<O> {
    fn mean(&self) -> O::T2 {
        O::divide1(self.sum, self.n)
    }

    /// `(sumsq - sum^2 / n) / divisor`
    fn spread(&self, divisor: u64) -> O::T2 {
        let sum = O::to_t2(self.sum);
        let centered = O::subtract22(
            O::to_t2(self.sum_sq),
            O::divide2(O::product22(sum, sum), self.n),
        );
        O::divide2(centered, divisor)
    }

    fn variance(&self) -> O::T2 {
        O::t2_or_nan((self.n >= 2).then(|| self.spread(self.n - 1)))
    }

    fn population_variance(&self) -> O::T2 {
        O::t2_or_nan((self.n > 0).then(|| self.spread(self.n)))
    }

    /// Statistics computable from moments, `None` for everything else.
    fn statistic(&self, name: &StatName) -> Option<Statistic<O>> {
        let value = match name {
            StatName::N => Statistic::Count(self.n),
            StatName::Sum => Statistic::Primary(Some(self.sum)),
            StatName::SumSq => Statistic::Primary(Some(self.sum_sq)),
            StatName::Mean => Statistic::Secondary(self.mean()),
            StatName::SumOfLogs => Statistic::Secondary(self.sum_log),
            StatName::Variance => Statistic::Secondary(self.variance()),
            StatName::PopulationVariance => Statistic::Secondary(self.population_variance()),
            StatName::StandardDeviation => Statistic::Secondary(O::sqrt2(self.variance())),
            StatName::GeometricMean => {
                Statistic::Secondary(O::exp2(O::divide2(self.sum_log, self.n)))
            }
            StatName::QuadraticMean => {
                Statistic::Secondary(O::sqrt2(O::divide1(self.sum_sq, self.n)))
            }
            _ => return None,
        };
        Some(value)
    }
}

/// A count expressed in the secondary kind.
fn count2<O: NumericOps>(n: u64) -> O::T2 {
    O::to_t2(O::from_count(n))
}
