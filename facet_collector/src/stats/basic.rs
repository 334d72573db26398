/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use numeric_ops::NumericOps;

use super::Statistic;
use crate::config::StatName;

/// Sum and count.
#[derive(Debug, Clone, Copy)]
pub struct Basic<O: NumericOps> {
    pub sum: O::T1,
    pub n: u64,
}

impl<O: NumericOps> Default for Basic<O> {
    fn default() -> Self {
        Self {
            sum: O::zero1(),
            n: 0,
        }
    }
}

impl<O: NumericOps> Basic<O> {
    pub fn from_values(values: &[O::T1]) -> Self {
        Self {
            sum: values.iter().copied().fold(O::zero1(), O::add11),
            n: values.len() as u64,
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.sum = O::add11(self.sum, other.sum);
        self.n += other.n;
    }

    pub fn statistic(&self, name: &StatName) -> Statistic<O> {
        match name {
            StatName::N => Statistic::Count(self.n),
            StatName::Sum => Statistic::Primary(Some(self.sum)),
            StatName::Mean => Statistic::Secondary(O::divide1(self.sum, self.n)),
            _ => Statistic::Unsupported,
        }
    }
}
