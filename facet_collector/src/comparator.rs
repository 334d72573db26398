/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Direction-aware comparison of single statistic values.

use std::cmp::Ordering;

use numeric_ops::NumericOps;

use crate::config::SortDirection;
use crate::stats::Statistic;

/// The value an item is sorted on.
#[derive(Debug, Clone, Copy)]
pub enum SortValue<O: NumericOps> {
    Count(u64),
    Primary(Option<O::T1>),
    Secondary(O::T2),
}

impl<O: NumericOps> SortValue<O> {
    pub(crate) fn from_statistic(statistic: Statistic<O>) -> Self {
        match statistic {
            Statistic::Count(n) => Self::Count(n),
            Statistic::Primary(value) => Self::Primary(value),
            Statistic::Secondary(value) => Self::Secondary(value),
            Statistic::Distribution(_) | Statistic::Unsupported => Self::Primary(None),
        }
    }

    pub fn is_defined(&self) -> bool {
        match self {
            Self::Count(_) => true,
            Self::Primary(value) => value.is_some(),
            Self::Secondary(value) => O::is_defined2(*value),
        }
    }

    /// Ascending order of two defined values of the same class.
    fn ascending(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Count(a), Self::Count(b)) => a.cmp(b),
            (Self::Primary(Some(a)), Self::Primary(Some(b))) => O::compare1(*a, *b),
            (Self::Secondary(a), Self::Secondary(b)) => O::compare2(*a, *b),
            _ => Ordering::Equal,
        }
    }

    /// Order in `direction`. Undefined values come last either way and are
    /// equal to each other.
    pub fn compare(&self, other: &Self, direction: SortDirection) -> Ordering {
        match (self.is_defined(), other.is_defined()) {
            (true, true) => direction.apply(self.ascending(other)),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
        }
    }
}

/// Whether `value` ranks at least as well as `reference` in `direction`.
pub(crate) fn at_least_as_good<O: NumericOps>(
    value: O::T1,
    reference: O::T1,
    direction: SortDirection,
) -> bool {
    direction.apply(O::compare1(value, reference)) != Ordering::Greater
}

/// `max(0, a - b)` in the primary kind.
pub(crate) fn positive_difference<O: NumericOps>(a: O::T1, b: O::T1) -> O::T1 {
    if O::compare1(a, b) == Ordering::Greater {
        O::subtract11(a, b)
    } else {
        O::zero1()
    }
}
