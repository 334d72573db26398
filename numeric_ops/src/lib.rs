/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Arithmetic strategies for facet statistics.
//!
//! Facet values come in two flavours: integer-valued facets (term counts,
//! positions, lengths) and float-valued facets (scores, weights). The
//! aggregation algorithms are identical for both, so they are written once
//! against the [`NumericOps`] trait and instantiated with either
//! [`IntegerOps`] or [`FloatOps`].
//!
//! Every strategy works with two numeric kinds:
//!
//! - `T1`, the *primary* kind, in which raw values, sums, minima and maxima
//!   are stored;
//! - `T2`, the *secondary* kind, in which derived statistics (means,
//!   variances, logarithms) are expressed.
//!
//! # Null propagation
//!
//! A statistic that was never observed is not zero. When typed `T1` it is
//! represented as `None` (see [`NumericOps::lift11`]); when typed `T2` it
//! is `NaN` (see [`NumericOps::t2_or_nan`]). Operations that are undefined
//! for their input, such as dividing by a zero count, produce `NaN` as well.
//!
//! # Example
//!
//! ```
//! use numeric_ops::{IntegerOps, NumericOps};
//!
//! let sum = IntegerOps::add11(3, 4);
//! assert_eq!(sum, 7);
//! assert_eq!(IntegerOps::divide1(sum, 2), 3.5);
//! assert!(IntegerOps::divide1(sum, 0).is_nan());
//! assert_eq!(IntegerOps::lift11(Some(1), None, IntegerOps::add11), None);
//! ```

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::num::NonZeroU64;

mod float;
mod integer;

pub use float::FloatOps;
pub use integer::IntegerOps;

/// The numeric kind of the values a facet aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Whole numbers, stored as `i64`.
    Integer,
    /// Floating point numbers, stored as `f64`.
    Float,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
        }
    }
}

/// A rendered numeric value, ready for external serialization.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// The value as a float, whatever its kind.
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Arithmetic over a primary kind `T1` and a secondary kind `T2`.
///
/// Implementations are zero-sized strategy types; every method is an
/// associated function so that algorithms generic over `O: NumericOps`
/// are resolved statically. Algorithms must never hard-code a concrete
/// numeric type: zero values, identities and allocators all come from here.
pub trait NumericOps: Copy + Debug + Default + Send + Sync + 'static {
    /// Primary kind: raw values, sums, minima and maxima.
    type T1: Copy + PartialOrd + Debug + Display + Send + Sync + 'static;
    /// Secondary kind: derived statistics.
    type T2: Copy + PartialOrd + Debug + Display + Send + Sync + 'static;

    /// The value kind this strategy handles.
    const KIND: ValueKind;

    /// Additive identity of `T1`.
    fn zero1() -> Self::T1;
    /// Additive identity of `T2`.
    fn zero2() -> Self::T2;
    /// Identity of [`Self::min11`]: larger than or equal to every `T1`.
    fn plus_infinity1() -> Self::T1;
    /// Identity of [`Self::max11`]: smaller than or equal to every `T1`.
    fn minus_infinity1() -> Self::T1;
    /// The undefined `T2` value.
    fn nan2() -> Self::T2;

    fn add11(a: Self::T1, b: Self::T1) -> Self::T1;
    fn add22(a: Self::T2, b: Self::T2) -> Self::T2;
    fn subtract11(a: Self::T1, b: Self::T1) -> Self::T1;
    fn subtract22(a: Self::T2, b: Self::T2) -> Self::T2;
    fn product11(a: Self::T1, b: Self::T1) -> Self::T1;
    fn product22(a: Self::T2, b: Self::T2) -> Self::T2;
    fn min11(a: Self::T1, b: Self::T1) -> Self::T1;
    fn max11(a: Self::T1, b: Self::T1) -> Self::T1;

    /// `a / n`, `NaN` when `n` is zero.
    fn divide1(a: Self::T1, n: u64) -> Self::T2;
    /// `a / n`, `NaN` when `n` is zero.
    fn divide2(a: Self::T2, n: u64) -> Self::T2;
    /// `a / b`, `NaN` when `b` is zero.
    fn divide22(a: Self::T2, b: Self::T2) -> Self::T2;
    /// `a * n`, staying in the primary kind.
    fn multiply1(a: Self::T1, n: u64) -> Self::T1;
    /// `a / n`, staying in the primary kind. Integer kinds round towards
    /// negative infinity.
    fn quotient1(a: Self::T1, n: NonZeroU64) -> Self::T1;

    /// Natural logarithm.
    fn log1(a: Self::T1) -> Self::T2;
    fn sqrt2(a: Self::T2) -> Self::T2;
    fn exp2(a: Self::T2) -> Self::T2;

    /// Widen a primary value into the secondary kind.
    fn to_t2(a: Self::T1) -> Self::T2;
    /// Express a count in the primary kind.
    fn from_count(n: u64) -> Self::T1;
    /// Lossy conversion used for bucketing.
    fn to_f64(a: Self::T1) -> f64;
    /// Parse a primary value. Returns `None` for text that is not a value of
    /// this kind, e.g. `"2.5"` for an integer strategy.
    fn parse1(text: &str) -> Option<Self::T1>;

    fn number1(a: Self::T1) -> Number;
    fn number2(a: Self::T2) -> Number;

    /// Whether `a` is a defined secondary value (not `NaN`).
    fn is_defined2(a: Self::T2) -> bool;

    /// Total order on defined primary values.
    fn compare1(a: Self::T1, b: Self::T1) -> Ordering {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }

    /// Total order on defined secondary values.
    fn compare2(a: Self::T2, b: Self::T2) -> Ordering {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }

    /// Lift a binary primary operation over nullable operands.
    ///
    /// Yields `None` as soon as either operand is `None`.
    fn lift11(
        a: Option<Self::T1>,
        b: Option<Self::T1>,
        op: fn(Self::T1, Self::T1) -> Self::T1,
    ) -> Option<Self::T1> {
        Some(op(a?, b?))
    }

    /// Collapse a nullable secondary value, `None` becoming `NaN`.
    fn t2_or_nan(a: Option<Self::T2>) -> Self::T2 {
        a.unwrap_or_else(Self::nan2)
    }

    fn create_vector1(len: usize) -> Vec<Self::T1> {
        vec![Self::zero1(); len]
    }

    fn create_vector2(len: usize) -> Vec<Self::T2> {
        vec![Self::zero2(); len]
    }

    /// Allocate `rows` empty rows of primary values.
    fn create_matrix1(rows: usize) -> Vec<Vec<Self::T1>> {
        vec![Vec::new(); rows]
    }
}
