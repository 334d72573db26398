/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use std::cmp::Ordering;
use std::num::NonZeroU64;

use crate::{Number, NumericOps, ValueKind};

/// Strategy for integer-valued facets: `T1 = i64`, `T2 = f64`.
///
/// Primary arithmetic saturates at the `i64` bounds rather than wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerOps;

/// Clamp a count into the primary kind.
fn count_to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl NumericOps for IntegerOps {
    type T1 = i64;
    type T2 = f64;

    const KIND: ValueKind = ValueKind::Integer;

    fn zero1() -> i64 {
        0
    }

    fn zero2() -> f64 {
        0.0
    }

    fn plus_infinity1() -> i64 {
        i64::MAX
    }

    fn minus_infinity1() -> i64 {
        i64::MIN
    }

    fn nan2() -> f64 {
        f64::NAN
    }

    fn add11(a: i64, b: i64) -> i64 {
        a.saturating_add(b)
    }

    fn add22(a: f64, b: f64) -> f64 {
        a + b
    }

    fn subtract11(a: i64, b: i64) -> i64 {
        a.saturating_sub(b)
    }

    fn subtract22(a: f64, b: f64) -> f64 {
        a - b
    }

    fn product11(a: i64, b: i64) -> i64 {
        a.saturating_mul(b)
    }

    fn product22(a: f64, b: f64) -> f64 {
        a * b
    }

    fn min11(a: i64, b: i64) -> i64 {
        a.min(b)
    }

    fn max11(a: i64, b: i64) -> i64 {
        a.max(b)
    }

    fn divide1(a: i64, n: u64) -> f64 {
        if n == 0 { f64::NAN } else { a as f64 / n as f64 }
    }

    fn divide2(a: f64, n: u64) -> f64 {
        if n == 0 { f64::NAN } else { a / n as f64 }
    }

    fn divide22(a: f64, b: f64) -> f64 {
        if b == 0.0 { f64::NAN } else { a / b }
    }

    fn multiply1(a: i64, n: u64) -> i64 {
        a.saturating_mul(count_to_i64(n))
    }

    fn quotient1(a: i64, n: NonZeroU64) -> i64 {
        a.div_euclid(count_to_i64(n.get()))
    }

    fn log1(a: i64) -> f64 {
        (a as f64).ln()
    }

    fn sqrt2(a: f64) -> f64 {
        a.sqrt()
    }

    fn exp2(a: f64) -> f64 {
        a.exp()
    }

    fn to_t2(a: i64) -> f64 {
        a as f64
    }

    fn from_count(n: u64) -> i64 {
        count_to_i64(n)
    }

    fn to_f64(a: i64) -> f64 {
        a as f64
    }

    fn parse1(text: &str) -> Option<i64> {
        text.trim().parse().ok()
    }

    fn number1(a: i64) -> Number {
        Number::Integer(a)
    }

    fn number2(a: f64) -> Number {
        Number::Float(a)
    }

    fn is_defined2(a: f64) -> bool {
        !a.is_nan()
    }

    fn compare1(a: i64, b: i64) -> Ordering {
        a.cmp(&b)
    }
}
