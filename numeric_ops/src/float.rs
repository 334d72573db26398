/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

use std::num::NonZeroU64;

use crate::{Number, NumericOps, ValueKind};

/// Strategy for float-valued facets: `T1 = T2 = f64`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatOps;

impl NumericOps for FloatOps {
    type T1 = f64;
    type T2 = f64;

    const KIND: ValueKind = ValueKind::Float;

    fn zero1() -> f64 {
        0.0
    }

    fn zero2() -> f64 {
        0.0
    }

    fn plus_infinity1() -> f64 {
        f64::INFINITY
    }

    fn minus_infinity1() -> f64 {
        f64::NEG_INFINITY
    }

    fn nan2() -> f64 {
        f64::NAN
    }

    fn add11(a: f64, b: f64) -> f64 {
        a + b
    }

    fn add22(a: f64, b: f64) -> f64 {
        a + b
    }

    fn subtract11(a: f64, b: f64) -> f64 {
        a - b
    }

    fn subtract22(a: f64, b: f64) -> f64 {
        a - b
    }

    fn product11(a: f64, b: f64) -> f64 {
        a * b
    }

    fn product22(a: f64, b: f64) -> f64 {
        a * b
    }

    fn min11(a: f64, b: f64) -> f64 {
        a.min(b)
    }

    fn max11(a: f64, b: f64) -> f64 {
        a.max(b)
    }

    fn divide1(a: f64, n: u64) -> f64 {
        if n == 0 { f64::NAN } else { a / n as f64 }
    }

    fn divide2(a: f64, n: u64) -> f64 {
        Self::divide1(a, n)
    }

    fn divide22(a: f64, b: f64) -> f64 {
        if b == 0.0 { f64::NAN } else { a / b }
    }

    fn multiply1(a: f64, n: u64) -> f64 {
        a * n as f64
    }

    fn quotient1(a: f64, n: NonZeroU64) -> f64 {
        a / n.get() as f64
    }

    fn log1(a: f64) -> f64 {
        a.ln()
    }

    fn sqrt2(a: f64) -> f64 {
        a.sqrt()
    }

    fn exp2(a: f64) -> f64 {
        a.exp()
    }

    fn to_t2(a: f64) -> f64 {
        a
    }

    fn from_count(n: u64) -> f64 {
        n as f64
    }

    fn to_f64(a: f64) -> f64 {
        a
    }

    fn parse1(text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|value| !value.is_nan())
    }

    fn number1(a: f64) -> Number {
        Number::Float(a)
    }

    fn number2(a: f64) -> Number {
        Number::Float(a)
    }

    fn is_defined2(a: f64) -> bool {
        !a.is_nan()
    }
}
