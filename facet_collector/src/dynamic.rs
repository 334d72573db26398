/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Collector trees whose value kind is only known at runtime.

use numeric_ops::{FloatOps, IntegerOps, Number, ValueKind};

use crate::arena::CollectorIndex;
use crate::config::CollectorConfig;
use crate::error::{CollectorError, Result};
use crate::tree::CollectorTree;

/// Error message recorded when a fractional value reaches an integer tree.
pub const NOT_AN_INTEGER: &str = "not an integer";

/// A [`CollectorTree`] of either value kind.
#[derive(Debug)]
pub enum AnyCollectorTree {
    Integer(CollectorTree<IntegerOps>),
    Float(CollectorTree<FloatOps>),
}

impl AnyCollectorTree {
    pub fn new(kind: ValueKind, config: CollectorConfig) -> Result<Self> {
        Ok(match kind {
            ValueKind::Integer => Self::Integer(CollectorTree::new(config)?),
            ValueKind::Float => Self::Float(CollectorTree::new(config)?),
        })
    }

    pub const fn value_kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
        }
    }

    pub const fn root(&self) -> CollectorIndex {
        match self {
            Self::Integer(tree) => tree.root(),
            Self::Float(tree) => tree.root(),
        }
    }

    pub fn init_new_list(&mut self, idx: CollectorIndex, capacity_hint: usize) -> Result<()> {
        match self {
            Self::Integer(tree) => tree.init_new_list(idx, capacity_hint),
            Self::Float(tree) => tree.init_new_list(idx, capacity_hint),
        }
    }

    /// Add `n` occurrences of `value` for `key`.
    ///
    /// This is [`CollectorTree::add`] with a sum of `value * n`, so only
    /// basic precision takes `n > 1`. Integer trees take integral floats as
    /// integers; any other float is counted as a [`NOT_AN_INTEGER`] error.
    pub fn add_number(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        value: Number,
        n: u64,
    ) -> Result<Option<CollectorIndex>> {
        match (self, value) {
            (Self::Integer(tree), Number::Integer(value)) => {
                tree.add(idx, key, value.saturating_mul(n.try_into().unwrap_or(i64::MAX)), n)
            }
            (Self::Integer(tree), Number::Float(value)) => match integral(value) {
                Some(value) => {
                    tree.add(idx, key, value.saturating_mul(n.try_into().unwrap_or(i64::MAX)), n)
                }
                None => tree.error(idx, key, NOT_AN_INTEGER, n),
            },
            (Self::Float(tree), value) => tree.add(idx, key, value.as_f64() * n as f64, n),
        }
    }

    /// See [`CollectorTree::add_text`].
    pub fn add_text(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        text: &str,
    ) -> Result<Option<CollectorIndex>> {
        match self {
            Self::Integer(tree) => tree.add_text(idx, key, text),
            Self::Float(tree) => tree.add_text(idx, key, text),
        }
    }

    pub fn error(
        &mut self,
        idx: CollectorIndex,
        key: Option<&str>,
        message: &str,
        count: u64,
    ) -> Result<Option<CollectorIndex>> {
        match self {
            Self::Integer(tree) => tree.error(idx, key, message, count),
            Self::Float(tree) => tree.error(idx, key, message, count),
        }
    }

    pub fn close_new_list(&mut self, idx: CollectorIndex) -> Result<()> {
        match self {
            Self::Integer(tree) => tree.close_new_list(idx),
            Self::Float(tree) => tree.close_new_list(idx),
        }
    }

    /// Merge the root of `other` into `idx`. Both trees must hold the same
    /// value kind.
    pub fn merge(&mut self, idx: CollectorIndex, other: Self, bump_source_number: bool) -> Result<()> {
        match (self, other) {
            (Self::Integer(tree), Self::Integer(other)) => tree.merge(idx, other, bump_source_number),
            (Self::Float(tree), Self::Float(other)) => tree.merge(idx, other, bump_source_number),
            (this, other) => Err(CollectorError::ValueKindMismatch {
                into: this.value_kind(),
                from: other.value_kind(),
            }),
        }
    }

    pub const fn as_integer(&self) -> Option<&CollectorTree<IntegerOps>> {
        match self {
            Self::Integer(tree) => Some(tree),
            Self::Float(_) => None,
        }
    }

    pub const fn as_float(&self) -> Option<&CollectorTree<FloatOps>> {
        match self {
            Self::Float(tree) => Some(tree),
            Self::Integer(_) => None,
        }
    }

    pub const fn as_integer_mut(&mut self) -> Option<&mut CollectorTree<IntegerOps>> {
        match self {
            Self::Integer(tree) => Some(tree),
            Self::Float(_) => None,
        }
    }

    pub const fn as_float_mut(&mut self) -> Option<&mut CollectorTree<FloatOps>> {
        match self {
            Self::Float(tree) => Some(tree),
            Self::Integer(_) => None,
        }
    }
}

/// `value` as an `i64` if it is a whole number in range.
fn integral(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then_some(value as i64)
}
