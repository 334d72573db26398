/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Final per-key snapshots.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use numeric_ops::{Number, NumericOps};
use serde::Serialize;

use crate::arena::CollectorIndex;
use crate::columns::KeyColumns;
use crate::comparator::SortValue;
use crate::config::{CollectorConfig, SortType, StatName, StatsType};
use crate::error::Result;
use crate::stats::{Accumulator, Bucket, Statistic};

/// A rendered statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(Number),
    Text(String),
    Distribution(Vec<Bucket>),
    Errors(BTreeMap<String, u64>),
    Null,
}

impl<O: NumericOps> From<Statistic<O>> for StatValue {
    fn from(statistic: Statistic<O>) -> Self {
        match statistic {
            Statistic::Count(n) => Self::Number(Number::Integer(i64::try_from(n).unwrap_or(i64::MAX))),
            Statistic::Primary(Some(value)) => Self::Number(O::number1(value)),
            Statistic::Secondary(value) if O::is_defined2(value) => Self::Number(O::number2(value)),
            Statistic::Distribution(buckets) => Self::Distribution(buckets),
            Statistic::Primary(None) | Statistic::Secondary(_) | Statistic::Unsupported => {
                Self::Null
            }
        }
    }
}

/// The final state of one key.
///
/// The sort value is computed on first use and forgotten whenever the item
/// absorbs another one.
#[derive(Debug, Clone)]
pub struct Item<O: NumericOps> {
    key: String,
    source_number: u64,
    error_number: u64,
    errors: BTreeMap<String, u64>,
    stats: Accumulator<O>,
    sub: Option<CollectorIndex>,
    config: Arc<CollectorConfig>,
    sort_value: OnceCell<SortValue<O>>,
}

impl<O: NumericOps> Item<O> {
    pub(crate) fn from_columns(columns: &KeyColumns<O>, slot: usize, config: &Arc<CollectorConfig>) -> Self {
        Self {
            key: columns.keys[slot].clone(),
            source_number: columns.source_numbers[slot],
            error_number: columns.error_numbers[slot],
            errors: columns.errors[slot].clone(),
            stats: columns.stats[slot].clone(),
            sub: columns.subs[slot],
            config: Arc::clone(config),
            sort_value: OnceCell::new(),
        }
    }

    /// The key; empty for data collectors.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn source_number(&self) -> u64 {
        self.source_number
    }

    pub const fn error_number(&self) -> u64 {
        self.error_number
    }

    pub const fn errors(&self) -> &BTreeMap<String, u64> {
        &self.errors
    }

    /// Sub-collector of this key, if the collector has a nested level.
    pub const fn sub(&self) -> Option<CollectorIndex> {
        self.sub
    }

    pub const fn stats(&self) -> &Accumulator<O> {
        &self.stats
    }

    pub const fn stats_type(&self) -> StatsType {
        self.stats.stats_type()
    }

    pub fn statistic(&self, name: &StatName) -> Statistic<O> {
        self.stats.statistic(name)
    }

    /// The value this item sorts on; `None` when sorting by key.
    pub fn sort_value(&self) -> Option<&SortValue<O>> {
        let SortType::Stat(stat) = self.config.sort_type() else {
            return None;
        };
        Some(
            self.sort_value
                .get_or_init(|| SortValue::from_statistic(self.stats.statistic(&stat))),
        )
    }

    /// Fold another item for the same key into this one.
    ///
    /// Sub-collectors are not touched; the tree merges them.
    pub fn add(&mut self, other: &Self) -> Result<()> {
        self.stats.merge(&other.stats)?;
        self.source_number += other.source_number;
        self.error_number += other.error_number;
        for (message, count) in &other.errors {
            *self.errors.entry(message.clone()).or_default() += count;
        }
        self.sort_value = OnceCell::new();
        Ok(())
    }

    /// Render every requested statistic by name.
    ///
    /// Statistics the precision cannot compute render as [`StatValue::Null`].
    /// `errorNumber` and `errorList` are present when errors were counted;
    /// `include_debug` adds `sourceNumber` and `statsType`.
    pub fn rewrite(&self, include_debug: bool) -> BTreeMap<String, StatValue> {
        let mut rendered: BTreeMap<String, StatValue> = self
            .config
            .stats_items()
            .iter()
            .map(|name| (name.to_string(), self.statistic(name).into()))
            .collect();
        if self.error_number > 0 {
            rendered.insert(
                "errorNumber".to_owned(),
                StatValue::Number(Number::Integer(
                    i64::try_from(self.error_number).unwrap_or(i64::MAX),
                )),
            );
            rendered.insert("errorList".to_owned(), StatValue::Errors(self.errors.clone()));
        }
        if include_debug {
            rendered.insert(
                "sourceNumber".to_owned(),
                StatValue::Number(Number::Integer(
                    i64::try_from(self.source_number).unwrap_or(i64::MAX),
                )),
            );
            rendered.insert(
                "statsType".to_owned(),
                StatValue::Text(self.stats_type().to_string()),
            );
        }
        rendered
    }

    pub(crate) fn remap_handles(&mut self, mapping: &HashMap<CollectorIndex, CollectorIndex>) {
        if let Some(sub) = self.sub.as_mut()
            && let Some(new) = mapping.get(sub)
        {
            *sub = *new;
        }
    }
}
