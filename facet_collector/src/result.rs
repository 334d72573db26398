/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Sorted, paginated view of a closed collector.
//!
//! Items are ordered by key, or by a statistic with ties broken by key. The
//! page `[start, start + number)` is then widened at both ends so that a
//! group of items sharing the sort value at the page edge is never split.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;

use numeric_ops::NumericOps;

use crate::arena::CollectorIndex;
use crate::config::{CollectorConfig, CollectorType, SortType};
use crate::item::Item;

#[derive(Debug)]
pub struct CollectorResult<O: NumericOps> {
    collector_type: CollectorType,
    items: Vec<Item<O>>,
    window: Range<usize>,
}

fn order<O: NumericOps>(config: &CollectorConfig, a: &Item<O>, b: &Item<O>) -> Ordering {
    let direction = config.sort_direction();
    match (config.sort_type(), a.sort_value(), b.sort_value()) {
        (SortType::Stat(_), Some(x), Some(y)) => x
            .compare(y, direction)
            .then_with(|| a.key().cmp(b.key())),
        _ => direction.apply(a.key().cmp(b.key())),
    }
}

fn tied<O: NumericOps>(config: &CollectorConfig, a: &Item<O>, b: &Item<O>) -> bool {
    match (config.sort_type(), a.sort_value(), b.sort_value()) {
        (SortType::Stat(_), Some(x), Some(y)) => {
            x.compare(y, config.sort_direction()) == Ordering::Equal
        }
        _ => false,
    }
}

impl<O: NumericOps> CollectorResult<O> {
    /// Sort `items` and pick the page configured in `config`.
    pub(crate) fn new(config: &CollectorConfig, mut items: Vec<Item<O>>) -> Self {
        items.sort_by(|a, b| order(config, a, b));
        let len = items.len();
        let mut start = config.start().min(len);
        let mut end = config
            .number()
            .map_or(len, |number| start.saturating_add(number).min(len));
        if start < end {
            while start > 0 && tied(config, &items[start - 1], &items[start]) {
                start -= 1;
            }
            while end < len && tied(config, &items[end - 1], &items[end]) {
                end += 1;
            }
        }
        Self {
            collector_type: config.collector_type(),
            items,
            window: start..end,
        }
    }

    pub const fn collector_type(&self) -> CollectorType {
        self.collector_type
    }

    /// The items of the page.
    pub fn list(&self) -> &[Item<O>] {
        &self.items[self.window.clone()]
    }

    /// Every item, sorted, ignoring the page.
    pub fn full_list(&self) -> &[Item<O>] {
        &self.items
    }

    /// The single item of a data collector; `None` when it saw nothing or
    /// the collector is a list.
    pub fn data(&self) -> Option<&Item<O>> {
        match self.collector_type {
            CollectorType::Data => self.items.first(),
            CollectorType::List => None,
        }
    }

    /// Key of the first item of the page.
    pub fn start_key(&self) -> Option<&str> {
        self.list().first().map(Item::key)
    }

    /// Key of the first item after the page.
    pub fn end_key(&self) -> Option<&str> {
        self.items.get(self.window.end).map(Item::key)
    }

    pub fn get(&self, key: &str) -> Option<&Item<O>> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub(crate) fn remap_handles(&mut self, mapping: &HashMap<CollectorIndex, CollectorIndex>) {
        for item in &mut self.items {
            item.remap_handles(mapping);
        }
    }
}
