/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Hierarchical facet statistics.
//!
//! A [`CollectorTree`] aggregates numeric values by facet key while an index
//! is scanned, one segment at a time, and turns them into a sorted,
//! paginated [`CollectorResult`]. Each key carries statistics at the
//! configured precision:
//!
//! - [`StatsType::Basic`]: sum, count and mean;
//! - [`StatsType::Advanced`]: adds extrema and moment based statistics;
//! - [`StatsType::Full`]: keeps every value for exact medians, higher
//!   moments and distributions.
//!
//! Collectors nest: a configuration may declare a sub-level, and each key
//! then owns its own collector of that shape. Trees built for different
//! segments merge into one.
//!
//! For queries that only want the best K keys by count or sum, a segment
//! mode enables the top-K boundary protocol, which lets segments skip keys
//! that provably cannot reach the top K.
//!
//! # Example
//!
//! ```
//! use facet_collector::{
//!     CollectorConfig, CollectorTree, CollectorType, IntegerOps, Number, SortDirection,
//!     SortType, StatName, StatValue,
//! };
//!
//! let config = CollectorConfig::for_statistics(CollectorType::List, "n,sum,max")
//!     .unwrap()
//!     .with_sort(SortType::Stat(StatName::Sum), SortDirection::Desc)
//!     .with_page(0, Some(1));
//! let mut tree = CollectorTree::<IntegerOps>::new(config).unwrap();
//! let root = tree.root();
//!
//! tree.init_new_list(root, 2).unwrap();
//! tree.add_values(root, Some("red"), &[3, 4]).unwrap();
//! tree.add_values(root, Some("blue"), &[10]).unwrap();
//! tree.close_new_list(root).unwrap();
//!
//! let result = tree.get_result(root).unwrap();
//! let top = &result.list()[0];
//! assert_eq!(top.key(), "blue");
//! assert_eq!(result.end_key(), Some("red"));
//! let rendered = top.rewrite(false);
//! assert_eq!(rendered["sum"], StatValue::Number(Number::Integer(10)));
//! ```

mod arena;
mod columns;
mod comparator;
mod config;
mod dynamic;
mod error;
mod item;
mod node;
mod result;
mod segment;
pub mod stats;
mod tree;

pub use arena::CollectorIndex;
pub use comparator::SortValue;
pub use config::{
    CollectorConfig, CollectorType, DistributionParams, SegmentBoundary, SegmentMode,
    SegmentScope, SortDirection, SortType, StatName, StatsType, parse_stats_items,
};
pub use dynamic::{AnyCollectorTree, NOT_AN_INTEGER};
pub use error::{CollectorError, Result};
pub use item::{Item, StatValue};
pub use node::NodeState;
pub use numeric_ops::{FloatOps, IntegerOps, Number, NumericOps, ValueKind};
pub use result::CollectorResult;
pub use stats::{Accumulator, Bucket, Statistic};
pub use tree::{CollectorTree, NOT_A_NUMBER};
