/*
 * Copyright (c) 2006-Present, Redis Ltd.
 * All rights reserved.
 *
 * Licensed under your choice of the Redis Source Available License 2.0
 * (RSALv2); or (b) the Server Side Public License v1 (SSPLv1); or (c) the
 * GNU Affero General Public License v3 (AGPLv3).
*/

//! Collector configuration.
//!
//! A [`CollectorConfig`] describes one level of a collector tree: its shape
//! (single slot or keyed list), the precision of its statistics, what is
//! rendered and how the result is sorted and paged. Nested levels hang off
//! [`CollectorConfig::with_sub`] and are shared between all sub-collectors of
//! a level.
//!
//! Every type here can be parsed from the names query languages use:
//!
//! ```
//! use facet_collector::{CollectorConfig, CollectorType, SortType, StatsType};
//!
//! let config = CollectorConfig::for_statistics(CollectorType::List, "n,sum,median").unwrap();
//! assert_eq!(config.stats_type(), StatsType::Full);
//!
//! let sort: SortType = "sum".parse().unwrap();
//! assert_eq!(sort.to_string(), "sum");
//! ```

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CollectorError, Result};

/// Shape of a collector node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorType {
    /// A single implicit slot, no keys.
    Data,
    /// One slot per key, kept sorted by key.
    List,
}

impl Display for CollectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => f.write_str("data"),
            Self::List => f.write_str("list"),
        }
    }
}

impl FromStr for CollectorType {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data" => Ok(Self::Data),
            "list" => Ok(Self::List),
            _ => Err(CollectorError::UnsupportedType(s.to_owned())),
        }
    }
}

/// Precision of the statistics a node keeps. Ordered by capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatsType {
    /// Sum and count.
    Basic,
    /// Streaming moments, minimum and maximum.
    Advanced,
    /// Every raw value.
    Full,
}

impl Display for StatsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Advanced => f.write_str("advanced"),
            Self::Full => f.write_str("full"),
        }
    }
}

impl FromStr for StatsType {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            "full" => Ok(Self::Full),
            _ => Err(CollectorError::UnsupportedType(s.to_owned())),
        }
    }
}

/// Optional arguments of the `distribution` statistic.
///
/// At most one of `step` and `number` is honored; `step` wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistributionParams {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub step: Option<f64>,
    pub number: Option<usize>,
}

/// Most buckets a distribution renders. Wider requests get wider buckets.
pub(crate) const MAX_DISTRIBUTION_BUCKETS: usize = 10_000;

impl DistributionParams {
    const fn is_default(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.step.is_none() && self.number.is_none()
    }

    fn parse(args: &str, original: &str) -> Result<Self> {
        let unsupported = || CollectorError::UnsupportedStatistic(original.to_owned());
        let mut params = Self::default();
        for arg in args.split(',').map(str::trim).filter(|arg| !arg.is_empty()) {
            let (name, value) = arg.split_once('=').ok_or_else(unsupported)?;
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "start" => params.start = Some(value.parse().map_err(|_| unsupported())?),
                "end" => params.end = Some(value.parse().map_err(|_| unsupported())?),
                "step" => params.step = Some(value.parse().map_err(|_| unsupported())?),
                "number" => params.number = Some(value.parse().map_err(|_| unsupported())?),
                _ => return Err(unsupported()),
            }
        }
        let finite = [params.start, params.end, params.step]
            .into_iter()
            .flatten()
            .all(f64::is_finite);
        let too_many = match (params.start, params.end, params.step, params.number) {
            (_, _, _, Some(number)) if number > MAX_DISTRIBUTION_BUCKETS => true,
            (Some(start), Some(end), Some(step), _) if step > 0.0 => {
                (end - start) / step > MAX_DISTRIBUTION_BUCKETS as f64
            }
            _ => false,
        };
        if !finite || too_many {
            return Err(unsupported());
        }
        Ok(params)
    }
}

/// A statistic that can be requested from, or sorted on, a collector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatName {
    N,
    Sum,
    Mean,
    Min,
    Max,
    SumSq,
    SumOfLogs,
    Variance,
    PopulationVariance,
    StandardDeviation,
    GeometricMean,
    QuadraticMean,
    Median,
    Skewness,
    Kurtosis,
    Distribution(DistributionParams),
}

/// Which kind of value a statistic produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatClass {
    /// A number of values.
    Count,
    /// A value of the primary numeric kind.
    Primary,
    /// A value of the secondary numeric kind.
    Secondary,
    /// A bucketed histogram; not sortable.
    Buckets,
}

impl StatName {
    /// The base name, without distribution arguments.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::N => "n",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::SumSq => "sumsq",
            Self::SumOfLogs => "sumoflogs",
            Self::Variance => "variance",
            Self::PopulationVariance => "populationvariance",
            Self::StandardDeviation => "standarddeviation",
            Self::GeometricMean => "geometricmean",
            Self::QuadraticMean => "quadraticmean",
            Self::Median => "median",
            Self::Skewness => "skewness",
            Self::Kurtosis => "kurtosis",
            Self::Distribution(_) => "distribution",
        }
    }

    /// The least precise stats type able to compute this statistic.
    pub const fn required_stats_type(&self) -> StatsType {
        match self {
            Self::N | Self::Sum | Self::Mean => StatsType::Basic,
            Self::Min
            | Self::Max
            | Self::SumSq
            | Self::SumOfLogs
            | Self::Variance
            | Self::PopulationVariance
            | Self::StandardDeviation
            | Self::GeometricMean
            | Self::QuadraticMean => StatsType::Advanced,
            Self::Median | Self::Skewness | Self::Kurtosis | Self::Distribution(_) => {
                StatsType::Full
            }
        }
    }

    pub(crate) const fn class(&self) -> StatClass {
        match self {
            Self::N => StatClass::Count,
            Self::Sum | Self::Min | Self::Max | Self::SumSq => StatClass::Primary,
            Self::Distribution(_) => StatClass::Buckets,
            _ => StatClass::Secondary,
        }
    }

    /// Whether results can be ordered by this statistic.
    pub const fn is_sortable(&self) -> bool {
        !matches!(self.class(), StatClass::Buckets)
    }
}

impl Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Distribution(params) = self else {
            return f.write_str(self.name());
        };
        f.write_str("distribution")?;
        if params.is_default() {
            return Ok(());
        }
        let args = [
            params.start.map(|v| format!("start={v}")),
            params.end.map(|v| format!("end={v}")),
            params.step.map(|v| format!("step={v}")),
            params.number.map(|v| format!("number={v}")),
        ];
        let args: Vec<String> = args.into_iter().flatten().collect();
        write!(f, "({})", args.join(","))
    }
}

impl FromStr for StatName {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let (name, args) = match text.split_once('(') {
            Some((name, rest)) => {
                let args = rest
                    .strip_suffix(')')
                    .ok_or_else(|| CollectorError::UnsupportedStatistic(s.to_owned()))?;
                (name.trim(), Some(args))
            }
            None => (text, None),
        };
        let stat = match name.to_ascii_lowercase().as_str() {
            "n" => Self::N,
            "sum" => Self::Sum,
            "mean" => Self::Mean,
            "min" => Self::Min,
            "max" => Self::Max,
            "sumsq" => Self::SumSq,
            "sumoflogs" => Self::SumOfLogs,
            "variance" => Self::Variance,
            "populationvariance" => Self::PopulationVariance,
            "standarddeviation" => Self::StandardDeviation,
            "geometricmean" => Self::GeometricMean,
            "quadraticmean" => Self::QuadraticMean,
            "median" => Self::Median,
            "skewness" => Self::Skewness,
            "kurtosis" => Self::Kurtosis,
            "distribution" => {
                Self::Distribution(DistributionParams::parse(args.unwrap_or_default(), s)?)
            }
            _ => return Err(CollectorError::UnsupportedStatistic(s.to_owned())),
        };
        if args.is_some() && !matches!(stat, Self::Distribution(_)) {
            return Err(CollectorError::UnsupportedStatistic(s.to_owned()));
        }
        Ok(stat)
    }
}

/// Parse a comma separated list of statistics, e.g. `n,sum,distribution(step=5)`.
///
/// Commas inside parentheses belong to the statistic's arguments. Repeated
/// statistics are kept once.
pub fn parse_stats_items(text: &str) -> Result<Vec<StatName>> {
    let mut items: Vec<StatName> = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    let mut push = |part: &str| -> Result<()> {
        if part.trim().is_empty() {
            return Ok(());
        }
        let stat = part.parse()?;
        if !items.contains(&stat) {
            items.push(stat);
        }
        Ok(())
    };
    for (offset, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push(&text[begin..offset])?;
                begin = offset + 1;
            }
            _ => {}
        }
    }
    push(&text[begin..])?;
    Ok(items)
}

/// Order of a sorted result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Orient an ascending ordering according to this direction.
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CollectorError::UnsupportedSort(s.to_owned())),
        }
    }
}

/// What a list result is sorted on.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SortType {
    /// The key itself.
    #[default]
    Key,
    /// A statistic of the key's values.
    Stat(StatName),
}

impl Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => f.write_str("key"),
            Self::Stat(stat) => stat.fmt(f),
        }
    }
}

impl FromStr for SortType {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("key") {
            return Ok(Self::Key);
        }
        let stat: StatName = s
            .parse()
            .map_err(|_| CollectorError::UnsupportedSort(s.to_owned()))?;
        if !stat.is_sortable() {
            return Err(CollectorError::UnsupportedSort(s.to_owned()));
        }
        Ok(Self::Stat(stat))
    }
}

/// Segment registration mode used for top-K pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentMode {
    /// First pass, ascending sort: estimate boundaries from local top lists.
    SortAsc,
    /// First pass, descending sort.
    SortDesc,
    /// Second pass, ascending sort: prune against a known boundary.
    BoundaryAsc,
    /// Second pass, descending sort.
    BoundaryDesc,
}

impl SegmentMode {
    pub const fn direction(self) -> SortDirection {
        match self {
            Self::SortAsc | Self::BoundaryAsc => SortDirection::Asc,
            Self::SortDesc | Self::BoundaryDesc => SortDirection::Desc,
        }
    }

    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::BoundaryAsc | Self::BoundaryDesc)
    }
}

impl FromStr for SegmentMode {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment_sort_asc" => Ok(Self::SortAsc),
            "segment_sort_desc" => Ok(Self::SortDesc),
            "segment_boundary_asc" => Ok(Self::BoundaryAsc),
            "segment_boundary_desc" => Ok(Self::BoundaryDesc),
            _ => Err(CollectorError::UnsupportedType(s.to_owned())),
        }
    }
}

/// Configuration of one level of a collector tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    collector_type: CollectorType,
    stats_type: StatsType,
    stats_items: Vec<StatName>,
    sort_type: SortType,
    sort_direction: SortDirection,
    start: usize,
    number: Option<usize>,
    segment_mode: Option<SegmentMode>,
    sub: Option<Arc<CollectorConfig>>,
}

impl CollectorConfig {
    /// A level rendering `n` and `sum`, sorted by key, without paging.
    pub fn new(collector_type: CollectorType, stats_type: StatsType) -> Self {
        Self {
            collector_type,
            stats_type,
            stats_items: vec![StatName::N, StatName::Sum],
            sort_type: SortType::Key,
            sort_direction: SortDirection::Asc,
            start: 0,
            number: None,
            segment_mode: None,
            sub: None,
        }
    }

    /// A level rendering `items`, with the least precise stats type that can
    /// compute all of them.
    pub fn for_statistics(collector_type: CollectorType, items: &str) -> Result<Self> {
        let items = parse_stats_items(items)?;
        let stats_type = items
            .iter()
            .map(StatName::required_stats_type)
            .max()
            .unwrap_or(StatsType::Basic);
        Ok(Self::new(collector_type, stats_type).with_stats_items(items))
    }

    #[must_use]
    pub fn with_stats_items(mut self, items: Vec<StatName>) -> Self {
        self.stats_items = items;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort_type: SortType, direction: SortDirection) -> Self {
        self.sort_type = sort_type;
        self.sort_direction = direction;
        self
    }

    /// Page the result: skip `start` items, then keep `number` (all when `None`).
    #[must_use]
    pub const fn with_page(mut self, start: usize, number: Option<usize>) -> Self {
        self.start = start;
        self.number = number;
        self
    }

    #[must_use]
    pub const fn with_segment_mode(mut self, mode: SegmentMode) -> Self {
        self.segment_mode = Some(mode);
        self
    }

    /// Attach a nested level: every key of this level gets its own collector.
    #[must_use]
    pub fn with_sub(mut self, sub: Self) -> Self {
        self.sub = Some(Arc::new(sub));
        self
    }

    pub const fn collector_type(&self) -> CollectorType {
        self.collector_type
    }

    pub const fn stats_type(&self) -> StatsType {
        self.stats_type
    }

    pub fn stats_items(&self) -> &[StatName] {
        &self.stats_items
    }

    pub const fn sort_type(&self) -> SortType {
        self.sort_type
    }

    pub const fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn number(&self) -> Option<usize> {
        self.number
    }

    pub const fn segment_mode(&self) -> Option<SegmentMode> {
        self.segment_mode
    }

    pub fn sub(&self) -> Option<&Arc<Self>> {
        self.sub.as_ref()
    }

    /// Number of levels from this one down.
    pub(crate) fn levels(&self) -> usize {
        1 + self.sub.as_ref().map_or(0, |sub| sub.levels())
    }

    /// Check that this level and every nested level can deliver what they ask for.
    pub fn validate(&self) -> Result<()> {
        if let Some(stat) = self
            .stats_items
            .iter()
            .find(|stat| stat.required_stats_type() > self.stats_type)
        {
            return Err(CollectorError::UnsupportedStatistic(format!(
                "{stat} needs {} statistics, collector keeps {}",
                stat.required_stats_type(),
                self.stats_type
            )));
        }
        if let SortType::Stat(stat) = self.sort_type
            && (!stat.is_sortable() || stat.required_stats_type() > self.stats_type)
        {
            return Err(CollectorError::UnsupportedSort(stat.to_string()));
        }
        if self.segment_mode.is_some() {
            let additive = matches!(self.sort_type, SortType::Stat(StatName::N | StatName::Sum));
            if self.collector_type != CollectorType::List || !additive {
                return Err(CollectorError::UnsupportedSort(format!(
                    "segment registration on {} sorted by {}",
                    self.collector_type, self.sort_type
                )));
            }
        }
        match &self.sub {
            Some(sub) => sub.validate(),
            None => Ok(()),
        }
    }
}

/// Boundary handed to a boundary-mode segment list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentBoundary {
    /// A cutoff that applies to segment-local values as is.
    Segment(String),
    /// A cutoff on totals over all segments.
    Total(String),
}

/// Identifies the segment an upcoming batch of values comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentScope {
    pub(crate) name: String,
    pub(crate) number: NonZeroU64,
    pub(crate) boundary: Option<SegmentBoundary>,
}

impl SegmentScope {
    /// `number` is the total number of segments taking part in the query.
    pub fn new(name: impl Into<String>, number: NonZeroU64) -> Self {
        Self {
            name: name.into(),
            number,
            boundary: None,
        }
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(SegmentBoundary::Segment(boundary.into()));
        self
    }

    #[must_use]
    pub fn with_total_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(SegmentBoundary::Total(boundary.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn number(&self) -> NonZeroU64 {
        self.number
    }
}
