//! Descriptive statistics over exact decimal values.
//!
//! Every function here operates on the non-null `Number` values of a column,
//! in row order, using `rust_decimal` arithmetic end to end — no value ever
//! passes through binary floating point. Divisions and the square root are
//! rounded to `STAT_SCALE` decimal places with banker's rounding
//! (`rust_decimal`'s default strategy); additions and subtractions are exact.

use rust_decimal::{Decimal, MathematicalOps};
use std::collections::HashMap;

/// Fixed scale for statistics that involve division or a square root.
pub(crate) const STAT_SCALE: u32 = 12;

/// One statistic a column can be reduced to, used by
/// [`Table::aggregate`](crate::Table::aggregate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
    Median,
    Mode,
    Min,
    Max,
    Variance,
    Stdev,
    Mad,
}

impl Aggregation {
    /// Suffix used for derived column names (`<column>_<name>`).
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
            Aggregation::Mode => "mode",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Variance => "variance",
            Aggregation::Stdev => "stdev",
            Aggregation::Mad => "mad",
        }
    }

    /// Apply this statistic; `None` when the input has no values
    /// (except `Sum`, which is zero on empty input).
    pub(crate) fn apply(&self, values: &[Decimal]) -> Option<Decimal> {
        match self {
            Aggregation::Sum => Some(sum(values)),
            Aggregation::Mean => mean(values),
            Aggregation::Median => median(values),
            Aggregation::Mode => mode(values),
            Aggregation::Min => min(values),
            Aggregation::Max => max(values),
            Aggregation::Variance => variance(values),
            Aggregation::Stdev => stdev(values),
            Aggregation::Mad => mad(values),
        }
    }
}

/// Cached per-column statistics, derived once from the non-null values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ColumnStats {
    pub sum: Decimal,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub mean: Option<Decimal>,
    pub median: Option<Decimal>,
    pub mode: Option<Decimal>,
    pub variance: Option<Decimal>,
    pub stdev: Option<Decimal>,
    pub mad: Option<Decimal>,
}

/// Compute the full statistics block for a set of values.
pub(crate) fn describe(values: &[Decimal]) -> ColumnStats {
    ColumnStats {
        sum: sum(values),
        min: min(values),
        max: max(values),
        mean: mean(values),
        median: median(values),
        mode: mode(values),
        variance: variance(values),
        stdev: stdev(values),
        mad: mad(values),
    }
}

/// Exact sum; the additive identity on empty input.
pub fn sum(values: &[Decimal]) -> Decimal {
    values.iter().fold(Decimal::ZERO, |acc, v| acc + v)
}

pub fn min(values: &[Decimal]) -> Option<Decimal> {
    values.iter().min().copied()
}

pub fn max(values: &[Decimal]) -> Option<Decimal> {
    values.iter().max().copied()
}

/// Exact sum divided by count, rounded to `STAT_SCALE` places.
pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    Some((sum(values) / Decimal::from(values.len())).round_dp(STAT_SCALE))
}

/// Central value after a full ordering; the mean of the two central values
/// for an even count.
pub fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(((sorted[mid - 1] + sorted[mid]) / Decimal::TWO).round_dp(STAT_SCALE))
    }
}

/// Most frequent value; ties go to the smallest value in numeric order.
pub fn mode(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut counts: HashMap<Decimal, usize> = HashMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    let best = counts.values().copied().max()?;
    counts
        .into_iter()
        .filter(|(_, c)| *c == best)
        .map(|(v, _)| v)
        .min()
}

/// Population variance: mean squared deviation from the mean.
pub fn variance(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values)?;
    let squares = values.iter().fold(Decimal::ZERO, |acc, v| {
        let d = *v - m;
        acc + d * d
    });
    Some((squares / Decimal::from(values.len())).round_dp(STAT_SCALE))
}

/// Square root of the population variance, rounded to `STAT_SCALE` places.
pub fn stdev(values: &[Decimal]) -> Option<Decimal> {
    // sqrt is defined for every (non-negative) variance
    variance(values)?.sqrt().map(|s| s.round_dp(STAT_SCALE))
}

/// Median of absolute deviations from the median.
pub fn mad(values: &[Decimal]) -> Option<Decimal> {
    let center = median(values)?;
    let deviations: Vec<Decimal> = values.iter().map(|v| (*v - center).abs()).collect();
    median(&deviations)
}
