//! Column types, values, and the typed immutable column.
//!
//! A [`Column`] is a named, ordered sequence of values where every value is
//! either null or valid for the column's [`ColumnType`]. Columns are built by
//! [`Table`](crate::Table) construction and never mutated afterwards; a "new
//! column" is always a new `Column` owned by a new table.
//!
//! # Dates
//!
//! Dates are stored as days since the Unix epoch (1970-01-01) and parsed and
//! formatted as ISO 8601 `YYYY-MM-DD` strings.

use crate::error::{Result, TableError};
use crate::stats::{self, ColumnStats};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Column value types.
///
/// Each variant defines how raw values are cast into the column and how two
/// values of the column compare. `Number` is arbitrary-precision decimal,
/// never binary floating point, so repeated arithmetic stays exact to the
/// input's decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Number,
    Boolean,
    Date,
}

impl ColumnType {
    /// Human-readable name of this type, used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Text => "Text",
            ColumnType::Number => "Number",
            ColumnType::Boolean => "Boolean",
            ColumnType::Date => "Date",
        }
    }

    /// Attempt the coercion without building an error.
    fn coerce(&self, raw: &Value) -> Option<Value> {
        if raw.is_null() {
            return Some(Value::Null);
        }
        match self {
            ColumnType::Text => Some(Value::Text(match raw {
                Value::Text(s) => s.clone(),
                other => other.to_string(),
            })),
            ColumnType::Number => match raw {
                Value::Number(d) => Some(Value::Number(*d)),
                Value::Text(s) => s.trim().parse::<Decimal>().ok().map(Value::Number),
                _ => None,
            },
            ColumnType::Boolean => match raw {
                Value::Boolean(b) => Some(Value::Boolean(*b)),
                Value::Text(s) => {
                    let t = s.trim();
                    if t.eq_ignore_ascii_case("true") {
                        Some(Value::Boolean(true))
                    } else if t.eq_ignore_ascii_case("false") {
                        Some(Value::Boolean(false))
                    } else {
                        None
                    }
                }
                Value::Number(d) if d.is_zero() => Some(Value::Boolean(false)),
                Value::Number(d) if *d == Decimal::ONE => Some(Value::Boolean(true)),
                _ => None,
            },
            ColumnType::Date => match raw {
                Value::Date(d) => Some(Value::Date(*d)),
                Value::Text(s) => parse_date(s.trim()).map(Value::Date),
                _ => None,
            },
        }
    }

    /// Cast a raw value into this type.
    ///
    /// Nulls pass through for every type. Text parses into `Number`,
    /// `Boolean` (`true`/`false`, case-insensitive), and `Date`
    /// (`YYYY-MM-DD`); any value renders into `Text`; `Number` 0 and 1 cast
    /// to `Boolean`.
    ///
    /// # Errors
    ///
    /// [`TableError::Cast`] when the raw value cannot be interpreted as this
    /// type, e.g. non-numeric text cast to `Number`.
    pub fn cast(&self, raw: &Value) -> Result<Value> {
        self.coerce(raw).ok_or_else(|| TableError::Cast {
            value: raw.to_string(),
            target: self.label(),
        })
    }

    /// Total order over values of this type.
    ///
    /// Numeric magnitude for `Number`, lexical for `Text`, chronological for
    /// `Date`, `false < true` for `Boolean`. Null sorts before every
    /// non-null value; two nulls are equal.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        a.compare(b)
    }
}

/// A single cell value.
///
/// Equality and hashing are by numeric value for `Number` (`2 == 2.00`), so
/// values can key hash maps directly — joins, `distinct`, and grouping all
/// rely on this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Boolean(bool),
    /// Days since the Unix epoch.
    Date(i32),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Days since the Unix epoch for `Date` values.
    pub fn as_date(&self) -> Option<i32> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Variant rank for ordering values of different types deterministically.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
            Value::Date(_) => 4,
        }
    }

    /// Natural total order with null before every non-null value.
    ///
    /// Values of different non-null types order by a fixed variant rank so
    /// the order stays total and deterministic.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(d) => write!(f, "{}", d),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(days) => f.write_str(&format_date(*days)),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Number(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// A named, typed, ordered sequence of values within a table.
///
/// Every value is null or cast-valid for the column's type; the length always
/// equals the owning table's row count — both are enforced when the table is
/// built, and immutability preserves them afterwards.
///
/// Descriptive statistics are derived from the column's non-null values on
/// first request and cached; because values never change, the cache needs no
/// invalidation and a `&Column` can be shared across threads freely.
#[derive(Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    values: Vec<Value>,
    stats: OnceLock<ColumnStats>,
}

impl Column {
    /// Values must already be cast-valid for `column_type`; callers go
    /// through `Table` construction, which guarantees it.
    pub(crate) fn new(name: String, column_type: ColumnType, values: Vec<Value>) -> Self {
        Column {
            name,
            column_type,
            values,
            stats: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// True if the predicate holds for at least one value.
    pub fn any<P>(&self, predicate: P) -> bool
    where
        P: Fn(&Value) -> bool,
    {
        self.values.iter().any(|v| predicate(v))
    }

    /// True if the predicate holds for every value.
    pub fn all<P>(&self, predicate: P) -> bool
    where
        P: Fn(&Value) -> bool,
    {
        self.values.iter().all(|v| predicate(v))
    }

    /// Cached statistics over the non-null values.
    fn stats(&self) -> Result<&ColumnStats> {
        if self.column_type != ColumnType::Number {
            return Err(TableError::TypeMismatch {
                column: self.name.clone(),
                actual: self.column_type.label(),
            });
        }
        Ok(self.stats.get_or_init(|| {
            let numbers: Vec<Decimal> = self.values.iter().filter_map(Value::as_number).collect();
            stats::describe(&numbers)
        }))
    }

    fn require(&self, stat: Option<Decimal>) -> Result<Decimal> {
        stat.ok_or_else(|| TableError::EmptyColumn(self.name.clone()))
    }

    /// Exact sum of the non-null values; zero on an all-null column.
    pub fn sum(&self) -> Result<Decimal> {
        Ok(self.stats()?.sum)
    }

    pub fn min(&self) -> Result<Decimal> {
        let stat = self.stats()?.min;
        self.require(stat)
    }

    pub fn max(&self) -> Result<Decimal> {
        let stat = self.stats()?.max;
        self.require(stat)
    }

    pub fn mean(&self) -> Result<Decimal> {
        let stat = self.stats()?.mean;
        self.require(stat)
    }

    pub fn median(&self) -> Result<Decimal> {
        let stat = self.stats()?.median;
        self.require(stat)
    }

    /// Most frequent value; ties go to the smallest value in numeric order.
    pub fn mode(&self) -> Result<Decimal> {
        let stat = self.stats()?.mode;
        self.require(stat)
    }

    /// Population variance.
    pub fn variance(&self) -> Result<Decimal> {
        let stat = self.stats()?.variance;
        self.require(stat)
    }

    pub fn stdev(&self) -> Result<Decimal> {
        let stat = self.stats()?.stdev;
        self.require(stat)
    }

    /// Median absolute deviation from the median.
    pub fn mad(&self) -> Result<Decimal> {
        let stat = self.stats()?.mad;
        self.require(stat)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        // The stats cache is derived state and excluded from equality.
        self.name == other.name
            && self.column_type == other.column_type
            && self.values == other.values
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {:?}, len: {} }}",
            self.name,
            self.column_type,
            self.len()
        )
    }
}

// ============================================================================
// Date helpers (epoch-days civil calendar)
// ============================================================================

/// Convert (year, month, day) to days since the Unix epoch.
fn days_from_ymd(year: i32, month: u32, day: u32) -> i32 {
    // Algorithm from https://howardhinnant.github.io/date_algorithms.html
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y / 400 } else { (y - 399) / 400 };
    let yoe = (y - era * 400) as u32;
    let doy = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    (era * 146097 + doe as i32) - 719468
}

/// Convert days since the Unix epoch to (year, month, day).
fn ymd_from_days(days: i32) -> (i32, u32, u32) {
    // Algorithm from https://howardhinnant.github.io/date_algorithms.html
    let z = days + 719468;
    let era = if z >= 0 { z / 146097 } else { (z - 146096) / 146097 };
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = (yoe as i32) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Parse an ISO 8601 date (`YYYY-MM-DD`) into days since the epoch.
pub(crate) fn parse_date(s: &str) -> Option<i32> {
    let mut parts = s.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(days_from_ymd(year, month, day))
}

/// Format days since the epoch as `YYYY-MM-DD`.
pub(crate) fn format_date(days: i32) -> String {
    let (year, month, day) = ymd_from_days(days);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(s: &str) -> Value {
        Value::Number(s.parse().unwrap())
    }

    #[test]
    fn test_cast_number_from_text() {
        let cast = ColumnType::Number.cast(&Value::from("12.50")).unwrap();
        assert_eq!(cast, number("12.50"));
    }

    #[test]
    fn test_cast_number_rejects_words() {
        let err = ColumnType::Number.cast(&Value::from("twelve")).unwrap_err();
        assert_eq!(
            err,
            TableError::Cast {
                value: "twelve".to_string(),
                target: "Number",
            }
        );
    }

    #[test]
    fn test_cast_null_passes_every_type() {
        for ty in [
            ColumnType::Text,
            ColumnType::Number,
            ColumnType::Boolean,
            ColumnType::Date,
        ] {
            assert_eq!(ty.cast(&Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_cast_boolean() {
        assert_eq!(
            ColumnType::Boolean.cast(&Value::from("TRUE")).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            ColumnType::Boolean.cast(&number("0")).unwrap(),
            Value::Boolean(false)
        );
        assert!(ColumnType::Boolean.cast(&Value::from("yes")).is_err());
    }

    #[test]
    fn test_cast_date_round_trips() {
        let cast = ColumnType::Date.cast(&Value::from("2024-02-29")).unwrap();
        assert_eq!(cast.to_string(), "2024-02-29");
        assert_eq!(
            ColumnType::Date.cast(&Value::from("1970-01-01")).unwrap(),
            Value::Date(0)
        );
        assert!(ColumnType::Date.cast(&Value::from("02/29/2024")).is_err());
    }

    #[test]
    fn test_cast_text_renders_anything() {
        assert_eq!(
            ColumnType::Text.cast(&number("1.50")).unwrap(),
            Value::from("1.50")
        );
        assert_eq!(
            ColumnType::Text.cast(&Value::Boolean(true)).unwrap(),
            Value::from("true")
        );
    }

    #[test]
    fn test_compare_null_first() {
        assert_eq!(Value::Null.compare(&number("0")), Ordering::Less);
        assert_eq!(number("0").compare(&Value::Null), Ordering::Greater);
        assert_eq!(Value::Null.compare(&Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_compare_numeric_magnitude() {
        assert_eq!(number("2.00").compare(&number("2")), Ordering::Equal);
        assert_eq!(number("-1").compare(&number("0.5")), Ordering::Less);
    }

    #[test]
    fn test_number_equality_ignores_scale() {
        assert_eq!(number("2"), number("2.00"));
    }

    #[test]
    fn test_column_any_all() {
        let col = Column::new(
            "v".to_string(),
            ColumnType::Number,
            vec![number("1"), number("2"), Value::Null],
        );
        assert!(col.any(|v| v.is_null()));
        assert!(!col.all(|v| v.is_null()));
        assert!(col.all(|v| v.is_null() || v.as_number().unwrap() > Decimal::ZERO));
    }

    #[test]
    fn test_column_stats_skip_nulls() {
        let col = Column::new(
            "v".to_string(),
            ColumnType::Number,
            vec![number("1.00"), Value::Null, number("2.00"), number("3.00")],
        );
        assert_eq!(col.mean().unwrap(), "2.00".parse::<Decimal>().unwrap());
        assert_eq!(col.sum().unwrap(), "6.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_column_stats_require_number() {
        let col = Column::new(
            "name".to_string(),
            ColumnType::Text,
            vec![Value::from("a")],
        );
        assert_eq!(
            col.mean().unwrap_err(),
            TableError::TypeMismatch {
                column: "name".to_string(),
                actual: "Text",
            }
        );
    }

    #[test]
    fn test_column_empty_stats() {
        let col = Column::new(
            "v".to_string(),
            ColumnType::Number,
            vec![Value::Null, Value::Null],
        );
        // Sum is the additive identity on empty input, everything else fails.
        assert_eq!(col.sum().unwrap(), Decimal::ZERO);
        assert_eq!(
            col.mean().unwrap_err(),
            TableError::EmptyColumn("v".to_string())
        );
        assert!(col.stdev().is_err());
    }

    #[test]
    fn test_date_helpers() {
        assert_eq!(parse_date("1970-01-01"), Some(0));
        assert_eq!(parse_date("1969-12-31"), Some(-1));
        assert_eq!(format_date(0), "1970-01-01");
        let d = parse_date("2000-03-01").unwrap();
        assert_eq!(format_date(d), "2000-03-01");
        assert_eq!(parse_date("not-a-date"), None);
    }
}
