//! The immutable table and its relational operations.
//!
//! A `Table` is an ordered collection of named typed columns sharing one row
//! count. Rows are addressed only by position; there is no row identity that
//! survives a transformation. Every operation consumes `&self` and returns a
//! brand-new `Table`, so the original stays usable — chains like
//! `table.filter(..).order_by(..)` never mutate shared state, and a `&Table`
//! can be read from any number of threads without locking.
//!
//! # Examples
//!
//! ```
//! use exactable::{ColumnType, Table, Value};
//!
//! let table = Table::new(
//!     vec![
//!         vec![Value::from("Widget"), Value::from("10")],
//!         vec![Value::from("Gadget"), Value::from("5")],
//!     ],
//!     vec![ColumnType::Text, ColumnType::Number],
//!     vec!["product".to_string(), "quantity".to_string()],
//! ).unwrap();
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.column_names()[0], "product");
//! ```

use crate::column::{format_date, Column, ColumnType, Value};
use crate::error::{Result, TableError};
use crate::row::RowView;
use crate::stats::{Aggregation, STAT_SCALE};
use rust_decimal::Decimal;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// An immutable rectangular dataset: ordered named typed columns sharing one
/// row count.
#[derive(Clone, PartialEq)]
pub struct Table {
    column_names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from rows of raw values, one [`ColumnType`] and name per
    /// column.
    ///
    /// Every cell is cast through its column's type; the whole construction
    /// fails on the first invalid cell, so no partially-built table is ever
    /// observable.
    ///
    /// # Errors
    ///
    /// * [`TableError::SchemaLength`] — types and names disagree on count
    /// * [`TableError::ColumnExists`] — duplicate column name
    /// * [`TableError::RowLength`] — a row without exactly one cell per column
    /// * [`TableError::CellCast`] — a cell incompatible with its column type,
    ///   reported with row and column position
    ///
    /// # Examples
    ///
    /// ```
    /// use exactable::{ColumnType, Table, Value};
    ///
    /// let table = Table::new(
    ///     vec![vec![Value::from("Alice"), Value::from("92.5")]],
    ///     vec![ColumnType::Text, ColumnType::Number],
    ///     vec!["name".to_string(), "score".to_string()],
    /// ).unwrap();
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn new(
        rows: Vec<Vec<Value>>,
        column_types: Vec<ColumnType>,
        column_names: Vec<String>,
    ) -> Result<Table> {
        if column_types.len() != column_names.len() {
            return Err(TableError::SchemaLength {
                expected: column_names.len(),
                actual: column_types.len(),
            });
        }
        for (i, name) in column_names.iter().enumerate() {
            if column_names[..i].contains(name) {
                return Err(TableError::ColumnExists(name.clone()));
            }
        }

        let width = column_names.len();
        let mut cells: Vec<Vec<Value>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(TableError::RowLength {
                    row: r,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (c, raw) in row.iter().enumerate() {
                match column_types[c].cast(raw) {
                    Ok(v) => cells[c].push(v),
                    Err(TableError::Cast { value, target }) => {
                        return Err(TableError::CellCast {
                            value,
                            target,
                            row: r,
                            column: column_names[c].clone(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let columns = column_names
            .iter()
            .zip(column_types)
            .zip(cells)
            .map(|((name, ty), values)| Column::new(name.clone(), ty, values))
            .collect();

        Ok(Table {
            column_names,
            columns,
            row_count: rows.len(),
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Columns in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column types in schema order.
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.column_type()).collect()
    }

    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|n| n == name)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.column_index(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| TableError::ColumnDoesNotExist(name.to_string()))
    }

    /// View of the row at `index`, or `None` past the end.
    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        (index < self.row_count).then(|| RowView::new(self, index))
    }

    /// Iterate over all rows as [`RowView`]s, in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.row_count).map(move |i| RowView::new(self, i))
    }

    /// All rows as owned value sequences, in order — together with
    /// [`column_names`](Table::column_names) and
    /// [`column_types`](Table::column_types) this is enough to re-serialize
    /// or reconstruct the table.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        (0..self.row_count)
            .map(|i| self.columns.iter().map(|c| c.values()[i].clone()).collect())
            .collect()
    }

    /// New table containing the given rows of this table, in the given order.
    fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let values = indices.iter().map(|&i| col.values()[i].clone()).collect();
                Column::new(col.name().to_string(), col.column_type(), values)
            })
            .collect();
        Table {
            column_names: self.column_names.clone(),
            columns,
            row_count: indices.len(),
        }
    }

    // ========================================================================
    // Relational operations
    // ========================================================================

    /// Project to the named columns; output column order follows `names`.
    ///
    /// # Errors
    ///
    /// [`TableError::ColumnDoesNotExist`] on an unknown name.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        let mut column_names = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push(self.column(name)?.clone());
            column_names.push((*name).to_string());
        }
        Ok(Table {
            column_names,
            columns,
            row_count: self.row_count,
        })
    }

    /// Keep exactly the rows for which the predicate is true, in original
    /// relative order. A zero-row result keeps the schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use exactable::{ColumnType, Table, Value};
    ///
    /// let table = Table::new(
    ///     vec![
    ///         vec![Value::from("a"), Value::from("1")],
    ///         vec![Value::from("b"), Value::from("9")],
    ///     ],
    ///     vec![ColumnType::Text, ColumnType::Number],
    ///     vec!["k".to_string(), "v".to_string()],
    /// ).unwrap();
    ///
    /// let high = table.filter(|row| {
    ///     row.get("v")
    ///         .ok()
    ///         .and_then(Value::as_number)
    ///         .map(|v| v > "5".parse().unwrap())
    ///         .unwrap_or(false)
    /// });
    /// assert_eq!(high.len(), 1);
    /// ```
    pub fn filter<P>(&self, predicate: P) -> Table
    where
        P: Fn(&RowView) -> bool,
    {
        let keep: Vec<usize> = (0..self.row_count)
            .filter(|&i| predicate(&RowView::new(self, i)))
            .collect();
        self.take_rows(&keep)
    }

    /// Reorder rows by the named column, ascending (descending with
    /// `reverse`). The sort is stable: rows with equal keys retain their
    /// original relative order, which is what makes composite-key and
    /// sort-then-limit idioms deterministic.
    pub fn order_by(&self, column: &str, reverse: bool) -> Result<Table> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| TableError::ColumnDoesNotExist(column.to_string()))?;
        let ty = self.columns[idx].column_type();
        let values = self.columns[idx].values();
        let mut order: Vec<usize> = (0..self.row_count).collect();
        order.sort_by(|&a, &b| {
            let ord = ty.compare(&values[a], &values[b]);
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        });
        Ok(self.take_rows(&order))
    }

    /// Reorder rows by a caller-supplied key function. Keys are compared
    /// with the natural value order (null before non-null); the sort is
    /// stable, so a composite ordered key composes deterministically.
    pub fn order_by_key<K>(&self, key: K, reverse: bool) -> Table
    where
        K: Fn(&RowView) -> Value,
    {
        let keys: Vec<Value> = (0..self.row_count)
            .map(|i| key(&RowView::new(self, i)))
            .collect();
        let mut order: Vec<usize> = (0..self.row_count).collect();
        order.sort_by(|&a, &b| {
            let ord = keys[a].compare(&keys[b]);
            if reverse {
                ord.reverse()
            } else {
                ord
            }
        });
        self.take_rows(&order)
    }

    /// Drop rows that duplicate an earlier row in full; the first occurrence
    /// is kept.
    pub fn distinct(&self) -> Table {
        let mut seen: HashSet<Vec<Value>> = HashSet::new();
        let mut keep = Vec::new();
        for i in 0..self.row_count {
            let row: Vec<Value> = self.columns.iter().map(|c| c.values()[i].clone()).collect();
            if seen.insert(row) {
                keep.push(i);
            }
        }
        self.take_rows(&keep)
    }

    /// Drop rows that duplicate an earlier row in the given key columns,
    /// keeping the first row observed for each distinct key tuple.
    pub fn distinct_by(&self, keys: &[&str]) -> Result<Table> {
        let key_idx: Vec<usize> = keys
            .iter()
            .map(|k| {
                self.column_index(k)
                    .ok_or_else(|| TableError::ColumnDoesNotExist(k.to_string()))
            })
            .collect::<Result<_>>()?;
        let mut seen: HashSet<Vec<Value>> = HashSet::new();
        let mut keep = Vec::new();
        for i in 0..self.row_count {
            let key: Vec<Value> = key_idx
                .iter()
                .map(|&c| self.columns[c].values()[i].clone())
                .collect();
            if seen.insert(key) {
                keep.push(i);
            }
        }
        Ok(self.take_rows(&keep))
    }

    /// Slice rows by position: from `start` up to but excluding `stop`
    /// (the end of the table when `None`), taking every `step`-th row.
    ///
    /// # Errors
    ///
    /// [`TableError::ZeroStep`] — a stride of zero never advances.
    pub fn limit(&self, start: usize, stop: Option<usize>, step: usize) -> Result<Table> {
        if step == 0 {
            return Err(TableError::ZeroStep);
        }
        let stop = stop.unwrap_or(self.row_count).min(self.row_count);
        let indices: Vec<usize> = (start..stop).step_by(step).collect();
        Ok(self.take_rows(&indices))
    }

    /// Append one computed column: `column_type.cast(f(row))` per row.
    ///
    /// # Errors
    ///
    /// * [`TableError::ColumnExists`] — `name` collides with a column
    /// * [`TableError::CellCast`] — a produced value incompatible with
    ///   `column_type`, reported with its row
    pub fn compute<F>(&self, name: &str, column_type: ColumnType, f: F) -> Result<Table>
    where
        F: Fn(&RowView) -> Value,
    {
        if self.column_index(name).is_some() {
            return Err(TableError::ColumnExists(name.to_string()));
        }
        let mut values = Vec::with_capacity(self.row_count);
        for i in 0..self.row_count {
            let raw = f(&RowView::new(self, i));
            match column_type.cast(&raw) {
                Ok(v) => values.push(v),
                Err(TableError::Cast { value, target }) => {
                    return Err(TableError::CellCast {
                        value,
                        target,
                        row: i,
                        column: name.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        let mut column_names = self.column_names.clone();
        column_names.push(name.to_string());
        let mut columns = self.columns.clone();
        columns.push(Column::new(name.to_string(), column_type, values));
        Ok(Table {
            column_names,
            columns,
            row_count: self.row_count,
        })
    }

    /// Append `(after - before) / before * 100` as a new Number column,
    /// computed in exact decimal arithmetic. A null in either operand makes
    /// that row's result null.
    ///
    /// # Errors
    ///
    /// * [`TableError::DivisionByZero`] — `before` is zero in some row; the
    ///   whole operation fails rather than emitting an infinity
    /// * [`TableError::TypeMismatch`] — either operand column is not Number
    /// * [`TableError::ColumnExists`] / [`TableError::ColumnDoesNotExist`]
    pub fn percent_change(&self, before: &str, after: &str, name: &str) -> Result<Table> {
        let b_col = self.column(before)?;
        let a_col = self.column(after)?;
        for col in [b_col, a_col] {
            if col.column_type() != ColumnType::Number {
                return Err(TableError::TypeMismatch {
                    column: col.name().to_string(),
                    actual: col.column_type().label(),
                });
            }
        }
        if self.column_index(name).is_some() {
            return Err(TableError::ColumnExists(name.to_string()));
        }

        let mut values = Vec::with_capacity(self.row_count);
        for i in 0..self.row_count {
            match (
                b_col.values()[i].as_number(),
                a_col.values()[i].as_number(),
            ) {
                (Some(b), Some(a)) => {
                    if b.is_zero() {
                        return Err(TableError::DivisionByZero { row: i });
                    }
                    let change = ((a - b) / b * Decimal::ONE_HUNDRED).round_dp(STAT_SCALE);
                    values.push(Value::Number(change));
                }
                _ => values.push(Value::Null),
            }
        }

        let mut column_names = self.column_names.clone();
        column_names.push(name.to_string());
        let mut columns = self.columns.clone();
        columns.push(Column::new(name.to_string(), ColumnType::Number, values));
        Ok(Table {
            column_names,
            columns,
            row_count: self.row_count,
        })
    }

    // ========================================================================
    // Grouping and aggregation
    // ========================================================================

    /// Reduce the table to one row per distinct value of `group_column`, in
    /// order of first appearance. The output holds the group value, a
    /// `<group>_count` row count, and one `<column>_<stat>` Number column per
    /// requested operation. A group with no non-null values in a statistic's
    /// source column gets a null there (zero for `Sum`).
    ///
    /// Group identity is value equality, which matches the column type's
    /// `compare == Equal`; a null group value forms its own group.
    ///
    /// # Examples
    ///
    /// ```
    /// use exactable::{Aggregation, ColumnType, Table, Value};
    ///
    /// let table = Table::new(
    ///     vec![
    ///         vec![Value::from("A"), Value::from("10")],
    ///         vec![Value::from("A"), Value::from("20")],
    ///         vec![Value::from("B"), Value::from("5")],
    ///     ],
    ///     vec![ColumnType::Text, ColumnType::Number],
    ///     vec!["g".to_string(), "v".to_string()],
    /// ).unwrap();
    ///
    /// let summary = table.aggregate("g", &[("v", Aggregation::Mean)]).unwrap();
    /// assert_eq!(summary.len(), 2);
    /// assert_eq!(summary.column_names()[2], "v_mean");
    /// ```
    pub fn aggregate(
        &self,
        group_column: &str,
        operations: &[(&str, Aggregation)],
    ) -> Result<Table> {
        let g_idx = self
            .column_index(group_column)
            .ok_or_else(|| TableError::ColumnDoesNotExist(group_column.to_string()))?;
        let mut op_idx = Vec::with_capacity(operations.len());
        for (name, _) in operations {
            let idx = self
                .column_index(name)
                .ok_or_else(|| TableError::ColumnDoesNotExist((*name).to_string()))?;
            let col = &self.columns[idx];
            if col.column_type() != ColumnType::Number {
                return Err(TableError::TypeMismatch {
                    column: col.name().to_string(),
                    actual: col.column_type().label(),
                });
            }
            op_idx.push(idx);
        }

        let (order, groups) = self.partition(g_idx);

        let mut out_rows = Vec::with_capacity(order.len());
        for key in &order {
            let members = &groups[key];
            let mut row = vec![
                key.clone(),
                Value::Number(Decimal::from(members.len())),
            ];
            for (&col, (_, op)) in op_idx.iter().zip(operations) {
                let values: Vec<Decimal> = members
                    .iter()
                    .filter_map(|&i| self.columns[col].values()[i].as_number())
                    .collect();
                row.push(op.apply(&values).map(Value::Number).unwrap_or(Value::Null));
            }
            out_rows.push(row);
        }

        let mut names = vec![
            group_column.to_string(),
            format!("{}_count", group_column),
        ];
        let mut types = vec![self.columns[g_idx].column_type(), ColumnType::Number];
        for (column, op) in operations {
            names.push(format!("{}_{}", column, op.name()));
            types.push(ColumnType::Number);
        }
        Table::new(out_rows, types, names)
    }

    /// Partition rows by distinct value of `column` into one table per group,
    /// same schema, relative row order preserved. This is the raw partition
    /// behind [`aggregate`](Table::aggregate), for manual per-group analysis.
    pub fn group_by(&self, column: &str) -> Result<HashMap<Value, Table>> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| TableError::ColumnDoesNotExist(column.to_string()))?;
        let (_, groups) = self.partition(idx);
        Ok(groups
            .into_iter()
            .map(|(key, members)| {
                let table = self.take_rows(&members);
                (key, table)
            })
            .collect())
    }

    /// Group row indices by the values of one column, recording the order in
    /// which each distinct value first appears.
    fn partition(&self, column: usize) -> (Vec<Value>, HashMap<Value, Vec<usize>>) {
        let mut order: Vec<Value> = Vec::new();
        let mut groups: HashMap<Value, Vec<usize>> = HashMap::new();
        for (i, value) in self.columns[column].values().iter().enumerate() {
            match groups.entry(value.clone()) {
                Entry::Occupied(mut e) => e.get_mut().push(i),
                Entry::Vacant(e) => {
                    order.push(value.clone());
                    e.insert(vec![i]);
                }
            }
        }
        (order, groups)
    }

    // ========================================================================
    // Joins
    // ========================================================================

    /// Emit one row for every pair of rows whose key values are equal; rows
    /// without a match on either side are dropped. Duplicate keys multiply:
    /// every matching pair appears (standard inner-join cardinality).
    ///
    /// The outer loop walks this table's rows in order; matches come in the
    /// other table's original order, so the output is deterministic. Both key
    /// columns are retained; an other-side column whose name collides with
    /// one of this table's columns is prefixed `right_`.
    pub fn inner_join(
        &self,
        self_key: &str,
        other: &Table,
        other_key: &str,
    ) -> Result<Table> {
        self.join(self_key, other, other_key, false)
    }

    /// As [`inner_join`](Table::inner_join), but every row of this table
    /// without a match still emits one row with all other-side columns null.
    pub fn left_outer_join(
        &self,
        self_key: &str,
        other: &Table,
        other_key: &str,
    ) -> Result<Table> {
        self.join(self_key, other, other_key, true)
    }

    fn join(
        &self,
        self_key: &str,
        other: &Table,
        other_key: &str,
        keep_unmatched: bool,
    ) -> Result<Table> {
        let l_idx = self
            .column_index(self_key)
            .ok_or_else(|| TableError::ColumnDoesNotExist(self_key.to_string()))?;
        let r_idx = other
            .column_index(other_key)
            .ok_or_else(|| TableError::ColumnDoesNotExist(other_key.to_string()))?;

        // Hash the other side once; each key keeps its rows in original order.
        let mut probe: HashMap<&Value, Vec<usize>> = HashMap::new();
        for (i, value) in other.columns[r_idx].values().iter().enumerate() {
            if !value.is_null() {
                probe.entry(value).or_default().push(i);
            }
        }

        let mut names = self.column_names.clone();
        let mut types: Vec<ColumnType> = self.columns.iter().map(|c| c.column_type()).collect();
        for col in &other.columns {
            let name = if self.column_names.iter().any(|n| n == col.name()) {
                format!("right_{}", col.name())
            } else {
                col.name().to_string()
            };
            names.push(name);
            types.push(col.column_type());
        }

        let other_width = other.columns.len();
        let mut rows: Vec<Vec<Value>> = Vec::new();
        for i in 0..self.row_count {
            let key = &self.columns[l_idx].values()[i];
            // Null keys never match anything.
            let matches = if key.is_null() { None } else { probe.get(key) };
            match matches {
                Some(found) => {
                    for &j in found {
                        let mut row: Vec<Value> = self
                            .columns
                            .iter()
                            .map(|c| c.values()[i].clone())
                            .collect();
                        row.extend(other.columns.iter().map(|c| c.values()[j].clone()));
                        rows.push(row);
                    }
                }
                None if keep_unmatched => {
                    let mut row: Vec<Value> = self
                        .columns
                        .iter()
                        .map(|c| c.values()[i].clone())
                        .collect();
                    row.extend(std::iter::repeat(Value::Null).take(other_width));
                    rows.push(row);
                }
                None => {}
            }
        }

        Table::new(rows, types, names)
    }

    // ========================================================================
    // Outlier detection
    // ========================================================================

    /// Rows whose value in `column` deviates from the mean by more than
    /// `deviations` standard deviations — or, with `reject`, the
    /// complementary rows. Null values are never outliers.
    ///
    /// # Errors
    ///
    /// [`TableError::TypeMismatch`] / [`TableError::EmptyColumn`], propagated
    /// from the statistics layer.
    pub fn stdev_outliers(&self, column: &str, deviations: u32, reject: bool) -> Result<Table> {
        let col = self.column(column)?;
        let center = col.mean()?;
        let threshold = Decimal::from(deviations) * col.stdev()?;
        Ok(self.flag_outliers(column, center, threshold, reject))
    }

    /// Rows whose value in `column` deviates from the median by more than
    /// `deviations` median absolute deviations — or, with `reject`, the
    /// complementary rows. Null values are never outliers.
    pub fn mad_outliers(&self, column: &str, deviations: u32, reject: bool) -> Result<Table> {
        let col = self.column(column)?;
        let center = col.median()?;
        let threshold = Decimal::from(deviations) * col.mad()?;
        Ok(self.flag_outliers(column, center, threshold, reject))
    }

    fn flag_outliers(
        &self,
        column: &str,
        center: Decimal,
        threshold: Decimal,
        reject: bool,
    ) -> Table {
        self.filter(|row| {
            match row.get(column).ok().and_then(Value::as_number) {
                Some(v) => ((v - center).abs() > threshold) != reject,
                None => reject,
            }
        })
    }

    // ========================================================================
    // Serialization adapters
    // ========================================================================

    /// Render the table as CSV: a header row, then one line per row. Nulls
    /// become empty fields; text containing commas, quotes, or newlines is
    /// quoted with doubled inner quotes.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.column_names.join(","));
        out.push('\n');
        for i in 0..self.row_count {
            let fields: Vec<String> = self
                .columns
                .iter()
                .map(|c| csv_field(&c.values()[i]))
                .collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }

    /// Build a table from delimited text. The first line names the columns;
    /// every following line is cast through the declared types. Empty fields
    /// are null.
    pub fn from_csv_str(csv: &str, column_types: Vec<ColumnType>) -> Result<Table> {
        let mut parsed = parse_csv_rows(csv);
        if parsed.is_empty() {
            return Err(TableError::SchemaLength {
                expected: column_types.len(),
                actual: 0,
            });
        }
        let column_names = parsed.remove(0);
        let rows: Vec<Vec<Value>> = parsed
            .into_iter()
            .filter(|r| !(r.len() == 1 && r[0].is_empty()))
            .map(|r| {
                r.into_iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            Value::Null
                        } else {
                            Value::Text(cell)
                        }
                    })
                    .collect()
            })
            .collect();
        Table::new(rows, column_types, column_names)
    }

    /// Render the table as a JSON array of objects. Numbers keep their exact
    /// decimal digits (`serde_json`'s arbitrary-precision representation);
    /// dates render as ISO strings.
    pub fn to_json(&self) -> Result<String> {
        let rows: Vec<serde_json::Value> = (0..self.row_count)
            .map(|i| {
                let mut obj = serde_json::Map::new();
                for col in &self.columns {
                    obj.insert(col.name().to_string(), value_to_json(&col.values()[i]));
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::to_string_pretty(&rows).map_err(|e| TableError::Json(e.to_string()))
    }

    /// Build a table from a JSON array of objects. Each object's values are
    /// looked up by column name and cast through the declared types; a
    /// missing key is null.
    pub fn from_json(
        json: &str,
        column_types: Vec<ColumnType>,
        column_names: Vec<String>,
    ) -> Result<Table> {
        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(json).map_err(|e| TableError::Json(e.to_string()))?;
        let mut rows = Vec::with_capacity(parsed.len());
        for item in &parsed {
            let obj = item
                .as_object()
                .ok_or_else(|| TableError::Json("expected an array of objects".to_string()))?;
            let row = column_names
                .iter()
                .map(|name| json_to_raw(obj.get(name), name))
                .collect::<Result<Vec<Value>>>()?;
            rows.push(row);
        }
        Table::new(rows, column_types, column_names)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Table {{ columns: {}, rows: {} }}",
            self.columns.len(),
            self.row_count
        )
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) if s.contains(',') || s.contains('"') || s.contains('\n') => {
            format!("\"{}\"", s.replace('"', "\"\""))
        }
        other => other.to_string(),
    }
}

/// Split CSV text into rows of fields, honoring quoted fields with embedded
/// commas, newlines, and doubled quotes.
fn parse_csv_rows(csv: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(std::mem::take(&mut field)),
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\r' if !in_quotes => {}
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Date(days) => serde_json::Value::String(format_date(*days)),
        // arbitrary_precision keeps every decimal digit intact
        Value::Number(d) => {
            serde_json::Value::Number(serde_json::Number::from_string_unchecked(d.to_string()))
        }
    }
}

fn json_to_raw(value: Option<&serde_json::Value>, column: &str) -> Result<Value> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(Value::Null),
        Some(serde_json::Value::String(s)) => Ok(Value::Text(s.clone())),
        Some(serde_json::Value::Bool(b)) => Ok(Value::Boolean(*b)),
        Some(serde_json::Value::Number(n)) => {
            let text = n.to_string();
            text.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&text))
                .map(Value::Number)
                .map_err(|_| {
                    TableError::Json(format!("unrepresentable number for column '{}'", column))
                })
        }
        Some(other) => Err(TableError::Json(format!(
            "unsupported JSON value for column '{}': {}",
            column, other
        ))),
    }
}
