//! Name-keyed access into one row of a table.

use crate::column::Value;
use crate::error::Result;
use crate::table::Table;

/// A read-only projection over one row index across a table's columns.
///
/// Row views are handed to row predicates (`filter`), key functions
/// (`order_by_key`), and compute functions (`compute`); they borrow the table
/// and exist only for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(table: &'a Table, row: usize) -> Self {
        RowView { table, row }
    }

    /// Position of this row in the table.
    pub fn index(&self) -> usize {
        self.row
    }

    /// Value of the named column in this row.
    ///
    /// # Errors
    ///
    /// [`TableError::ColumnDoesNotExist`](crate::TableError::ColumnDoesNotExist)
    /// on an unknown column name.
    pub fn get(&self, column: &str) -> Result<&'a Value> {
        let col = self.table.column(column)?;
        Ok(&col.values()[self.row])
    }

    /// All values of this row in schema order.
    pub fn values(&self) -> Vec<&'a Value> {
        self.table
            .columns()
            .iter()
            .map(|c| &c.values()[self.row])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::error::TableError;

    fn sample() -> Table {
        Table::new(
            vec![
                vec![Value::from("Alice"), Value::from("30")],
                vec![Value::from("Bob"), Value::from("25")],
            ],
            vec![ColumnType::Text, ColumnType::Number],
            vec!["name".to_string(), "age".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_row_view_get() {
        let table = sample();
        let row = table.row(1).unwrap();
        assert_eq!(row.get("name").unwrap().as_text(), Some("Bob"));
        assert_eq!(
            row.get("age").unwrap().as_number(),
            Some("25".parse().unwrap())
        );
        assert_eq!(row.index(), 1);
    }

    #[test]
    fn test_row_view_unknown_column() {
        let table = sample();
        let row = table.row(0).unwrap();
        assert_eq!(
            row.get("salary").unwrap_err(),
            TableError::ColumnDoesNotExist("salary".to_string())
        );
    }

    #[test]
    fn test_row_view_values_in_schema_order() {
        let table = sample();
        let row = table.row(0).unwrap();
        let values = row.values();
        assert_eq!(values[0].as_text(), Some("Alice"));
        assert_eq!(values[1].as_number(), Some("30".parse().unwrap()));
    }
}
