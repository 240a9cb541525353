//! Exactable — an in-memory tabular data engine.
//!
//! Datasets are represented as immutable, schema-typed [`Table`]s exposing
//! relational operations (projection, selection, sorting, distinct, joins,
//! group-by/aggregate) plus descriptive statistics and outlier detection over
//! numeric columns. Numbers are exact decimals end to end, never binary
//! floating point, so repeated arithmetic stays true to the input's scale.
//!
//! Every operation takes immutable inputs and returns a new, independently
//! owned table; nothing is ever mutated in place, which makes sharing tables
//! across threads safe without locking.

pub mod column;
pub mod error;
pub mod row;
pub mod stats;
pub mod table;

pub use column::{Column, ColumnType, Value};
pub use error::{Result, TableError};
pub use row::RowView;
pub use stats::Aggregation;
pub use table::Table;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sales() -> Table {
        Table::new(
            vec![
                vec![Value::from("Widget"), Value::from("10"), Value::from("9.99")],
                vec![Value::from("Gadget"), Value::from("5"), Value::from("19.99")],
                vec![Value::from("Doohickey"), Value::from("15"), Value::from("4.99")],
            ],
            vec![ColumnType::Text, ColumnType::Number, ColumnType::Number],
            vec![
                "product".to_string(),
                "quantity".to_string(),
                "price".to_string(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_complete_workflow() {
        // Compute a revenue column, keep the high earners, and rank them.
        let ranked = sales()
            .compute("revenue", ColumnType::Number, |row| {
                let q = row.get("quantity").ok().and_then(Value::as_number);
                let p = row.get("price").ok().and_then(Value::as_number);
                match (q, p) {
                    (Some(q), Some(p)) => Value::Number(q * p),
                    _ => Value::Null,
                }
            })
            .unwrap()
            .filter(|row| {
                row.get("revenue")
                    .ok()
                    .and_then(Value::as_number)
                    .map(|r| r > dec("90"))
                    .unwrap_or(false)
            })
            .order_by("revenue", true)
            .unwrap()
            .limit(0, Some(1), 1)
            .unwrap();

        assert_eq!(ranked.len(), 1);
        // Gadget: 5 * 19.99 = 99.95, exactly.
        assert_eq!(
            ranked.column("product").unwrap().values()[0],
            Value::from("Gadget")
        );
        assert_eq!(
            ranked.column("revenue").unwrap().values()[0],
            Value::Number(dec("99.95"))
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let expensive = |row: &RowView| {
            row.get("price")
                .ok()
                .and_then(Value::as_number)
                .map(|p| p > dec("5"))
                .unwrap_or(false)
        };
        let table = sales();
        let once = table.filter(expensive);
        let twice = once.filter(expensive);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_select_preserves_values() {
        let table = sales();
        let projected = table.select(&["price"]).unwrap();
        assert_eq!(projected.column_names(), ["price".to_string()]);
        assert_eq!(
            projected.column("price").unwrap().values(),
            table.column("price").unwrap().values()
        );
    }

    #[test]
    fn test_export_reimport_is_identity() {
        let table = sales();
        let rebuilt = Table::new(
            table.rows(),
            table.column_types(),
            table.column_names().to_vec(),
        )
        .unwrap();
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn test_exact_decimal_mean() {
        // 0.30000000000000004 territory stays out of the results.
        let table = Table::new(
            vec![
                vec![Value::from("1.00")],
                vec![Value::from("2.00")],
                vec![Value::from("3.00")],
            ],
            vec![ColumnType::Number],
            vec!["v".to_string()],
        )
        .unwrap();
        assert_eq!(table.column("v").unwrap().mean().unwrap(), dec("2.00"));
    }

    #[test]
    fn test_aggregate_workflow() {
        let table = Table::new(
            vec![
                vec![Value::from("A"), Value::from("10")],
                vec![Value::from("A"), Value::from("20")],
                vec![Value::from("B"), Value::from("5")],
            ],
            vec![ColumnType::Text, ColumnType::Number],
            vec!["g".to_string(), "v".to_string()],
        )
        .unwrap();
        let summary = table.aggregate("g", &[("v", Aggregation::Mean)]).unwrap();
        assert_eq!(
            summary.rows(),
            vec![
                vec![
                    Value::from("A"),
                    Value::Number(dec("2")),
                    Value::Number(dec("15")),
                ],
                vec![
                    Value::from("B"),
                    Value::Number(dec("1")),
                    Value::Number(dec("5")),
                ],
            ]
        );
    }

    #[test]
    fn test_tables_share_across_threads() {
        let table = sales();
        std::thread::scope(|scope| {
            let by_price = scope.spawn(|| table.order_by("price", false).unwrap().len());
            let total = scope.spawn(|| table.column("price").unwrap().sum().unwrap());
            assert_eq!(by_price.join().unwrap(), 3);
            assert_eq!(total.join().unwrap(), dec("34.97"));
        });
    }
}
