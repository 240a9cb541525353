use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use exactable::{Aggregation, ColumnType, Table, Value};

fn build_table(rows: usize) -> Table {
    let data: Vec<Vec<Value>> = (0..rows)
        .map(|i| {
            vec![
                Value::from(format!("group_{}", i % 10)),
                Value::from(format!("{}.25", i)),
            ]
        })
        .collect();
    Table::new(
        data,
        vec![ColumnType::Text, ColumnType::Number],
        vec!["g".to_string(), "v".to_string()],
    )
    .unwrap()
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| build_table(black_box(size)));
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100, 1000, 10000].iter() {
        let table = build_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                table.filter(|row| {
                    row.get("v")
                        .ok()
                        .and_then(Value::as_number)
                        .map(|v| v > "50".parse().unwrap())
                        .unwrap_or(false)
                })
            });
        });
    }
    group.finish();
}

fn bench_order_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_by");

    for size in [100, 1000, 10000].iter() {
        let table = build_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| table.order_by(black_box("v"), true).unwrap());
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [100, 1000, 10000].iter() {
        let table = build_table(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                table
                    .aggregate(
                        black_box("g"),
                        &[("v", Aggregation::Mean), ("v", Aggregation::Stdev)],
                    )
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_inner_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("inner_join");

    for size in [100, 1000].iter() {
        let left = build_table(*size);
        let right = build_table(10);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| left.inner_join(black_box("g"), &right, "g").unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_filter,
    bench_order_by,
    bench_aggregate,
    bench_inner_join
);
criterion_main!(benches);
