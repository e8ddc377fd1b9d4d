use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use downhole_stats::chart::histogram;
use downhole_stats::gaps::analyze_gaps;
use downhole_stats::stats::interval_statistics;
use downhole_stats::table::IntervalTable;

/// `holes` holes of `per_hole` one-metre intervals, every tenth followed by a gap.
fn synthetic_table(holes: usize, per_hole: usize) -> IntervalTable {
    let rows = holes * per_hole;
    let mut hole_ids = Vec::with_capacity(rows);
    let mut from = Vec::with_capacity(rows);
    let mut to = Vec::with_capacity(rows);
    let mut grades = Vec::with_capacity(rows);

    for hole in 0..holes {
        let mut depth = 0.0;
        for i in 0..per_hole {
            hole_ids.push(format!("DH{hole:04}"));
            from.push(depth);
            depth += 1.0;
            to.push(depth);
            if i % 10 == 9 {
                depth += 0.5;
            }
            grades.push(if i % 17 == 0 {
                None
            } else {
                Some(((hole * 31 + i * 7) % 100) as f64 / 10.0)
            });
        }
    }

    IntervalTable::from_columns(
        StringArray::from(hole_ids),
        Float64Array::from(from),
        Float64Array::from(to),
        vec![(
            "Au".to_string(),
            Arc::new(Float64Array::from(grades)) as ArrayRef,
        )],
    )
    .unwrap()
}

fn benchmark_analyses(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_analyses");

    for holes in [10, 100, 1000].iter() {
        let table = synthetic_table(*holes, 100);
        group.throughput(Throughput::Elements(table.num_rows() as u64));

        group.bench_with_input(
            BenchmarkId::new("interval_statistics", holes),
            &table,
            |b, table| b.iter(|| interval_statistics(std::hint::black_box(table), "Au").unwrap()),
        );
        group.bench_with_input(BenchmarkId::new("gap_analysis", holes), &table, |b, table| {
            b.iter(|| analyze_gaps(std::hint::black_box(table)))
        });
        group.bench_with_input(BenchmarkId::new("histogram", holes), &table, |b, table| {
            b.iter(|| histogram(std::hint::black_box(table), "Au", 20).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_analyses);
criterion_main!(benches);
