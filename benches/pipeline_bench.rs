use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hospital_data_gen::{DatasetBundle, Generator, GeneratorConfig, RenderConfig, Renderer};
use hospital_etl::parser::{split_statements, InsertParser};
use std::hint::black_box;

fn bundle(encounters: usize) -> DatasetBundle {
    let config = GeneratorConfig::default()
        .with_seed(42)
        .with_encounters(encounters);
    Generator::new(config)
        .expect("valid generator config")
        .generate()
}

fn render(bundle: &DatasetBundle) -> String {
    Renderer::new(RenderConfig::new())
        .render_to_string(bundle)
        .expect("render into memory")
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);

    for encounters in [1_000, 10_000] {
        group.throughput(Throughput::Elements(encounters as u64));
        group.bench_with_input(
            BenchmarkId::new("bundle", encounters),
            &encounters,
            |b, &n| b.iter(|| black_box(bundle(n))),
        );
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for encounters in [1_000, 10_000] {
        let data = bundle(encounters);
        group.throughput(Throughput::Elements(data.total_rows() as u64));
        group.bench_with_input(
            BenchmarkId::new("load_script", encounters),
            &data,
            |b, data| b.iter(|| black_box(render(data))),
        );
    }

    group.finish();
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for encounters in [1_000, 10_000] {
        let sql = render(&bundle(encounters));
        group.throughput(Throughput::Bytes(sql.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("split_statements", format!("{}_enc", encounters)),
            &sql,
            |b, sql| b.iter(|| black_box(split_statements(sql).len())),
        );

        let statements = split_statements(&sql);
        group.bench_with_input(
            BenchmarkId::new("parse_inserts", format!("{}_enc", encounters)),
            &statements,
            |b, statements| {
                b.iter(|| {
                    let rows: usize = statements
                        .iter()
                        .filter_map(|s| InsertParser::new(s).parse().ok())
                        .map(|p| p.rows.len())
                        .sum();
                    black_box(rows)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_render, bench_split);
criterion_main!(benches);
