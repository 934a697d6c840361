#![allow(missing_docs)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tempfile::tempdir;

use fon::{Fon, FonDump, Record, WriteStrategy};

// --- SETUP ---

fn bench_record(i: u64) -> Record {
    let mut record = Record::new();
    record.insert("id", i as i64).unwrap();
    record.insert("name", format!("entity_{i}")).unwrap();
    record.insert("score", (i as f64) * 0.125).unwrap();
    record.insert("active", i % 2 == 0).unwrap();
    record
        .insert("samples", (0..16).map(|k| (i + k) as i32).collect::<Vec<_>>())
        .unwrap();
    record
}

fn generate_dump(count: u64) -> FonDump {
    let mut dump = FonDump::new();
    for i in 0..count {
        dump.insert(i, bench_record(i)).unwrap();
    }
    dump
}

// --- BENCHMARKS ---

fn bench_line_codec(c: &mut Criterion) {
    let record = bench_record(42);
    let line = Fon::serialize_line(&record);

    let mut group = c.benchmark_group("Line Codec");
    group.throughput(Throughput::Bytes(line.len() as u64));

    group.bench_function("serialize", |b| {
        b.iter(|| Fon::serialize_line(black_box(&record)));
    });
    group.bench_function("parse", |b| {
        b.iter(|| Fon::parse_line(black_box(&line)).unwrap());
    });
    group.finish();
}

fn bench_file_pipeline(c: &mut Criterion) {
    let record_count = 50_000;
    let dump = generate_dump(record_count);
    let dir = tempdir().unwrap();

    let probe = dir.path().join("probe.fon");
    Fon::save(&dump, &probe).unwrap();
    let file_bytes = std::fs::metadata(&probe).unwrap().len();

    let mut group = c.benchmark_group("File Pipeline");
    group.sample_size(20);
    group.throughput(Throughput::Bytes(file_bytes));

    for (name, strategy) in [
        ("write_fanout", WriteStrategy::Fanout),
        ("write_chunked", WriteStrategy::Chunked),
        ("write_pipelined", WriteStrategy::Pipelined),
    ] {
        let path = dir.path().join(format!("{name}.fon"));
        group.bench_function(name, |b| {
            b.iter(|| {
                Fon::builder()
                    .strategy(strategy)
                    .save(black_box(&dump), &path)
                    .unwrap()
            });
        });
    }

    group.bench_function("read_whole", |b| {
        b.iter(|| Fon::load(black_box(&probe)).unwrap());
    });
    group.bench_function("read_chunked", |b| {
        b.iter(|| Fon::load_chunked(black_box(&probe), 10_000).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_line_codec, bench_file_pipeline);
criterion_main!(benches);
