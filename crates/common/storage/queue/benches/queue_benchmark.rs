// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmarks for the rotating disk queue.
//!
//! Measures:
//! - Record append throughput per flush mode
//! - Full-queue read throughput

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use spool_codec::{Record, Value};
use spool_queue::{FlushMode, Project};
use tempfile::TempDir;

/// Number of records per throughput measurement.
const BATCH: u64 = 1_000;

fn sample_record(i: i64) -> Record {
    let mut record = Record::new();
    record.insert("seq".to_owned(), Value::Int(i));
    record.insert("name".to_owned(), Value::from("benchmark-record"));
    record.insert(
        "tags".to_owned(),
        Value::Array(vec![Value::from("a"), Value::from("b")]),
    );
    record
}

fn bench_write_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_throughput");
    group.throughput(Throughput::Elements(BATCH));

    for (label, mode) in [
        ("on_rotate", FlushMode::OnRotate),
        ("each_write", FlushMode::EachWrite),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &mode, |b, &mode| {
            let temp_dir = TempDir::new().unwrap();
            let project = Project::builder(temp_dir.path())
                .flush_mode(mode)
                .open()
                .unwrap();
            let mut sink = project.open_sink("bench").unwrap();

            b.iter(|| {
                for i in 0..BATCH {
                    sink.write_dict(black_box(&sample_record(i as i64))).unwrap();
                }
            });

            sink.close().unwrap();
        });
    }

    group.finish();
}

fn bench_read_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_throughput");
    group.throughput(Throughput::Elements(BATCH));

    group.bench_function("scan", |b| {
        let temp_dir = TempDir::new().unwrap();
        let project = Project::open(temp_dir.path()).unwrap();

        let mut sink = project.open_sink("bench").unwrap();
        for i in 0..BATCH {
            sink.write_dict(&sample_record(i as i64)).unwrap();
        }
        sink.close().unwrap();

        b.iter(|| {
            let source = project.open_source("bench").unwrap();
            let mut count = 0u64;
            for entry in source {
                black_box(entry.unwrap());
                count += 1;
            }
            assert_eq!(count, BATCH);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_write_throughput, bench_read_throughput);
criterion_main!(benches);
