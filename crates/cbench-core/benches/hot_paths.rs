// cbench - Codec Round-Trip Benchmark Harness
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmarks for the harness's own work between codec invocations.
//!
//! Covers corpus generation, byte comparison of round trips, and
//! aggregation of large grids. Codec time is not measured here.

use cbench_core::aggregate::aggregate;
use cbench_core::corpus::{generate_text, DEFAULT_SEED};
use cbench_core::verify::first_difference;
use cbench_core::{
    Algorithm, CorpusFile, Grid, ParameterPoint, Phase, TrialArtifact, TrialKey, TrialOutcome,
    TrialRecord,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use std::path::{Path, PathBuf};

fn bench_generate_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_text");

    for charset in [0u8, 1, 2] {
        let point = ParameterPoint::new(64 * 1024, charset, 0);
        group.throughput(Throughput::Bytes(point.size));
        group.bench_with_input(BenchmarkId::new("charset", charset), &point, |b, point| {
            b.iter(|| generate_text(black_box(point), DEFAULT_SEED))
        });
    }

    group.finish();
}

fn bench_first_difference(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_difference");
    let dir = tempfile::tempdir().expect("temp dir");

    for size in [64 * 1024usize, 1024 * 1024, 8 * 1024 * 1024] {
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let left = dir.path().join(format!("left-{}", size));
        let right = dir.path().join(format!("right-{}", size));
        fs::write(&left, &data).expect("write");
        fs::write(&right, &data).expect("write");

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("identical", size), &size, |b, _| {
            b.iter(|| first_difference(black_box(&left), black_box(&right)))
        });
    }

    group.finish();
}

fn records(grid: &Grid, phase: Phase) -> Vec<TrialRecord> {
    grid.points()
        .flat_map(|point| {
            Algorithm::ALL.into_iter().map(move |algorithm| {
                let source = CorpusFile::resolve(Path::new("corpus"), point);
                TrialRecord {
                    key: TrialKey::new(phase, point, algorithm),
                    source: source.clone(),
                    outcome: TrialOutcome::Completed(TrialArtifact {
                        source,
                        algorithm,
                        phase,
                        output_path: PathBuf::from("out"),
                        count_path: PathBuf::from("out.ops"),
                        op_count: point.size * 3 + u64::from(point.charset),
                        cached: false,
                    }),
                }
            })
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for sizes in [10u64, 100, 1000] {
        let axis: Vec<u64> = (1..=sizes).map(|s| s * 1024).collect();
        let grid = Grid::new(&axis, &[0, 1, 2], &[0, 1, 2]).expect("grid");
        let records = records(&grid, Phase::Encode);

        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::new("trials", records.len()), &records, |b, records| {
            b.iter(|| aggregate(black_box(&grid), Phase::Encode, black_box(records)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate_text, bench_first_difference, bench_aggregate);
criterion_main!(benches);
