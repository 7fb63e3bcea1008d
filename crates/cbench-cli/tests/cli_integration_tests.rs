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

//! End-to-end tests of the `cbench` binary against the loopback codec.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const LOOPBACK: &str = env!("CARGO_BIN_EXE_cbench-loopback");

/// Test helper to create a cbench command
fn cbench_cmd() -> Command {
    let mut cmd = Command::cargo_bin("cbench").expect("Failed to find cbench binary");
    cmd.env("NO_COLOR", "1")
        .env_remove("CBENCH_LOOPBACK_FAIL")
        .env_remove("CBENCH_LOOPBACK_FAIL_ALGORITHM")
        .env_remove("CBENCH_LOOPBACK_CORRUPT");
    cmd
}

/// Generate the 2x2x1 corpus: 1 KiB and 2 MiB files in charsets 0 and 1.
fn scenario() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    cbench_cmd()
        .args(["generate", "--corpus-dir"])
        .arg(dir.path().join("corpus"))
        .args(["--sizes", "1024,2097152", "--charsets", "0,1", "--samples", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 4 file(s)"));
    dir
}

fn run_cmd(root: &Path) -> Command {
    let mut cmd = cbench_cmd();
    cmd.arg("run")
        .arg("--corpus-dir")
        .arg(root.join("corpus"))
        .arg("--codec")
        .arg(LOOPBACK)
        .arg("--output-dir")
        .arg(root.join("out"))
        .args(["--jobs", "2"]);
    cmd
}

fn report(root: &Path) -> Value {
    let content = fs::read_to_string(root.join("out/report.json")).expect("report.json");
    serde_json::from_str(&content).expect("valid JSON")
}

#[test]
fn test_generate_writes_exact_sizes() {
    let dir = scenario();
    for (size, charset) in [(1024u64, 0), (1024, 1), (2097152, 0), (2097152, 1)] {
        let path = dir
            .path()
            .join(format!("corpus/size-{}_charset-{}_sample-0.txt", size, charset));
        let bytes = fs::read(&path).expect("corpus file");
        assert_eq!(bytes.len() as u64, size);
        assert!(std::str::from_utf8(&bytes).is_ok());
    }

    // a second pass keeps everything
    cbench_cmd()
        .args(["generate", "--corpus-dir"])
        .arg(dir.path().join("corpus"))
        .arg("--discover")
        .assert()
        .success()
        .stdout(predicate::str::contains("(4 kept)"));
}

#[test]
fn test_grid_lists_points() {
    let dir = scenario();
    cbench_cmd()
        .args(["grid", "--discover", "--corpus-dir"])
        .arg(dir.path().join("corpus"))
        .assert()
        .success()
        .stdout(predicate::str::contains("size=2097152 charset=1 sample=0"))
        .stdout(predicate::str::contains("4 point(s), 0 missing"));

    let output = cbench_cmd()
        .args(["grid", "--json", "--sizes", "10", "--charsets", "2", "--samples", "0,1", "--corpus-dir"])
        .arg(dir.path().join("corpus"))
        .output()
        .expect("grid --json");
    assert!(output.status.success());
    let entries: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let entries = entries.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["sample"], 1);
    assert_eq!(entries[1]["present"], false);
}

#[test]
fn test_run_scenario_succeeds() {
    let dir = scenario();
    run_cmd(dir.path())
        .arg("--discover")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trials: 16"))
        .stdout(predicate::str::contains("Matched: 8"))
        .stdout(predicate::str::contains("Mismatched: 0"));

    let report = report(dir.path());
    assert_eq!(report["summary"]["completed"], 16);
    assert_eq!(report["summary"]["failed"], 0);

    let by_size: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("out/aggregates/encode_by_size.json")).unwrap(),
    )
    .unwrap();
    let groups = by_size["groups"].as_object().expect("groups");
    assert_eq!(groups.len(), 2);
    for series in groups.values() {
        let entries: usize = series
            .as_object()
            .unwrap()
            .values()
            .map(|points| points.as_array().unwrap().len())
            .sum();
        assert_eq!(entries, 4);
    }
    assert!(dir.path().join("out/aggregates/decode_by_algorithm.json").is_file());
    assert!(dir.path().join("out/tables.md").is_file());
}

#[test]
fn test_failing_trial_exits_nonzero_and_others_complete() {
    let dir = scenario();
    run_cmd(dir.path())
        .arg("--discover")
        .env("CBENCH_LOOPBACK_FAIL", "size-1024_charset-1_sample-0.txt")
        .env("CBENCH_LOOPBACK_FAIL_ALGORITHM", "huffman")
        .assert()
        .failure()
        .stdout(predicate::str::contains("external process failure (1)"))
        .stdout(predicate::str::contains("injected failure"))
        .stdout(predicate::str::contains("re-run:"))
        .stderr(predicate::str::contains("Run failed: 1 failed trial(s)"));

    let report = report(dir.path());
    assert_eq!(report["summary"]["failed"], 1);
    assert_eq!(report["summary"]["blocked"], 1);
    assert_eq!(report["summary"]["completed"], 14);
    assert_eq!(report["summary"]["matched"], 7);
}

#[test]
fn test_corrupt_round_trip_exits_nonzero() {
    let dir = scenario();
    run_cmd(dir.path())
        .arg("--discover")
        .env("CBENCH_LOOPBACK_CORRUPT", "size-2097152_charset-0_sample-0.shan")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Mismatched: 1"))
        .stdout(predicate::str::contains("round-trip mismatch"));
}

#[test]
fn test_missing_corpus_file() {
    let dir = scenario();
    fs::remove_file(dir.path().join("corpus/size-1024_charset-0_sample-0.txt")).unwrap();
    let grid = ["--sizes", "1024,2097152", "--charsets", "0,1", "--samples", "0"];

    run_cmd(dir.path())
        .args(grid)
        .assert()
        .failure()
        .stdout(predicate::str::contains("generation gap (2)"));

    run_cmd(dir.path())
        .args(grid)
        .arg("--allow-missing-corpus")
        .assert()
        .success()
        .stdout(predicate::str::contains("Matched: 6"));
}

#[test]
fn test_second_run_uses_cache() {
    let dir = scenario();
    run_cmd(dir.path()).arg("--discover").assert().success();
    run_cmd(dir.path())
        .arg("--discover")
        .assert()
        .success()
        .stdout(predicate::str::contains("(16 cached)"));
    run_cmd(dir.path())
        .args(["--discover", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(0 cached)"));
}

#[test]
fn test_tables_rerender() {
    let dir = scenario();
    run_cmd(dir.path()).arg("--discover").assert().success();
    let tables = dir.path().join("out/tables.md");
    let original = fs::read_to_string(&tables).unwrap();
    fs::remove_file(&tables).unwrap();

    cbench_cmd()
        .args(["tables", "--output-dir"])
        .arg(dir.path().join("out"))
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&tables).unwrap(), original);
    assert!(original.contains("### Encoding, file size 2097152 bytes"));

    cbench_cmd()
        .args(["tables", "--print", "--output-dir"])
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("## Decoding"));
}

#[test]
fn test_tables_without_aggregates_fails() {
    let dir = tempdir().unwrap();
    cbench_cmd()
        .args(["tables", "--output-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No aggregates found"));
}

#[test]
fn test_missing_codec_is_a_trial_failure() {
    let dir = scenario();
    cbench_cmd()
        .arg("run")
        .arg("--corpus-dir")
        .arg(dir.path().join("corpus"))
        .arg("--codec")
        .arg(dir.path().join("no-such-codec"))
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .arg("--discover")
        .assert()
        .failure()
        .stdout(predicate::str::contains("launch failure"));
}

#[test]
fn test_invalid_arguments() {
    let dir = tempdir().unwrap();
    cbench_cmd()
        .arg("run")
        .arg("--corpus-dir")
        .arg(dir.path().join("absent"))
        .args(["--codec", LOOPBACK, "--output-dir"])
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("corpus-dir"));

    cbench_cmd()
        .args(["grid", "--discover", "--sizes", "10", "--corpus-dir", "."])
        .assert()
        .failure();
}

#[test]
fn test_loopback_honours_codec_contract() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("size-5_charset-0_sample-0.txt");
    fs::write(&input, "hello").unwrap();

    Command::new(LOOPBACK)
        .args(["-a", "shennon", "-i"])
        .arg(&input)
        .assert()
        .success();
    let encoded = dir.path().join("size-5_charset-0_sample-0.shan");
    assert!(encoded.is_file());
    let ops = fs::read_to_string(dir.path().join("size-5_charset-0_sample-0.shan.ops")).unwrap();
    assert_eq!(ops.lines().next(), Some("301"));

    Command::new(LOOPBACK)
        .args(["-a", "shennon", "-i"])
        .arg(&encoded)
        .assert()
        .success();
    let decoded = dir.path().join("size-5_charset-0_sample-0-unz-s.txt");
    assert_eq!(fs::read_to_string(decoded).unwrap(), "hello");

    Command::new(LOOPBACK)
        .args(["-a", "shannon", "-i"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown algorithm"));
}
