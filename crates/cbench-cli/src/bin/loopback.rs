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

//! Loopback codec.
//!
//! A stand-in for the real codec that honours its command-line contract:
//!
//! ```text
//! cbench-loopback -a <huffman|shennon> -i <input>
//! ```
//!
//! An input ending in `.haff` or `.shan` is decoded to `<base>-unz-<tag>.txt`;
//! anything else is encoded to `<base>.haff` / `<base>.shan`. Every output
//! gets a companion `.ops` file whose first line is an operation count.
//!
//! The "encoding" stores the input reversed behind a header, so decoding
//! restores it exactly.
//!
//! # Fault injection
//!
//! - `CBENCH_LOOPBACK_FAIL=<substring>`: exit 3 when the input path contains
//!   the substring
//! - `CBENCH_LOOPBACK_FAIL_ALGORITHM=<name>`: restrict the above to one
//!   algorithm
//! - `CBENCH_LOOPBACK_CORRUPT=<substring>`: flip the first decoded byte

use cbench_core::layout::{count_path, decoded_output, encoded_output};
use cbench_core::Algorithm;
use clap::Parser;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const HEADER: &[u8] = b"LOOPBACK";

#[derive(Parser)]
#[command(name = "cbench-loopback", about = "Loopback codec for cbench tests")]
struct Args {
    /// Algorithm: huffman or shennon
    #[arg(short = 'a', value_name = "ALGORITHM")]
    algorithm: String,

    /// Input file
    #[arg(short = 'i', value_name = "FILE")]
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let Some(algorithm) = Algorithm::from_cli_name(&args.algorithm) else {
        eprintln!("unknown algorithm '{}'", args.algorithm);
        return ExitCode::from(2);
    };

    if injected(&args.input, Some(algorithm), "CBENCH_LOOPBACK_FAIL") {
        eprintln!("loopback: starting {}", algorithm.cli_name());
        eprintln!("loopback: injected failure for {}", args.input.display());
        return ExitCode::from(3);
    }

    match process(&args.input, algorithm) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::from(1)
        }
    }
}

fn process(input: &Path, algorithm: Algorithm) -> Result<(), String> {
    let data = fs::read(input).map_err(|e| format!("cannot read '{}': {}", input.display(), e))?;
    let decoding = input
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(Algorithm::from_encoded_extension)
        .is_some();

    let (output, bytes) = if decoding {
        let body = data
            .strip_prefix(HEADER)
            .and_then(|rest| rest.split_first())
            .filter(|(tag, _)| **tag == algorithm.tag() as u8)
            .map(|(_, body)| body)
            .ok_or_else(|| format!("'{}' is not a {} archive", input.display(), algorithm))?;
        let mut bytes: Vec<u8> = body.iter().rev().copied().collect();
        if injected(input, None, "CBENCH_LOOPBACK_CORRUPT") {
            if let Some(first) = bytes.first_mut() {
                *first ^= 0xff;
            }
        }
        (decoded_output(input, algorithm), bytes)
    } else {
        let mut bytes = Vec::with_capacity(HEADER.len() + 1 + data.len());
        bytes.extend_from_slice(HEADER);
        bytes.push(algorithm.tag() as u8);
        bytes.extend(data.iter().rev());
        (encoded_output(input, algorithm), bytes)
    };

    fs::write(&output, &bytes).map_err(|e| format!("cannot write '{}': {}", output.display(), e))?;
    let ops = operations(algorithm, data.len() as u64);
    let count = count_path(&output);
    fs::write(&count, format!("{}\nbytes in: {}\n", ops, data.len()))
        .map_err(|e| format!("cannot write '{}': {}", count.display(), e))
}

/// Deterministic operation count for an input of `len` bytes.
fn operations(algorithm: Algorithm, len: u64) -> u64 {
    match algorithm {
        Algorithm::Huffman => len * 7 + 256,
        Algorithm::Shannon => len * 9 + 256,
    }
}

fn injected(input: &Path, algorithm: Option<Algorithm>, var: &str) -> bool {
    let Ok(needle) = env::var(var) else {
        return false;
    };
    if needle.is_empty() || !input.to_string_lossy().contains(&needle) {
        return false;
    }
    match (algorithm, env::var("CBENCH_LOOPBACK_FAIL_ALGORITHM")) {
        (Some(algorithm), Ok(only)) => only == algorithm.cli_name() || only == algorithm.to_string(),
        _ => true,
    }
}
