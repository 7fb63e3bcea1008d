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

//! cbench Command Line Interface

use cbench_cli::cli::Commands;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// cbench - codec round-trip benchmark harness
///
/// Drives an external Huffman / Shannon-Fano codec over a grid of corpus
/// files, verifies every round trip and aggregates the codec's operation
/// counts.
///
/// # Examples
///
/// ```bash
/// # Generate the default corpus
/// cbench generate --corpus-dir inputs
///
/// # Run the benchmark
/// cbench run --corpus-dir inputs --codec ./myprog --output-dir results
/// ```
#[derive(Parser)]
#[command(name = "cbench")]
#[command(author, version, about = "cbench - codec round-trip benchmark harness", long_about = None)]
struct Cli {
    /// Log every trial and debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.execute(cli.verbose) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` adds to the default directive.
fn init_logging(verbose: bool) {
    let directive = if verbose {
        "cbench_core=debug"
    } else {
        "cbench_core=info"
    };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive.parse() {
        filter = filter.add_directive(directive);
    }
    if let Ok(directive) = "cbench_cli=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
