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

//! Benchmark commands: running trials and rendering their results.

use super::args::GridArgs;
use crate::commands;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments of `cbench run`.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory holding the corpus files
    #[arg(long, value_name = "DIR")]
    pub corpus_dir: PathBuf,

    /// Codec executable
    #[arg(long, value_name = "PATH")]
    pub codec: PathBuf,

    /// Directory for trial artifacts, aggregates and the report
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Concurrent codec invocations [default: min(4, cores), or CBENCH_POOL_SIZE]
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Re-run trials whose artifacts already exist
    #[arg(long)]
    pub force: bool,

    /// Do not fail the run because corpus files are missing
    #[arg(long)]
    pub allow_missing_corpus: bool,
}

/// Benchmark commands.
#[derive(Subcommand)]
pub enum BenchCommands {
    /// Run encode and decode trials over the grid
    ///
    /// Stages every corpus file, encodes it with each algorithm, decodes
    /// every encoded artifact, verifies the round trip byte for byte and
    /// aggregates the codec's operation counts. Exits non-zero if any
    /// trial fails, any round trip mismatches or aggregation is incomplete.
    Run(RunArgs),

    /// Re-render tables.md from the persisted aggregates
    Tables {
        /// Output directory of a previous run
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Also print the tables to stdout
        #[arg(long)]
        print: bool,
    },
}

impl BenchCommands {
    /// Execute the benchmark command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the run cannot start, does not pass, or the
    /// aggregates cannot be read.
    pub fn execute(self, verbose: bool) -> Result<(), String> {
        match self {
            BenchCommands::Run(args) => commands::run(args, verbose),
            BenchCommands::Tables { output_dir, print } => commands::tables(&output_dir, print),
        }
        .map_err(|e| e.to_string())
    }
}
