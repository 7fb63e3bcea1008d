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

//! CLI command definitions and argument parsing.
//!
//! - [`bench`]: `run`, `tables`
//! - [`corpus`]: `generate`, `grid`
//! - [`args`]: grid selection shared by several commands

pub mod args;
mod bench;
mod corpus;

use clap::Subcommand;

pub use args::GridArgs;
pub use bench::{BenchCommands, RunArgs};
pub use corpus::CorpusCommands;

/// Top-level CLI commands.
///
/// ```text
/// Commands
/// ├── Bench (run, tables)
/// └── Corpus (generate, grid)
/// ```
#[derive(Subcommand)]
pub enum Commands {
    // Flattened so every command appears at the top level
    #[command(flatten)]
    Bench(BenchCommands),

    #[command(flatten)]
    Corpus(CorpusCommands),
}

impl Commands {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns the message to print when the command fails.
    pub fn execute(self, verbose: bool) -> Result<(), String> {
        match self {
            Commands::Bench(cmd) => cmd.execute(verbose),
            Commands::Corpus(cmd) => cmd.execute(),
        }
    }
}
