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

//! Corpus commands.

use super::args::GridArgs;
use crate::commands;
use cbench_core::corpus::DEFAULT_SEED;
use clap::Subcommand;
use std::path::PathBuf;

/// Corpus commands.
#[derive(Subcommand)]
pub enum CorpusCommands {
    /// Generate a reproducible corpus
    ///
    /// Writes one file of exactly `size` bytes per grid point, drawn from
    /// the point's charset: 0 is Latin letters and space, 1 adds Cyrillic
    /// letters, 2 adds punctuation. Existing files of the right size are
    /// kept.
    Generate {
        /// Directory to write the corpus into
        #[arg(long, value_name = "DIR")]
        corpus_dir: PathBuf,

        #[command(flatten)]
        grid: GridArgs,

        /// Generator seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Rewrite files that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// List every grid point with its corpus path
    Grid {
        /// Corpus directory the paths are resolved in
        #[arg(long, value_name = "DIR")]
        corpus_dir: PathBuf,

        #[command(flatten)]
        grid: GridArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl CorpusCommands {
    /// Execute the corpus command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the grid is invalid or the corpus cannot be written.
    pub fn execute(self) -> Result<(), String> {
        match self {
            CorpusCommands::Generate {
                corpus_dir,
                grid,
                seed,
                overwrite,
            } => commands::generate(&corpus_dir, &grid, seed, overwrite),
            CorpusCommands::Grid {
                corpus_dir,
                grid,
                json,
            } => commands::grid(&corpus_dir, &grid, json),
        }
        .map_err(|e| e.to_string())
    }
}
