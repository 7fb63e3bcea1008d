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

//! `cbench generate`: write a reproducible corpus.

use crate::cli::GridArgs;
use crate::error::CliError;
use cbench_core::corpus;
use colored::Colorize;
use std::path::Path;

/// Generate every corpus file of the selected grid.
///
/// `--discover` is accepted and regenerates files for the grid already
/// present in the directory.
///
/// # Errors
///
/// Returns `Err` for an unknown charset or if a file cannot be written.
pub fn generate(corpus_dir: &Path, grid: &GridArgs, seed: u64, overwrite: bool) -> Result<(), CliError> {
    let grid = grid.resolve(corpus_dir)?;
    let summary = corpus::generate(corpus_dir, &grid, seed, overwrite)?;
    println!(
        "{} {} file(s) in {} ({} kept)",
        "Generated".green().bold(),
        summary.written,
        corpus_dir.display(),
        summary.kept
    );
    Ok(())
}
