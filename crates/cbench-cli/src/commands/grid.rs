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

//! `cbench grid`: list grid points and their corpus files.

use crate::cli::GridArgs;
use crate::error::CliError;
use cbench_core::corpus;
use cbench_core::ParameterPoint;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct GridEntry {
    #[serde(flatten)]
    point: ParameterPoint,
    path: PathBuf,
    present: bool,
}

/// Print every point of the selected grid.
///
/// # Errors
///
/// Returns `Err` if the grid is invalid.
pub fn grid(corpus_dir: &Path, grid: &GridArgs, json: bool) -> Result<(), CliError> {
    let grid = grid.resolve(corpus_dir)?;
    let entries: Vec<GridEntry> = grid
        .points()
        .map(|point| {
            let path = corpus::locate(corpus_dir, &point);
            GridEntry {
                present: path.is_file(),
                point,
                path,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let marker = if entry.present {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("{} {}  {}", marker, entry.point, entry.path.display());
    }
    let missing = entries.iter().filter(|e| !e.present).count();
    println!(
        "{} point(s), {} missing",
        entries.len().to_string().bright_white(),
        missing
    );
    Ok(())
}
