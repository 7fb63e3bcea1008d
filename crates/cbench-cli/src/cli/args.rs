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

//! Arguments shared by several commands.

use crate::error::CliError;
use cbench_core::corpus::discover_grid;
use cbench_core::grid::{DEFAULT_CHARSETS, DEFAULT_SAMPLES, DEFAULT_SIZES};
use cbench_core::{Grid, GridConfig};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

/// Grid selection.
///
/// Axes given on the command line override the defaults one by one;
/// `--grid` and `--discover` replace the whole grid.
#[derive(Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// File sizes in bytes (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "BYTES")]
    pub sizes: Vec<u64>,

    /// Charset ids (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub charsets: Vec<u8>,

    /// Sample indices (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "INDICES")]
    pub samples: Vec<u32>,

    /// Read the grid from a JSON file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["sizes", "charsets", "samples", "discover"])]
    pub grid: Option<PathBuf>,

    /// Build the grid from the corpus files present
    #[arg(long, conflicts_with_all = ["sizes", "charsets", "samples"])]
    pub discover: bool,
}

impl GridArgs {
    /// Resolve the grid for a corpus directory.
    pub fn resolve(&self, corpus_dir: &Path) -> Result<Grid, CliError> {
        if self.discover {
            return Ok(discover_grid(corpus_dir)?);
        }
        if let Some(path) = &self.grid {
            return load_grid_file(path);
        }
        Ok(Grid::new(
            or_default(&self.sizes, DEFAULT_SIZES),
            or_default(&self.charsets, DEFAULT_CHARSETS),
            or_default(&self.samples, DEFAULT_SAMPLES),
        )?)
    }
}

fn or_default<'a, T>(given: &'a [T], default: &'a [T]) -> &'a [T] {
    if given.is_empty() {
        default
    } else {
        given
    }
}

/// Load a grid from a JSON file such as
/// `{ "sizes": [1024], "charsets": [0, 1], "samples": [0] }`.
pub fn load_grid_file(path: &Path) -> Result<Grid, CliError> {
    let content = fs::read_to_string(path).map_err(|e| CliError::grid_file(path, e.to_string()))?;
    let config: GridConfig =
        serde_json::from_str(&content).map_err(|e| CliError::grid_file(path, e.to_string()))?;
    Ok(Grid::from_config(&config)?)
}
