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

//! `cbench tables`: re-render markdown tables from persisted aggregates.

use crate::error::CliError;
use cbench_core::config::{aggregates_dir, TABLES_FILE};
use cbench_core::report::load_views;
use cbench_core::tables::{render, write_tables};
use cbench_core::Phase;
use colored::Colorize;
use std::path::Path;
use tracing::warn;

/// Render `tables.md` for a previous run.
///
/// Phases whose aggregates are missing are skipped with a warning.
///
/// # Errors
///
/// Returns [`CliError::NoAggregates`] if no phase could be loaded.
pub fn tables(output_dir: &Path, print: bool) -> Result<(), CliError> {
    let dir = aggregates_dir(output_dir);
    let mut views = Vec::new();
    for phase in Phase::ALL {
        match load_views(&dir, phase) {
            Ok(v) => views.push(v),
            Err(e) => warn!(%phase, "skipping phase: {}", e),
        }
    }
    if views.is_empty() {
        return Err(CliError::NoAggregates(dir));
    }

    let path = output_dir.join(TABLES_FILE);
    write_tables(&path, &views)?;
    if print {
        print!("{}", render(&views));
    } else {
        println!("{} {}", "Wrote".green().bold(), path.display());
    }
    Ok(())
}
