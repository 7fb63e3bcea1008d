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

//! Markdown tables of the aggregate views.
//!
//! Series keyed by size are split into small and big files at
//! [`BIG_FILE_THRESHOLD`]. The by-size view is only tabulated for big files;
//! small sizes are better read from the other two views.

use crate::aggregate::SeriesPoint;
use crate::algorithm::Phase;
use crate::error::{HarnessError, Result};
use crate::report::PhaseViews;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::fs;
use std::path::Path;

/// Files of at least this many bytes are "big".
pub const BIG_FILE_THRESHOLD: u64 = 1024 * 1024;

pub fn is_small(size: u64) -> bool {
    size < BIG_FILE_THRESHOLD
}

/// Render every phase as one markdown document.
pub fn render(views: &[PhaseViews]) -> String {
    let mut md = String::from("# Operation counts\n");

    for phase in views {
        let title = phase_title(phase.phase);
        md.push_str(&format!("\n## {}\n", title));

        for (algorithm, series) in &phase.by_algorithm.groups {
            let name = format!("{}, algorithm {}", title, algorithm);
            size_split(&mut md, &name, series, |charset| format!("charset {}", charset));
        }
        for (charset, series) in &phase.by_charset.groups {
            let name = format!("{}, charset {}", title, charset);
            size_split(&mut md, &name, series, |algorithm| algorithm.to_string());
        }
        for (size, series) in &phase.by_size.groups {
            if is_small(*size) {
                continue;
            }
            let name = format!("{}, file size {} bytes", title, size);
            table(&mut md, &name, "charset", series, |_| true, |a| a.to_string());
        }
    }
    md
}

/// Render and write `tables.md`.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if the file cannot be written.
pub fn write_tables(path: &Path, views: &[PhaseViews]) -> Result<()> {
    fs::write(path, render(views)).map_err(|e| HarnessError::io_error(path, e))
}

fn phase_title(phase: Phase) -> &'static str {
    match phase {
        Phase::Encode => "Encoding",
        Phase::Decode => "Decoding",
    }
}

fn size_split<S, L>(md: &mut String, name: &str, series: &BTreeMap<S, Vec<SeriesPoint>>, label: L)
where
    S: Ord + Display,
    L: Fn(&S) -> String + Copy,
{
    table(md, &format!("{}, small files", name), "size (bytes)", series, is_small, label);
    table(md, &format!("{}, big files", name), "size (bytes)", series, |x| !is_small(x), label);
}

/// One pivot table: a row per `x`, a column per series.
fn table<S, K, L>(
    md: &mut String,
    name: &str,
    x_label: &str,
    series: &BTreeMap<S, Vec<SeriesPoint>>,
    keep: K,
    label: L,
) where
    S: Ord + Display,
    K: Fn(u64) -> bool,
    L: Fn(&S) -> String,
{
    let rows: BTreeSet<u64> = series
        .values()
        .flatten()
        .map(|p| p.x)
        .filter(|&x| keep(x))
        .collect();
    if rows.is_empty() {
        return;
    }

    md.push_str(&format!("\n### {}\n\n", name));
    md.push_str(&format!("| {} |", x_label));
    for key in series.keys() {
        md.push_str(&format!(" {} |", label(key)));
    }
    md.push_str("\n|---|");
    md.push_str(&"---|".repeat(series.len()));
    md.push('\n');

    for x in rows {
        md.push_str(&format!("| {} |", x));
        for points in series.values() {
            match points.iter().find(|p| p.x == x) {
                Some(p) => md.push_str(&format!(" {} |", p.op_count)),
                None => md.push_str(" - |"),
            }
        }
        md.push('\n');
    }
}
