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

//! Corpus resolution, discovery and generation.
//!
//! Corpus files are named `size-<bytes>_charset-<id>_sample-<n>.txt`; the
//! extensionless form is accepted too. [`resolve`] maps a grid point to the
//! canonical path without touching the filesystem. [`locate`] picks
//! whichever form is on disk; whether either exists is the trial driver's
//! concern.

use crate::error::{HarnessError, Result};
use crate::grid::{Grid, ParameterPoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension appended to corpus file names.
pub const CORPUS_EXTENSION: &str = "txt";

/// Default generator seed.
pub const DEFAULT_SEED: u64 = 0x5eed_c0de;

const LATIN: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ abcdefghijklmnopqrstuvwxyz";
const CYRILLIC: &str = "АаБбВвГгДдЕеЁёЖжЗзИиЙйКкЛлМмНнОоПпРрСсТтУуФфХхЦцЧчШшЩщЪъЫыЬьЭэЮюЯя";
const PUNCTUATION: &str = "+-*/=.,;:?!%@#$&~()[]{}<>\"'";

/// A corpus input on disk, referenced but not owned by the harness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpusFile {
    pub point: ParameterPoint,
    pub path: PathBuf,
}

impl CorpusFile {
    /// Resolve the corpus file for `point` inside `dir`.
    pub fn resolve(dir: &Path, point: ParameterPoint) -> Self {
        Self {
            point,
            path: resolve(dir, &point),
        }
    }

    /// The corpus file for `point` as found in `dir`. See [`locate`].
    pub fn locate(dir: &Path, point: ParameterPoint) -> Self {
        Self {
            point,
            path: locate(dir, &point),
        }
    }

    /// The file name without its `.txt` extension.
    pub fn base_name(&self) -> String {
        base_name(&self.point)
    }
}

/// Base name shared by a corpus file and every artifact derived from it.
pub fn base_name(point: &ParameterPoint) -> String {
    format!(
        "size-{}_charset-{}_sample-{}",
        point.size, point.charset, point.sample
    )
}

/// Corpus file name for a point.
pub fn corpus_file_name(point: &ParameterPoint) -> String {
    format!("{}.{}", base_name(point), CORPUS_EXTENSION)
}

/// Corpus path for a point. Pure: never checks existence.
pub fn resolve(dir: &Path, point: &ParameterPoint) -> PathBuf {
    dir.join(corpus_file_name(point))
}

/// Corpus path for a point as present in `dir`.
///
/// Prefers `<base>.txt` and falls back to the extensionless `<base>`. When
/// neither is a file the canonical path is returned.
pub fn locate(dir: &Path, point: &ParameterPoint) -> PathBuf {
    let canonical = resolve(dir, point);
    if canonical.is_file() {
        return canonical;
    }
    let bare = dir.join(base_name(point));
    if bare.is_file() {
        bare
    } else {
        canonical
    }
}

/// Parse a corpus file name back into its point.
///
/// Accepts names with or without the `.txt` extension and rejects
/// anything else, including derived artifacts such as `.haff` files.
pub fn parse_corpus_file_name(name: &str) -> Option<ParameterPoint> {
    let stem = name
        .strip_suffix(CORPUS_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name);

    let mut parts = stem.split('_');
    let size = parse_field(parts.next()?, "size-")?;
    let charset = parse_field(parts.next()?, "charset-")?;
    let sample = parse_field(parts.next()?, "sample-")?;
    if parts.next().is_some() {
        return None;
    }
    Some(ParameterPoint::new(size, charset, sample))
}

fn parse_field<T: std::str::FromStr>(part: &str, prefix: &str) -> Option<T> {
    let digits = part.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Build a grid from the corpus files present in `dir`.
///
/// The grid is the cross product of every size, charset and sample seen,
/// so a missing combination later surfaces as a generation gap rather than
/// silently shrinking the grid.
pub fn discover_grid(dir: &Path) -> Result<Grid> {
    let entries = fs::read_dir(dir).map_err(|e| HarnessError::io_error(dir, e))?;
    let mut points = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::io_error(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(point) = entry.file_name().to_str().and_then(parse_corpus_file_name) {
            points.push(point);
        }
    }
    if points.is_empty() {
        return Err(HarnessError::invalid_config(
            "corpus-dir",
            format!("no corpus files found in '{}'", dir.display()),
        ));
    }
    debug!(count = points.len(), dir = %dir.display(), "discovered corpus files");
    Grid::covering(&points)
}

/// Character alphabet for a charset id.
///
/// Each set extends the previous one: 0 is Latin letters and space, 1 adds
/// Cyrillic letters, 2 adds punctuation.
pub fn charset_alphabet(charset: u8) -> Option<Vec<char>> {
    let mut chars: Vec<char> = LATIN.chars().collect();
    match charset {
        0 => {}
        1 => chars.extend(CYRILLIC.chars()),
        2 => {
            chars.extend(CYRILLIC.chars());
            chars.extend(PUNCTUATION.chars());
        }
        _ => return None,
    }
    Some(chars)
}

/// Counts from a generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Files written
    pub written: usize,
    /// Existing files of the right size that were kept
    pub kept: usize,
}

/// Generate every corpus file of `grid` into `dir`.
///
/// Contents are a deterministic function of `(seed, point)`. Files that
/// already exist with the expected size are kept unless `overwrite` is set.
pub fn generate(dir: &Path, grid: &Grid, seed: u64, overwrite: bool) -> Result<GenerationSummary> {
    for &charset in grid.charsets() {
        if charset_alphabet(charset).is_none() {
            return Err(HarnessError::invalid_config(
                "charsets",
                format!("unknown charset {} (known: 0, 1, 2)", charset),
            ));
        }
    }
    fs::create_dir_all(dir).map_err(|e| HarnessError::io_error(dir, e))?;

    let points: Vec<ParameterPoint> = grid.points().collect();
    let written: Vec<bool> = points
        .par_iter()
        .map(|point| generate_one(dir, point, seed, overwrite))
        .collect::<Result<_>>()?;

    let summary = GenerationSummary {
        written: written.iter().filter(|w| **w).count(),
        kept: written.iter().filter(|w| !**w).count(),
    };
    info!(
        written = summary.written,
        kept = summary.kept,
        dir = %dir.display(),
        "corpus generated"
    );
    Ok(summary)
}

fn generate_one(dir: &Path, point: &ParameterPoint, seed: u64, overwrite: bool) -> Result<bool> {
    let path = locate(dir, point);
    if !overwrite {
        if let Ok(meta) = fs::metadata(&path) {
            if meta.is_file() && meta.len() == point.size {
                return Ok(false);
            }
        }
    }

    let text = generate_text(point, seed)?;
    let file = fs::File::create(&path).map_err(|e| HarnessError::io_error(&path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| HarnessError::io_error(&path, e))?;
    Ok(true)
}

/// Random text of exactly `point.size` bytes drawn from the point's charset.
///
/// When a multi-byte character would overshoot the size, a single-byte
/// character is drawn instead, so the result is always valid UTF-8.
pub fn generate_text(point: &ParameterPoint, seed: u64) -> Result<String> {
    let alphabet = charset_alphabet(point.charset).ok_or_else(|| {
        HarnessError::invalid_config("charsets", format!("unknown charset {}", point.charset))
    })?;
    let single_byte: Vec<char> = alphabet.iter().copied().filter(|c| c.is_ascii()).collect();

    let size = usize::try_from(point.size)
        .map_err(|_| HarnessError::invalid_config("sizes", "size does not fit in memory"))?;
    let mut rng = StdRng::seed_from_u64(point_seed(seed, point));
    let mut text = String::with_capacity(size);
    while text.len() < size {
        let remaining = size - text.len();
        let mut c = alphabet[rng.gen_range(0..alphabet.len())];
        if c.len_utf8() > remaining {
            c = single_byte[rng.gen_range(0..single_byte.len())];
        }
        text.push(c);
    }
    Ok(text)
}

fn point_seed(seed: u64, point: &ParameterPoint) -> u64 {
    seed.wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ point.size.rotate_left(21)
        ^ (u64::from(point.charset) << 48)
        ^ u64::from(point.sample).rotate_left(7)
}
