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

//! Trial records and the per-trial state machine.
//!
//! A trial is one codec invocation for one `(point, algorithm, phase)`.
//! It moves through
//!
//! ```text
//! Pending -> Invoked -> ArtifactProduced -> CountParsed -> Aggregated
//! ```
//!
//! and may fail from any of these transitions. A failed trial keeps the last
//! stage it reached and is excluded from aggregation.

use crate::algorithm::{Algorithm, Phase};
use crate::corpus::CorpusFile;
use crate::error::{HarnessError, Result};
use crate::grid::ParameterPoint;
use crate::layout::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Progress of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrialStage {
    Pending,
    Invoked,
    ArtifactProduced,
    CountParsed,
    Aggregated,
}

impl TrialStage {
    /// The stage that follows this one on the success path.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Invoked),
            Self::Invoked => Some(Self::ArtifactProduced),
            Self::ArtifactProduced => Some(Self::CountParsed),
            Self::CountParsed => Some(Self::Aggregated),
            Self::Aggregated => None,
        }
    }
}

impl fmt::Display for TrialStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Invoked => "invoked",
            Self::ArtifactProduced => "artifact-produced",
            Self::CountParsed => "count-parsed",
            Self::Aggregated => "aggregated",
        };
        f.write_str(label)
    }
}

/// Identity of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrialKey {
    pub phase: Phase,
    pub point: ParameterPoint,
    pub algorithm: Algorithm,
}

impl TrialKey {
    pub fn new(phase: Phase, point: ParameterPoint, algorithm: Algorithm) -> Self {
        Self {
            phase,
            point,
            algorithm,
        }
    }
}

impl fmt::Display for TrialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.phase, self.algorithm, self.point)
    }
}

/// Result of a successful trial. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialArtifact {
    pub source: CorpusFile,
    pub algorithm: Algorithm,
    pub phase: Phase,
    /// Encoded or decoded data produced by the codec
    pub output_path: PathBuf,
    /// Companion count file
    pub count_path: PathBuf,
    /// First line of the count file
    pub op_count: u64,
    /// Reused from a previous run instead of invoking the codec
    pub cached: bool,
}

/// Terminal state of a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The trial produced its artifact and count.
    Completed(TrialArtifact),
    /// The trial failed after reaching `stage`.
    Failed {
        stage: TrialStage,
        error: HarnessError,
    },
    /// Not scheduled because an upstream trial failed.
    Blocked { reason: String },
    /// Not started because the run was cancelled.
    Cancelled,
}

impl TrialOutcome {
    pub fn artifact(&self) -> Option<&TrialArtifact> {
        match self {
            Self::Completed(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Short status label for reports.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed(a) if a.cached => "cached",
            Self::Completed(_) => "completed",
            Self::Failed { .. } => "failed",
            Self::Blocked { .. } => "blocked",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A trial and how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialRecord {
    pub key: TrialKey,
    pub source: CorpusFile,
    pub outcome: TrialOutcome,
}

/// Read the operation count from the first line of a count file.
///
/// # Errors
///
/// - [`HarnessError::ArtifactMissing`] if the file does not exist
/// - [`HarnessError::MalformedCount`] if it is empty or the first line is
///   not a decimal integer
///
/// A missing or empty file is never read as zero.
pub fn read_op_count(path: &Path, kind: ArtifactKind) -> Result<u64> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(HarnessError::ArtifactMissing {
                path: path.to_path_buf(),
                kind,
            })
        }
        Err(e) => return Err(HarnessError::io_error(path, e)),
    };

    let mut first = String::new();
    BufReader::new(file)
        .read_line(&mut first)
        .map_err(|e| HarnessError::malformed_count(path, e.to_string()))?;

    let line = first.trim();
    if line.is_empty() {
        return Err(HarnessError::malformed_count(path, "first line is empty"));
    }
    if !line.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HarnessError::malformed_count(
            path,
            format!("'{}' is not a decimal integer", line),
        ));
    }
    line.parse::<u64>()
        .map_err(|e| HarnessError::malformed_count(path, format!("'{}': {}", line, e)))
}
