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

//! Structured error types for the benchmark harness.
//!
//! Every trial-level failure is captured as a [`HarnessError`] and kept with
//! the trial that produced it, so one failing grid point never hides the
//! results of the others. Only configuration and output-directory errors
//! abort a run.

use crate::algorithm::{Algorithm, Phase};
use crate::grid::ParameterPoint;
use crate::layout::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// The main error type for harness operations.
///
/// # Cloning
///
/// Implements `Clone` so failures can be copied out of the worker pool into
/// trial outcomes and the final report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    /// Expected corpus file is absent.
    ///
    /// Fatal for every trial of that grid point, never for the run.
    #[error("Corpus file '{path}' is missing ({point})")]
    GenerationGap {
        /// The resolved corpus path
        path: PathBuf,
        /// The grid point it belongs to
        point: ParameterPoint,
    },

    /// The codec exited non-zero or could not be launched.
    #[error("Codec '{program}' failed on '{input}' with {status}: {detail}")]
    ExternalProcessFailure {
        /// The codec executable
        program: PathBuf,
        /// The input passed with `-i`
        input: PathBuf,
        /// Exit status description ("exit code 3", "signal", "launch failure")
        status: String,
        /// Captured stderr tail or the launch error
        detail: String,
    },

    /// An output file the codec should have produced is absent.
    #[error("Codec reported success but {kind} artifact '{path}' does not exist")]
    ArtifactMissing {
        /// The expected path
        path: PathBuf,
        /// What the path should have held
        kind: ArtifactKind,
    },

    /// The count file exists but its first line is not a decimal integer.
    #[error("Malformed operation count in '{path}': {reason}")]
    MalformedCount {
        /// The count file
        path: PathBuf,
        /// Why parsing failed
        reason: String,
    },

    /// Decoded bytes differ from the source bytes.
    #[error(
        "Round-trip mismatch for {point} with {algorithm}: first difference at byte {offset} \
         (source {expected_len} bytes, decoded {actual_len} bytes)"
    )]
    RoundTripMismatch {
        /// The grid point
        point: ParameterPoint,
        /// The algorithm under test
        algorithm: Algorithm,
        /// Offset of the first differing byte
        offset: u64,
        /// Length of the source file
        expected_len: u64,
        /// Length of the decoded artifact
        actual_len: u64,
    },

    /// A triple required by the grid has no trial outcome at all.
    #[error("No {phase} trial data for {point} with {algorithm}")]
    AggregationGap {
        /// The phase being aggregated
        phase: Phase,
        /// The missing grid point
        point: ParameterPoint,
        /// The missing algorithm
        algorithm: Algorithm,
    },

    /// I/O operation failed.
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// Invalid configuration parameter.
    #[error("Invalid configuration parameter '{parameter}': {reason}")]
    InvalidConfig {
        /// Parameter name
        parameter: String,
        /// Reason for invalidity
        reason: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {message}")]
    Json {
        /// The error message
        message: String,
    },
}

impl HarnessError {
    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed count error.
    pub fn malformed_count(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedCount {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The failure category used to group errors in summaries.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GenerationGap { .. } => ErrorCategory::GenerationGap,
            Self::ExternalProcessFailure { .. } => ErrorCategory::ExternalProcessFailure,
            Self::ArtifactMissing { .. } => ErrorCategory::ArtifactMissing,
            Self::MalformedCount { .. } => ErrorCategory::MalformedCount,
            Self::RoundTripMismatch { .. } => ErrorCategory::RoundTripMismatch,
            Self::AggregationGap { .. } => ErrorCategory::AggregationGap,
            Self::Io { .. } => ErrorCategory::Io,
            Self::InvalidConfig { .. } => ErrorCategory::InvalidConfig,
            Self::Json { .. } => ErrorCategory::Json,
        }
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            message: source.to_string(),
        }
    }
}

/// Failure categories reported in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    GenerationGap,
    ExternalProcessFailure,
    ArtifactMissing,
    MalformedCount,
    RoundTripMismatch,
    AggregationGap,
    Io,
    InvalidConfig,
    Json,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GenerationGap => "generation gap",
            Self::ExternalProcessFailure => "external process failure",
            Self::ArtifactMissing => "artifact missing",
            Self::MalformedCount => "malformed count",
            Self::RoundTripMismatch => "round-trip mismatch",
            Self::AggregationGap => "aggregation gap",
            Self::Io => "I/O error",
            Self::InvalidConfig => "invalid configuration",
            Self::Json => "JSON error",
        };
        f.write_str(label)
    }
}
