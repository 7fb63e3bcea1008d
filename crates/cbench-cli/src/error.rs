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

//! Structured error types for the cbench CLI.

use cbench_core::HarnessError;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for CLI operations.
///
/// # Cloning
///
/// Implements `Clone` like [`HarnessError`], which it wraps.
#[derive(Error, Debug, Clone)]
pub enum CliError {
    /// A harness operation failed before producing a report.
    #[error(transparent)]
    Harness(#[from] HarnessError),

    /// The `--grid` file could not be used.
    #[error("Invalid grid file '{path}': {message}")]
    GridFile {
        /// The grid file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The run finished but did not pass.
    #[error(
        "Run failed: {failed} failed trial(s), {cancelled} cancelled, \
         {mismatched} mismatch(es), {aggregation_errors} aggregation error(s). \
         See '{report}'"
    )]
    RunFailed {
        failed: usize,
        cancelled: usize,
        mismatched: usize,
        aggregation_errors: usize,
        /// The written report
        report: PathBuf,
    },

    /// No persisted aggregates were found.
    #[error("No aggregates found in '{0}'; run `cbench run` first")]
    NoAggregates(PathBuf),
}

impl CliError {
    /// Create a grid file error.
    pub fn grid_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::GridFile {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::Harness(HarnessError::from(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_error_is_transparent() {
        let inner = HarnessError::invalid_config("pool-size", "must be at least 1");
        let err = CliError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn test_run_failed_message() {
        let err = CliError::RunFailed {
            failed: 1,
            cancelled: 2,
            mismatched: 0,
            aggregation_errors: 0,
            report: PathBuf::from("out/report.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("1 failed trial(s)"));
        assert!(msg.contains("2 cancelled"));
        assert!(msg.contains("out/report.json"));
    }
}
