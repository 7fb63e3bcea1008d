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

//! Run configuration.
//!
//! A single [`RunConfig`] is threaded through every component; nothing reads
//! ambient state such as the working directory.

use crate::error::{HarnessError, Result};
use crate::layout::TrialLayout;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default worker-pool size.
pub const POOL_SIZE_ENV: &str = "CBENCH_POOL_SIZE";

/// Upper bound of the default pool size.
///
/// Each worker spawns a codec process, so the default stays small.
pub const MAX_DEFAULT_POOL_SIZE: usize = 4;

/// Subdirectory of the output directory holding aggregate JSON files.
pub const AGGREGATES_DIR: &str = "aggregates";

/// File name of the full run report.
pub const REPORT_FILE: &str = "report.json";

/// File name of the rendered text tables.
pub const TABLES_FILE: &str = "tables.md";

/// Default worker-pool size.
///
/// Reads `CBENCH_POOL_SIZE`, falling back to the number of available cores
/// capped at [`MAX_DEFAULT_POOL_SIZE`].
pub fn default_pool_size() -> usize {
    std::env::var(POOL_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_DEFAULT_POOL_SIZE)
        })
}

/// Configuration of one harness run.
///
/// # Example
///
/// ```no_run
/// use cbench_core::config::RunConfig;
///
/// let config = RunConfig::new("inputs", "results", "./build-myprog/myprog")
///     .with_pool_size(2)
///     .with_force(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Directory holding the corpus files
    pub corpus_dir: PathBuf,
    /// Directory for trial artifacts and aggregate results
    pub output_dir: PathBuf,
    /// External codec executable
    pub codec_path: PathBuf,
    /// Number of concurrent codec invocations
    pub pool_size: usize,
    /// Re-run trials even when well-formed artifacts already exist
    pub force: bool,
    /// Missing corpus files do not fail the run
    pub allow_missing_corpus: bool,
    /// Report every trial as it finishes
    pub verbose: bool,
}

impl RunConfig {
    pub fn new(
        corpus_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        codec_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            output_dir: output_dir.into(),
            codec_path: codec_path.into(),
            pool_size: default_pool_size(),
            force: false,
            allow_missing_corpus: false,
            verbose: false,
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_allow_missing_corpus(mut self, allow: bool) -> Self {
        self.allow_missing_corpus = allow;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the configuration before any trial runs.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] if the pool size is zero, the
    /// corpus directory is not a directory, or the output directory is the
    /// corpus directory.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(HarnessError::invalid_config(
                "pool-size",
                "must be at least 1",
            ));
        }
        if !self.corpus_dir.is_dir() {
            return Err(HarnessError::invalid_config(
                "corpus-dir",
                format!("'{}' is not a directory", self.corpus_dir.display()),
            ));
        }
        if self.corpus_dir == self.output_dir {
            return Err(HarnessError::invalid_config(
                "output-dir",
                "must differ from the corpus directory",
            ));
        }
        Ok(())
    }

    /// Layout of the trial directory.
    pub fn layout(&self) -> TrialLayout {
        TrialLayout::new(&self.output_dir)
    }

    pub fn aggregates_dir(&self) -> PathBuf {
        aggregates_dir(&self.output_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    pub fn tables_path(&self) -> PathBuf {
        self.output_dir.join(TABLES_FILE)
    }
}

/// Aggregate directory for an output directory.
pub fn aggregates_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(AGGREGATES_DIR)
}
