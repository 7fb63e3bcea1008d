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

//! Temporary corpora and run configurations.

use cbench_core::corpus::{self, DEFAULT_SEED};
use cbench_core::{Grid, RunConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The 2x2x1 grid: a small and a big file in two charsets.
pub fn scenario_grid() -> Grid {
    Grid::new(&[1024, 2 * 1024 * 1024], &[0, 1], &[0]).expect("valid scenario grid")
}

/// A grid small enough for many-trial tests.
pub fn small_grid() -> Grid {
    Grid::new(&[64, 256], &[0, 1, 2], &[0, 1]).expect("valid small grid")
}

/// A generated corpus and an empty output directory under one temp root.
///
/// Both are removed when the workspace is dropped.
pub struct Workspace {
    root: TempDir,
    grid: Grid,
}

impl Workspace {
    /// Generate a corpus for `grid`.
    pub fn new(grid: Grid) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        corpus::generate(&root.path().join("corpus"), &grid, DEFAULT_SEED, false)
            .expect("Failed to generate corpus");
        std::fs::create_dir_all(root.path().join("out")).expect("Failed to create output dir");
        Self { root, grid }
    }

    /// The 2x2x1 scenario workspace.
    pub fn scenario() -> Self {
        Self::new(scenario_grid())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn corpus_dir(&self) -> PathBuf {
        self.root.path().join("corpus")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }

    /// A run configuration with two workers.
    pub fn config(&self, codec: impl Into<PathBuf>) -> RunConfig {
        RunConfig::new(self.corpus_dir(), self.output_dir(), codec).with_pool_size(2)
    }

    /// Corpus path of one point.
    pub fn corpus_file(&self, size: u64, charset: u8, sample: u32) -> PathBuf {
        corpus::resolve(
            &self.corpus_dir(),
            &cbench_core::ParameterPoint::new(size, charset, sample),
        )
    }
}
