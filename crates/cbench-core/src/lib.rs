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

//! Codec round-trip benchmark harness.
//!
//! Drives an external Huffman / Shannon-Fano codec over a grid of corpus
//! files, checks that every decoded file matches its source byte for byte,
//! and folds the codec's self-reported operation counts into cross-tab views.
//!
//! ## Pipeline
//!
//! ```text
//! Grid -> corpus -> driver (stage | encode | decode) -> verify + aggregate -> report
//! ```
//!
//! - [`grid`]: the `size x charset x sample` parameter space
//! - [`corpus`]: corpus naming, discovery and generation
//! - [`layout`]: where every trial artifact lives
//! - [`codec`]: the [`Codec`] capability and the subprocess implementation
//! - [`driver`]: concurrent trial execution with a bounded pool
//! - [`verify`]: byte-for-byte round-trip checks
//! - [`aggregate`]: the three cross-tab views per phase
//! - [`report`], [`tables`]: persisted JSON and markdown output
//!
//! ## Usage
//!
//! ```no_run
//! use cbench_core::{harness, CancelToken, Grid, ProcessCodec, RunConfig};
//!
//! let config = RunConfig::new("inputs", "results", "./myprog");
//! let grid = Grid::new(&[1024, 2097152], &[0, 1], &[0]).unwrap();
//! let codec = ProcessCodec::new(&config.codec_path);
//!
//! let report = harness::run(&config, &grid, &codec, CancelToken::new()).unwrap();
//! println!("{} trials, {} mismatches", report.summary.trials, report.summary.mismatched);
//! ```

pub mod aggregate;
pub mod algorithm;
pub mod codec;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod error;
pub mod grid;
pub mod harness;
pub mod layout;
pub mod report;
pub mod tables;
pub mod trial;
pub mod verify;

pub use aggregate::{aggregate, AggregateView, PhaseAggregate, SeriesPoint};
pub use algorithm::{Algorithm, Phase};
pub use codec::{Codec, CodecOutputs, ProcessCodec};
pub use config::RunConfig;
pub use corpus::CorpusFile;
pub use driver::{CancelToken, TrialDriver, TrialRun};
pub use error::{ErrorCategory, HarnessError, Result};
pub use grid::{Grid, GridConfig, ParameterPoint};
pub use layout::{ArtifactKind, Role, TrialLayout};
pub use report::RunReport;
pub use trial::{TrialArtifact, TrialKey, TrialOutcome, TrialRecord, TrialStage};
pub use verify::{verify, Verification, VerificationResult};
