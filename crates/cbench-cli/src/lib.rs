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

//! cbench CLI library.
//!
//! # Commands
//!
//! - **run**: drive the codec over the grid, verify round trips and
//!   aggregate operation counts
//! - **tables**: re-render `tables.md` from a previous run's aggregates
//! - **generate**: write a reproducible corpus
//! - **grid**: list grid points and their corpus files
//!
//! # Examples
//!
//! ```bash
//! cbench generate --corpus-dir inputs --sizes 1024,2097152 --charsets 0,1 --samples 0
//! cbench run --corpus-dir inputs --codec ./build-myprog/myprog --output-dir results --discover
//! cbench tables --output-dir results --print
//! ```

pub mod cli;
pub mod commands;
pub mod error;

pub use error::CliError;
