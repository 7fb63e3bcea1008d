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

//! Shared test fixtures for cbench.
//!
//! - [`FakeCodec`]: an in-process [`cbench_core::Codec`] with fault injection
//! - [`Workspace`]: a generated corpus and output directory in a temp dir
//!
//! ```rust
//! use cbench_test::{FakeCodec, Workspace};
//! use cbench_core::{harness, CancelToken};
//!
//! let ws = Workspace::new(cbench_test::fixtures::small_grid());
//! let codec = FakeCodec::new();
//! let report = harness::run(&ws.config("fake"), ws.grid(), &codec, CancelToken::new()).unwrap();
//! assert!(report.is_success(false));
//! ```

pub mod fake;
pub mod fixtures;

pub use fake::{FakeCodec, Fault, FaultTarget, Invocation};
pub use fixtures::{scenario_grid, small_grid, Workspace};
