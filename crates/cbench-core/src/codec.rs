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

//! The external codec capability.
//!
//! The trial driver only ever talks to a [`Codec`]. Production runs use
//! [`ProcessCodec`], which spawns the pre-built codec executable; tests
//! substitute an in-process fake.

use crate::algorithm::Algorithm;
use crate::error::{HarnessError, Result};
use crate::layout::{count_path, decoded_output, encoded_output};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Number of stderr lines kept in an [`HarnessError::ExternalProcessFailure`].
const STDERR_TAIL_LINES: usize = 5;

/// Files a successful codec invocation is expected to have produced.
///
/// These are expectations, not guarantees: the driver checks that they
/// exist before trusting them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOutputs {
    /// Encoded or decoded data
    pub payload: PathBuf,
    /// Companion operation-count file
    pub count: PathBuf,
}

/// A codec that can encode and decode files on disk.
///
/// Implementations must be thread-safe: the driver calls them from a
/// worker pool, one trial per call.
pub trait Codec: Send + Sync {
    /// Encode `input` with `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ExternalProcessFailure`] if the codec fails.
    fn encode(&self, input: &Path, algorithm: Algorithm) -> Result<CodecOutputs>;

    /// Decode the encoded artifact `input` with `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ExternalProcessFailure`] if the codec fails.
    fn decode(&self, input: &Path, algorithm: Algorithm) -> Result<CodecOutputs>;

    /// Human-readable name for logs and reports.
    fn name(&self) -> &str;
}

/// Drives an external codec executable.
///
/// Invocation is `<program> -a <algorithm> -i <input>`. The codec picks
/// encode or decode from the input it is given and writes its outputs
/// beside the input.
#[derive(Debug, Clone)]
pub struct ProcessCodec {
    program: PathBuf,
    name: String,
}

impl ProcessCodec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self { program, name }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn invoke(&self, input: &Path, algorithm: Algorithm) -> Result<()> {
        debug!(
            program = %self.program.display(),
            algorithm = algorithm.cli_name(),
            input = %input.display(),
            "invoking codec"
        );
        let output = Command::new(&self.program)
            .arg("-a")
            .arg(algorithm.cli_name())
            .arg("-i")
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| HarnessError::ExternalProcessFailure {
                program: self.program.clone(),
                input: input.to_path_buf(),
                status: "launch failure".to_string(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(HarnessError::ExternalProcessFailure {
            program: self.program.clone(),
            input: input.to_path_buf(),
            status: describe_status(output.status),
            detail: stderr_tail(&output.stderr),
        })
    }
}

impl Codec for ProcessCodec {
    fn encode(&self, input: &Path, algorithm: Algorithm) -> Result<CodecOutputs> {
        self.invoke(input, algorithm)?;
        let payload = encoded_output(input, algorithm);
        let count = count_path(&payload);
        Ok(CodecOutputs { payload, count })
    }

    fn decode(&self, input: &Path, algorithm: Algorithm) -> Result<CodecOutputs> {
        self.invoke(input, algorithm)?;
        let payload = decoded_output(input, algorithm);
        let count = count_path(&payload);
        Ok(CodecOutputs { payload, count })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return "no stderr output".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
