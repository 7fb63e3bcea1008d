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

//! In-process codec double.
//!
//! [`FakeCodec`] honours the same file contract as the real codec: outputs
//! are written beside the input, with a companion `.ops` count file. Its
//! "encoding" is a reversible byte transform behind a small header, so a
//! round trip restores the input exactly unless a [`Fault`] says otherwise.

use cbench_core::corpus::{parse_corpus_file_name, CORPUS_EXTENSION};
use cbench_core::layout::{count_path, decoded_output, encoded_output};
use cbench_core::{Algorithm, CancelToken, Codec, CodecOutputs, HarnessError, ParameterPoint, Phase, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const MAGIC: &[u8; 4] = b"FAKE";
const MASK: u8 = 0x5a;

/// Something that goes wrong in a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Exit with a non-zero status and write nothing.
    Exit(i32),
    /// Succeed without writing the payload.
    NoPayload,
    /// Write the payload but no count file.
    NoCount,
    /// Write a count file whose first line is not a number.
    MalformedCount,
    /// Write an empty count file.
    EmptyCount,
    /// Decode with the first byte flipped.
    CorruptDecode,
    /// Decode with the last byte dropped.
    TruncateDecode,
}

/// Which invocations a [`Fault`] applies to. `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultTarget {
    pub phase: Option<Phase>,
    pub algorithm: Option<Algorithm>,
    pub point: Option<ParameterPoint>,
}

impl FaultTarget {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn point(mut self, point: ParameterPoint) -> Self {
        self.point = Some(point);
        self
    }

    fn matches(&self, phase: Phase, algorithm: Algorithm, point: Option<ParameterPoint>) -> bool {
        self.phase.map_or(true, |p| p == phase)
            && self.algorithm.map_or(true, |a| a == algorithm)
            && self.point.map_or(true, |p| Some(p) == point)
    }
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub phase: Phase,
    pub algorithm: Algorithm,
    pub input: PathBuf,
}

/// Deterministic in-process codec.
///
/// The reported operation count of an invocation is
/// `input_len * weight + 1`, with weight 2 for Huffman and 3 for Shannon.
///
/// # Example
///
/// ```
/// use cbench_test::{Fault, FakeCodec, FaultTarget};
/// use cbench_core::Phase;
///
/// let codec = FakeCodec::new().with_fault(FaultTarget::any().phase(Phase::Decode), Fault::Exit(3));
/// assert_eq!(codec.invocation_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct FakeCodec {
    faults: Vec<(FaultTarget, Fault)>,
    invocations: Mutex<Vec<Invocation>>,
    count: AtomicUsize,
    cancel_after: Option<(usize, CancelToken)>,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `fault` to every invocation matching `target`.
    pub fn with_fault(mut self, target: FaultTarget, fault: Fault) -> Self {
        self.faults.push((target, fault));
        self
    }

    /// Cancel `token` once `n` invocations have finished.
    pub fn cancel_after(mut self, n: usize, token: CancelToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn invocation_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Every invocation so far, in completion order.
    pub fn invocations(&self) -> Vec<Invocation> {
        match self.invocations.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The op count the fake reports for an input of `len` bytes.
    pub fn op_count(algorithm: Algorithm, len: u64) -> u64 {
        let weight = match algorithm {
            Algorithm::Huffman => 2,
            Algorithm::Shannon => 3,
        };
        len * weight + 1
    }

    fn fault(&self, phase: Phase, algorithm: Algorithm, input: &Path) -> Option<Fault> {
        let point = point_of(input);
        self.faults
            .iter()
            .find(|(target, _)| target.matches(phase, algorithm, point))
            .map(|(_, fault)| *fault)
    }

    fn record(&self, phase: Phase, algorithm: Algorithm, input: &Path) {
        if let Ok(mut guard) = self.invocations.lock() {
            guard.push(Invocation {
                phase,
                algorithm,
                input: input.to_path_buf(),
            });
        }
        let done = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, token)) = &self.cancel_after {
            if done >= *n {
                token.cancel();
            }
        }
    }

    fn run(&self, phase: Phase, algorithm: Algorithm, input: &Path) -> Result<CodecOutputs> {
        self.record(phase, algorithm, input);
        let payload = match phase {
            Phase::Encode => encoded_output(input, algorithm),
            Phase::Decode => decoded_output(input, algorithm),
        };
        let outputs = CodecOutputs {
            count: count_path(&payload),
            payload,
        };
        let fault = self.fault(phase, algorithm, input);

        if let Some(Fault::Exit(code)) = fault {
            return Err(HarnessError::ExternalProcessFailure {
                program: PathBuf::from("fake-codec"),
                input: input.to_path_buf(),
                status: format!("exit code {}", code),
                detail: "injected failure".to_string(),
            });
        }

        let data = fs::read(input).map_err(|e| HarnessError::io_error(input, e))?;
        let bytes = match phase {
            Phase::Encode => encode_bytes(&data, algorithm),
            Phase::Decode => {
                let mut decoded = decode_bytes(&data, algorithm).ok_or_else(|| {
                    HarnessError::ExternalProcessFailure {
                        program: PathBuf::from("fake-codec"),
                        input: input.to_path_buf(),
                        status: "exit code 2".to_string(),
                        detail: "not an encoded file for this algorithm".to_string(),
                    }
                })?;
                match fault {
                    Some(Fault::CorruptDecode) => {
                        if let Some(first) = decoded.first_mut() {
                            *first ^= 0xff;
                        } else {
                            decoded.push(b'!');
                        }
                    }
                    Some(Fault::TruncateDecode) => {
                        decoded.pop();
                    }
                    _ => {}
                }
                decoded
            }
        };

        if fault != Some(Fault::NoPayload) {
            write(&outputs.payload, &bytes)?;
        }
        match fault {
            Some(Fault::NoCount) => {}
            Some(Fault::MalformedCount) => write(&outputs.count, b"lots\n")?,
            Some(Fault::EmptyCount) => write(&outputs.count, b"")?,
            _ => {
                let ops = Self::op_count(algorithm, data.len() as u64);
                write(&outputs.count, format!("{}\n", ops).as_bytes())?;
            }
        }
        Ok(outputs)
    }
}

impl Codec for FakeCodec {
    fn encode(&self, input: &Path, algorithm: Algorithm) -> Result<CodecOutputs> {
        self.run(Phase::Encode, algorithm, input)
    }

    fn decode(&self, input: &Path, algorithm: Algorithm) -> Result<CodecOutputs> {
        self.run(Phase::Decode, algorithm, input)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| HarnessError::io_error(path, e))
}

/// The grid point of a staged input or an encoded artifact.
fn point_of(input: &Path) -> Option<ParameterPoint> {
    let stem = input.file_stem()?.to_str()?;
    parse_corpus_file_name(&format!("{}.{}", stem, CORPUS_EXTENSION))
}

fn encode_bytes(data: &[u8], algorithm: Algorithm) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + MAGIC.len() + 1);
    out.extend_from_slice(MAGIC);
    out.push(algorithm.tag() as u8);
    out.extend(data.iter().map(|b| b ^ MASK));
    out
}

fn decode_bytes(data: &[u8], algorithm: Algorithm) -> Option<Vec<u8>> {
    let body = data.strip_prefix(MAGIC.as_slice())?;
    let (&tag, body) = body.split_first()?;
    if tag != algorithm.tag() as u8 {
        return None;
    }
    Some(body.iter().map(|b| b ^ MASK).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("size-5_charset-0_sample-0.txt");
        fs::write(&input, b"hello").unwrap();

        let codec = FakeCodec::new();
        let encoded = codec.encode(&input, Algorithm::Shannon).unwrap();
        assert_eq!(encoded.payload, dir.path().join("size-5_charset-0_sample-0.shan"));
        assert_eq!(fs::read_to_string(&encoded.count).unwrap(), "16\n");

        let decoded = codec.decode(&encoded.payload, Algorithm::Shannon).unwrap();
        assert_eq!(decoded.payload, dir.path().join("size-5_charset-0_sample-0-unz-s.txt"));
        assert_eq!(fs::read(&decoded.payload).unwrap(), b"hello");
        assert_eq!(codec.invocation_count(), 2);
    }

    #[test]
    fn test_decode_rejects_other_algorithm() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("size-3_charset-0_sample-0.txt");
        fs::write(&input, b"abc").unwrap();
        let codec = FakeCodec::new();
        let encoded = codec.encode(&input, Algorithm::Huffman).unwrap();
        let renamed = dir.path().join("size-3_charset-0_sample-0.shan");
        fs::copy(&encoded.payload, &renamed).unwrap();
        assert!(codec.decode(&renamed, Algorithm::Shannon).is_err());
    }

    #[test]
    fn test_fault_targeting() {
        let point = ParameterPoint::new(3, 0, 0);
        let target = FaultTarget::any().phase(Phase::Encode).point(point);
        assert!(target.matches(Phase::Encode, Algorithm::Huffman, Some(point)));
        assert!(!target.matches(Phase::Decode, Algorithm::Huffman, Some(point)));
        assert!(!target.matches(Phase::Encode, Algorithm::Huffman, None));
        assert_eq!(
            point_of(Path::new("x/size-3_charset-0_sample-0.haff")),
            Some(point)
        );
    }

    #[test]
    fn test_exit_fault_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("size-3_charset-0_sample-0.txt");
        fs::write(&input, b"abc").unwrap();
        let codec = FakeCodec::new().with_fault(FaultTarget::any(), Fault::Exit(7));
        let err = codec.encode(&input, Algorithm::Huffman).unwrap_err();
        assert!(err.to_string().contains("exit code 7"));
        assert!(!dir.path().join("size-3_charset-0_sample-0.haff").exists());
    }
}
