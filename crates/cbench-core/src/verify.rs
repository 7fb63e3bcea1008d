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

//! Round-trip verification.
//!
//! For every point and algorithm whose decode trial completed, the decoded
//! artifact is compared byte for byte with the original corpus file.
//! Verification is total: a mismatch is recorded and the next pair is
//! checked.

use crate::algorithm::Algorithm;
use crate::corpus::CorpusFile;
use crate::error::HarnessError;
use crate::trial::{TrialKey, TrialOutcome, TrialRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Read buffer size for comparisons.
const COMPARE_CHUNK: usize = 64 * 1024;

/// Where two files first differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Offset of the first differing byte, or of the end of the shorter file
    pub offset: u64,
    pub expected_len: u64,
    pub actual_len: u64,
}

/// Outcome of comparing one decoded artifact with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub source: CorpusFile,
    pub algorithm: Algorithm,
    pub decoded_path: PathBuf,
    pub matched: bool,
    pub mismatch: Option<Mismatch>,
}

impl VerificationResult {
    /// The mismatch as an error, for reporting.
    pub fn to_error(&self) -> Option<HarnessError> {
        self.mismatch.map(|m| HarnessError::RoundTripMismatch {
            point: self.source.point,
            algorithm: self.algorithm,
            offset: m.offset,
            expected_len: m.expected_len,
            actual_len: m.actual_len,
        })
    }
}

/// All verification results of a run.
#[derive(Debug, Clone, Default)]
pub struct Verification {
    /// One result per completed decode trial, in grid order
    pub results: Vec<VerificationResult>,
    /// Pairs whose decode trial did not complete
    pub unverified: Vec<TrialKey>,
    /// Pairs whose files could not be read for comparison
    pub errors: Vec<(TrialKey, HarnessError)>,
}

impl Verification {
    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.matched).count()
    }

    pub fn mismatch_count(&self) -> usize {
        self.results.iter().filter(|r| !r.matched).count()
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.matched)
    }
}

/// Verify every decode trial.
///
/// Comparisons run on the current rayon pool; the harness installs the
/// driver's pool first so the worker bound holds here too.
pub fn verify(decode_records: &[TrialRecord]) -> Verification {
    enum Checked {
        Result(VerificationResult),
        Unverified(TrialKey),
        Error(TrialKey, HarnessError),
    }

    let checked: Vec<Checked> = decode_records
        .par_iter()
        .map(|record| match &record.outcome {
            TrialOutcome::Completed(artifact) => {
                match verify_pair(&record.source, record.key.algorithm, &artifact.output_path) {
                    Ok(result) => Checked::Result(result),
                    Err(e) => Checked::Error(record.key, e),
                }
            }
            _ => Checked::Unverified(record.key),
        })
        .collect();

    let mut verification = Verification::default();
    for item in checked {
        match item {
            Checked::Result(result) => {
                if let Some(e) = result.to_error() {
                    error!("{}", e);
                }
                verification.results.push(result);
            }
            Checked::Unverified(key) => verification.unverified.push(key),
            Checked::Error(key, e) => {
                error!(trial = %key, "{}", e);
                verification.errors.push((key, e));
            }
        }
    }
    info!(
        matched = verification.matched_count(),
        mismatched = verification.mismatch_count(),
        unverified = verification.unverified.len(),
        "verification finished"
    );
    verification
}

/// Compare one decoded artifact with its source file.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if either file cannot be read.
pub fn verify_pair(
    source: &CorpusFile,
    algorithm: Algorithm,
    decoded: &Path,
) -> Result<VerificationResult, HarnessError> {
    let mismatch = first_difference(&source.path, decoded).map_err(|e| {
        let path = if source.path.is_file() {
            decoded
        } else {
            &source.path
        };
        HarnessError::io_error(path, e)
    })?;
    Ok(VerificationResult {
        source: source.clone(),
        algorithm,
        decoded_path: decoded.to_path_buf(),
        matched: mismatch.is_none(),
        mismatch,
    })
}

/// Find the first byte where two files differ.
///
/// Returns `None` if the files are identical. A file that is a strict prefix
/// of the other differs at the end of the shorter one.
pub fn first_difference(expected: &Path, actual: &Path) -> io::Result<Option<Mismatch>> {
    let expected_len = fs::metadata(expected)?.len();
    let actual_len = fs::metadata(actual)?.len();
    let mut left = BufReader::with_capacity(COMPARE_CHUNK, File::open(expected)?);
    let mut right = BufReader::with_capacity(COMPARE_CHUNK, File::open(actual)?);

    let mut offset = 0u64;
    loop {
        let (consumed, diff) = {
            let a = left.fill_buf()?;
            let b = right.fill_buf()?;
            if a.is_empty() || b.is_empty() {
                break;
            }
            let n = a.len().min(b.len());
            (n, a[..n].iter().zip(&b[..n]).position(|(x, y)| x != y))
        };
        if let Some(i) = diff {
            return Ok(Some(Mismatch {
                offset: offset + i as u64,
                expected_len,
                actual_len,
            }));
        }
        left.consume(consumed);
        right.consume(consumed);
        offset += consumed as u64;
    }

    if expected_len != actual_len {
        return Ok(Some(Mismatch {
            offset,
            expected_len,
            actual_len,
        }));
    }
    Ok(None)
}
