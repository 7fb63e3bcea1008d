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

//! Trial driver: runs the codec over the whole grid.
//!
//! A run has three barriers:
//!
//! 1. **Stage**: copy each corpus file into the trial directory.
//! 2. **Encode**: one trial per point and algorithm.
//! 3. **Decode**: one trial per artifact produced by a successful encode
//!    trial of this run.
//!
//! Trials inside a barrier run concurrently on a bounded rayon pool. Each
//! trial only touches files private to it (see [`crate::layout`]), so
//! execution order inside a barrier does not matter. Failures are captured
//! per trial and never stop the batch.
//!
//! # Caching
//!
//! Unless [`RunConfig::force`] is set, a trial whose payload and count files
//! already exist with a well-formed count is reused without invoking the
//! codec. An interrupted run therefore resumes where it stopped. Artifacts
//! only survive while the staged input still matches the corpus file byte
//! for byte.

use crate::algorithm::{Algorithm, Phase};
use crate::codec::{Codec, CodecOutputs};
use crate::config::RunConfig;
use crate::corpus::CorpusFile;
use crate::error::{HarnessError, Result};
use crate::grid::{Grid, ParameterPoint};
use crate::layout::{ArtifactKind, Role, TrialLayout};
use crate::trial::{read_op_count, TrialArtifact, TrialKey, TrialOutcome, TrialRecord, TrialStage};
use crate::verify::first_difference;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cooperative cancellation flag shared with the driver.
///
/// Trials already running finish; trials not yet started are recorded as
/// [`TrialOutcome::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Every trial record of one run.
#[derive(Debug, Clone)]
pub struct TrialRun {
    /// Encode trials in grid order
    pub encode: Vec<TrialRecord>,
    /// Decode trials in grid order, one per encode trial
    pub decode: Vec<TrialRecord>,
    /// Wall-clock time of the run in milliseconds
    pub elapsed_ms: u128,
}

impl TrialRun {
    pub fn records(&self, phase: Phase) -> &[TrialRecord] {
        match phase {
            Phase::Encode => &self.encode,
            Phase::Decode => &self.decode,
        }
    }

    pub fn all_records(&self) -> impl Iterator<Item = &TrialRecord> {
        self.encode.iter().chain(self.decode.iter())
    }

    pub fn total_trials(&self) -> usize {
        self.encode.len() + self.decode.len()
    }
}

/// Progress tracker for one barrier.
///
/// Uses atomic counters so workers never contend on a lock.
#[derive(Debug)]
struct ProgressTracker {
    phase: &'static str,
    total: usize,
    processed: AtomicUsize,
    failed: AtomicUsize,
    interval: usize,
    verbose: bool,
    start_time: Instant,
}

impl ProgressTracker {
    fn new(phase: &'static str, total: usize, verbose: bool) -> Self {
        Self {
            phase,
            total,
            processed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            interval: (total / 10).max(1),
            verbose,
            start_time: Instant::now(),
        }
    }

    fn record(&self, record: &TrialRecord) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if let TrialOutcome::Failed { stage, error } = &record.outcome {
            self.failed.fetch_add(1, Ordering::Relaxed);
            warn!(trial = %record.key, %stage, "{}", error);
        } else if self.verbose {
            info!(trial = %record.key, status = record.outcome.status(), "trial finished");
        }

        if self.should_report(processed) {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            info!(
                "{}: [{}/{}] {} failed ({:.1} trials/s)",
                self.phase,
                processed,
                self.total,
                self.failed.load(Ordering::Relaxed),
                processed as f64 / elapsed.max(f64::EPSILON)
            );
        }
    }

    fn should_report(&self, processed: usize) -> bool {
        processed % self.interval == 0 || processed == self.total
    }
}

/// Runs encode and decode trials through a [`Codec`].
pub struct TrialDriver<'a> {
    config: &'a RunConfig,
    codec: &'a dyn Codec,
    layout: TrialLayout,
    pool: rayon::ThreadPool,
    cancel: CancelToken,
}

impl<'a> TrialDriver<'a> {
    /// Create a driver with a private pool of `config.pool_size` workers.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] if the pool cannot be built.
    pub fn new(config: &'a RunConfig, codec: &'a dyn Codec) -> Result<Self> {
        if config.pool_size == 0 {
            return Err(HarnessError::invalid_config("pool-size", "must be at least 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.pool_size)
            .thread_name(|i| format!("cbench-worker-{}", i))
            .build()
            .map_err(|e| HarnessError::invalid_config("pool-size", e.to_string()))?;
        Ok(Self {
            config,
            codec,
            layout: config.layout(),
            pool,
            cancel: CancelToken::new(),
        })
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn layout(&self) -> &TrialLayout {
        &self.layout
    }

    /// Run `op` on the driver's pool so its parallel work shares the bound.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }

    /// Run every trial of `grid`.
    ///
    /// # Errors
    ///
    /// Only fails if the trial directory cannot be created; every per-trial
    /// problem is recorded in the returned [`TrialRun`].
    pub fn run(&self, grid: &Grid) -> Result<TrialRun> {
        let start = Instant::now();
        fs::create_dir_all(self.layout.dir())
            .map_err(|e| HarnessError::io_error(self.layout.dir(), e))?;
        info!(
            codec = self.codec.name(),
            points = grid.len(),
            workers = self.config.pool_size,
            "starting trials"
        );

        let sources: Vec<CorpusFile> = grid
            .points()
            .map(|p| CorpusFile::locate(&self.config.corpus_dir, p))
            .collect();
        let staged: Vec<Result<PathBuf>> = self
            .pool
            .install(|| sources.par_iter().map(|s| self.stage(s)).collect());

        let encode_jobs: Vec<(&CorpusFile, &Result<PathBuf>, Algorithm)> = sources
            .iter()
            .zip(staged.iter())
            .flat_map(|(source, staged)| {
                Algorithm::ALL
                    .into_iter()
                    .map(move |algorithm| (source, staged, algorithm))
            })
            .collect();
        let encode = self.execute("encode", &encode_jobs, |(source, staged, algorithm)| {
            let outcome = match staged {
                Ok(input) => self.encode_trial(source, input, *algorithm),
                Err(error) => TrialOutcome::Failed {
                    stage: TrialStage::Pending,
                    error: error.clone(),
                },
            };
            record(Phase::Encode, source, *algorithm, outcome)
        });

        let decode = self.execute("decode", &encode, |upstream| {
            let outcome = match &upstream.outcome {
                TrialOutcome::Completed(artifact) => self.decode_trial(artifact),
                TrialOutcome::Cancelled => TrialOutcome::Cancelled,
                other => TrialOutcome::Blocked {
                    reason: format!("encode trial {}", other.status()),
                },
            };
            record(Phase::Decode, &upstream.source, upstream.key.algorithm, outcome)
        });

        Ok(TrialRun {
            encode,
            decode,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }

    /// Run one barrier on the pool, preserving job order in the output.
    fn execute<J, F>(&self, phase: &'static str, jobs: &[J], run: F) -> Vec<TrialRecord>
    where
        J: Sync,
        F: Fn(&J) -> TrialRecord + Sync,
    {
        let tracker = ProgressTracker::new(phase, jobs.len(), self.config.verbose);
        self.pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let record = run(job);
                    tracker.record(&record);
                    record
                })
                .collect()
        })
    }

    /// Copy a corpus file into the trial directory.
    ///
    /// A staged copy is kept only while its bytes equal the corpus file.
    /// Refreshing it drops every artifact derived from the old copy, so the
    /// cache never serves results of different input.
    fn stage(&self, source: &CorpusFile) -> Result<PathBuf> {
        if !source.path.is_file() {
            return Err(HarnessError::GenerationGap {
                path: source.path.clone(),
                point: source.point,
            });
        }

        let staged = self.layout.staged_input(&source.point);
        let reusable =
            !self.config.force && matches!(first_difference(&source.path, &staged), Ok(None));
        if !reusable {
            self.invalidate(source.point)?;
            fs::copy(&source.path, &staged).map_err(|e| HarnessError::io_error(&staged, e))?;
            debug!(from = %source.path.display(), to = %staged.display(), "staged corpus file");
        }
        Ok(staged)
    }

    /// Remove the artifacts derived from the staged input of `point`.
    fn invalidate(&self, point: ParameterPoint) -> Result<()> {
        for (kind, path) in self.layout.artifacts(point) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(%kind, path = %path.display(), "dropped stale artifact"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(HarnessError::io_error(&path, e)),
            }
        }
        Ok(())
    }

    fn encode_trial(&self, source: &CorpusFile, input: &Path, algorithm: Algorithm) -> TrialOutcome {
        self.trial(source, Phase::Encode, algorithm, || {
            self.codec.encode(input, algorithm)
        })
    }

    fn decode_trial(&self, encoded: &TrialArtifact) -> TrialOutcome {
        // The algorithm comes from the encode trial, never from the file name.
        let algorithm = encoded.algorithm;
        self.trial(&encoded.source, Phase::Decode, algorithm, || {
            self.codec.decode(&encoded.output_path, algorithm)
        })
    }

    fn trial<F>(&self, source: &CorpusFile, phase: Phase, algorithm: Algorithm, invoke: F) -> TrialOutcome
    where
        F: FnOnce() -> Result<CodecOutputs>,
    {
        if self.cancel.is_cancelled() {
            return TrialOutcome::Cancelled;
        }

        let payload_kind = ArtifactKind::new(phase, algorithm, Role::Payload);
        let count_kind = ArtifactKind::new(phase, algorithm, Role::Count);
        let expected = CodecOutputs {
            payload: self.layout.artifact(&source.point, payload_kind),
            count: self.layout.artifact(&source.point, count_kind),
        };

        if !self.config.force {
            if let Some(artifact) = self.cached(source, phase, algorithm, &expected) {
                debug!(trial = %TrialKey::new(phase, source.point, algorithm), "reusing cached artifact");
                return TrialOutcome::Completed(artifact);
            }
        }

        let mut stage = TrialStage::Invoked;
        let outputs = match invoke() {
            Ok(outputs) => outputs,
            Err(error) => return TrialOutcome::Failed { stage, error },
        };

        if outputs.payload != expected.payload || !expected.payload.is_file() {
            return TrialOutcome::Failed {
                stage,
                error: HarnessError::ArtifactMissing {
                    path: expected.payload,
                    kind: payload_kind,
                },
            };
        }
        stage = TrialStage::ArtifactProduced;

        if outputs.count != expected.count {
            return TrialOutcome::Failed {
                stage,
                error: HarnessError::ArtifactMissing {
                    path: expected.count,
                    kind: count_kind,
                },
            };
        }
        match read_op_count(&expected.count, count_kind) {
            Ok(op_count) => TrialOutcome::Completed(TrialArtifact {
                source: source.clone(),
                algorithm,
                phase,
                output_path: expected.payload,
                count_path: expected.count,
                op_count,
                cached: false,
            }),
            Err(error) => TrialOutcome::Failed { stage, error },
        }
    }

    fn cached(
        &self,
        source: &CorpusFile,
        phase: Phase,
        algorithm: Algorithm,
        expected: &CodecOutputs,
    ) -> Option<TrialArtifact> {
        if !expected.payload.is_file() {
            return None;
        }
        let kind = ArtifactKind::new(phase, algorithm, Role::Count);
        let op_count = read_op_count(&expected.count, kind).ok()?;
        Some(TrialArtifact {
            source: source.clone(),
            algorithm,
            phase,
            output_path: expected.payload.clone(),
            count_path: expected.count.clone(),
            op_count,
            cached: true,
        })
    }
}

fn record(phase: Phase, source: &CorpusFile, algorithm: Algorithm, outcome: TrialOutcome) -> TrialRecord {
    TrialRecord {
        key: TrialKey::new(phase, source.point, algorithm),
        source: source.clone(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_progress_tracker_should_report() {
        let tracker = ProgressTracker::new("encode", 100, false);
        assert!(!tracker.should_report(1));
        assert!(!tracker.should_report(9));
        assert!(tracker.should_report(10));
        assert!(tracker.should_report(100));

        let small = ProgressTracker::new("decode", 3, false);
        assert!(small.should_report(1));
    }

    #[test]
    fn test_pool_size_bounds_workers() {
        struct NoCodec;
        impl Codec for NoCodec {
            fn encode(&self, _: &Path, _: Algorithm) -> Result<CodecOutputs> {
                unreachable!()
            }
            fn decode(&self, _: &Path, _: Algorithm) -> Result<CodecOutputs> {
                unreachable!()
            }
            fn name(&self) -> &str {
                "none"
            }
        }
        let config = RunConfig::new("in", "out", "codec").with_pool_size(0);
        assert!(TrialDriver::new(&config, &NoCodec).is_err());

        let config = RunConfig::new("in", "out", "codec").with_pool_size(3);
        let driver = TrialDriver::new(&config, &NoCodec).unwrap();
        assert_eq!(driver.install(rayon::current_num_threads), 3);
    }
}
