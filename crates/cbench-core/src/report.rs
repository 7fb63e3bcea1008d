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

//! Run report and persisted aggregates.
//!
//! A run writes, under its output directory:
//!
//! - `aggregates/<phase>_by_algorithm.json`, `<phase>_by_charset.json` and
//!   `<phase>_by_size.json`;
//! - `report.json` with every trial outcome, the verification results, the
//!   summary and any aggregation errors.

use crate::aggregate::{AggregateView, Dimension, PhaseAggregate};
use crate::algorithm::{Algorithm, Phase};
use crate::error::{ErrorCategory, HarnessError, Result};
use crate::grid::GridConfig;
use crate::layout::{ArtifactKind, Role, TrialLayout};
use crate::trial::{TrialKey, TrialRecord, TrialStage};
use crate::verify::{Verification, VerificationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One trial as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialEntry {
    pub key: TrialKey,
    pub source: PathBuf,
    /// `completed`, `cached`, `failed`, `blocked` or `cancelled`
    pub status: String,
    /// Last stage reached; `aggregated` once the count is in the views
    pub stage: Option<TrialStage>,
    pub op_count: Option<u64>,
    pub output_path: Option<PathBuf>,
    pub category: Option<ErrorCategory>,
    pub error: Option<String>,
    /// Why the trial was not scheduled
    pub reason: Option<String>,
    /// Command line reproducing this trial
    pub rerun: String,
}

/// A failure of one category, with what to re-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub trial: String,
    pub error: String,
    pub rerun: String,
}

/// An aggregation that could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationFailure {
    pub phase: Phase,
    pub category: ErrorCategory,
    pub error: String,
}

/// A verification that could not read its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub key: TrialKey,
    pub error: String,
}

/// Counters printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub points: usize,
    pub trials: usize,
    pub completed: usize,
    pub cached: usize,
    pub failed: usize,
    pub blocked: usize,
    pub cancelled: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub unverified: usize,
    pub verification_errors: usize,
    pub aggregation_errors: usize,
    pub elapsed_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub codec: String,
    pub grid: GridConfig,
    pub summary: RunSummary,
    pub trials: Vec<TrialEntry>,
    pub verification: Vec<VerificationResult>,
    pub verification_errors: Vec<VerificationFailure>,
    pub aggregates: Vec<PhaseAggregate>,
    pub aggregation_errors: Vec<AggregationFailure>,
    /// Failures grouped by category, each with its re-run command
    pub failures: BTreeMap<ErrorCategory, Vec<FailureDetail>>,
}

impl RunReport {
    /// Assemble the report of a finished run.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        codec: &Path,
        layout: &TrialLayout,
        grid: GridConfig,
        records: &[&TrialRecord],
        verification: &Verification,
        aggregates: Vec<PhaseAggregate>,
        aggregation_errors: Vec<(Phase, HarnessError)>,
        elapsed_ms: u128,
    ) -> Self {
        let trials: Vec<TrialEntry> = records
            .iter()
            .map(|r| entry(codec, layout, r, &aggregates))
            .collect();

        let mut failures: BTreeMap<ErrorCategory, Vec<FailureDetail>> = BTreeMap::new();
        for t in &trials {
            if let (Some(category), Some(error)) = (t.category, &t.error) {
                failures.entry(category).or_default().push(FailureDetail {
                    trial: t.key.to_string(),
                    error: error.clone(),
                    rerun: t.rerun.clone(),
                });
            }
        }
        for result in verification.mismatches() {
            if let Some(error) = result.to_error() {
                let key = TrialKey::new(Phase::Decode, result.source.point, result.algorithm);
                failures
                    .entry(ErrorCategory::RoundTripMismatch)
                    .or_default()
                    .push(FailureDetail {
                        trial: key.to_string(),
                        error: error.to_string(),
                        rerun: rerun_command(codec, layout, &key),
                    });
            }
        }

        let aggregation_errors: Vec<AggregationFailure> = aggregation_errors
            .into_iter()
            .map(|(phase, e)| AggregationFailure {
                phase,
                category: e.category(),
                error: e.to_string(),
            })
            .collect();
        for e in &aggregation_errors {
            failures.entry(e.category).or_default().push(FailureDetail {
                trial: format!("{} aggregation", e.phase),
                error: e.error.clone(),
                rerun: String::new(),
            });
        }

        let count = |status: &str| trials.iter().filter(|t| t.status == status).count();
        let summary = RunSummary {
            points: grid_points(&grid),
            trials: trials.len(),
            completed: count("completed") + count("cached"),
            cached: count("cached"),
            failed: count("failed"),
            blocked: count("blocked"),
            cancelled: count("cancelled"),
            matched: verification.matched_count(),
            mismatched: verification.mismatch_count(),
            unverified: verification.unverified.len(),
            verification_errors: verification.errors.len(),
            aggregation_errors: aggregation_errors.len(),
            elapsed_ms: u64::try_from(elapsed_ms).unwrap_or(u64::MAX),
        };

        Self {
            codec: codec.display().to_string(),
            grid,
            summary,
            trials,
            verification: verification.results.clone(),
            verification_errors: verification
                .errors
                .iter()
                .map(|(key, e)| VerificationFailure {
                    key: *key,
                    error: e.to_string(),
                })
                .collect(),
            aggregates,
            aggregation_errors,
            failures,
        }
    }

    /// Whether the run should exit zero.
    ///
    /// Missing corpus files are tolerated when `allow_missing_corpus` is set;
    /// every other failure, mismatch or aggregation error is not. A
    /// cancelled run is incomplete and never succeeds.
    pub fn is_success(&self, allow_missing_corpus: bool) -> bool {
        let trial_failures = self
            .trials
            .iter()
            .filter(|t| t.status == "failed")
            .filter(|t| !(allow_missing_corpus && t.category == Some(ErrorCategory::GenerationGap)))
            .count();
        trial_failures == 0
            && self.summary.cancelled == 0
            && self.summary.mismatched == 0
            && self.summary.verification_errors == 0
            && self.aggregation_errors.is_empty()
    }

    pub fn aggregate(&self, phase: Phase) -> Option<&PhaseAggregate> {
        self.aggregates.iter().find(|a| a.phase == phase)
    }
}

fn grid_points(grid: &GridConfig) -> usize {
    grid.sizes.len() * grid.charsets.len() * grid.samples.len()
}

fn entry(codec: &Path, layout: &TrialLayout, record: &TrialRecord, aggregates: &[PhaseAggregate]) -> TrialEntry {
    use crate::trial::TrialOutcome;

    let key = record.key;
    let mut entry = TrialEntry {
        key,
        source: record.source.path.clone(),
        status: record.outcome.status().to_string(),
        stage: None,
        op_count: None,
        output_path: None,
        category: None,
        error: None,
        reason: None,
        rerun: rerun_command(codec, layout, &key),
    };
    match &record.outcome {
        TrialOutcome::Completed(artifact) => {
            let aggregated = aggregates.iter().any(|a| {
                a.phase == key.phase
                    && a.includes(key.point.size, key.point.charset, key.algorithm)
            });
            entry.stage = Some(if aggregated {
                TrialStage::Aggregated
            } else {
                TrialStage::CountParsed
            });
            entry.op_count = Some(artifact.op_count);
            entry.output_path = Some(artifact.output_path.clone());
        }
        TrialOutcome::Failed { stage, error } => {
            entry.stage = Some(*stage);
            entry.category = Some(error.category());
            entry.error = Some(error.to_string());
        }
        TrialOutcome::Blocked { reason } => entry.reason = Some(reason.clone()),
        TrialOutcome::Cancelled => {}
    }
    entry
}

/// The codec command line that reproduces one trial.
pub fn rerun_command(codec: &Path, layout: &TrialLayout, key: &TrialKey) -> String {
    let input = match key.phase {
        Phase::Encode => layout.staged_input(&key.point),
        Phase::Decode => layout.artifact(
            &key.point,
            ArtifactKind::new(Phase::Encode, key.algorithm, Role::Payload),
        ),
    };
    format!(
        "{} -a {} -i {}",
        codec.display(),
        key.algorithm.cli_name(),
        input.display()
    )
}

/// The three views of one phase as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseViews {
    pub phase: Phase,
    pub by_algorithm: AggregateView<Algorithm, u8>,
    pub by_charset: AggregateView<u8, Algorithm>,
    pub by_size: AggregateView<u64, Algorithm>,
}

impl From<&PhaseAggregate> for PhaseViews {
    fn from(aggregate: &PhaseAggregate) -> Self {
        Self {
            phase: aggregate.phase,
            by_algorithm: aggregate.by_algorithm.clone(),
            by_charset: aggregate.by_charset.clone(),
            by_size: aggregate.by_size.clone(),
        }
    }
}

/// Path of one persisted view.
pub fn aggregate_file(dir: &Path, phase: Phase, key: Dimension) -> PathBuf {
    let key = match key {
        Dimension::Algorithm => "algorithm",
        Dimension::Charset => "charset",
        Dimension::Size => "size",
    };
    dir.join(format!("{}_by_{}.json", phase, key))
}

/// Write the three views of a phase as pretty JSON.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] or [`HarnessError::Json`] on failure.
pub fn write_aggregates(dir: &Path, aggregate: &PhaseAggregate) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| HarnessError::io_error(dir, e))?;
    let phase = aggregate.phase;
    let written = vec![
        write_json(&aggregate_file(dir, phase, Dimension::Algorithm), &aggregate.by_algorithm)?,
        write_json(&aggregate_file(dir, phase, Dimension::Charset), &aggregate.by_charset)?,
        write_json(&aggregate_file(dir, phase, Dimension::Size), &aggregate.by_size)?,
    ];
    Ok(written)
}

/// Load the persisted views of a phase.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if a view file cannot be read and
/// [`HarnessError::Json`] if it does not parse.
pub fn load_views(dir: &Path, phase: Phase) -> Result<PhaseViews> {
    Ok(PhaseViews {
        phase,
        by_algorithm: read_json(&aggregate_file(dir, phase, Dimension::Algorithm))?,
        by_charset: read_json(&aggregate_file(dir, phase, Dimension::Charset))?,
        by_size: read_json(&aggregate_file(dir, phase, Dimension::Size))?,
    })
}

/// Export the run report as pretty JSON.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] or [`HarnessError::Json`] on failure.
pub fn export_json(report: &RunReport, path: &Path) -> Result<()> {
    write_json(path, report).map(|_| ())
}

/// Load a report written by [`export_json`].
pub fn load_report(path: &Path) -> Result<RunReport> {
    read_json(path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| HarnessError::io_error(path, e))?;
    Ok(path.to_path_buf())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| HarnessError::io_error(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{project, FactKey, FactTable};
    use crate::grid::ParameterPoint;
    use tempfile::tempdir;

    fn sample_aggregate(phase: Phase) -> PhaseAggregate {
        let mut facts = FactTable::new();
        for (size, charset, algorithm, ops) in [
            (1024, 0, Algorithm::Huffman, 10),
            (1024, 1, Algorithm::Shannon, 12),
            (2097152, 0, Algorithm::Huffman, 900),
        ] {
            facts.insert(
                FactKey {
                    size,
                    charset,
                    algorithm,
                },
                ops,
            );
        }
        project(phase, &facts, Vec::new(), 1)
    }

    #[test]
    fn test_aggregate_file_names() {
        let dir = Path::new("out/aggregates");
        assert_eq!(
            aggregate_file(dir, Phase::Encode, Dimension::Algorithm),
            dir.join("encode_by_algorithm.json")
        );
        assert_eq!(
            aggregate_file(dir, Phase::Decode, Dimension::Size),
            dir.join("decode_by_size.json")
        );
    }

    #[test]
    fn test_write_and_load_views() {
        let dir = tempdir().unwrap();
        let aggregate = sample_aggregate(Phase::Decode);
        let written = write_aggregates(dir.path(), &aggregate).unwrap();
        assert_eq!(written.len(), 3);
        assert!(written.iter().all(|p| p.is_file()));

        let views = load_views(dir.path(), Phase::Decode).unwrap();
        assert_eq!(views, PhaseViews::from(&aggregate));
    }

    #[test]
    fn test_persisted_views_are_stable() {
        let dir = tempdir().unwrap();
        let aggregate = sample_aggregate(Phase::Encode);
        let path = aggregate_file(dir.path(), Phase::Encode, Dimension::Size);

        write_aggregates(dir.path(), &aggregate).unwrap();
        let first = fs::read(&path).unwrap();
        write_aggregates(dir.path(), &aggregate).unwrap();
        assert_eq!(first, fs::read(&path).unwrap());
    }

    #[test]
    fn test_load_views_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_views(dir.path(), Phase::Encode),
            Err(HarnessError::Io { .. })
        ));
    }

    #[test]
    fn test_rerun_command() {
        let layout = TrialLayout::new(Path::new("out"));
        let point = ParameterPoint::new(1024, 1, 0);
        let encode = TrialKey::new(Phase::Encode, point, Algorithm::Shannon);
        assert_eq!(
            rerun_command(Path::new("./myprog"), &layout, &encode),
            "./myprog -a shennon -i out/trials/size-1024_charset-1_sample-0.txt"
        );
        let decode = TrialKey::new(Phase::Decode, point, Algorithm::Huffman);
        assert_eq!(
            rerun_command(Path::new("./myprog"), &layout, &decode),
            "./myprog -a huffman -i out/trials/size-1024_charset-1_sample-0.haff"
        );
    }

    #[test]
    fn test_empty_run_is_success() {
        let layout = TrialLayout::new(Path::new("out"));
        let report = RunReport::build(
            Path::new("codec"),
            &layout,
            GridConfig::default(),
            &[],
            &Verification::default(),
            vec![sample_aggregate(Phase::Encode)],
            Vec::new(),
            0,
        );
        assert!(report.is_success(false));
        assert_eq!(report.summary.points, 27);
        assert!(report.aggregate(Phase::Encode).is_some());
        assert!(report.aggregate(Phase::Decode).is_none());
    }

    #[test]
    fn test_aggregation_error_fails_run() {
        let layout = TrialLayout::new(Path::new("out"));
        let gap = HarnessError::AggregationGap {
            phase: Phase::Encode,
            point: ParameterPoint::new(1, 0, 0),
            algorithm: Algorithm::Huffman,
        };
        let report = RunReport::build(
            Path::new("codec"),
            &layout,
            GridConfig::default(),
            &[],
            &Verification::default(),
            Vec::new(),
            vec![(Phase::Encode, gap)],
            0,
        );
        assert!(!report.is_success(true));
        assert_eq!(report.summary.aggregation_errors, 1);
        assert_eq!(report.failures[&ErrorCategory::AggregationGap].len(), 1);
    }
}
