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

//! Metrics aggregation.
//!
//! The trials of one phase are folded into a single fact table
//! `(size, charset, algorithm) -> op_count`, and three cross-tab views are
//! projected from it:
//!
//! | view | key | series | x |
//! |---|---|---|---|
//! | by-algorithm | algorithm | charset | size |
//! | by-charset | charset | algorithm | size |
//! | by-size | size | algorithm | charset |
//!
//! Every view is built from the same facts, so the three always agree.
//! When the grid has several samples, a fact is the sum of the samples'
//! counts.
//!
//! A triple is handled in one of three ways:
//!
//! - every sample completed: it becomes a fact;
//! - any sample failed, was blocked or was cancelled: it is listed in
//!   [`PhaseAggregate::excluded`];
//! - any sample has no outcome at all: [`HarnessError::AggregationGap`]
//!   aborts the phase, because a partial cross-tab would mislead.

use crate::algorithm::{Algorithm, Phase};
use crate::error::{HarnessError, Result};
use crate::grid::{Grid, ParameterPoint};
use crate::trial::{TrialKey, TrialOutcome, TrialRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A grid dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Algorithm,
    Charset,
    Size,
}

/// One `(x, op_count)` pair of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: u64,
    pub op_count: u64,
}

/// A cross-tab: `key -> series -> [(x, op_count)]`, each series sorted by `x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateView<K, S>
where
    K: Ord,
    S: Ord,
{
    pub phase: Phase,
    pub key: Dimension,
    pub series: Dimension,
    pub x: Dimension,
    pub groups: BTreeMap<K, BTreeMap<S, Vec<SeriesPoint>>>,
}

impl<K: Ord, S: Ord> AggregateView<K, S> {
    fn new(phase: Phase, key: Dimension, series: Dimension, x: Dimension) -> Self {
        Self {
            phase,
            key,
            series,
            x,
            groups: BTreeMap::new(),
        }
    }

    fn insert(&mut self, key: K, series: S, x: u64, op_count: u64) {
        self.groups
            .entry(key)
            .or_default()
            .entry(series)
            .or_default()
            .push(SeriesPoint { x, op_count });
    }

    fn finish(mut self) -> Self {
        for series in self.groups.values_mut() {
            for points in series.values_mut() {
                points.sort_by_key(|p| p.x);
            }
        }
        self
    }

    /// Number of `(x, op_count)` entries under `key`.
    pub fn entries_under(&self, key: &K) -> usize {
        self.groups
            .get(key)
            .map(|series| series.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Total number of `(x, op_count)` entries.
    pub fn entry_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|series| series.values())
            .map(Vec::len)
            .sum()
    }

    /// Flatten into `(key, series, x, op_count)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (&K, &S, SeriesPoint)> {
        self.groups.iter().flat_map(|(key, series)| {
            series
                .iter()
                .flat_map(move |(s, points)| points.iter().map(move |p| (key, s, *p)))
        })
    }
}

/// Identity of one fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactKey {
    pub size: u64,
    pub charset: u8,
    pub algorithm: Algorithm,
}

/// The fact table all views are projected from.
pub type FactTable = BTreeMap<FactKey, u64>;

/// A triple left out of the views because one of its trials did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub size: u64,
    pub charset: u8,
    pub algorithm: Algorithm,
    /// Sample whose trial did not complete
    pub sample: u32,
    /// Trial status and error
    pub reason: String,
}

/// The three views of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAggregate {
    pub phase: Phase,
    pub by_algorithm: AggregateView<Algorithm, u8>,
    pub by_charset: AggregateView<u8, Algorithm>,
    pub by_size: AggregateView<u64, Algorithm>,
    pub excluded: Vec<Exclusion>,
    /// Number of trials folded into the facts
    pub aggregated_trials: usize,
}

impl PhaseAggregate {
    /// Whether a triple made it into the views.
    pub fn includes(&self, size: u64, charset: u8, algorithm: Algorithm) -> bool {
        self.by_size
            .groups
            .get(&size)
            .and_then(|series| series.get(&algorithm))
            .is_some_and(|points| points.iter().any(|p| p.x == u64::from(charset)))
    }

    /// Rebuild the fact table from the by-algorithm view.
    pub fn facts_from_by_algorithm(&self) -> FactTable {
        self.by_algorithm
            .rows()
            .map(|(&algorithm, &charset, p)| {
                (
                    FactKey {
                        size: p.x,
                        charset,
                        algorithm,
                    },
                    p.op_count,
                )
            })
            .collect()
    }

    /// Rebuild the fact table from the by-charset view.
    pub fn facts_from_by_charset(&self) -> FactTable {
        self.by_charset
            .rows()
            .map(|(&charset, &algorithm, p)| {
                (
                    FactKey {
                        size: p.x,
                        charset,
                        algorithm,
                    },
                    p.op_count,
                )
            })
            .collect()
    }

    /// Rebuild the fact table from the by-size view.
    pub fn facts_from_by_size(&self) -> FactTable {
        self.by_size
            .rows()
            .map(|(&size, &algorithm, p)| {
                (
                    FactKey {
                        size,
                        charset: p.x as u8,
                        algorithm,
                    },
                    p.op_count,
                )
            })
            .collect()
    }
}

/// Aggregate the trials of `phase` over `grid`.
///
/// Records of other phases are ignored.
///
/// # Errors
///
/// - [`HarnessError::AggregationGap`] if a grid triple has a sample with no
///   trial record
/// - [`HarnessError::InvalidConfig`] if a summed count overflows `u64`
pub fn aggregate(grid: &Grid, phase: Phase, records: &[TrialRecord]) -> Result<PhaseAggregate> {
    let index: HashMap<TrialKey, &TrialOutcome> = records
        .iter()
        .filter(|r| r.key.phase == phase)
        .map(|r| (r.key, &r.outcome))
        .collect();

    let mut facts = FactTable::new();
    let mut excluded = Vec::new();

    for (size, charset) in grid.cells() {
        for algorithm in Algorithm::ALL {
            let mut total = 0u64;
            let mut exclusion = None;
            for &sample in grid.samples() {
                let point = ParameterPoint::new(size, charset, sample);
                let outcome = index
                    .get(&TrialKey::new(phase, point, algorithm))
                    .ok_or(HarnessError::AggregationGap {
                        phase,
                        point,
                        algorithm,
                    })?;
                match outcome {
                    TrialOutcome::Completed(artifact) => {
                        total = total.checked_add(artifact.op_count).ok_or_else(|| {
                            HarnessError::invalid_config(
                                "op-count",
                                format!("sum of counts for {} overflows", point),
                            )
                        })?;
                    }
                    other if exclusion.is_none() => {
                        exclusion = Some(Exclusion {
                            size,
                            charset,
                            algorithm,
                            sample,
                            reason: describe(other),
                        });
                    }
                    _ => {}
                }
            }
            match exclusion {
                Some(e) => excluded.push(e),
                None => {
                    facts.insert(
                        FactKey {
                            size,
                            charset,
                            algorithm,
                        },
                        total,
                    );
                }
            }
        }
    }

    debug!(%phase, facts = facts.len(), excluded = excluded.len(), "aggregated");
    Ok(project(phase, &facts, excluded, grid.samples().len()))
}

fn describe(outcome: &TrialOutcome) -> String {
    match outcome {
        TrialOutcome::Failed { stage, error } => {
            format!("failed after {}: {}", stage, error)
        }
        TrialOutcome::Blocked { reason } => format!("blocked: {}", reason),
        other => other.status().to_string(),
    }
}

/// Project a fact table into the three views.
pub fn project(
    phase: Phase,
    facts: &FactTable,
    excluded: Vec<Exclusion>,
    samples: usize,
) -> PhaseAggregate {
    let mut by_algorithm = AggregateView::new(phase, Dimension::Algorithm, Dimension::Charset, Dimension::Size);
    let mut by_charset = AggregateView::new(phase, Dimension::Charset, Dimension::Algorithm, Dimension::Size);
    let mut by_size = AggregateView::new(phase, Dimension::Size, Dimension::Algorithm, Dimension::Charset);

    for (fact, &op_count) in facts {
        by_algorithm.insert(fact.algorithm, fact.charset, fact.size, op_count);
        by_charset.insert(fact.charset, fact.algorithm, fact.size, op_count);
        by_size.insert(fact.size, fact.algorithm, u64::from(fact.charset), op_count);
    }

    PhaseAggregate {
        phase,
        by_algorithm: by_algorithm.finish(),
        by_charset: by_charset.finish(),
        by_size: by_size.finish(),
        excluded,
        aggregated_trials: facts.len() * samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusFile;
    use crate::error::HarnessError;
    use crate::trial::{TrialArtifact, TrialStage};
    use std::path::{Path, PathBuf};

    fn completed(phase: Phase, point: ParameterPoint, algorithm: Algorithm, op_count: u64) -> TrialRecord {
        let source = CorpusFile::resolve(Path::new("corpus"), point);
        TrialRecord {
            key: TrialKey::new(phase, point, algorithm),
            source: source.clone(),
            outcome: TrialOutcome::Completed(TrialArtifact {
                source,
                algorithm,
                phase,
                output_path: PathBuf::from("out"),
                count_path: PathBuf::from("out.ops"),
                op_count,
                cached: false,
            }),
        }
    }

    fn ops(point: &ParameterPoint, algorithm: Algorithm) -> u64 {
        point.size * 10 + u64::from(point.charset) * 3 + point.sample as u64 + algorithm as u64
    }

    fn full_run(grid: &Grid, phase: Phase) -> Vec<TrialRecord> {
        grid.points()
            .flat_map(|p| {
                Algorithm::ALL
                    .into_iter()
                    .map(move |a| completed(phase, p, a, ops(&p, a)))
            })
            .collect()
    }

    #[test]
    fn test_views_shape() {
        let grid = Grid::new(&[1024, 2097152], &[0, 1], &[0]).unwrap();
        let agg = aggregate(&grid, Phase::Encode, &full_run(&grid, Phase::Encode)).unwrap();

        assert_eq!(agg.by_size.groups.len(), 2);
        assert_eq!(agg.by_size.entries_under(&1024), 4);
        assert_eq!(agg.by_size.entries_under(&2097152), 4);
        assert_eq!(agg.by_algorithm.groups.len(), 2);
        assert_eq!(agg.by_charset.groups.len(), 2);
        assert_eq!(agg.by_algorithm.entry_count(), 8);
        assert_eq!(agg.aggregated_trials, 8);
        assert!(agg.excluded.is_empty());
    }

    #[test]
    fn test_series_sorted_by_x() {
        let grid = Grid::new(&[300, 100, 200], &[2, 0], &[0]).unwrap();
        let agg = aggregate(&grid, Phase::Encode, &full_run(&grid, Phase::Encode)).unwrap();
        let series = &agg.by_algorithm.groups[&Algorithm::Huffman][&2];
        let xs: Vec<u64> = series.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![100, 200, 300]);
        let by_size = &agg.by_size.groups[&200][&Algorithm::Shannon];
        let xs: Vec<u64> = by_size.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 2]);
    }

    #[test]
    fn test_views_are_projections_of_one_table() {
        let grid = Grid::new(&[10, 20, 30], &[0, 1, 2], &[0, 1]).unwrap();
        let agg = aggregate(&grid, Phase::Decode, &full_run(&grid, Phase::Decode)).unwrap();
        let facts = agg.facts_from_by_algorithm();
        assert_eq!(facts.len(), 18);
        assert_eq!(facts, agg.facts_from_by_charset());
        assert_eq!(facts, agg.facts_from_by_size());
    }

    #[test]
    fn test_samples_are_summed() {
        let grid = Grid::new(&[10], &[0], &[0, 1, 2]).unwrap();
        let agg = aggregate(&grid, Phase::Encode, &full_run(&grid, Phase::Encode)).unwrap();
        let key = FactKey {
            size: 10,
            charset: 0,
            algorithm: Algorithm::Huffman,
        };
        let expected: u64 = (0..3)
            .map(|s| ops(&ParameterPoint::new(10, 0, s), Algorithm::Huffman))
            .sum();
        assert_eq!(agg.facts_from_by_size()[&key], expected);
        assert_eq!(agg.aggregated_trials, 6);
    }

    #[test]
    fn test_missing_record_is_a_gap_not_zero() {
        let grid = Grid::new(&[10, 20], &[0], &[0]).unwrap();
        let mut records = full_run(&grid, Phase::Encode);
        records.retain(|r| !(r.key.point.size == 20 && r.key.algorithm == Algorithm::Shannon));

        let err = aggregate(&grid, Phase::Encode, &records).unwrap_err();
        match err {
            HarnessError::AggregationGap {
                phase,
                point,
                algorithm,
            } => {
                assert_eq!(phase, Phase::Encode);
                assert_eq!(point, ParameterPoint::new(20, 0, 0));
                assert_eq!(algorithm, Algorithm::Shannon);
            }
            other => panic!("Expected AggregationGap, got {:?}", other),
        }
    }

    #[test]
    fn test_other_phase_records_do_not_fill_gaps() {
        let grid = Grid::new(&[10], &[0], &[0]).unwrap();
        let records = full_run(&grid, Phase::Encode);
        assert!(matches!(
            aggregate(&grid, Phase::Decode, &records),
            Err(HarnessError::AggregationGap { .. })
        ));
    }

    #[test]
    fn test_failed_trial_excluded() {
        let grid = Grid::new(&[10, 20], &[0, 1], &[0]).unwrap();
        let mut records = full_run(&grid, Phase::Encode);
        let victim = records
            .iter_mut()
            .find(|r| r.key.point == ParameterPoint::new(20, 1, 0) && r.key.algorithm == Algorithm::Huffman)
            .unwrap();
        victim.outcome = TrialOutcome::Failed {
            stage: TrialStage::Invoked,
            error: HarnessError::ExternalProcessFailure {
                program: PathBuf::from("codec"),
                input: PathBuf::from("in"),
                status: "exit code 1".to_string(),
                detail: "boom".to_string(),
            },
        };

        let agg = aggregate(&grid, Phase::Encode, &records).unwrap();
        assert_eq!(agg.excluded.len(), 1);
        assert!(agg.excluded[0].reason.contains("exit code 1"));
        assert!(!agg.includes(20, 1, Algorithm::Huffman));
        assert!(agg.includes(20, 1, Algorithm::Shannon));
        assert_eq!(agg.by_size.entries_under(&20), 3);
        assert_eq!(agg.by_algorithm.entry_count(), 7);
        assert_eq!(agg.facts_from_by_charset(), agg.facts_from_by_size());
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let grid = Grid::new(&[10, 20], &[0, 1, 2], &[0, 1]).unwrap();
        let records = full_run(&grid, Phase::Encode);
        let first = aggregate(&grid, Phase::Encode, &records).unwrap();
        let second = aggregate(&grid, Phase::Encode, &records).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_view_json_roundtrip() {
        let grid = Grid::new(&[10], &[0, 1], &[0]).unwrap();
        let agg = aggregate(&grid, Phase::Encode, &full_run(&grid, Phase::Encode)).unwrap();
        let json = serde_json::to_string(&agg.by_size).unwrap();
        let back: AggregateView<u64, Algorithm> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, agg.by_size);
    }
}
