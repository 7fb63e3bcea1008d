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

//! The full run pipeline: trials, verification, aggregation, report.

use crate::aggregate::{aggregate, Dimension};
use crate::algorithm::Phase;
use crate::codec::Codec;
use crate::config::RunConfig;
use crate::driver::{CancelToken, TrialDriver};
use crate::error::{HarnessError, Result};
use crate::grid::Grid;
use crate::report::{aggregate_file, export_json, write_aggregates, PhaseViews, RunReport};
use crate::tables::write_tables;
use crate::trial::TrialRecord;
use crate::verify::verify;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{error, info};

/// Run every trial of `grid`, verify, aggregate and persist the results.
///
/// Per-trial failures, mismatches and aggregation gaps end up in the
/// returned report; check [`RunReport::is_success`] for the verdict.
///
/// # Errors
///
/// Fails only on invalid configuration or when the output directory cannot
/// be written.
pub fn run(config: &RunConfig, grid: &Grid, codec: &dyn Codec, cancel: CancelToken) -> Result<RunReport> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)
        .map_err(|e| HarnessError::io_error(&config.output_dir, e))?;

    let driver = TrialDriver::new(config, codec)?.with_cancel_token(cancel);
    let trials = driver.run(grid)?;
    let verification = driver.install(|| verify(&trials.decode));

    let aggregates_dir = config.aggregates_dir();
    let mut aggregates = Vec::new();
    let mut aggregation_errors = Vec::new();
    for phase in Phase::ALL {
        match aggregate(grid, phase, trials.records(phase)) {
            Ok(aggregate) => {
                write_aggregates(&aggregates_dir, &aggregate)?;
                aggregates.push(aggregate);
            }
            Err(e) => {
                error!(%phase, "aggregation aborted: {}", e);
                remove_views(&aggregates_dir, phase)?;
                aggregation_errors.push((phase, e));
            }
        }
    }

    let records: Vec<&TrialRecord> = trials.all_records().collect();
    let report = RunReport::build(
        &config.codec_path,
        driver.layout(),
        grid.to_config(),
        &records,
        &verification,
        aggregates,
        aggregation_errors,
        trials.elapsed_ms,
    );

    export_json(&report, &config.report_path())?;
    let views: Vec<PhaseViews> = report.aggregates.iter().map(PhaseViews::from).collect();
    write_tables(&config.tables_path(), &views)?;

    info!(
        trials = report.summary.trials,
        failed = report.summary.failed,
        mismatched = report.summary.mismatched,
        elapsed_ms = report.summary.elapsed_ms,
        "run finished"
    );
    Ok(report)
}

/// Drop stale views of a phase that could not be aggregated.
fn remove_views(dir: &Path, phase: Phase) -> Result<()> {
    for key in [Dimension::Algorithm, Dimension::Charset, Dimension::Size] {
        let path = aggregate_file(dir, phase, key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(HarnessError::io_error(&path, e)),
        }
    }
    Ok(())
}
