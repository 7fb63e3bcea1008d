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

//! `cbench run`: the full benchmark pipeline.

use crate::cli::RunArgs;
use crate::error::CliError;
use cbench_core::{harness, CancelToken, ProcessCodec, RunConfig, RunReport};
use colored::Colorize;

/// Run every trial of the selected grid and print the summary.
///
/// # Errors
///
/// Returns [`CliError::RunFailed`] if any trial failed (missing corpus files
/// only count without `--allow-missing-corpus`), the run was cancelled, any
/// round trip mismatched, or aggregation was incomplete. Configuration and output-directory errors
/// are returned as [`CliError::Harness`].
pub fn run(args: RunArgs, verbose: bool) -> Result<(), CliError> {
    let grid = args.grid.resolve(&args.corpus_dir)?;
    let mut config = RunConfig::new(&args.corpus_dir, &args.output_dir, &args.codec)
        .with_force(args.force)
        .with_allow_missing_corpus(args.allow_missing_corpus)
        .with_verbose(verbose);
    if let Some(jobs) = args.jobs {
        config = config.with_pool_size(jobs);
    }

    let codec = ProcessCodec::new(&config.codec_path);
    let report = harness::run(&config, &grid, &codec, CancelToken::new())?;
    print_summary(&report, &config);

    if report.is_success(config.allow_missing_corpus) {
        Ok(())
    } else {
        Err(CliError::RunFailed {
            failed: report.summary.failed,
            cancelled: report.summary.cancelled,
            mismatched: report.summary.mismatched,
            aggregation_errors: report.summary.aggregation_errors,
            report: config.report_path(),
        })
    }
}

fn print_summary(report: &RunReport, config: &RunConfig) {
    let s = &report.summary;

    println!();
    println!("{}", "═".repeat(60).bright_blue());
    println!(
        "{} {}",
        "Codec Benchmark:".bright_blue().bold(),
        report.codec.bright_white()
    );
    println!("{}", "═".repeat(60).bright_blue());
    println!(
        "  {} {}",
        "Grid points:".bright_cyan(),
        s.points.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Trials:".bright_cyan(),
        s.trials.to_string().bright_white()
    );
    println!(
        "  {} {} ({} cached)",
        "Completed:".green().bold(),
        s.completed.to_string().bright_white(),
        s.cached
    );
    println!(
        "  {} {}",
        "Failed:".red().bold(),
        s.failed.to_string().bright_white()
    );
    if s.blocked > 0 || s.cancelled > 0 {
        println!(
            "  {} {} blocked, {} cancelled",
            "Not run:".yellow().bold(),
            s.blocked,
            s.cancelled
        );
    }
    println!(
        "  {} {}",
        "Matched:".green().bold(),
        s.matched.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Mismatched:".red().bold(),
        s.mismatched.to_string().bright_white()
    );
    if s.unverified > 0 || s.verification_errors > 0 {
        println!(
            "  {} {} unverified, {} unreadable",
            "Not verified:".yellow().bold(),
            s.unverified,
            s.verification_errors
        );
    }
    println!(
        "  {} {}",
        "Aggregation errors:".red().bold(),
        s.aggregation_errors.to_string().bright_white()
    );
    println!(
        "  {} {:.2}s",
        "Elapsed:".bright_cyan(),
        s.elapsed_ms as f64 / 1000.0
    );

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failures by category:".red().bold());
        for (category, details) in &report.failures {
            println!("  {} ({})", category.to_string().yellow(), details.len());
            for detail in details {
                println!("    {} {}", "✗".red(), detail.trial);
                println!("      {}", detail.error);
                if !detail.rerun.is_empty() {
                    println!("      {} {}", "re-run:".bright_black(), detail.rerun);
                }
            }
        }
    }

    println!();
    println!(
        "  {} {}",
        "Report:".bright_cyan(),
        config.report_path().display()
    );
    println!(
        "  {} {}",
        "Aggregates:".bright_cyan(),
        config.aggregates_dir().display()
    );
    println!(
        "  {} {}",
        "Tables:".bright_cyan(),
        config.tables_path().display()
    );
    println!("{}", "═".repeat(60).bright_blue());
}
