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

//! Property-based tests for grid enumeration and artifact naming.
//!
//! # Properties Tested
//!
//! 1. **Canonical order**: points come out strictly increasing, one per
//!    combination of axis values
//! 2. **Naming round trip**: a corpus file name parses back to its point
//! 3. **No collisions**: every file a run may write has a distinct path

use cbench_core::corpus::{corpus_file_name, parse_corpus_file_name};
use cbench_core::{Grid, ParameterPoint, TrialLayout};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

fn axes() -> impl Strategy<Value = (Vec<u64>, Vec<u8>, Vec<u32>)> {
    (
        prop::collection::vec(1u64..5_000_000, 1..5),
        prop::collection::vec(0u8..3, 1..4),
        prop::collection::vec(0u32..20, 1..4),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: points are unique, sorted and cover the full product.
    #[test]
    fn prop_points_in_canonical_order((sizes, charsets, samples) in axes()) {
        let grid = Grid::new(&sizes, &charsets, &samples).unwrap();
        let points: Vec<ParameterPoint> = grid.points().collect();

        let distinct = |v: &[u64]| v.iter().collect::<BTreeSet<_>>().len();
        let expected = distinct(&sizes)
            * charsets.iter().collect::<BTreeSet<_>>().len()
            * samples.iter().collect::<BTreeSet<_>>().len();

        prop_assert_eq!(points.len(), expected);
        prop_assert_eq!(grid.len(), expected);
        prop_assert!(points.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(points.iter().all(|p| grid.contains(p)));
    }

    /// Property: corpus names parse back to the point they were built from.
    #[test]
    fn prop_corpus_name_roundtrip(size in 1u64..u64::MAX, charset in any::<u8>(), sample in any::<u32>()) {
        let point = ParameterPoint::new(size, charset, sample);
        let name = corpus_file_name(&point);
        prop_assert_eq!(parse_corpus_file_name(&name), Some(point));
    }

    /// Property: no two trial files of a run share a path.
    #[test]
    fn prop_trial_paths_never_collide((sizes, charsets, samples) in axes()) {
        let grid = Grid::new(&sizes, &charsets, &samples).unwrap();
        let layout = TrialLayout::new(Path::new("out"));

        let paths: Vec<_> = layout.all_paths(&grid).map(|(_, _, path)| path).collect();
        let unique: HashSet<_> = paths.iter().collect();

        // staged input + 2 phases x 2 algorithms x (payload, count)
        prop_assert_eq!(paths.len(), grid.len() * 9);
        prop_assert_eq!(unique.len(), paths.len());
    }
}

#[test]
fn test_discovered_grid_matches_generated() {
    let dir = tempfile::tempdir().unwrap();
    let grid = Grid::new(&[16, 48], &[0, 2], &[0, 1, 2]).unwrap();
    cbench_core::corpus::generate(dir.path(), &grid, 7, false).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a corpus file").unwrap();

    let discovered = cbench_core::corpus::discover_grid(dir.path()).unwrap();
    assert_eq!(discovered, grid);
}
