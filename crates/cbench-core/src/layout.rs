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

//! Artifact naming and the trial directory layout.
//!
//! The codec writes its outputs beside its input, so the names here mirror
//! the codec's contract:
//!
//! ```text
//! <base>.txt                  staged corpus input
//! <base>.haff | <base>.shan   encoded artifact
//! <base>.haff.ops             encode count file
//! <base>-unz-h.txt            decoded artifact (tag s for Shannon)
//! <base>-unz-h.txt.ops        decode count file
//! ```
//!
//! Every `(point, algorithm, phase, role)` maps to a distinct path. That is
//! what keeps concurrent trials from writing the same file; there is no
//! locking.

use crate::algorithm::{Algorithm, Phase};
use crate::corpus::{base_name, CORPUS_EXTENSION};
use crate::grid::{Grid, ParameterPoint};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Subdirectory of the output directory holding all trial files.
pub const TRIALS_DIR: &str = "trials";

/// Extension of operation-count files.
pub const COUNT_EXTENSION: &str = "ops";

/// What an artifact file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Encoded or decoded data
    Payload,
    /// Companion operation-count file
    Count,
}

/// Tag attached to an artifact path when it is computed.
///
/// Consumers read the kind from here instead of inspecting file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactKind {
    pub phase: Phase,
    pub algorithm: Algorithm,
    pub role: Role,
}

impl ArtifactKind {
    pub fn new(phase: Phase, algorithm: Algorithm, role: Role) -> Self {
        Self {
            phase,
            algorithm,
            role,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            Role::Payload => "payload",
            Role::Count => "count",
        };
        write!(f, "{} {} {}", self.phase, self.algorithm, role)
    }
}

/// Encoded artifact the codec writes for `input`.
///
/// A trailing `.txt` is replaced by the algorithm's extension; any other
/// name gets the extension appended.
pub fn encoded_output(input: &Path, algorithm: Algorithm) -> PathBuf {
    let stem = strip_extension(input, CORPUS_EXTENSION);
    with_suffix(&stem, &format!(".{}", algorithm.encoded_extension()))
}

/// Decoded artifact the codec writes for an encoded `input`.
pub fn decoded_output(input: &Path, algorithm: Algorithm) -> PathBuf {
    let stem = strip_extension(input, algorithm.encoded_extension());
    with_suffix(
        &stem,
        &format!("-unz-{}.{}", algorithm.tag(), CORPUS_EXTENSION),
    )
}

/// Count file accompanying an artifact.
pub fn count_path(artifact: &Path) -> PathBuf {
    with_suffix(artifact, &format!(".{}", COUNT_EXTENSION))
}

fn strip_extension(path: &Path, ext: &str) -> PathBuf {
    if path.extension().is_some_and(|e| e == ext) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Paths of every trial file under `<output>/trials`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialLayout {
    dir: PathBuf,
}

impl TrialLayout {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            dir: output_dir.join(TRIALS_DIR),
        }
    }

    /// The trial directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the corpus file for `point` is staged before encoding.
    pub fn staged_input(&self, point: &ParameterPoint) -> PathBuf {
        self.dir
            .join(format!("{}.{}", base_name(point), CORPUS_EXTENSION))
    }

    /// Path of the artifact of the given kind for `point`.
    pub fn artifact(&self, point: &ParameterPoint, kind: ArtifactKind) -> PathBuf {
        let encoded = encoded_output(&self.staged_input(point), kind.algorithm);
        let payload = match kind.phase {
            Phase::Encode => encoded,
            Phase::Decode => decoded_output(&encoded, kind.algorithm),
        };
        match kind.role {
            Role::Payload => payload,
            Role::Count => count_path(&payload),
        }
    }

    /// Every artifact derived from the staged input of `point`.
    pub fn artifacts(&self, point: ParameterPoint) -> impl Iterator<Item = (ArtifactKind, PathBuf)> + '_ {
        Phase::ALL.into_iter().flat_map(move |phase| {
            Algorithm::ALL.into_iter().flat_map(move |algorithm| {
                [Role::Payload, Role::Count].into_iter().map(move |role| {
                    let kind = ArtifactKind::new(phase, algorithm, role);
                    (kind, self.artifact(&point, kind))
                })
            })
        })
    }

    /// Every path a run over `grid` may write, with its owner.
    ///
    /// Staged inputs have no kind; they are owned by the point alone.
    pub fn all_paths<'a>(
        &'a self,
        grid: &'a Grid,
    ) -> impl Iterator<Item = (ParameterPoint, Option<ArtifactKind>, PathBuf)> + 'a {
        grid.points().flat_map(move |point| {
            let staged = std::iter::once((point, None, self.staged_input(&point)));
            let artifacts = self
                .artifacts(point)
                .map(move |(kind, path)| (point, Some(kind), path));
            staged.chain(artifacts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codec_contract_names() {
        let input = Path::new("in/size-1024_charset-0_sample-0.txt");
        let encoded = encoded_output(input, Algorithm::Huffman);
        assert_eq!(encoded, PathBuf::from("in/size-1024_charset-0_sample-0.haff"));
        assert_eq!(
            count_path(&encoded),
            PathBuf::from("in/size-1024_charset-0_sample-0.haff.ops")
        );

        let decoded = decoded_output(&encoded, Algorithm::Huffman);
        assert_eq!(decoded, PathBuf::from("in/size-1024_charset-0_sample-0-unz-h.txt"));
        assert_eq!(
            count_path(&decoded),
            PathBuf::from("in/size-1024_charset-0_sample-0-unz-h.txt.ops")
        );
    }

    #[test]
    fn test_shannon_names() {
        let input = Path::new("size-1_charset-2_sample-3.txt");
        let encoded = encoded_output(input, Algorithm::Shannon);
        assert_eq!(encoded, PathBuf::from("size-1_charset-2_sample-3.shan"));
        assert_eq!(
            decoded_output(&encoded, Algorithm::Shannon),
            PathBuf::from("size-1_charset-2_sample-3-unz-s.txt")
        );
    }

    #[test]
    fn test_input_without_txt_extension() {
        let input = Path::new("size-1_charset-0_sample-0");
        assert_eq!(
            encoded_output(input, Algorithm::Huffman),
            PathBuf::from("size-1_charset-0_sample-0.haff")
        );
    }

    #[test]
    fn test_layout_paths() {
        let layout = TrialLayout::new(Path::new("out"));
        let point = ParameterPoint::new(2097152, 1, 0);
        assert_eq!(layout.dir(), Path::new("out/trials"));
        assert_eq!(
            layout.staged_input(&point),
            PathBuf::from("out/trials/size-2097152_charset-1_sample-0.txt")
        );
        let kind = ArtifactKind::new(Phase::Decode, Algorithm::Shannon, Role::Count);
        assert_eq!(
            layout.artifact(&point, kind),
            PathBuf::from("out/trials/size-2097152_charset-1_sample-0-unz-s.txt.ops")
        );
    }

    #[test]
    fn test_no_two_owners_share_a_path() {
        let grid = Grid::new(&[1024, 2097152], &[0, 1, 2], &[0, 1]).unwrap();
        let layout = TrialLayout::new(Path::new("out"));
        let paths: Vec<_> = layout.all_paths(&grid).collect();
        let unique: HashSet<_> = paths.iter().map(|(_, _, p)| p.clone()).collect();
        assert_eq!(paths.len(), grid.len() * 9);
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_kind_display() {
        let kind = ArtifactKind::new(Phase::Encode, Algorithm::Huffman, Role::Payload);
        assert_eq!(kind.to_string(), "encode huffman payload");
    }
}
