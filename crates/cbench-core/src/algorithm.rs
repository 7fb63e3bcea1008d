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

//! Algorithms under test and the two trial phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A compression algorithm implemented by the external codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Huffman-family coder
    Huffman,
    /// Shannon-Fano-family coder
    Shannon,
}

impl Algorithm {
    /// Every algorithm, in aggregation order.
    pub const ALL: [Algorithm; 2] = [Algorithm::Huffman, Algorithm::Shannon];

    /// The exact `-a` value the codec accepts.
    ///
    /// The codec spells the Shannon coder `shennon`; anything else is rejected.
    pub fn cli_name(self) -> &'static str {
        match self {
            Algorithm::Huffman => "huffman",
            Algorithm::Shannon => "shennon",
        }
    }

    /// Extension of the encoded artifact.
    pub fn encoded_extension(self) -> &'static str {
        match self {
            Algorithm::Huffman => "haff",
            Algorithm::Shannon => "shan",
        }
    }

    /// Single-letter tag used in decoded file names (`-unz-<tag>.txt`).
    pub fn tag(self) -> char {
        match self {
            Algorithm::Huffman => 'h',
            Algorithm::Shannon => 's',
        }
    }

    /// Parse a codec `-a` value.
    pub fn from_cli_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.cli_name() == name)
    }

    /// Identify an algorithm by its encoded-artifact extension.
    pub fn from_encoded_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.encoded_extension() == ext)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Huffman => f.write_str("huffman"),
            Algorithm::Shannon => f.write_str("shannon"),
        }
    }
}

/// One pass of the codec over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Encode,
    Decode,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Encode, Phase::Decode];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Encode => f.write_str("encode"),
            Phase::Decode => f.write_str("decode"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_names_are_exact() {
        assert_eq!(Algorithm::Huffman.cli_name(), "huffman");
        assert_eq!(Algorithm::Shannon.cli_name(), "shennon");
        assert_eq!(Algorithm::from_cli_name("shennon"), Some(Algorithm::Shannon));
        assert_eq!(Algorithm::from_cli_name("shannon"), None);
        assert_eq!(Algorithm::from_cli_name("Huffman"), None);
    }

    #[test]
    fn test_extensions_and_tags() {
        assert_eq!(Algorithm::from_encoded_extension("haff"), Some(Algorithm::Huffman));
        assert_eq!(Algorithm::from_encoded_extension("shan"), Some(Algorithm::Shannon));
        assert_eq!(Algorithm::from_encoded_extension("txt"), None);
        assert_eq!(Algorithm::Huffman.tag(), 'h');
        assert_eq!(Algorithm::Shannon.tag(), 's');
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Algorithm::Shannon).unwrap(), "\"shannon\"");
        assert_eq!(serde_json::to_string(&Phase::Decode).unwrap(), "\"decode\"");
    }
}
