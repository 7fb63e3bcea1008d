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

//! Parameter grid.
//!
//! The grid is the cross product of configured sizes, charset identifiers
//! and sample indices. Points are always produced in ascending
//! `(size, charset, sample)` order so that artifact naming and report
//! layout are reproducible across runs.

use crate::error::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default corpus sizes in bytes (20, 40 and 60 KiB).
pub const DEFAULT_SIZES: &[u64] = &[20 * 1024, 40 * 1024, 60 * 1024];

/// Default charset identifiers.
pub const DEFAULT_CHARSETS: &[u8] = &[0, 1, 2];

/// Default sample indices.
pub const DEFAULT_SAMPLES: &[u32] = &[0, 1, 2];

/// One corpus file's coordinates in the grid.
///
/// Field order matters: the derived `Ord` gives the canonical grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParameterPoint {
    /// File size in bytes
    pub size: u64,
    /// Charset identifier
    pub charset: u8,
    /// Sample index
    pub sample: u32,
}

impl ParameterPoint {
    pub fn new(size: u64, charset: u8, sample: u32) -> Self {
        Self {
            size,
            charset,
            sample,
        }
    }

    /// The `(size, charset)` aggregation cell this point belongs to.
    pub fn cell(&self) -> (u64, u8) {
        (self.size, self.charset)
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={} charset={} sample={}",
            self.size, self.charset, self.sample
        )
    }
}

/// Serializable grid axes, as accepted by `--grid <file.json>`.
///
/// ```json
/// { "sizes": [1024, 2097152], "charsets": [0, 1], "samples": [0] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub sizes: Vec<u64>,
    pub charsets: Vec<u8>,
    pub samples: Vec<u32>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            charsets: DEFAULT_CHARSETS.to_vec(),
            samples: DEFAULT_SAMPLES.to_vec(),
        }
    }
}

/// The normalised parameter grid.
///
/// Each axis is sorted, deduplicated and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    sizes: Vec<u64>,
    charsets: Vec<u8>,
    samples: Vec<u32>,
}

impl Grid {
    /// Build a grid from raw axis values.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] if an axis is empty or a size is zero.
    pub fn new(sizes: &[u64], charsets: &[u8], samples: &[u32]) -> Result<Self> {
        let sizes = normalise("sizes", sizes)?;
        if sizes.first() == Some(&0) {
            return Err(HarnessError::invalid_config("sizes", "sizes must be positive"));
        }
        Ok(Self {
            sizes,
            charsets: normalise("charsets", charsets)?,
            samples: normalise("samples", samples)?,
        })
    }

    /// Build a grid from a [`GridConfig`].
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        Self::new(&config.sizes, &config.charsets, &config.samples)
    }

    /// Build the smallest grid whose cross product covers every given point.
    pub fn covering<'a>(points: impl IntoIterator<Item = &'a ParameterPoint>) -> Result<Self> {
        let mut sizes = Vec::new();
        let mut charsets = Vec::new();
        let mut samples = Vec::new();
        for p in points {
            sizes.push(p.size);
            charsets.push(p.charset);
            samples.push(p.sample);
        }
        Self::new(&sizes, &charsets, &samples)
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn charsets(&self) -> &[u8] {
        &self.charsets
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    /// Number of points in the grid.
    pub fn len(&self) -> usize {
        self.sizes.len() * self.charsets.len() * self.samples.len()
    }

    /// Always false: every axis holds at least one value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazy iterator over every point in canonical order.
    ///
    /// Calling `points()` again restarts from the first point.
    pub fn points(&self) -> Points<'_> {
        Points {
            grid: self,
            index: 0,
        }
    }

    /// Every `(size, charset)` aggregation cell in ascending order.
    pub fn cells(&self) -> impl Iterator<Item = (u64, u8)> + '_ {
        self.sizes
            .iter()
            .flat_map(move |&size| self.charsets.iter().map(move |&charset| (size, charset)))
    }

    /// Whether the point lies on the grid.
    pub fn contains(&self, point: &ParameterPoint) -> bool {
        self.sizes.binary_search(&point.size).is_ok()
            && self.charsets.binary_search(&point.charset).is_ok()
            && self.samples.binary_search(&point.sample).is_ok()
    }

    /// The axes as a serializable config.
    pub fn to_config(&self) -> GridConfig {
        GridConfig {
            sizes: self.sizes.clone(),
            charsets: self.charsets.clone(),
            samples: self.samples.clone(),
        }
    }
}

fn normalise<T: Ord + Copy>(axis: &str, values: &[T]) -> Result<Vec<T>> {
    let set: BTreeSet<T> = values.iter().copied().collect();
    if set.is_empty() {
        return Err(HarnessError::invalid_config(axis, "axis must not be empty"));
    }
    Ok(set.into_iter().collect())
}

/// Iterator returned by [`Grid::points`].
///
/// The point at `index` is decoded from mixed-radix digits
/// `(size, charset, sample)`, with sample varying fastest.
#[derive(Debug, Clone)]
pub struct Points<'a> {
    grid: &'a Grid,
    index: usize,
}

impl Iterator for Points<'_> {
    type Item = ParameterPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.grid.len() {
            return None;
        }
        let samples = self.grid.samples.len();
        let charsets = self.grid.charsets.len();
        let sample = self.index % samples;
        let charset = (self.index / samples) % charsets;
        let size = self.index / (samples * charsets);
        self.index += 1;
        Some(ParameterPoint::new(
            self.grid.sizes[size],
            self.grid.charsets[charset],
            self.grid.samples[sample],
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}
