// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::hash::Hash;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::HashFamily;

// Serialization constants
const PREAMBLE_BYTES_EMPTY: u8 = 12;
const PREAMBLE_BYTES_STANDARD: u8 = 20;
const FAMILY_ID: u8 = 16;
const SERIAL_VERSION: u8 = 1;
const EMPTY_FLAG_MASK: u8 = 1 << 2;

// A tracker holds the trailing-zero count of a 64-bit hash, so 64 is the
// largest value it can ever take (reached only by a hash of exactly zero).
const MAX_TRAILING_ZEROS: u8 = 64;

// Both layout dimensions travel as u16 in the serialized form, and every
// update pays one member derivation per tracker anyway.
const MAX_NUM_TRACKERS: usize = u16::MAX as usize;

/// A Flajolet-Martin sketch estimating the number of distinct items seen.
///
/// The sketch maintains `k` trackers, one per hash function. Each tracker
/// records the maximum trailing-zero count observed under its function; a
/// stream containing `n` distinct items drives trackers toward `log2(n)`, so
/// `2^tracker` estimates the cardinality. A single tracker is unusably noisy
/// (always a power of two, easily off by 2x from one lucky draw), so the
/// estimate partitions the trackers into groups, takes the median within each
/// group, and averages the medians.
///
/// Duplicate items never change the state: every update is a max against
/// values the same item already produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FmSketch {
    /// Hash family addressing the trackers
    family: HashFamily,
    /// Per-function maximum trailing-zero counts, each in `0..=64`
    trackers: Vec<u8>,
    /// Number of aggregation groups; divides `trackers.len()` evenly
    num_groups: usize,
    /// Total number of items observed (with duplicates)
    n: u64,
}

impl FmSketch {
    /// Creates a sketch with `num_trackers` hash functions aggregated in
    /// `num_groups` groups.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if either argument is zero,
    /// `num_trackers` exceeds 65,535, or `num_trackers` is not a multiple of
    /// `num_groups`. The split must be exact: silently truncating trackers
    /// would bias the estimate.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamkit::fm::FmSketch;
    ///
    /// // 128 trackers, aggregated as 8 medians of 16 trackers each.
    /// let sketch = FmSketch::new(128, 8).unwrap();
    /// assert_eq!(sketch.samples_per_group(), 16);
    /// ```
    pub fn new(num_trackers: usize, num_groups: usize) -> Result<Self, Error> {
        Self::with_seed(num_trackers, num_groups, DEFAULT_UPDATE_SEED)
    }

    /// Creates a sketch with a custom hash seed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn with_seed(num_trackers: usize, num_groups: usize, seed: u32) -> Result<Self, Error> {
        if num_trackers == 0 {
            return Err(Error::config("num_trackers must be positive"));
        }
        if num_trackers > MAX_NUM_TRACKERS {
            return Err(Error::config("num_trackers is unreasonably large")
                .with_context("num_trackers", num_trackers)
                .with_context("max", MAX_NUM_TRACKERS));
        }
        if num_groups == 0 {
            return Err(Error::config("num_groups must be positive"));
        }
        if num_trackers % num_groups != 0 {
            return Err(
                Error::config("num_trackers must be divisible by num_groups")
                    .with_context("num_trackers", num_trackers)
                    .with_context("num_groups", num_groups),
            );
        }

        Ok(FmSketch {
            family: HashFamily::with_seed(seed),
            trackers: vec![0; num_trackers],
            num_groups,
            n: 0,
        })
    }

    /// Folds an item into the sketch.
    ///
    /// Each of the `k` trackers is raised to the trailing-zero count of its
    /// hash function applied to the item. Re-updating with a previously seen
    /// item is a no-op on every tracker.
    pub fn update<T: Hash>(&mut self, item: T) {
        let pair = self.family.fingerprint(&item);
        for (index, tracker) in self.trackers.iter_mut().enumerate() {
            let member = HashFamily::member64(pair, index as u64);
            // trailing_zeros of 0 is 64, which is exactly the cap we want
            // for the one hash value with no low set bit.
            let r = member.trailing_zeros() as u8;
            if r > *tracker {
                *tracker = r;
            }
        }
        self.n += 1;
    }

    /// Returns the estimated number of distinct items observed.
    ///
    /// Per-tracker raw estimates `2^tracker` are grouped, each group reduced
    /// to its median (robust against the exponentially heavy upper tail of
    /// the raw estimates), and the group medians averaged.
    pub fn estimate(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let group_size = self.samples_per_group();
        let median_sum: f64 = self
            .trackers
            .chunks_exact(group_size)
            .map(group_median)
            .sum();
        median_sum / self.num_groups as f64
    }

    /// Returns true if no items have been observed.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of items observed by this sketch, counting
    /// duplicates.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns the number of trackers (hash functions).
    pub fn num_trackers(&self) -> usize {
        self.trackers.len()
    }

    /// Returns the number of aggregation groups.
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Returns the number of trackers contributing to each group median.
    pub fn samples_per_group(&self) -> usize {
        self.trackers.len() / self.num_groups
    }

    /// Serializes the sketch to a byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let is_empty = self.is_empty();
        let preamble_bytes = if is_empty {
            PREAMBLE_BYTES_EMPTY
        } else {
            PREAMBLE_BYTES_STANDARD
        };

        let capacity = preamble_bytes as usize + if is_empty { 0 } else { self.trackers.len() };
        let mut bytes = SketchBytes::with_capacity(capacity);

        bytes.write_u8(preamble_bytes);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(FAMILY_ID);
        bytes.write_u8(if is_empty { EMPTY_FLAG_MASK } else { 0 });
        bytes.write_u16_le(self.num_groups as u16);
        bytes.write_u16_le(self.samples_per_group() as u16);
        bytes.write_u32_le(self.family.seed());

        if !is_empty {
            bytes.write_u64_le(self.n);
            bytes.write(&self.trackers);
        }

        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    ///
    /// # Errors
    ///
    /// Returns a `MalformedDeserializeData` error if the data is truncated,
    /// is not a serialized [`FmSketch`], or carries inconsistent parameters.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);

        let preamble_bytes = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("preamble_bytes"))?;
        let serial_version = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("serial_version"))?;
        let family_id = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("family_id"))?;
        let flags = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("flags"))?;

        if family_id != FAMILY_ID {
            return Err(Error::invalid_family(FAMILY_ID, family_id, "FmSketch"));
        }
        if serial_version != SERIAL_VERSION {
            return Err(Error::deserial(format!(
                "unsupported serial version: {serial_version}"
            )));
        }
        if preamble_bytes != PREAMBLE_BYTES_EMPTY && preamble_bytes != PREAMBLE_BYTES_STANDARD {
            return Err(Error::deserial(format!(
                "invalid preamble length: {preamble_bytes}"
            )));
        }

        let num_groups = cursor
            .read_u16_le()
            .map_err(|_| Error::insufficient_data("num_groups"))? as usize;
        let samples_per_group = cursor
            .read_u16_le()
            .map_err(|_| Error::insufficient_data("samples_per_group"))?
            as usize;
        if num_groups == 0 || samples_per_group == 0 {
            return Err(Error::deserial("tracker layout must be non-empty"));
        }
        let num_trackers = num_groups * samples_per_group;
        if num_trackers > MAX_NUM_TRACKERS {
            return Err(Error::deserial("tracker layout is unreasonably large")
                .with_context("num_trackers", num_trackers)
                .with_context("max", MAX_NUM_TRACKERS));
        }

        let seed = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("seed"))?;

        if (flags & EMPTY_FLAG_MASK) != 0 {
            return Self::with_seed(num_trackers, num_groups, seed)
                .map_err(|e| Error::deserial("invalid empty sketch layout").set_source(e));
        }

        let n = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("n"))?;
        if n == 0 {
            return Err(Error::deserial("non-empty sketch with zero item count"));
        }

        let mut trackers = vec![0u8; num_trackers];
        cursor
            .read_exact(&mut trackers)
            .map_err(|_| Error::insufficient_data("trackers"))?;
        if trackers.iter().any(|&t| t > MAX_TRAILING_ZEROS) {
            return Err(Error::deserial("tracker value exceeds hash width"));
        }

        Ok(FmSketch {
            family: HashFamily::with_seed(seed),
            trackers,
            num_groups,
            n,
        })
    }
}

/// Median of the raw estimates `2^tracker` within one group.
///
/// Even-sized groups average the two middle values, so a group median is not
/// necessarily a power of two.
fn group_median(group: &[u8]) -> f64 {
    let mut sorted = group.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        f64::exp2(sorted[mid] as f64)
    } else {
        (f64::exp2(sorted[mid - 1] as f64) + f64::exp2(sorted[mid] as f64)) / 2.0
    }
}
