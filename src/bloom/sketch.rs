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
const PREAMBLE_BYTES_EMPTY: u8 = 18;
const PREAMBLE_BYTES_STANDARD: u8 = 26;
const FAMILY_ID: u8 = 17;
const SERIAL_VERSION: u8 = 1;
const EMPTY_FLAG_MASK: u8 = 1 << 2;

const MAX_NUM_HASHES: u16 = 100;

/// A Bloom filter for probabilistic set membership testing.
///
/// Provides fast membership queries with:
/// - No false negatives (inserted items always return `true`)
/// - Tunable false positive rate
/// - Constant space usage
///
/// There is no delete operation on this type. Removal requires per-bucket
/// counters; see [`CountingBloomFilter`](crate::bloom::CountingBloomFilter).
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilter {
    /// Hash family addressing the buckets
    family: HashFamily,
    /// Number of hash functions to use (h)
    num_hashes: u16,
    /// Total number of bit buckets in the filter (m)
    num_buckets: u64,
    /// Count of bits set to 1 (for statistics)
    num_bits_set: u64,
    /// Bit array packed into u64 words, length = ceil(num_buckets / 64)
    bits: Vec<u64>,
}

impl BloomFilter {
    /// Creates a filter with `num_buckets` bits addressed by `num_hashes`
    /// hash functions.
    ///
    /// Use [`suggest_num_buckets`](Self::suggest_num_buckets) and
    /// [`suggest_num_hashes`](Self::suggest_num_hashes) to size the filter
    /// for a target false-positive rate.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if `num_buckets` is zero, or
    /// `num_hashes` is zero or greater than 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamkit::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(10_000, 3).unwrap();
    /// assert!(filter.is_empty());
    /// ```
    pub fn new(num_buckets: u64, num_hashes: u16) -> Result<Self, Error> {
        Self::with_seed(num_buckets, num_hashes, DEFAULT_UPDATE_SEED)
    }

    /// Creates a filter with a custom hash seed.
    ///
    /// Two filters answer consistently for the same keys only if they share
    /// a seed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn with_seed(num_buckets: u64, num_hashes: u16, seed: u32) -> Result<Self, Error> {
        validate_shape(num_buckets, num_hashes)?;

        let num_words = num_buckets.div_ceil(64) as usize;
        Ok(BloomFilter {
            family: HashFamily::with_seed(seed),
            num_hashes,
            num_buckets,
            num_bits_set: 0,
            bits: vec![0u64; num_words],
        })
    }

    /// Inserts an item into the filter.
    ///
    /// After insertion, `contains(&item)` will always return `true`.
    pub fn insert<T: Hash>(&mut self, item: T) {
        let pair = self.family.fingerprint(&item);
        for i in 0..self.num_hashes {
            let bucket = HashFamily::slot(pair, u64::from(i), self.num_buckets);
            self.set_bit(bucket);
        }
    }

    /// Tests whether an item is possibly in the set.
    ///
    /// Returns:
    /// - `true`: the item was **possibly** inserted (or is a false positive)
    /// - `false`: the item was **definitely not** inserted
    pub fn contains<T: Hash>(&self, item: &T) -> bool {
        if self.is_empty() {
            return false;
        }

        let pair = self.family.fingerprint(item);
        (0..self.num_hashes).all(|i| {
            let bucket = HashFamily::slot(pair, u64::from(i), self.num_buckets);
            self.get_bit(bucket)
        })
    }

    /// Resets the filter to its initial empty state, preserving the
    /// configuration.
    pub fn reset(&mut self) {
        for word in &mut self.bits {
            *word = 0;
        }
        self.num_bits_set = 0;
    }

    /// Returns whether the filter is empty (no items inserted).
    pub fn is_empty(&self) -> bool {
        self.num_bits_set == 0
    }

    /// Returns the number of bits set to 1.
    pub fn bits_set(&self) -> u64 {
        self.num_bits_set
    }

    /// Returns the number of bit buckets in the filter.
    pub fn num_buckets(&self) -> u64 {
        self.num_buckets
    }

    /// Returns the number of hash functions used.
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Returns the current load factor (fraction of bits set).
    ///
    /// Values near 0.5 indicate the filter is approaching saturation.
    pub fn load_factor(&self) -> f64 {
        self.num_bits_set as f64 / self.num_buckets as f64
    }

    /// Estimates the current false positive probability from the load
    /// factor, following the standard `(1 - e^(-h*n/m))^h` analysis.
    pub fn estimated_fpp(&self) -> f64 {
        let h = self.num_hashes as f64;
        (1.0 - (-h * self.load_factor()).exp()).powf(h)
    }

    /// Suggests the number of buckets for `max_items` insertions at a target
    /// false-positive probability.
    ///
    /// Formula: `m = -n * ln(p) / (ln(2)^2)`, rounded up to a multiple
    /// of 64.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is 0 or `fpp` is not in (0.0, 1.0).
    pub fn suggest_num_buckets(max_items: u64, fpp: f64) -> u64 {
        assert!(max_items > 0, "max_items must be greater than 0");
        assert!(
            fpp > 0.0 && fpp < 1.0,
            "fpp must be between 0.0 and 1.0 (exclusive)"
        );

        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        let buckets = (-(max_items as f64) * fpp.ln() / ln2_squared).ceil() as u64;
        buckets.div_ceil(64) * 64
    }

    /// Suggests the number of hash functions for `max_items` insertions into
    /// `num_buckets` buckets.
    ///
    /// Formula: `h = (m/n) * ln(2)`.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is 0.
    pub fn suggest_num_hashes(max_items: u64, num_buckets: u64) -> u16 {
        assert!(max_items > 0, "max_items must be greater than 0");

        let h = (num_buckets as f64 / max_items as f64 * std::f64::consts::LN_2).round();
        (h as u16).clamp(1, MAX_NUM_HASHES)
    }

    /// Serializes the filter to a byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let is_empty = self.is_empty();
        let preamble_bytes = if is_empty {
            PREAMBLE_BYTES_EMPTY
        } else {
            PREAMBLE_BYTES_STANDARD
        };

        let capacity =
            preamble_bytes as usize + if is_empty { 0 } else { self.bits.len() * 8 };
        let mut bytes = SketchBytes::with_capacity(capacity);

        bytes.write_u8(preamble_bytes);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(FAMILY_ID);
        bytes.write_u8(if is_empty { EMPTY_FLAG_MASK } else { 0 });
        bytes.write_u16_le(self.num_hashes);
        bytes.write_u32_le(self.family.seed());
        bytes.write_u64_le(self.num_buckets);

        if !is_empty {
            bytes.write_u64_le(self.num_bits_set);
            for &word in &self.bits {
                bytes.write_u64_le(word);
            }
        }

        bytes.into_bytes()
    }

    /// Deserializes a filter from bytes.
    ///
    /// # Errors
    ///
    /// Returns a `MalformedDeserializeData` error if the data is truncated,
    /// is not a serialized [`BloomFilter`], or carries an invalid shape.
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
            return Err(Error::invalid_family(FAMILY_ID, family_id, "BloomFilter"));
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

        let num_hashes = cursor
            .read_u16_le()
            .map_err(|_| Error::insufficient_data("num_hashes"))?;
        let seed = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("seed"))?;
        let num_buckets = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("num_buckets"))?;

        let mut filter = Self::with_seed(num_buckets, num_hashes, seed)
            .map_err(|e| Error::deserial("invalid filter shape").set_source(e))?;

        if (flags & EMPTY_FLAG_MASK) == 0 {
            filter.num_bits_set = cursor
                .read_u64_le()
                .map_err(|_| Error::insufficient_data("num_bits_set"))?;
            for word in &mut filter.bits {
                *word = cursor
                    .read_u64_le()
                    .map_err(|_| Error::insufficient_data("bits"))?;
            }

            let actual: u64 = filter.bits.iter().map(|w| w.count_ones() as u64).sum();
            if actual != filter.num_bits_set {
                return Err(Error::deserial("bit count does not match bit array")
                    .with_context("recorded", filter.num_bits_set)
                    .with_context("actual", actual));
            }

            // The last word may pad past num_buckets; those bits are never
            // addressable and would skew the load statistics if set.
            let tail_bits = filter.num_buckets % 64;
            if tail_bits != 0 && filter.bits[filter.bits.len() - 1] >> tail_bits != 0 {
                return Err(Error::deserial("bit array has bits set beyond num_buckets")
                    .with_context("num_buckets", filter.num_buckets));
            }
        }

        Ok(filter)
    }

    fn get_bit(&self, bucket: u64) -> bool {
        let word = (bucket / 64) as usize;
        let mask = 1u64 << (bucket % 64);
        (self.bits[word] & mask) != 0
    }

    fn set_bit(&mut self, bucket: u64) {
        let word = (bucket / 64) as usize;
        let mask = 1u64 << (bucket % 64);
        if (self.bits[word] & mask) == 0 {
            self.bits[word] |= mask;
            self.num_bits_set += 1;
        }
    }
}

pub(crate) fn validate_shape(num_buckets: u64, num_hashes: u16) -> Result<(), Error> {
    if num_buckets == 0 {
        return Err(Error::config("num_buckets must be positive"));
    }
    if num_hashes == 0 {
        return Err(Error::config("num_hashes must be positive"));
    }
    if num_hashes > MAX_NUM_HASHES {
        return Err(Error::config("num_hashes is unreasonably large")
            .with_context("num_hashes", num_hashes)
            .with_context("max", MAX_NUM_HASHES));
    }
    Ok(())
}
