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

use crate::bloom::sketch::validate_shape;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::HashFamily;

// Serialization constants
const PREAMBLE_BYTES_EMPTY: u8 = 20;
const PREAMBLE_BYTES_STANDARD: u8 = 28;
const FAMILY_ID: u8 = 18;
const SERIAL_VERSION: u8 = 1;
const EMPTY_FLAG_MASK: u8 = 1 << 2;

const MIN_COUNTER_BITS: u8 = 1;
const MAX_COUNTER_BITS: u8 = 32;
// ~4 GB of counter state is a reasonable ceiling.
const MAX_TOTAL_BITS: u64 = 1 << 35;

/// A Bloom filter variant that supports deletion.
///
/// Each bucket holds a saturating counter of `bits_per_counter` bits instead
/// of a single bit: `insert` increments the addressed counters, `delete`
/// decrements them, and `contains` requires all of them to be positive. The
/// counter width bounds how many colliding keys one bucket can track; pushing
/// a counter past `2^bits_per_counter - 1` (or below zero) is a usage error,
/// surfaced as a typed error, never silently clamped.
///
/// Both failing operations are all-or-nothing: the addressed counters are
/// validated before any of them is written, so a failed insert or delete
/// leaves the filter bit-for-bit unchanged and usable.
///
/// # Examples
///
/// ```
/// use streamkit::bloom::CountingBloomFilter;
///
/// let mut filter = CountingBloomFilter::new(10_000, 3, 4).unwrap();
///
/// filter.insert("session-42").unwrap();
/// assert!(filter.contains(&"session-42"));
///
/// filter.delete("session-42").unwrap();
/// assert!(!filter.contains(&"session-42"));
///
/// // A second delete has nothing left to decrement.
/// assert!(filter.delete("session-42").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CountingBloomFilter {
    /// Hash family addressing the buckets
    family: HashFamily,
    /// Number of hash functions to use (h)
    num_hashes: u16,
    /// Number of counter buckets (m)
    num_buckets: u64,
    /// Width of each counter in bits
    bits_per_counter: u8,
    /// Saturation bound, `2^bits_per_counter - 1`
    max_count: u64,
    /// Counters bit-packed into u64 words; a counter may straddle two words
    words: Vec<u64>,
    /// Net number of successful inserts minus successful deletes
    items: u64,
}

impl CountingBloomFilter {
    /// Creates a filter with `num_buckets` counters of `bits_per_counter`
    /// bits each, addressed by `num_hashes` hash functions.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if `num_buckets` is zero, `num_hashes`
    /// is zero or greater than 100, `bits_per_counter` is outside `1..=32`,
    /// or the total counter state would exceed 4 GB.
    pub fn new(num_buckets: u64, num_hashes: u16, bits_per_counter: u8) -> Result<Self, Error> {
        Self::with_seed(num_buckets, num_hashes, bits_per_counter, DEFAULT_UPDATE_SEED)
    }

    /// Creates a filter with a custom hash seed.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn with_seed(
        num_buckets: u64,
        num_hashes: u16,
        bits_per_counter: u8,
        seed: u32,
    ) -> Result<Self, Error> {
        validate_shape(num_buckets, num_hashes)?;
        if !(MIN_COUNTER_BITS..=MAX_COUNTER_BITS).contains(&bits_per_counter) {
            return Err(Error::config("bits_per_counter must be in 1..=32")
                .with_context("bits_per_counter", bits_per_counter));
        }
        let total_bits = num_buckets
            .checked_mul(u64::from(bits_per_counter))
            .filter(|&bits| bits <= MAX_TOTAL_BITS)
            .ok_or_else(|| {
                Error::config("total counter state is too large")
                    .with_context("num_buckets", num_buckets)
                    .with_context("bits_per_counter", bits_per_counter)
            })?;

        let num_words = total_bits.div_ceil(64) as usize;
        Ok(CountingBloomFilter {
            family: HashFamily::with_seed(seed),
            num_hashes,
            num_buckets,
            bits_per_counter,
            max_count: (1u64 << bits_per_counter) - 1,
            words: vec![0u64; num_words],
            items: 0,
        })
    }

    /// Inserts an item, incrementing each addressed counter once per hash
    /// function.
    ///
    /// # Errors
    ///
    /// Returns a `CounterOverflow` error if any addressed counter would
    /// exceed the saturation bound `2^bits_per_counter - 1`. On failure no
    /// counter has been modified.
    pub fn insert<T: Hash>(&mut self, item: T) -> Result<(), Error> {
        let buckets = self.buckets_for(&item);

        // Validate the whole update before the first write. A bucket that
        // several hash functions map to receives one increment per function,
        // so pending increments from earlier positions count too.
        for (i, &bucket) in buckets.iter().enumerate() {
            let pending = count_earlier(&buckets, i);
            if self.counter(bucket) + pending >= self.max_count {
                return Err(Error::counter_overflow(bucket, self.max_count));
            }
        }

        for &bucket in &buckets {
            self.set_counter(bucket, self.counter(bucket) + 1);
        }
        self.items += 1;
        Ok(())
    }

    /// Deletes an item, decrementing each addressed counter once per hash
    /// function.
    ///
    /// Deleting a key that was never inserted, or more times than it was
    /// inserted, underflows (possibly a counter shared with another key).
    ///
    /// # Errors
    ///
    /// Returns a `CounterUnderflow` error if any addressed counter would
    /// drop below zero. On failure no counter has been modified.
    pub fn delete<T: Hash>(&mut self, item: T) -> Result<(), Error> {
        let buckets = self.buckets_for(&item);

        for (i, &bucket) in buckets.iter().enumerate() {
            let pending = count_earlier(&buckets, i);
            if self.counter(bucket) <= pending {
                return Err(Error::counter_underflow(bucket));
            }
        }

        for &bucket in &buckets {
            self.set_counter(bucket, self.counter(bucket) - 1);
        }
        self.items -= 1;
        Ok(())
    }

    /// Tests whether an item is possibly in the set.
    ///
    /// True only if every addressed counter is positive. As with the basic
    /// filter, `false` is definitive and `true` is probabilistic.
    pub fn contains<T: Hash>(&self, item: &T) -> bool {
        if self.is_empty() {
            return false;
        }

        let pair = self.family.fingerprint(item);
        (0..self.num_hashes).all(|i| {
            let bucket = HashFamily::slot(pair, u64::from(i), self.num_buckets);
            self.counter(bucket) > 0
        })
    }

    /// Returns whether the filter currently counts zero items.
    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Returns the net number of items currently counted (successful inserts
    /// minus successful deletes).
    pub fn items(&self) -> u64 {
        self.items
    }

    /// Returns the number of counter buckets.
    pub fn num_buckets(&self) -> u64 {
        self.num_buckets
    }

    /// Returns the number of hash functions used.
    pub fn num_hashes(&self) -> u16 {
        self.num_hashes
    }

    /// Returns the configured counter width in bits.
    pub fn bits_per_counter(&self) -> u8 {
        self.bits_per_counter
    }

    /// Returns the saturation bound of each counter.
    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    /// Serializes the filter to a byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let short_form = self.items == 0 && self.words.iter().all(|&w| w == 0);
        let preamble_bytes = if short_form {
            PREAMBLE_BYTES_EMPTY
        } else {
            PREAMBLE_BYTES_STANDARD
        };

        let capacity =
            preamble_bytes as usize + if short_form { 0 } else { self.words.len() * 8 };
        let mut bytes = SketchBytes::with_capacity(capacity);

        bytes.write_u8(preamble_bytes);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(FAMILY_ID);
        bytes.write_u8(if short_form { EMPTY_FLAG_MASK } else { 0 });
        bytes.write_u16_le(self.num_hashes);
        bytes.write_u8(self.bits_per_counter);
        bytes.write_u8(0); // reserved
        bytes.write_u32_le(self.family.seed());
        bytes.write_u64_le(self.num_buckets);

        if !short_form {
            bytes.write_u64_le(self.items);
            for &word in &self.words {
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
    /// is not a serialized [`CountingBloomFilter`], or carries an invalid
    /// shape.
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
            return Err(Error::invalid_family(
                FAMILY_ID,
                family_id,
                "CountingBloomFilter",
            ));
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
        let bits_per_counter = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("bits_per_counter"))?;
        let _reserved = cursor
            .read_u8()
            .map_err(|_| Error::insufficient_data("reserved"))?;
        let seed = cursor
            .read_u32_le()
            .map_err(|_| Error::insufficient_data("seed"))?;
        let num_buckets = cursor
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("num_buckets"))?;

        let mut filter = Self::with_seed(num_buckets, num_hashes, bits_per_counter, seed)
            .map_err(|e| Error::deserial("invalid filter shape").set_source(e))?;

        if (flags & EMPTY_FLAG_MASK) == 0 {
            filter.items = cursor
                .read_u64_le()
                .map_err(|_| Error::insufficient_data("items"))?;
            for word in &mut filter.words {
                *word = cursor
                    .read_u64_le()
                    .map_err(|_| Error::insufficient_data("counters"))?;
            }

            // Every successful insert adds num_hashes increments and every
            // delete removes as many, so the counter total determines items.
            let total: u128 = (0..filter.num_buckets)
                .map(|b| u128::from(filter.counter(b)))
                .sum();
            let expected = u128::from(filter.items) * u128::from(filter.num_hashes);
            if total != expected {
                return Err(Error::deserial("counter total does not match item count")
                    .with_context("items", filter.items)
                    .with_context("counter_total", total));
            }
        }

        Ok(filter)
    }

    /// Buckets addressed by the item, one per hash function, in function
    /// order and with duplicates preserved.
    fn buckets_for<T: Hash>(&self, item: &T) -> Vec<u64> {
        let pair = self.family.fingerprint(item);
        (0..self.num_hashes)
            .map(|i| HashFamily::slot(pair, u64::from(i), self.num_buckets))
            .collect()
    }

    /// Reads the counter at `bucket`.
    fn counter(&self, bucket: u64) -> u64 {
        let width = u64::from(self.bits_per_counter);
        let first_bit = bucket * width;
        let word = (first_bit / 64) as usize;
        let offset = first_bit % 64;
        let mask = (1u64 << width) - 1;

        let mut value = self.words[word] >> offset;
        if offset + width > 64 {
            value |= self.words[word + 1] << (64 - offset);
        }
        value & mask
    }

    /// Writes the counter at `bucket`. `value` must fit in the counter
    /// width.
    fn set_counter(&mut self, bucket: u64, value: u64) {
        debug_assert!(value <= self.max_count);

        let width = u64::from(self.bits_per_counter);
        let first_bit = bucket * width;
        let word = (first_bit / 64) as usize;
        let offset = first_bit % 64;
        let mask = (1u64 << width) - 1;

        // Shifts past the word boundary drop the high part, which is
        // exactly the part carried into the next word below.
        self.words[word] &= !(mask << offset);
        self.words[word] |= value << offset;

        if offset + width > 64 {
            let consumed = 64 - offset;
            self.words[word + 1] &= !(mask >> consumed);
            self.words[word + 1] |= value >> consumed;
        }
    }
}

/// Number of occurrences of `buckets[i]` among the positions before `i`.
fn count_earlier(buckets: &[u64], i: usize) -> u64 {
    let bucket = buckets[i];
    buckets[..i].iter().filter(|&&b| b == bucket).count() as u64
}
