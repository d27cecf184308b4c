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

//! The indexed hash family shared by all sketches and samplers.
//!
//! Every structure in this crate needs many "different" hash functions, but
//! engineering k independent functions is unnecessary: a single 128-bit
//! MurmurHash3 digest `(h1, h2)` yields an entire family via the
//! Kirsch-Mitzenmacher combination `h1 + index * h2`, which preserves the
//! uniformity guarantees the sketches rely on. The family index acts as a
//! salt; deriving members by mangling the input key itself (for example by
//! repeating the string) can correlate supposedly independent outputs and is
//! deliberately not supported.

use std::hash::Hash;
use std::hash::Hasher;

use mur3::Hasher128;

/// The seed 9001 used by default for all hashing in this crate.
///
/// Choosing a seed is somewhat arbitrary. What matters is that two structures
/// that must agree on hash values (for example a filter and a serialized copy
/// of it) are built with the same seed; the seed is therefore carried in
/// every serialized form.
pub const DEFAULT_UPDATE_SEED: u32 = 9001;

/// A family of deterministic hash functions indexed by an integer.
///
/// For a fixed seed, [`fingerprint`](HashFamily::fingerprint) is a pure
/// function of the key, and each family index derives a distinct member from
/// that fingerprint. Members behave as approximately independent hash
/// functions over the same key domain.
///
/// # Examples
///
/// ```
/// use streamkit::hash::HashFamily;
///
/// let family = HashFamily::default();
/// let first = family.index_of(&"key", 0, 1000);
/// let again = family.index_of(&"key", 0, 1000);
/// assert_eq!(first, again);
/// assert!(first < 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashFamily {
    seed: u32,
}

impl Default for HashFamily {
    fn default() -> Self {
        Self::with_seed(DEFAULT_UPDATE_SEED)
    }
}

impl HashFamily {
    /// Creates a family from the given seed.
    pub const fn with_seed(seed: u32) -> Self {
        Self { seed }
    }

    /// Returns the seed this family was built with.
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Computes the 128-bit MurmurHash3 digest pair for an item.
    ///
    /// The pair is the expensive part of a lookup; callers addressing
    /// several family members for one key compute it once and derive each
    /// member with [`slot`](Self::slot) or [`member64`](Self::member64).
    pub fn fingerprint<T: Hash + ?Sized>(&self, item: &T) -> (u64, u64) {
        let mut hasher = Hasher128::with_seed(self.seed);
        item.hash(&mut hasher);
        hasher.finish128()
    }

    /// Derives family member `index` as a full-width 64-bit value.
    pub fn member64(pair: (u64, u64), index: u64) -> u64 {
        pair.0.wrapping_add(index.wrapping_mul(pair.1))
    }

    /// Derives family member `index` reduced into `[0, range)`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is zero.
    pub fn slot(pair: (u64, u64), index: u64, range: u64) -> u64 {
        Self::member64(pair, index) % range
    }

    /// Hashes `item` under family member `index` into `[0, range)`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is zero.
    pub fn index_of<T: Hash + ?Sized>(&self, item: &T, index: u64, range: u64) -> u64 {
        Self::slot(self.fingerprint(item), index, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let family = HashFamily::default();
        for index in 0..16 {
            assert_eq!(
                family.index_of(&"determinism", index, 1 << 20),
                family.index_of(&"determinism", index, 1 << 20),
            );
        }
    }

    #[test]
    fn test_range_containment() {
        let family = HashFamily::default();
        for range in [1u64, 2, 3, 10, 100, 1 << 33] {
            for i in 0..64 {
                let key = format!("key_{i}");
                assert!(family.index_of(&key, i, range) < range);
            }
        }
    }

    #[test]
    fn test_indexes_disagree() {
        // Distinct family members should produce distinct values for most
        // keys; over a large range, 8 members colliding pairwise on the same
        // key would indicate a broken derivation.
        let family = HashFamily::default();
        let pair = family.fingerprint(&"index independence");
        let values: Vec<u64> = (0..8).map(|i| HashFamily::slot(pair, i, 1 << 40)).collect();
        let mut deduped = values.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(values.len(), deduped.len());
    }

    #[test]
    fn test_seeds_disagree() {
        let a = HashFamily::with_seed(1);
        let b = HashFamily::with_seed(2);
        assert_ne!(a.fingerprint(&"seed"), b.fingerprint(&"seed"));
    }
}
