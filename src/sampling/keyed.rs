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

use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::hash::HashFamily;

/// A deterministic per-key sampler with target inclusion rate `a/b`.
///
/// A key is accepted when its hash lands in the first `a` of `b` buckets.
/// For a fixed configuration and seed the decision is a pure function of the
/// key: every occurrence of a key is consistently accepted or consistently
/// rejected, which is the property that distinguishes this from flipping a
/// coin per record. The expected fraction of *distinct keys* accepted is
/// `a/b`.
///
/// The sampler holds no per-key state; whatever collection of accepted
/// records is needed belongs to the caller.
///
/// # Examples
///
/// ```
/// use streamkit::sampling::KeyedSampler;
///
/// // Keep one user in ten.
/// let sampler = KeyedSampler::new(1, 10).unwrap();
///
/// let decision = sampler.accept(&"user-1001");
/// // The same key always gets the same decision.
/// assert_eq!(sampler.accept(&"user-1001"), decision);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedSampler {
    /// Hash family deciding acceptance
    family: HashFamily,
    /// Number of accepting buckets (a)
    numerator: u64,
    /// Total number of buckets (b)
    modulus: u64,
}

impl KeyedSampler {
    /// Creates a sampler accepting keys at rate `numerator / modulus`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error unless `0 < numerator <= modulus`.
    pub fn new(numerator: u64, modulus: u64) -> Result<Self, Error> {
        Self::with_seed(numerator, modulus, DEFAULT_UPDATE_SEED)
    }

    /// Creates a sampler with a custom hash seed.
    ///
    /// Different seeds select different (but still deterministic) subsets of
    /// the key space.
    ///
    /// # Errors
    ///
    /// Same conditions as [`new`](Self::new).
    pub fn with_seed(numerator: u64, modulus: u64, seed: u32) -> Result<Self, Error> {
        if modulus == 0 {
            return Err(Error::config("modulus must be positive"));
        }
        if numerator == 0 {
            return Err(Error::config("numerator must be positive"));
        }
        if numerator > modulus {
            return Err(Error::config("numerator must not exceed modulus")
                .with_context("numerator", numerator)
                .with_context("modulus", modulus));
        }

        Ok(KeyedSampler {
            family: HashFamily::with_seed(seed),
            numerator,
            modulus,
        })
    }

    /// Returns whether records with this key belong to the sample.
    pub fn accept<T: Hash + ?Sized>(&self, key: &T) -> bool {
        self.family.index_of(key, 0, self.modulus) < self.numerator
    }

    /// Returns the configured inclusion rate `a/b`.
    pub fn rate(&self) -> f64 {
        self.numerator as f64 / self.modulus as f64
    }
}
