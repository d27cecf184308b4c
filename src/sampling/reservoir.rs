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

use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;

/// A fixed-capacity uniform random sample over an unbounded stream.
///
/// The classic reservoir algorithm (Vitter's Algorithm R): the first
/// `capacity` items fill the reservoir, and item number `t > capacity` draws
/// a uniform position `p` in `[0, t)`, replacing slot `p` when `p <
/// capacity` and being discarded otherwise. By induction, after `t`
/// observations every item seen so far occupies a slot with probability
/// exactly `capacity / t`, and the reservoir is a uniform simple random
/// sample without replacement.
///
/// The random source is owned by the sampler and injectable, so a seeded
/// generator gives fully reproducible sampling runs.
///
/// # Examples
///
/// ```
/// use streamkit::sampling::ReservoirSampler;
///
/// let mut sampler = ReservoirSampler::new(10).unwrap();
/// for line in 0..100_000 {
///     sampler.observe(line);
/// }
///
/// assert_eq!(sampler.sample().len(), 10);
/// assert_eq!(sampler.n(), 100_000);
/// ```
#[derive(Debug, Clone)]
pub struct ReservoirSampler<T, R: RandomSource = XorShift64> {
    /// Random source for replacement draws
    rng: R,
    /// Maximum number of retained items (B)
    capacity: usize,
    /// Current sample, length = min(n, capacity)
    reservoir: Vec<T>,
    /// Number of items observed so far (t)
    n: u64,
}

impl<T> ReservoirSampler<T, XorShift64> {
    /// Creates a sampler retaining at most `capacity` items, with a
    /// time-seeded random source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        Self::with_rng(capacity, XorShift64::default())
    }
}

impl<T, R: RandomSource> ReservoirSampler<T, R> {
    /// Creates a sampler with a caller-supplied random source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigInvalid` error if `capacity` is zero.
    pub fn with_rng(capacity: usize, rng: R) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::config("capacity must be positive"));
        }

        Ok(ReservoirSampler {
            rng,
            capacity,
            reservoir: Vec::with_capacity(capacity),
            n: 0,
        })
    }

    /// Offers the next stream item to the reservoir.
    ///
    /// Exactly one random draw per item once the reservoir is full; no
    /// draws while it is filling.
    pub fn observe(&mut self, item: T) {
        self.n += 1;

        if self.reservoir.len() < self.capacity {
            self.reservoir.push(item);
            return;
        }

        // Position of this item among all n seen so far; landing inside
        // the reservoir evicts the previous occupant of that slot.
        let p = self.rng.next_u64_below(self.n);
        if (p as usize) < self.capacity {
            self.reservoir[p as usize] = item;
        }
    }

    /// Returns the current sample, of length `min(n, capacity)`.
    ///
    /// Reading the sample does not stop ingestion; further items may be
    /// observed afterwards.
    pub fn sample(&self) -> &[T] {
        &self.reservoir
    }

    /// Returns the number of items observed so far.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns the configured reservoir capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_in_stream_order() {
        let mut sampler = ReservoirSampler::with_rng(5, XorShift64::seeded(1)).unwrap();
        for i in 0..3 {
            sampler.observe(i);
        }
        assert_eq!(sampler.sample(), &[0, 1, 2]);
        assert_eq!(sampler.n(), 3);
    }

    #[test]
    fn test_size_is_min_of_n_and_capacity() {
        let mut sampler = ReservoirSampler::with_rng(8, XorShift64::seeded(2)).unwrap();
        for i in 0..1000u32 {
            sampler.observe(i);
            let expected = (sampler.n() as usize).min(8);
            assert_eq!(sampler.sample().len(), expected);
        }
    }

    #[test]
    fn test_sample_items_come_from_stream() {
        let mut sampler = ReservoirSampler::with_rng(16, XorShift64::seeded(3)).unwrap();
        for i in 0..10_000u32 {
            sampler.observe(i);
        }
        for &item in sampler.sample() {
            assert!(item < 10_000);
        }
    }

    #[test]
    fn test_observation_continues_after_read() {
        let mut sampler = ReservoirSampler::with_rng(4, XorShift64::seeded(4)).unwrap();
        for i in 0..100u32 {
            sampler.observe(i);
        }
        let before = sampler.sample().len();
        sampler.observe(100);
        assert_eq!(sampler.sample().len(), before);
        assert_eq!(sampler.n(), 101);
    }

    #[test]
    fn test_invalid_capacity() {
        use crate::error::ErrorKind;

        let result = ReservoirSampler::<u32>::new(0);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = ReservoirSampler::with_rng(10, XorShift64::seeded(99)).unwrap();
        let mut b = ReservoirSampler::with_rng(10, XorShift64::seeded(99)).unwrap();
        for i in 0..5000u32 {
            a.observe(i);
            b.observe(i);
        }
        assert_eq!(a.sample(), b.sample());
    }
}
