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

use googletest::assert_that;
use googletest::prelude::near;
use streamkit::common::RandomSource;
use streamkit::common::XorShift64;
use streamkit::sampling::KeyedSampler;
use streamkit::sampling::ReservoirSampler;

#[test]
fn test_keyed_decision_is_consistent() {
    let sampler = KeyedSampler::new(1, 10).unwrap();
    let first = sampler.accept(&"user_alpha");
    for _ in 0..1000 {
        assert_eq!(sampler.accept(&"user_alpha"), first);
    }
}

#[test]
fn test_keyed_acceptance_rate() {
    // 100,000 distinct keys at rate 1/10 should accept close to 10%.
    let sampler = KeyedSampler::new(1, 10).unwrap();

    let total = 100_000;
    let accepted = (0..total)
        .filter(|i| sampler.accept(&format!("user_{i}")))
        .count();

    let fraction = accepted as f64 / total as f64;
    assert_that!(fraction, near(0.10, 0.01));
}

#[test]
fn test_keyed_sampling_is_per_key_not_per_record() {
    // Feed every key 5 times; the accepted record count must be exactly
    // 5 times the accepted key count, which per-record coin flipping
    // would not produce.
    let sampler = KeyedSampler::new(3, 10).unwrap();

    let mut accepted_keys = 0u32;
    let mut accepted_records = 0u32;
    for i in 0..10_000 {
        let key = format!("user_{i}");
        if sampler.accept(&key) {
            accepted_keys += 1;
        }
        for _ in 0..5 {
            if sampler.accept(&key) {
                accepted_records += 1;
            }
        }
    }

    assert_eq!(accepted_records, accepted_keys * 5);
}

#[test]
fn test_reservoir_size() {
    for (n, capacity) in [(3u64, 10usize), (10, 10), (5000, 10), (1, 1)] {
        let mut sampler =
            ReservoirSampler::with_rng(capacity, XorShift64::seeded(7)).unwrap();
        for i in 0..n {
            sampler.observe(i);
        }
        assert_eq!(sampler.sample().len(), (n as usize).min(capacity));
        assert_eq!(sampler.n(), n);
    }
}

#[test]
fn test_reservoir_uniformity() {
    // 100,000 independent reservoirs of capacity 3 over the same 10
    // labeled items: each item should end up retained close to 3/10 of
    // the time. Trial generators are seeded from one master generator so
    // the whole run is reproducible.
    const TRIALS: u64 = 100_000;
    const ITEMS: usize = 10;
    const CAPACITY: usize = 3;

    let mut master = XorShift64::seeded(0xA5A5_5A5A);
    let mut retained = [0u64; ITEMS];

    for _ in 0..TRIALS {
        let mut sampler =
            ReservoirSampler::with_rng(CAPACITY, XorShift64::seeded(master.next_u64()))
                .unwrap();
        for item in 0..ITEMS {
            sampler.observe(item);
        }
        for &item in sampler.sample() {
            retained[item] += 1;
        }
    }

    for &count in retained.iter() {
        let fraction = count as f64 / TRIALS as f64;
        assert_that!(fraction, near(CAPACITY as f64 / ITEMS as f64, 0.02));
    }
}

#[test]
fn test_reservoir_long_stream_keeps_late_items_reachable() {
    // Items from the tail of a long stream must still appear: a sampler
    // that stopped replacing would only ever hold the head.
    let mut sampler = ReservoirSampler::with_rng(100, XorShift64::seeded(11)).unwrap();
    for i in 0..100_000u64 {
        sampler.observe(i);
    }

    let late = sampler.sample().iter().filter(|&&i| i >= 50_000).count();
    // Expect about half; anything above zero proves replacement, the
    // margin guards against a biased draw.
    assert!(late > 25, "only {late} of 100 samples from the second half");
}

#[test]
fn test_keyed_and_reservoir_compose_on_one_stream() {
    // The typical pipeline: one pass, each component consuming the same
    // records independently.
    let sampler = KeyedSampler::new(1, 4).unwrap();
    let mut reservoir =
        ReservoirSampler::with_rng(50, XorShift64::seeded(21)).unwrap();

    let mut accepted = 0u32;
    for i in 0..20_000 {
        let record = format!("event_{i}");
        if sampler.accept(&record) {
            accepted += 1;
        }
        reservoir.observe(record);
    }

    assert_that!(f64::from(accepted) / 20_000.0, near(0.25, 0.02));
    assert_eq!(reservoir.sample().len(), 50);
    assert_eq!(reservoir.n(), 20_000);
}
