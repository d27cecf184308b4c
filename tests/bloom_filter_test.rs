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
use googletest::prelude::ge;
use googletest::prelude::le;
use streamkit::bloom::BloomFilter;

#[test]
fn test_no_false_negatives() {
    // No false negatives, for any shape and insertion order.
    for (num_buckets, num_hashes) in [(100, 1), (1000, 3), (10_000, 7), (64, 5)] {
        let mut filter = BloomFilter::new(num_buckets, num_hashes).unwrap();

        for i in 0..500 {
            filter.insert(format!("key_{i}"));
        }
        for i in (0..500).rev() {
            assert!(
                filter.contains(&format!("key_{i}")),
                "false negative for key_{i} with shape ({num_buckets}, {num_hashes})"
            );
        }
    }
}

#[test]
fn test_false_positive_rate_tracks_theory() {
    // 5 keys into 100 buckets with 3 hashes: theory predicts a rate of
    // (1 - e^(-3*5/100))^3, about 0.0027. Probing 100,000 keys disjoint
    // from the inserted set should land within a small constant factor.
    let mut filter = BloomFilter::new(100, 3).unwrap();
    for i in 0..5 {
        filter.insert(format!("member_{i}"));
    }

    let probes = 100_000;
    let mut false_positives = 0u32;
    for i in 0..probes {
        if filter.contains(&format!("outsider_{i}")) {
            false_positives += 1;
        }
    }

    let rate = f64::from(false_positives) / f64::from(probes);
    let theory = (1.0 - (-3.0 * 5.0 / 100.0_f64).exp()).powi(3);
    assert_that!(rate, le(theory * 8.0));
    assert_that!(rate, ge(theory / 8.0));
}

#[test]
fn test_fpp_rises_with_load() {
    let mut filter = BloomFilter::new(1000, 3).unwrap();
    filter.insert("first");
    let lightly_loaded = filter.estimated_fpp();

    for i in 0..500 {
        filter.insert(format!("key_{i}"));
    }
    assert!(filter.estimated_fpp() > lightly_loaded);
}

#[test]
fn test_suggested_shape_hits_target_rate() {
    // Size the filter for 1,000 items at 1% and verify the empirical rate
    // is in the intended neighborhood once those items are inserted.
    let num_buckets = BloomFilter::suggest_num_buckets(1000, 0.01);
    let num_hashes = BloomFilter::suggest_num_hashes(1000, num_buckets);
    let mut filter = BloomFilter::new(num_buckets, num_hashes).unwrap();

    for i in 0..1000 {
        filter.insert(format!("member_{i}"));
    }

    let probes = 50_000;
    let mut false_positives = 0u32;
    for i in 0..probes {
        if filter.contains(&format!("outsider_{i}")) {
            false_positives += 1;
        }
    }

    let rate = f64::from(false_positives) / f64::from(probes);
    assert_that!(rate, le(0.03));
}

#[test]
fn test_serialized_filter_answers_identically() {
    let mut filter = BloomFilter::new(4096, 4).unwrap();
    for i in 0..300 {
        filter.insert(format!("key_{i}"));
    }

    let restored = BloomFilter::deserialize(&filter.serialize()).unwrap();
    for i in 0..2000 {
        let key = format!("key_{i}");
        assert_eq!(filter.contains(&key), restored.contains(&key));
    }
}
