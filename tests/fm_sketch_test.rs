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
use streamkit::error::ErrorKind;
use streamkit::fm::FmSketch;

#[test]
fn test_empty() {
    let sketch = FmSketch::new(128, 8).unwrap();
    assert!(sketch.is_empty());
    assert_eq!(sketch.estimate(), 0.0);
}

#[test]
fn test_estimate_invariant_under_duplicates() {
    // The same 500-key set, once as a plain pass and once as a multiset
    // with 10,000 total occurrences, must give identical estimates.
    let mut once = FmSketch::new(128, 8).unwrap();
    for i in 0..500 {
        once.update(format!("key_{i}"));
    }

    let mut repeated = FmSketch::new(128, 8).unwrap();
    for round in 0..20 {
        for i in 0..500 {
            // Vary the order between rounds as a stream would.
            let key = (i * 7 + round) % 500;
            repeated.update(format!("key_{key}"));
        }
    }

    assert_eq!(repeated.n(), 10_000);
    assert_eq!(once.estimate(), repeated.estimate());
}

#[test]
fn test_estimate_order_of_magnitude() {
    // 1,000 known-distinct keys with k=128 (8 groups of 16). The estimator
    // is probabilistic and power-of-two quantized, so this asserts the
    // order of magnitude, not the exact value.
    let mut sketch = FmSketch::new(128, 8).unwrap();
    for i in 0..1000 {
        sketch.update(format!("distinct_key_{i:05}"));
    }

    let estimate = sketch.estimate();
    assert_that!(estimate, ge(400.0));
    assert_that!(estimate, le(2500.0));
}

#[test]
fn test_estimate_grows_with_cardinality() {
    let mut sketch = FmSketch::new(128, 8).unwrap();

    for i in 0..100 {
        sketch.update(format!("key_{i}"));
    }
    let at_hundred = sketch.estimate();

    for i in 100..100_000 {
        sketch.update(format!("key_{i}"));
    }
    let at_hundred_thousand = sketch.estimate();

    assert!(at_hundred_thousand > at_hundred * 10.0);
}

#[test]
fn test_estimation_does_not_stop_ingestion() {
    let mut sketch = FmSketch::new(64, 8).unwrap();
    for i in 0..100 {
        sketch.update(i);
        let _ = sketch.estimate();
    }
    assert_eq!(sketch.n(), 100);
}

#[test]
fn test_config_errors_are_immediate() {
    // 120 trackers cannot be split into 16 equal groups.
    let err = FmSketch::new(120, 16).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[test]
fn test_serialization_preserves_estimate() {
    let mut sketch = FmSketch::new(128, 8).unwrap();
    for i in 0..2500 {
        sketch.update(format!("key_{i}"));
    }

    let restored = FmSketch::deserialize(&sketch.serialize()).unwrap();
    assert_eq!(restored.estimate(), sketch.estimate());
    assert_eq!(restored.n(), sketch.n());
}
