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

//! One stream, several consumers: the typical deployment feeds the same
//! one-pass record iterator into independent structures for different
//! analytical questions.

use googletest::assert_that;
use googletest::prelude::ge;
use googletest::prelude::le;
use streamkit::bloom::BloomFilter;
use streamkit::fm::FmSketch;
use streamkit::sampling::ReservoirSampler;

/// A synthetic log of 7,637 distinct IP-address strings.
fn ip_stream() -> impl Iterator<Item = String> {
    (0..7637u32).map(|i| format!("10.{}.{}.{}", i / 65_536, (i / 256) % 256, i % 256))
}

#[test]
fn test_distinct_ip_estimate() {
    let mut sketch = FmSketch::new(128, 8).unwrap();
    for ip in ip_stream() {
        sketch.update(ip);
    }

    // Order-of-magnitude check for 7,637 distinct addresses.
    let estimate = sketch.estimate();
    assert_that!(estimate, ge(4000.0));
    assert_that!(estimate, le(14_000.0));
}

#[test]
fn test_every_seen_ip_is_reported_present() {
    let mut filter = BloomFilter::new(10_000, 3).unwrap();
    for ip in ip_stream() {
        filter.insert(ip);
    }

    for ip in ip_stream() {
        assert!(filter.contains(&ip), "false negative for {ip}");
    }
}

#[test]
fn test_single_pass_feeds_all_consumers() {
    let mut sketch = FmSketch::new(128, 8).unwrap();
    let mut filter = BloomFilter::new(10_000, 3).unwrap();
    let mut reservoir = ReservoirSampler::new(25).unwrap();

    // One pass; no component sees the stream twice.
    for ip in ip_stream() {
        sketch.update(&ip);
        filter.insert(&ip);
        reservoir.observe(ip);
    }

    assert_eq!(sketch.n(), 7637);
    assert_eq!(reservoir.n(), 7637);
    assert_eq!(reservoir.sample().len(), 25);
    assert!(filter.contains(&"10.0.0.0".to_string()));
}
