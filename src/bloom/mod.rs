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

//! Approximate set-membership filters with one-sided error.
//!
//! [`BloomFilter`] answers "was this item inserted?" with no false negatives
//! and a tunable false-positive rate, in a fixed-size bit array.
//!
//! [`CountingBloomFilter`] replaces each bit with a small saturating counter,
//! which buys a `delete` operation at a memory cost of `bits_per_counter`
//! per bucket. The basic filter cannot support deletion: a single bit may
//! have been set by several inserted keys, and clearing it for one key would
//! introduce false negatives for the others.
//!
//! # Usage
//!
//! ```rust
//! use streamkit::bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::new(10_000, 3).unwrap();
//! filter.insert("alice");
//!
//! assert!(filter.contains(&"alice"));
//! assert!(!filter.contains(&"mallory")); // almost certainly
//! ```

mod counting;
mod sketch;

pub use self::counting::CountingBloomFilter;
pub use self::sketch::BloomFilter;
