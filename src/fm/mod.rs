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

//! Flajolet-Martin sketch for approximate distinct counting.
//!
//! The sketch tracks, per hash function, the maximum number of trailing zero
//! bits observed across all items, and aggregates the per-function estimates
//! with a median-of-means scheme. Memory is fixed at construction and
//! independent of both stream length and true cardinality.
//!
//! # Usage
//!
//! ```rust
//! use streamkit::fm::FmSketch;
//!
//! let mut sketch = FmSketch::new(128, 8).unwrap();
//!
//! for user in ["alice", "bob", "carol", "alice"] {
//!     sketch.update(user);
//! }
//!
//! // Three distinct users; the estimate is approximate.
//! assert!(sketch.estimate() >= 1.0);
//! assert_eq!(sketch.n(), 4);
//! ```

mod sketch;

pub use self::sketch::FmSketch;
