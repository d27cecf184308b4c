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

//! # Streamkit
//!
//! Probabilistic data structures for one-pass stream processing with bounded
//! memory: approximate distinct counting, set-membership filters, and
//! fixed-size stream sampling.
//!
//! All structures share the same model: a caller feeds items from an
//! unbounded stream one at a time, each item is folded into a fixed amount of
//! state, and a result can be read back at any point without stopping
//! ingestion. Exactness is traded for space, governed by hashing and
//! randomization.
//!
//! This library is divided into modules that constitute distinct groups of
//! functionality:
//!
//! - [`fm`]: Flajolet-Martin distinct counting ([`FmSketch`](fm::FmSketch))
//! - [`bloom`]: membership filters ([`BloomFilter`](bloom::BloomFilter) and
//!   the deletable [`CountingBloomFilter`](bloom::CountingBloomFilter))
//! - [`sampling`]: stream samplers ([`ReservoirSampler`](sampling::ReservoirSampler)
//!   and the per-key [`KeyedSampler`](sampling::KeyedSampler))
//! - [`hash`]: the indexed hash family shared by all of the above
//! - [`common`]: the injectable random source used by the samplers
//! - [`error`]: the error type returned by all fallible operations

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

mod codec;

pub mod bloom;
pub mod common;
pub mod error;
pub mod fm;
pub mod hash;
pub mod sampling;
