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

//! Bounded-memory sampling over unbounded streams.
//!
//! Two independent strategies:
//!
//! - [`KeyedSampler`] accepts or rejects *keys* deterministically at a target
//!   rate, so that every record sharing a key gets the same decision. Use it
//!   when downstream analysis aggregates per key ("what fraction of users"),
//!   where sampling records by position would give arbitrarily wrong
//!   answers.
//! - [`ReservoirSampler`] keeps a fixed-size uniform random sample of
//!   *records*, each item seen so far occupying a slot with equal
//!   probability regardless of stream length.

mod keyed;
mod reservoir;

pub use self::keyed::KeyedSampler;
pub use self::reservoir::ReservoirSampler;
