// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Disk-backed memoization for lazily produced sequences.
//!
//! [`DiskCache`] wraps a producer of a finite sequence. The first pass
//! drains the producer while teeing every element to a temp file; only on
//! exhaustion is the file atomically promoted to the real cache file. Later
//! passes replay from disk without invoking the producer. Caching is purely
//! an optimization: if the cache cannot be written the sequence is passed
//! through uncached, and a corrupt cache file is discarded and recomputed.
//!
//! Not safe for concurrent re-entrant use within a process: a populate pass
//! must finish (or be discarded) before the cache file can be trusted, so
//! do not start a second pass while one is mid-flight.

pub mod cache;
pub mod error;
pub mod key;
pub mod store;

pub use cache::{CacheIter, DiskCache};
pub use error::{CacheError, Result};
pub use key::digest;
pub use store::{ScanIter, load, save, scan};
