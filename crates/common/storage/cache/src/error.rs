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

use std::path::PathBuf;

use snafu::Snafu;
use spool_codec::CodecError;

/// Cache operation errors.
///
/// `CreateDir`/`Create`/`Encode`/`Write`/`Promote` are write-side failures;
/// [`DiskCache`](crate::DiskCache) recovers from them internally by running
/// uncached. `Open`/`Decode` are read-side failures surfaced during replay;
/// the corrupt file is removed so the next pass recomputes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CacheError {
    /// Cache directory could not be created.
    #[snafu(display("Failed to create cache directory {}", path.display()))]
    CreateDir {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Cache key is empty or not usable as a file name.
    #[snafu(display("Invalid cache key {key:?}"))]
    InvalidKey { key: String },

    /// Cache or temp file could not be created.
    #[snafu(display("Failed to create cache file {}", path.display()))]
    Create {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Element could not be encoded into the cache file.
    #[snafu(display("Failed to encode cached value"))]
    Encode { source: CodecError },

    /// Raw write or sync of a cache file failed.
    #[snafu(display("Failed to write cache file {}", path.display()))]
    Write {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Completed temp file could not be renamed into place.
    #[snafu(display("Failed to promote cache file {} to {}", from.display(), to.display()))]
    Promote {
        from:   PathBuf,
        to:     PathBuf,
        source: std::io::Error,
    },

    /// Cache file could not be opened for replay.
    #[snafu(display("Failed to open cache file {}", path.display()))]
    Open {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Cache file contains bytes that do not decode.
    #[snafu(display("Corrupted cache file {}", path.display()))]
    Decode {
        path:   PathBuf,
        source: CodecError,
    },

    /// Cache file could not be removed.
    #[snafu(display("Failed to clear cache file {}", path.display()))]
    Clear {
        path:   PathBuf,
        source: std::io::Error,
    },
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
