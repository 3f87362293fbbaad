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

/// Queue operation errors.
///
/// Filesystem failures during normal reads and writes propagate to the
/// caller; checkpoint failures always propagate (a silently lost checkpoint
/// means silent reprocessing on the next run).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueueError {
    /// Project root directory could not be created.
    #[snafu(display("Failed to create project directory {}", path.display()))]
    Directory {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Queue name is empty or would escape the project directory.
    #[snafu(display("Invalid queue name {name:?}"))]
    InvalidName { name: String },

    /// Project directory could not be listed for segment files.
    #[snafu(display("Failed to list segments under {}", path.display()))]
    ListSegments {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Segment file could not be opened.
    #[snafu(display("Failed to open segment {}", path.display()))]
    OpenSegment {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Append or flush to a segment file failed.
    #[snafu(display("Failed to write segment {}", path.display()))]
    WriteSegment {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Record could not be encoded.
    #[snafu(display("Failed to encode record"))]
    EncodeRecord { source: CodecError },

    /// Segment contains bytes that do not decode as a record.
    #[snafu(display("Corrupted segment {filename}"))]
    DecodeRecord {
        filename: String,
        source:   CodecError,
    },

    /// Consumed segment could not be unlinked during cleanup.
    #[snafu(display("Failed to unlink consumed segment {}", path.display()))]
    Cleanup {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Checkpoint file could not be read.
    #[snafu(display("Failed to read checkpoint {}", path.display()))]
    ReadCheckpoint {
        path:   PathBuf,
        source: std::io::Error,
    },

    /// Checkpoint file exists but does not decode.
    #[snafu(display("Corrupted checkpoint {}", path.display()))]
    DecodeCheckpoint {
        path:   PathBuf,
        source: CodecError,
    },

    /// Checkpoint position could not be encoded.
    #[snafu(display("Failed to encode checkpoint"))]
    EncodeCheckpoint { source: CodecError },

    /// Checkpoint file could not be written or atomically replaced.
    #[snafu(display("Failed to write checkpoint {}", path.display()))]
    WriteCheckpoint {
        path:   PathBuf,
        source: std::io::Error,
    },
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
