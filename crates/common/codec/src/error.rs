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

use snafu::Snafu;

/// Codec errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    /// Value could not be encoded to MessagePack.
    #[snafu(display("Failed to encode value"))]
    Encode { source: rmp_serde::encode::Error },

    /// Byte stream does not decode to a value of the expected shape.
    #[snafu(display("Failed to decode value"))]
    Decode { source: rmp_serde::decode::Error },

    /// A value was cut off mid-stream, e.g. by a truncated file.
    #[snafu(display("Value truncated after {bytes_into_value} bytes"))]
    Truncated {
        bytes_into_value: u64,
        source:           rmp_serde::decode::Error,
    },
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
