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

//! Cache key derivation.
//!
//! Cache keys are explicit: the caller owns the identity of a cached
//! producer and passes a key string to [`DiskCache`](crate::DiskCache).
//! For parameterized producers, [`digest`] folds the parameters into a
//! short stable hex string that stays within file name limits.

use sha2::{Digest, Sha256};

/// Length of a derived key in hex characters.
const DIGEST_LEN: usize = 16;

/// Derives a short stable cache key from a sequence of string parts.
///
/// Parts are length-separated before hashing, so `["ab", "c"]` and
/// `["a", "bc"]` produce different keys.
pub fn digest<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        let part = part.as_ref();
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }

    let hash = hasher.finalize();
    let mut key = String::with_capacity(DIGEST_LEN);
    for byte in &hash[..DIGEST_LEN / 2] {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(digest(["fetch", "2026"]), digest(["fetch", "2026"]));
    }

    #[test]
    fn test_digest_is_short_hex() {
        let key = digest(["anything"]);
        assert_eq!(key.len(), DIGEST_LEN);
        assert!(key.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_differs_per_argument() {
        assert_ne!(digest(["fetch", "2026"]), digest(["fetch", "2027"]));
    }

    #[test]
    fn test_digest_separates_parts() {
        assert_ne!(digest(["ab", "c"]), digest(["a", "bc"]));
    }
}
