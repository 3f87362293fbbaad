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

//! Disk-backed memoization of a lazily produced sequence.
//!
//! The cache file lifecycle is `absent -> <key>.cache.tmp (being written)
//! -> <key>.cache (complete)`. Only an atomic rename on producer exhaustion
//! marks a file complete, so a crash or an abandoned pass can never leave a
//! truncated file that later replays as if it were the whole sequence.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use snafu::{IntoError, ResultExt, ensure};
use spool_codec::StreamDecoder;
use tracing::{debug, warn};

use crate::{
    Result,
    error::{CacheError, ClearSnafu, CreateDirSnafu, DecodeSnafu, EncodeSnafu, InvalidKeySnafu},
};

/// Disk-backed cache handle for one producer of a finite sequence.
///
/// The handle is explicit state the caller holds and passes around; there
/// is no process-wide registry. Not safe for concurrent re-entrant use:
/// finish (or drop) one [`iter`](DiskCache::iter) pass before starting the
/// next.
pub struct DiskCache<F> {
    path:     PathBuf,
    tmp_path: PathBuf,
    producer: F,
}

impl<F, I, T> DiskCache<F>
where
    F: Fn() -> I,
    I: IntoIterator<Item = T>,
    T: Serialize + DeserializeOwned,
{
    /// Creates a cache handle for `producer` keyed by `key` under `dir`.
    ///
    /// The directory is created if missing. Use [`digest`](crate::digest)
    /// to derive a key from producer parameters.
    pub fn new<P: AsRef<Path>>(dir: P, key: &str, producer: F) -> Result<Self> {
        let dir = dir.as_ref();
        ensure!(
            !key.is_empty() && !key.starts_with('.') && !key.contains(['/', '\\']),
            InvalidKeySnafu { key }
        );
        std::fs::create_dir_all(dir).context(CreateDirSnafu { path: dir })?;

        Ok(Self {
            path:     dir.join(format!("{key}.cache")),
            tmp_path: dir.join(format!("{key}.cache.tmp")),
            producer,
        })
    }

    /// Path of the (complete) cache file.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Starts one pass over the sequence.
    ///
    /// With a complete cache file on disk this replays it from the
    /// beginning without invoking the producer; each call starts a fresh
    /// read. Otherwise the producer runs and every element is teed to the
    /// temp file, which becomes the cache file once the producer is
    /// exhausted. If the temp file cannot be created the pass runs
    /// uncached.
    pub fn iter(&self) -> CacheIter<I::IntoIter> {
        if self.path.exists() {
            match File::open(&self.path) {
                Ok(file) => {
                    debug!(path = %self.path.display(), "Replaying cached sequence");
                    return CacheIter {
                        state: State::Replay {
                            decoder: StreamDecoder::new(BufReader::new(file)),
                            path:    self.path.clone(),
                        },
                    };
                }
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        error = ?err,
                        "Failed to open cache file; recomputing"
                    );
                }
            }
        }

        let inner = (self.producer)().into_iter();
        match File::create(&self.tmp_path) {
            Ok(file) => CacheIter {
                state: State::Populate {
                    inner,
                    tee: Some(TeeFile {
                        file,
                        tmp_path: self.tmp_path.clone(),
                        final_path: self.path.clone(),
                        promoted: false,
                    }),
                },
            },
            Err(err) => {
                warn!(
                    path = %self.tmp_path.display(),
                    error = ?err,
                    "Cannot create cache temp file; running uncached"
                );
                CacheIter {
                    state: State::Passthrough { inner },
                }
            }
        }
    }

    /// Removes the cache file and any in-progress temp file.
    ///
    /// Idempotent; missing files are not an error.
    pub fn clear(&self) -> Result<()> {
        for path in [&self.path, &self.tmp_path] {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "Cleared cache file"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err).context(ClearSnafu { path }),
            }
        }
        Ok(())
    }
}

/// One pass over a cached sequence.
///
/// Yields `Err` only on the replay path, when the cache file turns out to
/// be corrupt; populate and passthrough passes always yield the producer's
/// elements.
pub struct CacheIter<I> {
    state: State<I>,
}

enum State<I> {
    /// Reading back a complete cache file.
    Replay {
        decoder: StreamDecoder<BufReader<File>>,
        path:    PathBuf,
    },
    /// Draining the producer while teeing elements to the temp file.
    Populate { inner: I, tee: Option<TeeFile> },
    /// Producer without caching, after a write-side failure.
    Passthrough { inner: I },
    Exhausted,
}

impl<I> Iterator for CacheIter<I>
where
    I: Iterator,
    I::Item: Serialize + DeserializeOwned,
{
    type Item = Result<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            State::Replay { decoder, path } => match decoder.next_value::<I::Item>() {
                Ok(Some(value)) => Some(Ok(value)),
                Ok(None) => {
                    self.state = State::Exhausted;
                    None
                }
                Err(source) => {
                    let path = path.clone();
                    // Discard the corrupt file so the next pass recomputes.
                    if let Err(remove_err) = std::fs::remove_file(&path) {
                        warn!(
                            path = %path.display(),
                            error = ?remove_err,
                            "Failed to remove corrupt cache file"
                        );
                    } else {
                        warn!(path = %path.display(), "Removed corrupt cache file");
                    }
                    self.state = State::Exhausted;
                    Some(Err(DecodeSnafu { path }.into_error(source)))
                }
            },
            State::Populate { inner, tee } => match inner.next() {
                Some(value) => {
                    if let Some(active) = tee.as_mut() {
                        if let Err(err) = active.append(&value) {
                            warn!(error = ?err, "Cache write failed; continuing uncached");
                            *tee = None;
                        }
                    }
                    Some(Ok(value))
                }
                None => {
                    if let Some(finished) = tee.take() {
                        if let Err(err) = finished.promote() {
                            warn!(error = ?err, "Failed to finalize cache file; next pass recomputes");
                        }
                    }
                    self.state = State::Exhausted;
                    None
                }
            },
            State::Passthrough { inner } => inner.next().map(Ok),
            State::Exhausted => None,
        }
    }
}

/// Temp cache file being populated.
///
/// Dropped without [`promote`](TeeFile::promote), the temp file is removed:
/// an interrupted pass leaves no complete-looking file behind.
struct TeeFile {
    file:       File,
    tmp_path:   PathBuf,
    final_path: PathBuf,
    promoted:   bool,
}

impl TeeFile {
    fn append<T: Serialize>(&mut self, value: &T) -> Result<()> {
        spool_codec::write_value(&mut self.file, value).context(EncodeSnafu)
    }

    fn promote(mut self) -> Result<()> {
        self.file.sync_all().map_err(|source| CacheError::Write {
            path: self.tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&self.tmp_path, &self.final_path).map_err(|source| {
            CacheError::Promote {
                from: self.tmp_path.clone(),
                to:   self.final_path.clone(),
                source,
            }
        })?;
        self.promoted = true;
        debug!(path = %self.final_path.display(), "Cache file complete");
        Ok(())
    }
}

impl Drop for TeeFile {
    fn drop(&mut self) {
        if !self.promoted && std::fs::remove_file(&self.tmp_path).is_ok() {
            debug!(path = %self.tmp_path.display(), "Discarded partial cache file");
        }
    }
}
