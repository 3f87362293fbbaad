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

//! Ordered, resumable reader across rotated segments.
//!
//! A [`Source`] captures the segment list once at construction and reads
//! the segments back in name order, which is write order. Each successful
//! read advances an internal position; a source built by
//! [`continue_source`](crate::Project::continue_source) persists that
//! position as the queue's checkpoint when it is closed or dropped.
//!
//! Segments written after construction are not picked up (no tailing), and
//! an exhausted source stays exhausted until [`reset`](Source::reset).

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use spool_codec::{Record, StreamDecoder};
use tracing::{debug, error, info};

use crate::{
    Result,
    checkpoint::{CheckpointStore, ReadPosition},
    error::{CleanupSnafu, DecodeRecordSnafu, OpenSegmentSnafu},
    path::segment_files,
};

/// One record read from a queue, together with where it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    /// Segment file name the record came from.
    pub filename: String,
    /// Zero-based index of the record within its segment.
    pub index:    u64,
    /// The decoded record.
    pub record:   Record,
}

/// Sequential reader for one queue name.
pub struct Source {
    name:             String,
    files:            Vec<PathBuf>,
    /// Index into `files` of the next segment to open.
    next_file:        usize,
    /// Where reading started: segment index and, for a checkpoint resume,
    /// the record index to skip through in that segment.
    initial_file:     usize,
    initial_skip:     Option<u64>,
    current:          Option<SegmentReader>,
    /// Highest index into `files` such that every segment up to and
    /// including it has been read (or skipped) to the end.
    consumed_through: Option<usize>,
    /// Most recently yielded position.
    last:             Option<ReadPosition>,
    /// Present when this source persists its position on close.
    checkpoint:       Option<CheckpointStore>,
    finalized:        bool,
}

struct SegmentReader {
    filename:     String,
    decoder:      StreamDecoder<BufReader<File>>,
    next_index:   u64,
    /// Records with `index <= skip_through` were already consumed by an
    /// earlier run and are decoded but not yielded.
    skip_through: Option<u64>,
}

impl Source {
    pub(crate) fn new(
        dir: &Path,
        name: String,
        start_after: Option<ReadPosition>,
        checkpoint: Option<CheckpointStore>,
    ) -> Result<Self> {
        let files = segment_files(dir, &name)?;

        let (initial_file, initial_skip) = match start_after {
            None => (0, None),
            Some(position) => {
                match files
                    .iter()
                    .position(|path| file_name_of(path) == position.filename)
                {
                    Some(idx) => (idx, Some(position.record_index)),
                    None => {
                        if !files.is_empty() {
                            info!(
                                queue = %name,
                                filename = %position.filename,
                                "Checkpointed segment is gone; resuming from earliest remaining"
                            );
                        }
                        (0, None)
                    }
                }
            }
        };

        Ok(Self {
            name,
            files,
            next_file: initial_file,
            initial_file,
            initial_skip,
            current: None,
            consumed_through: initial_file.checked_sub(1),
            last: None,
            checkpoint,
            finalized: false,
        })
    }

    /// Queue name this source reads from.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Position of the most recently yielded record, if any.
    #[must_use]
    pub const fn last_position(&self) -> Option<&ReadPosition> { self.last.as_ref() }

    /// Reads the next record, or `None` once the segments known at
    /// construction are exhausted.
    pub fn read_next(&mut self) -> Result<Option<SourceEntry>> {
        loop {
            if self.current.is_none() && !self.open_next_segment()? {
                return Ok(None);
            }

            let Some(reader) = self.current.as_mut() else {
                return Ok(None);
            };

            match reader.decoder.next_value::<Record>() {
                Ok(Some(record)) => {
                    let index = reader.next_index;
                    reader.next_index += 1;

                    if reader.skip_through.is_some_and(|through| index <= through) {
                        continue;
                    }

                    let filename = reader.filename.clone();
                    self.last = Some(ReadPosition {
                        filename: filename.clone(),
                        record_index: index,
                    });
                    return Ok(Some(SourceEntry {
                        filename,
                        index,
                        record,
                    }));
                }
                Ok(None) => {
                    self.consumed_through = Some(self.next_file - 1);
                    self.current = None;
                }
                Err(source) => {
                    let filename = reader.filename.clone();
                    self.current = None;
                    return Err(source).context(DecodeRecordSnafu { filename });
                }
            }
        }
    }

    /// Rewinds to the starting position (beginning of the queue, or the
    /// record after the checkpoint this source was resumed from).
    pub fn reset(&mut self) {
        self.current = None;
        self.next_file = self.initial_file;
        self.consumed_through = self.initial_file.checked_sub(1);
    }

    /// Unlinks fully-consumed segments whose name is `<= up_to`.
    ///
    /// Partially-consumed and unread segments are never touched, so calling
    /// this with a name at or beyond the read position only removes the
    /// consumed prefix. Unlink failures propagate.
    pub fn unlink_to(&mut self, up_to: &str) -> Result<()> {
        let Some(limit) = self.consumed_through else {
            return Ok(());
        };

        let mut removed = 0;
        while removed <= limit {
            let path = &self.files[removed];
            let file_name = file_name_of(path);
            if file_name > up_to {
                break;
            }
            std::fs::remove_file(path).context(CleanupSnafu { path })?;
            debug!(queue = %self.name, file = %file_name, "Unlinked consumed segment");
            removed += 1;
        }

        if removed > 0 {
            self.files.drain(..removed);
            self.next_file -= removed;
            if self.initial_file < removed {
                self.initial_skip = None;
            }
            self.initial_file = self.initial_file.saturating_sub(removed);
            self.consumed_through = limit.checked_sub(removed);
        }
        Ok(())
    }

    /// Unlinks every segment this source has fully consumed so far.
    pub fn unlink_consumed(&mut self) -> Result<()> {
        let Some(limit) = self.consumed_through else {
            return Ok(());
        };
        let target = file_name_of(&self.files[limit]).to_owned();
        self.unlink_to(&target)
    }

    /// Persists the current read position as the queue's checkpoint (for
    /// sources built by [`continue_source`](crate::Project::continue_source))
    /// and releases the open segment handle.
    ///
    /// A source that never yielded a record saves nothing, so opening and
    /// closing an unused scope never moves an existing checkpoint.
    pub fn close(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.current = None;

        if let (Some(store), Some(last)) = (self.checkpoint.as_ref(), self.last.as_ref()) {
            store.save(last)?;
        }
        Ok(())
    }

    fn open_next_segment(&mut self) -> Result<bool> {
        let Some(path) = self.files.get(self.next_file).cloned() else {
            return Ok(false);
        };

        let filename = file_name_of(&path).to_owned();
        let file = File::open(&path).context(OpenSegmentSnafu { path: &path })?;
        let skip_through = if self.next_file == self.initial_file {
            self.initial_skip
        } else {
            None
        };

        debug!(queue = %self.name, file = %filename, "Reading segment");
        self.current = Some(SegmentReader {
            filename,
            decoder: StreamDecoder::new(BufReader::new(file)),
            next_index: 0,
            skip_through,
        });
        self.next_file += 1;
        Ok(true)
    }
}

impl Iterator for Source {
    type Item = Result<SourceEntry>;

    fn next(&mut self) -> Option<Self::Item> { self.read_next().transpose() }
}

impl Drop for Source {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            error!(queue = %self.name, error = ?err, "Failed to persist checkpoint on drop");
        }
    }
}

fn file_name_of(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or("")
}
