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

//! Rotating append-only queue writer.
//!
//! Every [`write_dict`](Sink::write_dict) checks the wall clock, aligns it
//! to the configured rotation boundary and rolls to a new segment when the
//! boundary has changed since the last write. Segment names encode the
//! boundary start, so a restart within the same boundary reopens the same
//! file in append mode rather than overwriting it. Segments a sink has
//! rotated away from are never appended to again.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::PathBuf,
};

use chrono::{DateTime, Utc};
use snafu::ResultExt;
use spool_codec::Record;
use tracing::{debug, warn};

use crate::{
    FlushMode, QueueConfig, Result,
    error::{EncodeRecordSnafu, OpenSegmentSnafu, WriteSegmentSnafu},
    path::{rotation_boundary, segment_path},
};

/// Append-only writer for one queue name.
pub struct Sink {
    dir:     PathBuf,
    name:    String,
    config:  QueueConfig,
    current: Option<OpenSegment>,
}

struct OpenSegment {
    file:     File,
    path:     PathBuf,
    boundary: DateTime<Utc>,
}

impl Sink {
    /// Segment files are opened lazily on the first write, so a sink that
    /// never writes leaves nothing on disk.
    pub(crate) fn new(dir: PathBuf, name: String, config: QueueConfig) -> Self {
        Self {
            dir,
            name,
            config,
            current: None,
        }
    }

    /// Queue name this sink appends to.
    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Encodes `record` and appends it to the current segment, rotating
    /// first if the wall clock has crossed a boundary.
    pub fn write_dict(&mut self, record: &Record) -> Result<()> {
        self.write_dict_at(record, Utc::now())
    }

    pub(crate) fn write_dict_at(&mut self, record: &Record, now: DateTime<Utc>) -> Result<()> {
        let boundary = rotation_boundary(now, self.config.rotate_interval);

        if self
            .current
            .as_ref()
            .is_some_and(|segment| segment.boundary != boundary)
        {
            debug!(queue = %self.name, "Rotating to new segment");
            self.close_current()?;
        }

        if self.current.is_none() {
            let path = segment_path(&self.dir, &self.name, boundary);
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .context(OpenSegmentSnafu { path: &path })?;
            debug!(queue = %self.name, path = %path.display(), "Opened segment");
            self.current = Some(OpenSegment {
                file,
                path,
                boundary,
            });
        }

        let bytes = spool_codec::to_vec(record).context(EncodeRecordSnafu)?;
        if let Some(segment) = self.current.as_mut() {
            segment
                .file
                .write_all(&bytes)
                .context(WriteSegmentSnafu { path: &segment.path })?;
            if self.config.flush_mode == FlushMode::EachWrite {
                segment
                    .file
                    .sync_data()
                    .context(WriteSegmentSnafu { path: &segment.path })?;
            }
        }

        Ok(())
    }

    /// Flushes and releases the current segment.
    ///
    /// Safe to call multiple times. A closed sink stays usable: the next
    /// [`write_dict`](Sink::write_dict) reopens or rotates as needed, which
    /// is the same append semantics a fresh sink has.
    pub fn close(&mut self) -> Result<()> { self.close_current() }

    fn close_current(&mut self) -> Result<()> {
        if let Some(mut segment) = self.current.take() {
            segment
                .file
                .flush()
                .context(WriteSegmentSnafu { path: &segment.path })?;
            segment
                .file
                .sync_data()
                .context(WriteSegmentSnafu { path: &segment.path })?;
            debug!(queue = %self.name, path = %segment.path.display(), "Closed segment");
        }
        Ok(())
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if let Err(err) = self.close_current() {
            warn!(queue = %self.name, error = ?err, "Failed to flush segment on drop");
        }
    }
}
