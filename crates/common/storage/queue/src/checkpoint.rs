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

//! Durable read-position checkpoints.
//!
//! One checkpoint file per `(project directory, queue name)`, holding the
//! position of the last record a resumable source yielded. Saves go through
//! a temp file and an atomic rename so a crash mid-write can never leave a
//! truncated checkpoint behind.

use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    Result,
    error::{
        DecodeCheckpointSnafu, EncodeCheckpointSnafu, ReadCheckpointSnafu, WriteCheckpointSnafu,
    },
    path::checkpoint_file_name,
};

/// Position of one record within a queue: segment file name plus the
/// record's zero-based index within that segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPosition {
    /// Segment file name (not a full path).
    pub filename:     String,
    /// Zero-based record index within the segment.
    pub record_index: u64,
}

/// Loads and saves the checkpoint for one queue.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub(crate) fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(checkpoint_file_name(name)),
        }
    }

    /// Loads the persisted position, or `None` if no checkpoint exists yet.
    ///
    /// A checkpoint file that exists but does not decode is an error, not a
    /// silent fresh start.
    pub fn load(&self) -> Result<Option<ReadPosition>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).context(ReadCheckpointSnafu { path: &self.path });
            }
        };

        let position =
            spool_codec::from_slice(&bytes).context(DecodeCheckpointSnafu { path: &self.path })?;
        Ok(Some(position))
    }

    /// Persists `position`, atomically replacing any previous checkpoint.
    pub fn save(&self, position: &ReadPosition) -> Result<()> {
        let bytes = spool_codec::to_vec(position).context(EncodeCheckpointSnafu)?;

        let tmp_path = self.tmp_path();
        {
            let mut file =
                std::fs::File::create(&tmp_path).context(WriteCheckpointSnafu { path: &tmp_path })?;
            file.write_all(&bytes)
                .context(WriteCheckpointSnafu { path: &tmp_path })?;
            file.sync_all()
                .context(WriteCheckpointSnafu { path: &tmp_path })?;
        }
        std::fs::rename(&tmp_path, &self.path).context(WriteCheckpointSnafu { path: &self.path })?;

        debug!(
            path = %self.path.display(),
            filename = %position.filename,
            index = position.record_index,
            "Checkpoint saved"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut file_name = self.path.as_os_str().to_owned();
        file_name.push(".tmp");
        PathBuf::from(file_name)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn position(filename: &str, record_index: u64) -> ReadPosition {
        ReadPosition {
            filename: filename.to_owned(),
            record_index,
        }
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path(), "events");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path(), "events");

        let pos = position("events.20260114120000", 41);
        store.save(&pos).unwrap();
        assert_eq!(store.load().unwrap(), Some(pos));
    }

    #[test]
    fn test_save_overwrites_previous_position() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path(), "events");

        store.save(&position("events.20260114120000", 1)).unwrap();
        store.save(&position("events.20260114130000", 7)).unwrap();

        assert_eq!(
            store.load().unwrap(),
            Some(position("events.20260114130000", 7))
        );
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path(), "events");
        store.save(&position("events.20260114120000", 0)).unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![".events.checkpoint"]);
    }

    #[test]
    fn test_corrupt_checkpoint_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path(), "events");
        std::fs::write(temp_dir.path().join(".events.checkpoint"), b"\xc1garbage").unwrap();

        assert!(store.load().is_err());
    }

    #[test]
    fn test_stores_are_scoped_per_queue_name() {
        let temp_dir = TempDir::new().unwrap();
        let events = CheckpointStore::new(temp_dir.path(), "events");
        let metrics = CheckpointStore::new(temp_dir.path(), "metrics");

        events.save(&position("events.20260114120000", 3)).unwrap();
        assert!(metrics.load().unwrap().is_none());
    }
}
