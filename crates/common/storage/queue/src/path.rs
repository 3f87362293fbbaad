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

//! Segment naming and listing.
//!
//! Segment files live flat in the project directory as
//! `<queue_name>.<YYYYMMDDHHMMSS>` (UTC, fixed width), so lexical order of
//! file names equals chronological write order. The stamp is the *start* of
//! the rotation boundary the segment belongs to: a process restarting within
//! the same boundary re-derives the same name and appends instead of
//! creating a competing file.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use snafu::ResultExt;

use crate::{Result, error::ListSegmentsSnafu};

/// Width of the boundary stamp in segment file names.
const STAMP_LEN: usize = 14;

/// Aligns `now` down to the start of its rotation boundary.
#[must_use]
pub fn rotation_boundary(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    let step = interval.as_secs().max(1) as i64;
    let aligned = now.timestamp().div_euclid(step) * step;
    DateTime::from_timestamp(aligned, 0).unwrap_or(now)
}

/// Renders a segment file name: `<name>.<YYYYMMDDHHMMSS>`.
#[must_use]
pub fn segment_file_name(name: &str, boundary: DateTime<Utc>) -> String {
    format!("{name}.{}", boundary.format("%Y%m%d%H%M%S"))
}

/// Returns the full path to a segment file.
#[must_use]
pub fn segment_path(dir: &Path, name: &str, boundary: DateTime<Utc>) -> PathBuf {
    dir.join(segment_file_name(name, boundary))
}

/// Name of the checkpoint file for a queue: `.<name>.checkpoint`.
#[must_use]
pub fn checkpoint_file_name(name: &str) -> String {
    format!(".{name}.checkpoint")
}

/// Lists the segment files for one queue, sorted in write order.
///
/// Only names of the exact `<name>.<14 digits>` shape are accepted, so
/// checkpoints, temp files and other queues sharing the directory are never
/// picked up. A missing directory lists as empty.
pub fn segment_files(dir: &Path, name: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir).context(ListSegmentsSnafu { path: dir })?;
    for entry in entries {
        let entry = entry.context(ListSegmentsSnafu { path: dir })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|file_name| is_segment_name(file_name, name))
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn is_segment_name(file_name: &str, queue: &str) -> bool {
    file_name
        .strip_prefix(queue)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|stamp| stamp.len() == STAMP_LEN && stamp.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_segment_file_name() {
        let boundary = Utc.with_ymd_and_hms(2026, 1, 14, 12, 30, 0).unwrap();
        assert_eq!(
            segment_file_name("events", boundary),
            "events.20260114123000"
        );
    }

    #[test]
    fn test_segment_names_sort_in_write_order() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 14, 23, 59, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        assert!(segment_file_name("events", earlier) < segment_file_name("events", later));
    }

    #[test_case(0, 0 ; "at the boundary start")]
    #[test_case(59, 0 ; "just before the next boundary")]
    #[test_case(60, 60 ; "at the next boundary")]
    #[test_case(119, 60 ; "inside the next boundary")]
    fn test_rotation_boundary_alignment(offset_secs: i64, expected_offset: i64) {
        let base = Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap();
        let now = base + chrono::TimeDelta::seconds(offset_secs);
        let boundary = rotation_boundary(now, Duration::from_secs(60));
        assert_eq!(boundary, base + chrono::TimeDelta::seconds(expected_offset));
    }

    #[test]
    fn test_same_boundary_rederives_same_name() {
        let interval = Duration::from_secs(600);
        let a = Utc.with_ymd_and_hms(2026, 1, 14, 12, 3, 7).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 1, 14, 12, 9, 59).unwrap();
        assert_eq!(
            segment_file_name("q", rotation_boundary(a, interval)),
            segment_file_name("q", rotation_boundary(b, interval)),
        );
    }

    #[test_case("events.20260114123000", "events", true ; "valid stamp")]
    #[test_case("events.2026011412300", "events", false ; "stamp too short")]
    #[test_case("events.20260114123000x", "events", false ; "stamp too long")]
    #[test_case(".events.checkpoint", "events", false ; "checkpoint file")]
    #[test_case(".events.checkpoint.tmp", "events", false ; "checkpoint temp file")]
    #[test_case("events.20260114123000", "event", false ; "other queue prefix")]
    #[test_case("other.20260114123000", "events", false ; "other queue")]
    fn test_is_segment_name(file_name: &str, queue: &str, expected: bool) {
        assert_eq!(is_segment_name(file_name, queue), expected);
    }

    #[test]
    fn test_segment_files_filters_and_sorts() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path();

        for file_name in [
            "events.20260114130000",
            "events.20260114120000",
            ".events.checkpoint",
            "metrics.20260114120000",
            "events.notastamp00000",
        ] {
            std::fs::write(dir.join(file_name), b"").unwrap();
        }

        let files = segment_files(dir, "events").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["events.20260114120000", "events.20260114130000"]);
    }

    #[test]
    fn test_segment_files_missing_dir_is_empty() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(segment_files(&missing, "events").unwrap().is_empty());
    }
}
