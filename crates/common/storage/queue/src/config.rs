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

use std::time::Duration;

/// Per-project queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Width of one rotation boundary. Sinks check the wall clock on every
    /// write and roll to a new segment when the aligned boundary changes.
    pub rotate_interval: Duration,
    /// When appended records are flushed to disk.
    pub flush_mode:      FlushMode,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            rotate_interval: Duration::from_secs(600),
            flush_mode:      FlushMode::EachWrite,
        }
    }
}

/// Durability policy for sink writes.
///
/// Rotation and [`Sink::close`](crate::Sink::close) always flush, so
/// `OnRotate` bounds data loss to the currently open segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Sync after every appended record.
    EachWrite,
    /// Sync only when a segment is rotated away from or closed.
    OnRotate,
}
