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

//! Durable, rotated, append-only disk queues with resumable readers.
//!
//! A [`Project`] scopes a directory of named queues. Each queue is a family
//! of segment files whose names sort in write order. A [`Sink`] appends
//! encoded records and rotates to a new segment whenever the wall clock
//! crosses a configured boundary; a [`Source`] reads segments back in order
//! and can resume from a checkpoint persisted by a previous process run.
//!
//! Single-writer per queue name; no tailing of segments written after a
//! source was opened.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod path;
pub mod project;
pub mod sink;
pub mod source;

pub use checkpoint::{CheckpointStore, ReadPosition};
pub use config::{FlushMode, QueueConfig};
pub use error::{QueueError, Result};
pub use project::{Project, ProjectBuilder};
pub use sink::Sink;
pub use source::{Source, SourceEntry};
