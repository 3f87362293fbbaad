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

//! Root-directory-scoped factory for queue sinks and sources.
//!
//! A [`Project`] owns a directory and hands out [`Sink`]s and [`Source`]s
//! for named queues inside it. Checkpoints are scoped to the same
//! directory, so two projects on different directories never see each
//! other's positions.
//!
//! There is no hidden registry of open handles: every sink and source
//! finalizes itself on [`close`](Sink::close)/drop, which is what
//! guarantees that a later [`continue_source`](Project::continue_source)
//! picks up exactly where the previous scope left off.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use snafu::{ResultExt, ensure};
use tracing::info;

use crate::{
    FlushMode, QueueConfig, Result,
    checkpoint::CheckpointStore,
    error::{DirectorySnafu, InvalidNameSnafu},
    sink::Sink,
    source::Source,
};

/// A directory of named queues.
pub struct Project {
    root:   PathBuf,
    config: QueueConfig,
}

impl Project {
    /// Opens a project at `root` with the default configuration, creating
    /// the directory if needed.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        Self::with_config(root, QueueConfig::default())
    }

    /// Opens a project at `root` with an explicit configuration.
    pub fn with_config<P: Into<PathBuf>>(root: P, config: QueueConfig) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).context(DirectorySnafu { path: &root })?;
        info!(path = %root.display(), "Opened project");
        Ok(Self { root, config })
    }

    /// Starts building a project with a non-default configuration.
    pub fn builder<P: Into<PathBuf>>(root: P) -> ProjectBuilder {
        ProjectBuilder {
            root:   root.into(),
            config: QueueConfig::default(),
        }
    }

    /// Project root directory.
    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Queue configuration used by sinks handed out by this project.
    #[must_use]
    pub const fn config(&self) -> &QueueConfig { &self.config }

    /// Opens an append-only sink for `name`.
    ///
    /// Opening a sink for a queue that already has segments on disk is the
    /// normal append path, not an error.
    pub fn open_sink(&self, name: &str) -> Result<Sink> {
        validate_name(name)?;
        Ok(Sink::new(
            self.root.clone(),
            name.to_owned(),
            self.config.clone(),
        ))
    }

    /// Opens a source reading from the very first record of the earliest
    /// segment for `name`, ignoring any checkpoint.
    pub fn open_source(&self, name: &str) -> Result<Source> {
        validate_name(name)?;
        Source::new(&self.root, name.to_owned(), None, None)
    }

    /// Opens a source that resumes immediately after the persisted
    /// checkpoint for `name`, or from the beginning if none exists.
    ///
    /// The returned source saves its final position as the new checkpoint
    /// when closed or dropped, provided it yielded at least one record.
    pub fn continue_source(&self, name: &str) -> Result<Source> {
        validate_name(name)?;
        let store = CheckpointStore::new(&self.root, name);
        let start_after = store.load()?;
        if let Some(position) = &start_after {
            info!(
                queue = name,
                filename = %position.filename,
                index = position.record_index,
                "Resuming from checkpoint"
            );
        }
        Source::new(&self.root, name.to_owned(), start_after, Some(store))
    }
}

/// Builder for a [`Project`] with a non-default queue configuration.
pub struct ProjectBuilder {
    root:   PathBuf,
    config: QueueConfig,
}

impl ProjectBuilder {
    /// Width of the time-based rotation boundary.
    #[must_use]
    pub fn rotate_interval(mut self, interval: Duration) -> Self {
        self.config.rotate_interval = interval;
        self
    }

    /// Durability policy for sink writes.
    #[must_use]
    pub fn flush_mode(mut self, mode: FlushMode) -> Self {
        self.config.flush_mode = mode;
        self
    }

    /// Opens the project, creating the root directory if needed.
    pub fn open(self) -> Result<Project> { Project::with_config(self.root, self.config) }
}

fn validate_name(name: &str) -> Result<()> {
    ensure!(
        !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\']),
        InvalidNameSnafu { name }
    );
    Ok(())
}
