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

//! Standalone helpers for storing values on disk in the cache format.
//!
//! [`save`] and [`load`] handle single values; [`scan`] streams every value
//! out of a file of concatenated encoded values — the same format
//! [`DiskCache`](crate::DiskCache) writes, so a cache file can also be
//! inspected directly.

use std::{
    fs::{File, OpenOptions},
    io::{BufReader, ErrorKind},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use snafu::ResultExt;
use spool_codec::StreamDecoder;

use crate::{
    Result,
    error::{CreateSnafu, DecodeSnafu, EncodeSnafu, OpenSnafu, WriteSnafu},
};

/// Writes one encoded value to `location`, truncating by default or
/// appending when `append` is set.
pub fn save<T: Serialize, P: AsRef<Path>>(location: P, value: &T, append: bool) -> Result<()> {
    let path = location.as_ref();
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    let mut file = options.open(path).context(CreateSnafu { path })?;
    spool_codec::write_value(&mut file, value).context(EncodeSnafu)?;
    file.sync_all().context(WriteSnafu { path })?;
    Ok(())
}

/// Reads the first value from `location`.
///
/// Returns `None` if the file does not exist or is empty.
pub fn load<T: DeserializeOwned, P: AsRef<Path>>(location: P) -> Result<Option<T>> {
    let path = location.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).context(OpenSnafu { path }),
    };

    let mut decoder = StreamDecoder::new(BufReader::new(file));
    decoder.next_value().context(DecodeSnafu { path })
}

/// Streams every value stored at `location`, in order.
pub fn scan<T: DeserializeOwned, P: AsRef<Path>>(location: P) -> Result<ScanIter<T>> {
    let path = location.as_ref().to_path_buf();
    let file = File::open(&path).context(OpenSnafu { path: &path })?;
    Ok(ScanIter {
        decoder: StreamDecoder::new(BufReader::new(file)),
        path,
        done: false,
        _marker: PhantomData,
    })
}

/// Iterator over the values in one file, produced by [`scan`].
pub struct ScanIter<T> {
    decoder: StreamDecoder<BufReader<File>>,
    path:    PathBuf,
    done:    bool,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> Iterator for ScanIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.next_value::<T>() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(source) => {
                self.done = true;
                Some(Err(source).context(DecodeSnafu { path: &self.path }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("value");

        save(&path, &vec![1i64, 2], false).unwrap();
        assert_eq!(load::<Vec<i64>, _>(&path).unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent");
        assert_eq!(load::<i64, _>(&path).unwrap(), None);
    }

    #[test]
    fn test_load_empty_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(load::<i64, _>(&path).unwrap(), None);
    }

    #[test]
    fn test_append_accumulates_and_load_sees_the_first() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log");

        save(&path, &1i64, true).unwrap();
        save(&path, &2i64, true).unwrap();

        assert_eq!(load::<i64, _>(&path).unwrap(), Some(1));
        assert_eq!(load::<i64, _>(&path).unwrap(), Some(1));

        let values: Vec<i64> = scan(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_save_without_append_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("value");

        save(&path, &1i64, false).unwrap();
        save(&path, &2i64, false).unwrap();

        let values: Vec<i64> = scan(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(values, vec![2]);
    }

    #[test]
    fn test_scan_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(scan::<i64, _>(temp_dir.path().join("absent")).is_err());
    }
}
