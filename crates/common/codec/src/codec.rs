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

//! MessagePack encoding with self-delimiting sequential decode.
//!
//! Encoded values carry their own length information, so a file of
//! back-to-back values needs no additional framing: [`StreamDecoder`] pulls
//! one value at a time from a reader and reports a clean end-of-stream only
//! when the reader is exhausted exactly at a value boundary. End-of-file in
//! the middle of a value is a [`CodecError::Truncated`] error, never a
//! silent stop.

use std::io::{ErrorKind, Read, Write};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::ResultExt;

use crate::error::{DecodeSnafu, EncodeSnafu, Result, TruncatedSnafu};

/// Encode a single value to a byte vector.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec(value).context(EncodeSnafu)
}

/// Decode a single value from a byte slice.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).context(DecodeSnafu)
}

/// Encode a single value and append it to a writer.
pub fn write_value<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    rmp_serde::encode::write(writer, value).context(EncodeSnafu)
}

/// Reader wrapper that counts consumed bytes.
///
/// The count distinguishes "end of stream at a value boundary" from "stream
/// died inside a value" when a decode fails with an EOF.
struct CountingReader<R> {
    inner:      R,
    bytes_read: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Sequential decoder over concatenated encoded values.
///
/// Each [`next_value`](StreamDecoder::next_value) call performs exactly one
/// decode step against the underlying reader. The element type is chosen per
/// call, so heterogeneous streams decode through a common dynamic type such
/// as [`Record`](crate::Record).
pub struct StreamDecoder<R> {
    reader: CountingReader<R>,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: CountingReader {
                inner:      reader,
                bytes_read: 0,
            },
        }
    }

    /// Decode the next value, or `None` at a clean end of stream.
    pub fn next_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        let start = self.reader.bytes_read;
        let mut de = rmp_serde::Deserializer::new(&mut self.reader);
        match T::deserialize(&mut de) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                let consumed = self.reader.bytes_read - start;
                if consumed == 0 && is_eof(&err) {
                    return Ok(None);
                }
                if is_eof(&err) {
                    return Err(err).context(TruncatedSnafu {
                        bytes_into_value: consumed,
                    });
                }
                Err(err).context(DecodeSnafu)
            }
        }
    }

    /// Total bytes consumed from the underlying reader.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 { self.reader.bytes_read }
}

fn is_eof(err: &rmp_serde::decode::Error) -> bool {
    use rmp_serde::decode::Error;
    match err {
        Error::InvalidMarkerRead(io) | Error::InvalidDataRead(io) => {
            io.kind() == ErrorKind::UnexpectedEof
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::value::{Record, Value};

    fn sample_record(marker: i64) -> Record {
        let mut record = Record::new();
        record.insert("id".to_owned(), Value::Int(marker));
        record.insert("name".to_owned(), Value::from("sample"));
        record.insert(
            "tags".to_owned(),
            Value::Array(vec![Value::from("a"), Value::from("b")]),
        );
        record
    }

    #[test]
    fn test_single_value_roundtrip() {
        let record = sample_record(1);
        let bytes = to_vec(&record).unwrap();
        let decoded: Record = from_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_nested_heterogeneous_roundtrip() {
        let mut inner = Record::new();
        inner.insert("flag".to_owned(), Value::Bool(true));
        inner.insert("blob".to_owned(), Value::Bytes(vec![0, 1, 2]));

        let mut record = Record::new();
        record.insert("nothing".to_owned(), Value::Null);
        record.insert("ratio".to_owned(), Value::Float(0.25));
        record.insert("nested".to_owned(), Value::Map(inner));

        let bytes = to_vec(&record).unwrap();
        let decoded: Record = from_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_stream_decode_concatenated_values() {
        let mut buf = Vec::new();
        for i in 0..5 {
            write_value(&mut buf, &sample_record(i)).unwrap();
        }

        let mut decoder = StreamDecoder::new(Cursor::new(buf));
        for i in 0..5 {
            let record: Record = decoder.next_value().unwrap().unwrap();
            assert_eq!(record.get("id"), Some(&Value::Int(i)));
        }
        assert!(decoder.next_value::<Record>().unwrap().is_none());
        // Exhausted streams stay exhausted.
        assert!(decoder.next_value::<Record>().unwrap().is_none());
    }

    #[test]
    fn test_stream_decode_empty_reader() {
        let mut decoder = StreamDecoder::new(Cursor::new(Vec::new()));
        assert!(decoder.next_value::<Record>().unwrap().is_none());
    }

    #[test]
    fn test_stream_decode_truncated_value_is_an_error() {
        let mut buf = Vec::new();
        write_value(&mut buf, &sample_record(0)).unwrap();
        write_value(&mut buf, &sample_record(1)).unwrap();
        buf.truncate(buf.len() - 3);

        let mut decoder = StreamDecoder::new(Cursor::new(buf));
        let first: Record = decoder.next_value().unwrap().unwrap();
        assert_eq!(first.get("id"), Some(&Value::Int(0)));

        let err = decoder.next_value::<Record>().unwrap_err();
        assert!(matches!(err, crate::CodecError::Truncated { .. }));
    }

    #[test]
    fn test_bytes_read_tracks_consumption() {
        let mut buf = Vec::new();
        write_value(&mut buf, &sample_record(0)).unwrap();
        let total = buf.len() as u64;

        let mut decoder = StreamDecoder::new(Cursor::new(buf));
        decoder.next_value::<Record>().unwrap().unwrap();
        assert_eq!(decoder.bytes_read(), total);
    }
}
