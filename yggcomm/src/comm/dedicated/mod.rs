//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
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
//

//! Dedicated-format adapters.
//!
//! Some formats are read and written unit by unit (a sequence record, an
//! alignment, an image) by code that owns the file, rather than by turning a
//! whole message into bytes. A [`DedicatedFormat`] is plugged into a
//! [`FileComm`](crate::comm::FileComm) in place of a serializer; values pass
//! through the channel untouched.
//!
//! Adapters parse the file when they are opened, so a reader only sees
//! content appended by another process after the channel closes and reopens
//! the adapter. [`DedicatedFormat::requires_refresh`] tells the channel when
//! to do that. Units already handed out are remembered across reopens and
//! forgotten on [`DedicatedFormat::reset_processed`], which the channel
//! calls when it moves to the next file of a series.
//!
//! Reading a dedicated file while another process is still writing it is not
//! supported.

mod alignment;
mod image;
mod sequence;

pub use alignment::SamFormat;
pub use image::NetpbmFormat;
pub use sequence::{SequenceFormat, SequenceKind};

use crate::comm::{CommError, Direction};
use crate::datatypes::{Element, Value, ValueMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A format whose file is owned by the adapter.
pub trait DedicatedFormat: Send + 'static {
    /// Short name of the format.
    fn name(&self) -> &'static str;

    /// Opens `path` for reading or appending.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Io`] if the file cannot be opened and
    /// [`CommError::Codec`] if existing content does not parse.
    fn open(&mut self, path: &Path, direction: Direction) -> Result<(), CommError>;

    /// Releases the file, flushing pending writes.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Io`] if a flush fails.
    fn close(&mut self) -> Result<(), CommError>;

    /// Returns the next unread unit, or `None` when every parsed unit has
    /// been handed out.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Closed`] unless open for reading.
    fn read_unit(&mut self) -> Result<Option<Value>, CommError>;

    /// Appends one unit.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Codec`] if the value is not a unit of this format.
    fn write_unit(&mut self, value: &Value) -> Result<(), CommError>;

    /// Returns `true` if the adapter must be reopened before the next read
    /// to observe the file's current content.
    fn requires_refresh(&self) -> bool;

    /// Returns the number of bytes after the last unit handed out.
    fn remaining_bytes(&self) -> u64;

    /// Forgets which units were handed out.
    fn reset_processed(&mut self);
}

/// The file behind an adapter.
#[derive(Debug, Default)]
pub(crate) struct UnitFile {
    path: Option<PathBuf>,
    writer: Option<File>,
    opened_len: u64,
}

impl UnitFile {
    /// Opens `path`, returning the whole content when reading.
    pub(crate) fn open(&mut self, path: &Path, direction: Direction) -> Result<Vec<u8>, CommError> {
        let contents = match direction {
            Direction::Recv => {
                let contents = fs::read(path).map_err(|e| CommError::io(path, e))?;
                self.opened_len = contents.len() as u64;
                self.writer = None;
                contents
            }
            Direction::Send => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| CommError::io(path, e))?;
                self.opened_len = file.metadata().map_err(|e| CommError::io(path, e))?.len();
                self.writer = Some(file);
                Vec::new()
            }
        };
        self.path = Some(path.to_path_buf());
        Ok(contents)
    }

    pub(crate) fn close(&mut self) -> Result<(), CommError> {
        let path = self.path.take();
        if let (Some(mut writer), Some(path)) = (self.writer.take(), path) {
            writer.flush().map_err(|e| CommError::io(path, e))?;
        }
        Ok(())
    }

    pub(crate) fn is_reading(&self) -> bool {
        self.path.is_some() && self.writer.is_none()
    }

    pub(crate) fn opened_len(&self) -> u64 {
        self.opened_len
    }

    pub(crate) fn current_len(&self) -> u64 {
        self.path
            .as_ref()
            .and_then(|path| fs::metadata(path).ok())
            .map_or(0, |metadata| metadata.len())
    }

    /// Returns `true` if the file changed size since it was opened.
    pub(crate) fn changed(&self) -> bool {
        self.path.is_some() && self.current_len() != self.opened_len
    }

    pub(crate) fn write(&mut self, format: &str, bytes: &[u8]) -> Result<(), CommError> {
        let (Some(writer), Some(path)) = (self.writer.as_mut(), self.path.as_ref()) else {
            return Err(CommError::Closed {
                comm: format.to_string(),
            });
        };
        writer.write_all(bytes).map_err(|e| CommError::io(path, e))
    }
}

/// Parsed units and how many of them were handed out.
#[derive(Debug, Default)]
pub(crate) struct UnitLog {
    /// Each unit with the byte offset just past it
    units: Vec<(Value, u64)>,
    processed: usize,
}

impl UnitLog {
    pub(crate) fn load(&mut self, units: Vec<(Value, u64)>) {
        self.units = units;
    }

    pub(crate) fn unload(&mut self) {
        self.units.clear();
    }

    pub(crate) fn next(&mut self) -> Option<Value> {
        let (unit, _) = self.units.get(self.processed)?;
        self.processed += 1;
        Some(unit.clone())
    }

    pub(crate) fn consumed_bytes(&self) -> u64 {
        match self.processed.min(self.units.len()) {
            0 => 0,
            count => self.units[count - 1].1,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.processed = 0;
    }
}

pub(crate) fn remaining(file: &UnitFile, log: &UnitLog) -> u64 {
    if !file.is_reading() {
        return 0;
    }
    file.current_len().saturating_sub(log.consumed_bytes())
}

/// Reads a text member of a unit map.
pub(crate) fn text_field(map: &ValueMap, key: &str) -> Option<String> {
    match map.get(key)?.as_scalar()?.value() {
        Element::Unicode(text) => Some(text.clone()),
        Element::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Reads an integer member of a unit map.
pub(crate) fn int_field(map: &ValueMap, key: &str) -> Option<i64> {
    match map.get(key)?.as_scalar()?.value() {
        Element::Int(value) => Some(*value),
        Element::Uint(value) => i64::try_from(*value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Scalar;

    #[test]
    fn test_unit_log_tracks_progress() {
        let mut log = UnitLog::default();
        log.load(vec![(Value::from(1i64), 4), (Value::from(2i64), 9)]);
        assert_eq!(log.consumed_bytes(), 0);
        assert_eq!(log.next(), Some(Value::from(1i64)));
        assert_eq!(log.consumed_bytes(), 4);

        // a reopen reloads units but keeps progress
        log.unload();
        log.load(vec![(Value::from(1i64), 4), (Value::from(2i64), 9), (Value::from(3i64), 12)]);
        assert_eq!(log.next(), Some(Value::from(2i64)));
        assert_eq!(log.next(), Some(Value::from(3i64)));
        assert_eq!(log.next(), None);

        log.reset();
        assert_eq!(log.next(), Some(Value::from(1i64)));
    }

    #[test]
    fn test_unit_file_reports_growth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.txt");
        fs::write(&path, b"abc").unwrap();

        let mut file = UnitFile::default();
        assert_eq!(file.open(&path, Direction::Recv).unwrap(), b"abc");
        assert!(!file.changed());
        fs::write(&path, b"abcdef").unwrap();
        assert!(file.changed());
        file.close().unwrap();
        assert!(!file.changed());
    }

    #[test]
    fn test_fields() {
        let map = ValueMap::new()
            .with("name", "read1")
            .with("raw", Scalar::bytes(b"x".to_vec()))
            .with("count", 7i64);
        assert_eq!(text_field(&map, "name").as_deref(), Some("read1"));
        assert_eq!(text_field(&map, "raw").as_deref(), Some("x"));
        assert_eq!(int_field(&map, "count"), Some(7));
        assert_eq!(text_field(&map, "count"), None);
    }
}
