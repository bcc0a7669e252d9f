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

//! FASTA and FASTQ sequence records.
//!
//! Each unit is a map of text members:
//!
//! | key | FASTA | FASTQ |
//! |---|---|---|
//! | `id` | required | required |
//! | `description` | optional | optional |
//! | `sequence` | required | required |
//! | `quality` | ignored | required, one character per base |

use crate::comm::dedicated::{remaining, text_field, DedicatedFormat, UnitFile, UnitLog};
use crate::comm::{CommError, Direction};
use crate::datatypes::{Scalar, Value, ValueMap};
use crate::serialization::CodecError;
use std::path::Path;
use tracing::debug;

const FASTA_LINE_WIDTH: usize = 60;

/// Which sequence file flavour an adapter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    /// `>` headers followed by wrapped sequence lines
    Fasta,
    /// Four-line records with per-base qualities
    Fastq,
}

impl SequenceKind {
    fn name(self) -> &'static str {
        match self {
            Self::Fasta => "fasta",
            Self::Fastq => "fastq",
        }
    }
}

#[derive(Debug, Default)]
struct SequenceRecord {
    id: String,
    description: String,
    sequence: String,
    quality: Option<String>,
}

impl SequenceRecord {
    fn from_header(header: &str) -> Self {
        let header = header.trim();
        let (id, description) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
        Self {
            id: id.to_string(),
            description: description.trim().to_string(),
            ..Self::default()
        }
    }

    fn from_value(kind: SequenceKind, value: &Value) -> Result<Self, CodecError> {
        let map = value.as_map().ok_or_else(|| {
            CodecError::mismatch(format!("{} records are maps, not {} values", kind.name(), value.kind()))
        })?;
        let required = |key: &str| {
            text_field(map, key)
                .ok_or_else(|| CodecError::mismatch(format!("{} record needs a text '{}'", kind.name(), key)))
        };
        let record = Self {
            id: required("id")?,
            description: text_field(map, "description").unwrap_or_default(),
            sequence: required("sequence")?,
            quality: match kind {
                SequenceKind::Fasta => None,
                SequenceKind::Fastq => Some(required("quality")?),
            },
        };
        if let Some(quality) = &record.quality {
            if quality.len() != record.sequence.len() {
                return Err(CodecError::mismatch(format!(
                    "record {} has {} bases but {} quality scores",
                    record.id,
                    record.sequence.len(),
                    quality.len()
                )));
            }
        }
        Ok(record)
    }

    fn header(&self) -> String {
        if self.description.is_empty() {
            self.id.clone()
        } else {
            format!("{} {}", self.id, self.description)
        }
    }

    fn to_text(&self, kind: SequenceKind) -> String {
        let mut out = String::new();
        match kind {
            SequenceKind::Fasta => {
                out.push('>');
                out.push_str(&self.header());
                out.push('\n');
                for chunk in self.sequence.as_bytes().chunks(FASTA_LINE_WIDTH) {
                    out.push_str(&String::from_utf8_lossy(chunk));
                    out.push('\n');
                }
            }
            SequenceKind::Fastq => {
                out.push('@');
                out.push_str(&self.header());
                out.push('\n');
                out.push_str(&self.sequence);
                out.push_str("\n+\n");
                out.push_str(self.quality.as_deref().unwrap_or_default());
                out.push('\n');
            }
        }
        out
    }

    fn into_value(self) -> Value {
        let mut map = ValueMap::new()
            .with("id", Scalar::unicode(self.id))
            .with("description", Scalar::unicode(self.description))
            .with("sequence", Scalar::unicode(self.sequence));
        if let Some(quality) = self.quality {
            map.insert("quality", Scalar::unicode(quality));
        }
        Value::Map(map)
    }
}

fn parse_fasta(text: &str) -> Result<Vec<(Value, u64)>, CodecError> {
    let mut records = Vec::new();
    let mut current: Option<SequenceRecord> = None;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let line = line.trim_end();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.replace(SequenceRecord::from_header(header)) {
                records.push((record.into_value(), start as u64));
            }
            continue;
        }
        match current.as_mut() {
            Some(record) => record.sequence.push_str(line),
            None => return Err(CodecError::format("fasta", start, "sequence data before the first '>' header")),
        }
    }
    if let Some(record) = current {
        records.push((record.into_value(), offset as u64));
    }
    Ok(records)
}

fn parse_fastq(text: &str) -> Result<Vec<(Value, u64)>, CodecError> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if !line.trim().is_empty() {
            lines.push((start, offset, line.trim_end()));
        }
    }

    let mut records = Vec::with_capacity(lines.len() / 4);
    for chunk in lines.chunks(4) {
        let &[(start, _, header), (_, _, sequence), (plus_at, _, plus), (quality_at, end, quality)] = chunk else {
            return Err(CodecError::format("fastq", chunk[0].0, "truncated record"));
        };
        let Some(header) = header.strip_prefix('@') else {
            return Err(CodecError::format("fastq", start, "record does not start with '@'"));
        };
        if !plus.starts_with('+') {
            return Err(CodecError::format("fastq", plus_at, "expected the '+' separator line"));
        }
        if quality.len() != sequence.len() {
            return Err(CodecError::format(
                "fastq",
                quality_at,
                format!("{} quality scores for {} bases", quality.len(), sequence.len()),
            ));
        }
        let mut record = SequenceRecord::from_header(header);
        record.sequence = sequence.to_string();
        record.quality = Some(quality.to_string());
        records.push((record.into_value(), end as u64));
    }
    Ok(records)
}

/// Reads and writes FASTA or FASTQ files one record at a time.
///
/// # Examples
///
/// ```rust
/// use yggcomm::comm::dedicated::{SequenceFormat, SequenceKind};
/// use yggcomm::comm::{DedicatedFormat, Direction};
/// use yggcomm::datatypes::{Scalar, Value, ValueMap};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("reads.fasta");
///
/// let mut writer = SequenceFormat::new(SequenceKind::Fasta);
/// writer.open(&path, Direction::Send).unwrap();
/// let record = ValueMap::new()
///     .with("id", "seq1")
///     .with("sequence", "ACGT");
/// writer.write_unit(&Value::Map(record)).unwrap();
/// writer.close().unwrap();
/// assert_eq!(std::fs::read_to_string(&path).unwrap(), ">seq1\nACGT\n");
///
/// let mut reader = SequenceFormat::new(SequenceKind::Fasta);
/// reader.open(&path, Direction::Recv).unwrap();
/// let unit = reader.read_unit().unwrap().unwrap();
/// assert_eq!(unit.as_map().unwrap().get("sequence"), Some(&Value::from("ACGT")));
/// assert!(reader.read_unit().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct SequenceFormat {
    kind: SequenceKind,
    file: UnitFile,
    log: UnitLog,
}

impl SequenceFormat {
    /// Creates an adapter for `kind` files.
    pub fn new(kind: SequenceKind) -> Self {
        Self {
            kind,
            file: UnitFile::default(),
            log: UnitLog::default(),
        }
    }

    /// Returns the file flavour.
    pub fn kind(&self) -> SequenceKind {
        self.kind
    }
}

impl DedicatedFormat for SequenceFormat {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn open(&mut self, path: &Path, direction: Direction) -> Result<(), CommError> {
        let contents = self.file.open(path, direction)?;
        if direction == Direction::Recv {
            let text = std::str::from_utf8(&contents)
                .map_err(|error| CodecError::format(self.kind.name(), error.valid_up_to(), "invalid UTF-8"))?;
            let records = match self.kind {
                SequenceKind::Fasta => parse_fasta(text)?,
                SequenceKind::Fastq => parse_fastq(text)?,
            };
            debug!(format = self.kind.name(), path = %path.display(), records = records.len(), "Loaded sequence file");
            self.log.load(records);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CommError> {
        self.log.unload();
        self.file.close()
    }

    fn read_unit(&mut self) -> Result<Option<Value>, CommError> {
        if !self.file.is_reading() {
            return Err(CommError::Closed {
                comm: self.kind.name().to_string(),
            });
        }
        Ok(self.log.next())
    }

    fn write_unit(&mut self, value: &Value) -> Result<(), CommError> {
        let record = SequenceRecord::from_value(self.kind, value)?;
        self.file.write(self.kind.name(), record.to_text(self.kind).as_bytes())
    }

    fn requires_refresh(&self) -> bool {
        self.file.changed()
    }

    fn remaining_bytes(&self) -> u64 {
        remaining(&self.file, &self.log)
    }

    fn reset_processed(&mut self) {
        self.log.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &Value, key: &str) -> String {
        text_field(value.as_map().unwrap(), key).unwrap()
    }

    #[test]
    fn test_parse_fasta_multiline() {
        let records = parse_fasta(">r1 first read\nACGT\nTTGA\n; note\n\n>r2\nGG\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(text(&records[0].0, "id"), "r1");
        assert_eq!(text(&records[0].0, "description"), "first read");
        assert_eq!(text(&records[0].0, "sequence"), "ACGTTTGA");
        assert_eq!(records[0].1, 33);
        assert_eq!(records[1].1, 40);
    }

    #[test]
    fn test_fasta_wraps_long_sequences() {
        let record = SequenceRecord {
            id: "long".to_string(),
            sequence: "A".repeat(130),
            ..SequenceRecord::default()
        };
        let text = record.to_text(SequenceKind::Fasta);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }

    #[test]
    fn test_parse_fastq() {
        let records = parse_fastq("@r1 lane 2\nACGT\n+\nIIII\n@r2\nGG\n+r2\n##\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(text(&records[0].0, "quality"), "IIII");
        assert_eq!(text(&records[1].0, "description"), "");

        let error = parse_fastq("@r1\nACGT\n+\nII\n").unwrap_err();
        assert!(matches!(error, CodecError::Format { offset: 11, .. }));
        assert!(parse_fastq("@r1\nACGT\n").unwrap_err().is_corrupt());
        assert!(parse_fasta("ACGT\n").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_fastq_write_requires_quality() {
        let value = Value::Map(ValueMap::new().with("id", "r").with("sequence", "ACGT"));
        assert!(SequenceRecord::from_value(SequenceKind::Fastq, &value).is_err());
        let value = Value::Map(
            ValueMap::new()
                .with("id", "r")
                .with("sequence", "ACGT")
                .with("quality", "II"),
        );
        let error = SequenceRecord::from_value(SequenceKind::Fastq, &value).unwrap_err();
        assert!(error.is_type_mismatch());
    }

    #[test]
    fn test_refresh_sees_appended_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");
        std::fs::write(&path, "@r1\nAC\n+\nII\n").unwrap();

        let mut reader = SequenceFormat::new(SequenceKind::Fastq);
        reader.open(&path, Direction::Recv).unwrap();
        assert!(reader.read_unit().unwrap().is_some());
        assert!(reader.read_unit().unwrap().is_none());
        assert!(!reader.requires_refresh());

        let mut writer = SequenceFormat::new(SequenceKind::Fastq);
        writer.open(&path, Direction::Send).unwrap();
        let record = ValueMap::new()
            .with("id", "r2")
            .with("sequence", "GT")
            .with("quality", "##");
        writer.write_unit(&Value::Map(record)).unwrap();
        writer.close().unwrap();

        assert!(reader.requires_refresh());
        assert_eq!(reader.remaining_bytes(), 12);
        reader.close().unwrap();
        reader.open(&path, Direction::Recv).unwrap();
        let unit = reader.read_unit().unwrap().unwrap();
        assert_eq!(text(&unit, "id"), "r2");
        assert_eq!(reader.remaining_bytes(), 0);
    }
}
