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

//! SAM alignment records.
//!
//! Each unit is one alignment line as a map:
//!
//! | key | type |
//! |---|---|
//! | `qname`, `rname`, `cigar`, `rnext`, `seq`, `qual` | text |
//! | `flag`, `pos`, `mapq`, `pnext`, `tlen` | int64 |
//! | `tags` | set of text, one per optional `TAG:TYPE:VALUE` field |
//!
//! `@` header lines are kept aside and available through
//! [`SamFormat::header`].

use crate::comm::dedicated::{int_field, remaining, text_field, DedicatedFormat, UnitFile, UnitLog};
use crate::comm::{CommError, Direction};
use crate::datatypes::{Scalar, Value, ValueMap};
use crate::serialization::CodecError;
use std::path::Path;
use tracing::debug;

const NAME: &str = "sam";
const TEXT_FIELDS: [(usize, &str); 6] = [(0, "qname"), (2, "rname"), (5, "cigar"), (6, "rnext"), (9, "seq"), (10, "qual")];
const INT_FIELDS: [(usize, &str); 5] = [(1, "flag"), (3, "pos"), (4, "mapq"), (7, "pnext"), (8, "tlen")];
const MANDATORY_FIELDS: usize = 11;

fn parse_record(line: &str, start: usize) -> Result<Value, CodecError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MANDATORY_FIELDS {
        return Err(CodecError::format(
            NAME,
            start,
            format!("alignment has {} fields, expected at least {}", fields.len(), MANDATORY_FIELDS),
        ));
    }
    let mut map = ValueMap::new();
    for (index, key) in TEXT_FIELDS {
        map.insert(key, Scalar::unicode(fields[index]));
    }
    for (index, key) in INT_FIELDS {
        let value: i64 = fields[index].parse().map_err(|_| {
            CodecError::format(NAME, start, format!("{} is not an integer: {:?}", key, fields[index]))
        })?;
        map.insert(key, Scalar::int(value, 64));
    }
    let tags = fields[MANDATORY_FIELDS..]
        .iter()
        .map(|tag| Value::Scalar(Scalar::unicode(*tag)))
        .collect::<Vec<_>>();
    map.insert("tags", Value::Set(tags));
    Ok(Value::Map(map))
}

fn format_record(value: &Value) -> Result<String, CodecError> {
    let map = value
        .as_map()
        .ok_or_else(|| CodecError::mismatch(format!("alignments are maps, not {} values", value.kind())))?;
    let mut fields = vec![String::new(); MANDATORY_FIELDS];
    for (index, key) in TEXT_FIELDS {
        fields[index] = text_field(map, key).unwrap_or_else(|| "*".to_string());
    }
    for (index, key) in INT_FIELDS {
        fields[index] = int_field(map, key).unwrap_or(0).to_string();
    }
    if let Some(tags) = map.get("tags") {
        let tags = tags
            .as_set()
            .ok_or_else(|| CodecError::mismatch("alignment tags are a set of text"))?;
        for tag in tags {
            match tag.as_scalar().map(|scalar| scalar.value()) {
                Some(crate::datatypes::Element::Unicode(tag)) => fields.push(tag.clone()),
                _ => return Err(CodecError::mismatch("alignment tags are a set of text")),
            }
        }
    }
    if fields.iter().any(|field| field.contains(['\t', '\n'])) {
        return Err(CodecError::mismatch("alignment fields cannot contain tabs or newlines"));
    }
    let mut line = fields.join("\t");
    line.push('\n');
    Ok(line)
}

/// Reads and writes SAM files one alignment at a time.
///
/// Every read reopens the file, so the adapter always reports
/// [`requires_refresh`](DedicatedFormat::requires_refresh) while reading.
#[derive(Debug, Default)]
pub struct SamFormat {
    file: UnitFile,
    log: UnitLog,
    header: Vec<String>,
    header_pending: bool,
}

impl SamFormat {
    /// Creates an adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `@` header lines to write before the first alignment of an
    /// empty file.
    #[must_use]
    pub fn with_header<S: Into<String>>(mut self, lines: impl IntoIterator<Item = S>) -> Self {
        self.header = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the header lines of the file being read, or those to write.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn load(&mut self, contents: &[u8]) -> Result<(), CodecError> {
        let text = std::str::from_utf8(contents)
            .map_err(|error| CodecError::format(NAME, error.valid_up_to(), "invalid UTF-8"))?;
        let mut header = Vec::new();
        let mut records = Vec::new();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let start = offset;
            offset += line.len();
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            if line.starts_with('@') {
                header.push(line.to_string());
            } else {
                records.push((parse_record(line, start)?, offset as u64));
            }
        }
        self.header = header;
        self.log.load(records);
        Ok(())
    }
}

impl DedicatedFormat for SamFormat {
    fn name(&self) -> &'static str {
        NAME
    }

    fn open(&mut self, path: &Path, direction: Direction) -> Result<(), CommError> {
        let contents = self.file.open(path, direction)?;
        match direction {
            Direction::Recv => {
                self.load(&contents)?;
                debug!(path = %path.display(), header_lines = self.header.len(), "Loaded alignment file");
            }
            Direction::Send => self.header_pending = self.file.opened_len() == 0 && !self.header.is_empty(),
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
                comm: NAME.to_string(),
            });
        }
        Ok(self.log.next())
    }

    fn write_unit(&mut self, value: &Value) -> Result<(), CommError> {
        let record = format_record(value)?;
        if self.header_pending {
            let mut header = self.header.join("\n");
            header.push('\n');
            self.file.write(NAME, header.as_bytes())?;
            self.header_pending = false;
        }
        self.file.write(NAME, record.as_bytes())
    }

    fn requires_refresh(&self) -> bool {
        self.file.is_reading()
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

    const SAM: &str = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\nr1\t0\tchr1\t7\t60\t4M\t*\t0\t0\tACGT\tIIII\tNM:i:0\n";

    #[test]
    fn test_parse_records_and_header() {
        let mut format = SamFormat::new();
        format.load(SAM.as_bytes()).unwrap();
        assert_eq!(format.header(), ["@HD\tVN:1.6", "@SQ\tSN:chr1\tLN:1000"]);

        let record = format.log.next().unwrap();
        let map = record.as_map().unwrap();
        assert_eq!(text_field(map, "rname").as_deref(), Some("chr1"));
        assert_eq!(int_field(map, "pos"), Some(7));
        assert_eq!(int_field(map, "mapq"), Some(60));
        assert_eq!(map.get("tags").and_then(Value::as_set).map(<[Value]>::len), Some(1));
        assert_eq!(format_record(&record).unwrap(), SAM.lines().nth(2).unwrap().to_string() + "\n");
    }

    #[test]
    fn test_bad_records() {
        let error = parse_record("r1\t0\tchr1", 5).unwrap_err();
        assert!(matches!(error, CodecError::Format { offset: 5, .. }));
        let error = parse_record("r1\tzero\tchr1\t7\t60\t4M\t*\t0\t0\tACGT\tIIII", 0).unwrap_err();
        assert!(error.to_string().contains("flag"));
        assert!(format_record(&Value::from(1i64)).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_writer_emits_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aln.sam");
        let record = {
            let mut format = SamFormat::new();
            format.load(SAM.as_bytes()).unwrap();
            format.log.next().unwrap()
        };

        for _ in 0..2 {
            let mut writer = SamFormat::new().with_header(["@HD\tVN:1.6"]);
            writer.open(&path, Direction::Send).unwrap();
            writer.write_unit(&record).unwrap();
            writer.close().unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("@HD").count(), 1);
        assert_eq!(text.lines().count(), 3);

        let mut reader = SamFormat::new();
        reader.open(&path, Direction::Recv).unwrap();
        assert!(reader.requires_refresh());
        assert!(reader.read_unit().unwrap().is_some());
        reader.close().unwrap();
        reader.open(&path, Direction::Recv).unwrap();
        assert!(reader.read_unit().unwrap().is_some());
        assert!(reader.read_unit().unwrap().is_none());
        reader.reset_processed();
        assert!(reader.read_unit().unwrap().is_some());
    }
}
