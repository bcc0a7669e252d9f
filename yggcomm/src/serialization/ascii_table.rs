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

//! The ASCII table serializer.
//!
//! An ASCII table file is an optional comment line of column names, a
//! comment line holding the row format string, then one line per row:
//!
//! ```text
//! # name	count	size
//! # %5s	%ld	%f
//!   one	1	1.000000
//!   two	2	2.000000
//! ```
//!
//! The row format is chosen with this precedence: a format string given at
//! construction, then one discovered in the file's header, then one derived
//! from the types of the first value sent. Discovery reads the header
//! comments first, then sizes any `%s` field without a width from the
//! widest value in the file.

use crate::datatypes::{ArrayData, Element, NdArray, Scalar, Subtype, Value, ValueMap};
use crate::serialization::{CFormat, CodecError, ColumnType, FormatSerializer, ReadMode};
use tracing::debug;

const NAME: &str = "ascii table";

/// Reads and writes delimited text tables.
///
/// Rows travel as a set of rows, each a set of scalars. With
/// [`with_as_array`](Self::with_as_array) a received table is instead a
/// map of column name to one dimensional array, or a set of arrays when
/// the columns are unnamed. Either shape is accepted when sending.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{Scalar, Value};
/// use yggcomm::serialization::{AsciiTableSerializer, FormatSerializer};
///
/// let mut table = AsciiTableSerializer::new()
///     .with_format_str("%5s\t%ld\n")
///     .unwrap()
///     .with_column_names(["name", "count"]);
/// let row = Value::Set(vec![Value::from(Scalar::bytes("one")), Value::from(1i64)]);
///
/// assert_eq!(table.file_header().unwrap(), b"# name\tcount\n# %5s\t%ld\n");
/// assert_eq!(table.serialize(&row).unwrap(), b"  one\t1\n");
/// ```
#[derive(Debug, Clone)]
pub struct AsciiTableSerializer {
    explicit: Option<CFormat>,
    discovered: Option<CFormat>,
    derived: Option<CFormat>,
    column_names: Vec<String>,
    comment: String,
    delimiter: String,
    newline: String,
    as_array: bool,
}

impl Default for AsciiTableSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl AsciiTableSerializer {
    /// A tab delimited table with `#` comments and no format yet.
    pub fn new() -> Self {
        Self {
            explicit: None,
            discovered: None,
            derived: None,
            column_names: Vec::new(),
            comment: "# ".to_string(),
            delimiter: "\t".to_string(),
            newline: "\n".to_string(),
            as_array: false,
        }
    }

    /// Fixes the row format.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Format`] if the string does not parse.
    pub fn with_format_str(mut self, format_str: &str) -> Result<Self, CodecError> {
        self.explicit = Some(CFormat::parse(format_str)?);
        Ok(self)
    }

    /// Names the columns.
    #[must_use]
    pub fn with_column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.column_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the comment marker written before header lines.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the delimiter used by derived formats and the names line.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the line terminator used by derived formats.
    #[must_use]
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    /// Receives tables as columns instead of rows.
    #[must_use]
    pub fn with_as_array(mut self, as_array: bool) -> Self {
        self.as_array = as_array;
        self
    }

    /// Returns the row format in effect.
    pub fn format(&self) -> Option<&CFormat> {
        self.explicit
            .as_ref()
            .or(self.discovered.as_ref())
            .or(self.derived.as_ref())
    }

    fn format_mut(&mut self) -> Option<&mut CFormat> {
        if self.explicit.is_some() {
            self.explicit.as_mut()
        } else if self.discovered.is_some() {
            self.discovered.as_mut()
        } else {
            self.derived.as_mut()
        }
    }

    /// Returns the column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn comment_marker(&self) -> &str {
        self.comment.trim_end()
    }

    fn comment_body<'a>(&self, line: &'a str) -> Option<&'a str> {
        let marker = self.comment_marker();
        if marker.is_empty() {
            return None;
        }
        let body = line.strip_prefix(marker)?;
        Some(body.strip_prefix(' ').unwrap_or(body))
    }

    fn terminate(&self, mut line: String) -> String {
        if !line.ends_with('\n') {
            line.push_str(&self.newline);
        }
        line
    }

    fn split_names(&self, text: &str) -> Vec<String> {
        let text = text.trim_end_matches(['\r', '\n']);
        if self.delimiter.trim().is_empty() {
            text.split_whitespace().map(str::to_string).collect()
        } else {
            text.split(self.delimiter.as_str()).map(|name| name.trim().to_string()).collect()
        }
    }

    fn rows_of(&mut self, value: &Value) -> Result<(Vec<Vec<Element>>, Vec<ColumnType>), CodecError> {
        let (rows, types) = match value {
            Value::Map(columns) => {
                if self.column_names.is_empty() {
                    self.column_names = columns.keys().map(str::to_string).collect();
                }
                let arrays = columns.iter().map(|(_, column)| column).collect::<Vec<_>>();
                table_from_columns(&arrays)?
            }
            Value::Set(items) if items.iter().all(|item| matches!(item, Value::Array(_))) && !items.is_empty() => {
                table_from_columns(&items.iter().collect::<Vec<_>>())?
            }
            Value::Set(items) if items.iter().all(|item| matches!(item, Value::Set(_))) => {
                let mut rows = Vec::with_capacity(items.len());
                let mut types = Vec::new();
                for item in items {
                    let (row, row_types) = row_of(item.as_set().unwrap_or_default())?;
                    if types.is_empty() {
                        types = row_types;
                    }
                    rows.push(row);
                }
                (rows, types)
            }
            Value::Set(items) => {
                let (row, types) = row_of(items)?;
                (vec![row], types)
            }
            other => {
                return Err(CodecError::mismatch(format!(
                    "a table is a set of rows or a collection of columns, not a {}",
                    other.kind()
                )))
            }
        };
        Ok((rows, types))
    }

    fn build(&self, rows: Vec<Vec<Element>>, types: &[ColumnType]) -> Result<Value, CodecError> {
        if !self.as_array {
            let rows = rows
                .into_iter()
                .map(|row| {
                    let scalars = row
                        .into_iter()
                        .zip(types)
                        .map(|(element, column)| Value::Scalar(to_scalar(element, column)))
                        .collect();
                    Value::Set(scalars)
                })
                .collect();
            return Ok(Value::Set(rows));
        }

        let mut columns: Vec<ArrayData> = types.iter().map(|column| ArrayData::empty(column.subtype)).collect();
        for row in rows {
            for (column, element) in columns.iter_mut().zip(row) {
                column.push(element)?;
            }
        }
        let arrays = columns.into_iter().zip(types).map(|(data, column)| {
            let precision = match column.subtype {
                Subtype::Bytes | Subtype::Unicode => data.natural_precision(),
                _ => column.precision.unwrap_or_else(|| column.subtype.default_precision()),
            };
            NdArray::from_data(data).with_precision(precision)
        });
        if self.column_names.len() == types.len() {
            Ok(Value::Map(
                self.column_names.iter().cloned().zip(arrays.map(Value::Array)).collect::<ValueMap>(),
            ))
        } else {
            Ok(Value::Set(arrays.map(Value::Array).collect()))
        }
    }

    fn data_lines<'a>(&self, text: &'a str) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let marker = self.comment_marker().to_string();
        let mut offset = 0;
        text.split_inclusive('\n').filter_map(move |line| {
            let start = offset;
            offset += line.len();
            let skip = line.trim().is_empty() || (!marker.is_empty() && line.starts_with(marker.as_str()));
            (!skip).then_some((start, line))
        })
    }

    fn parse_rows(&self, format: &CFormat, text: &str) -> Result<Vec<Vec<Element>>, CodecError> {
        self.data_lines(text)
            .map(|(start, line)| format.parse_row(line).map_err(|error| shift(error, start)))
            .collect()
    }
}

fn shift(error: CodecError, by: usize) -> CodecError {
    match error {
        CodecError::Format { format, offset, reason } => CodecError::Format {
            format,
            offset: offset + by,
            reason,
        },
        other => other,
    }
}

fn text_column(subtype: Subtype) -> ColumnType {
    ColumnType {
        subtype,
        precision: None,
    }
}

fn row_of(items: &[Value]) -> Result<(Vec<Element>, Vec<ColumnType>), CodecError> {
    let mut row = Vec::with_capacity(items.len());
    let mut types = Vec::with_capacity(items.len());
    for item in items {
        let scalar = item
            .as_scalar()
            .ok_or_else(|| CodecError::mismatch(format!("table cells are scalars, not {} values", item.kind())))?;
        types.push(match scalar.subtype() {
            Subtype::Bytes | Subtype::Unicode => text_column(scalar.subtype()),
            subtype => ColumnType::new(subtype, scalar.precision()),
        });
        row.push(scalar.value().clone());
    }
    Ok((row, types))
}

fn table_from_columns(columns: &[&Value]) -> Result<(Vec<Vec<Element>>, Vec<ColumnType>), CodecError> {
    let arrays = columns
        .iter()
        .map(|column| match column {
            Value::Array(array) if array.ndim() == 1 => Ok(array),
            other => Err(CodecError::mismatch(format!(
                "table columns are one dimensional arrays, not {} values",
                other.kind()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let count = arrays.first().map_or(0, |array| array.len());
    if arrays.iter().any(|array| array.len() != count) {
        return Err(CodecError::mismatch("table columns differ in length"));
    }
    let types = arrays
        .iter()
        .map(|array| match array.subtype() {
            Subtype::Bytes | Subtype::Unicode => text_column(array.subtype()),
            subtype => ColumnType::new(subtype, array.precision()),
        })
        .collect();
    let rows = (0..count)
        .map(|index| arrays.iter().filter_map(|array| array.data().get(index)).collect())
        .collect();
    Ok((rows, types))
}

fn to_scalar(element: Element, column: &ColumnType) -> Scalar {
    match element.subtype() {
        Subtype::Bytes | Subtype::Unicode => {
            let precision = element.natural_precision();
            Scalar::new(element, precision)
        }
        subtype => {
            let precision = column.precision.unwrap_or_else(|| subtype.default_precision());
            Scalar::new(element, precision)
        }
    }
}

impl FormatSerializer for AsciiTableSerializer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let (rows, types) = self.rows_of(value)?;
        if self.format().is_none() {
            let derived = CFormat::from_column_types(&types, &self.delimiter, &self.newline);
            debug!(format_str = %derived, "Derived table format from the first value");
            self.derived = Some(derived);
        }
        let Some(format) = self.format() else {
            return Err(CodecError::mismatch("table has no format"));
        };
        let mut out = String::new();
        for row in &rows {
            out.push_str(&self.terminate(format.format_row(row)?));
        }
        Ok(out.into_bytes())
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|error| CodecError::format(NAME, error.valid_up_to(), "invalid UTF-8"))?;
        let format = self
            .format()
            .ok_or_else(|| CodecError::format(NAME, 0, "no format string is known for this table"))?;
        let rows = self.parse_rows(format, text)?;
        let types = format.column_types();
        for row in &rows {
            for (element, column) in row.iter().zip(&types) {
                let precision = column.precision.unwrap_or_else(|| element.natural_precision());
                if element.subtype().is_numeric() && !element.fits(precision) {
                    return Err(CodecError::mismatch(format!(
                        "{} does not fit a {} bit {} column",
                        element, precision, column.subtype
                    )));
                }
            }
        }
        self.build(rows, &types)
    }

    fn merge(&self, values: &[Value]) -> Result<Value, CodecError> {
        let mut scratch = self.clone();
        let mut rows = Vec::new();
        let mut types: Vec<ColumnType> = Vec::new();
        for value in values {
            let (more, more_types) = scratch.rows_of(value)?;
            if types.is_empty() {
                types = more_types;
            }
            rows.extend(more);
        }
        if let Some(format) = self.format() {
            types = format.column_types();
        }
        scratch.build(rows, &types)
    }

    fn read_mode(&self) -> ReadMode {
        ReadMode::Line
    }

    fn file_header(&self) -> Option<Vec<u8>> {
        let format = self.format()?;
        let mut header = String::new();
        if !self.column_names.is_empty() {
            header.push_str(&self.comment);
            header.push_str(&self.column_names.join(&self.delimiter));
            header.push_str(&self.newline);
        }
        header.push_str(&self.comment);
        header.push_str(&self.terminate(format.to_string()));
        Some(header.into_bytes())
    }

    fn prepare_read(&mut self, contents: &[u8]) -> Result<(), CodecError> {
        let text = std::str::from_utf8(contents)
            .map_err(|error| CodecError::format(NAME, error.valid_up_to(), "invalid UTF-8"))?;
        let mut names = None;
        for line in text.split_inclusive('\n') {
            let Some(body) = self.comment_body(line) else {
                continue;
            };
            if body.contains('%') {
                if let Ok(format) = CFormat::parse(body) {
                    if format.field_count() > 0 {
                        self.discovered = Some(format);
                        break;
                    }
                }
            } else if !body.trim().is_empty() {
                names = Some(self.split_names(body));
            }
        }
        if self.column_names.is_empty() {
            if let Some(names) = names {
                self.column_names = names;
            }
        }

        let Some(format) = self.format() else {
            return Ok(());
        };
        let unsized_fields = format.unsized_text_fields();
        if unsized_fields.is_empty() {
            return Ok(());
        }
        let rows = self.parse_rows(format, text)?;
        let widths: Vec<(usize, usize)> = unsized_fields
            .into_iter()
            .filter_map(|index| {
                rows.iter()
                    .filter_map(|row| match row.get(index) {
                        Some(Element::Bytes(bytes)) => Some(bytes.len()),
                        _ => None,
                    })
                    .max()
                    .map(|width| (index, width))
            })
            .collect();
        if let Some(format) = self.format_mut() {
            for (index, width) in widths {
                format.set_text_width(index, width);
            }
            debug!(format_str = %format, "Sized text columns from file contents");
        }
        Ok(())
    }

    fn is_comment(&self, line: &[u8]) -> bool {
        let marker = self.comment_marker().as_bytes();
        line.iter().all(u8::is_ascii_whitespace) || (!marker.is_empty() && line.starts_with(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "# name\tcount\tsize\n# %s\t%d\t%f\n   one\t1\t1.500000\n  three\t3\t3.000000\n";

    fn row(name: &str, count: i64, size: f64) -> Value {
        Value::Set(vec![
            Value::from(Scalar::bytes(name)),
            Value::from(Scalar::int(count, 32)),
            Value::from(size),
        ])
    }

    #[test]
    fn test_discovers_format_and_widths() {
        let mut table = AsciiTableSerializer::new();
        table.prepare_read(FILE.as_bytes()).unwrap();
        assert_eq!(table.column_names(), ["name", "count", "size"]);
        assert_eq!(table.format().unwrap().to_string(), "%5s\t%d\t%f\n");

        let value = table.deserialize(FILE.as_bytes()).unwrap();
        assert_eq!(value, Value::Set(vec![row("one", 1, 1.5), row("three", 3, 3.0)]));
    }

    #[test]
    fn test_explicit_format_wins() {
        let mut table = AsciiTableSerializer::new().with_format_str("%s %d %g\n").unwrap();
        table.prepare_read(FILE.as_bytes()).unwrap();
        assert_eq!(table.format().unwrap().to_string(), "%5s %d %g\n");
        assert!(table.discovered.is_some());
    }

    #[test]
    fn test_derives_format_from_first_value() {
        let mut table = AsciiTableSerializer::new();
        assert!(table.file_header().is_none());
        let bytes = table.serialize(&row("one", 1, 1.5)).unwrap();
        assert_eq!(bytes, b"one\t1\t1.5\n");
        assert_eq!(table.file_header().unwrap(), b"# %s\t%d\t%g\n");
    }

    #[test]
    fn test_columns_in_and_out() {
        let mut table = AsciiTableSerializer::new()
            .with_format_str("%5s\t%ld\n")
            .unwrap()
            .with_as_array(true);
        let columns = ValueMap::new()
            .with("name", NdArray::from_data(vec![b"a".to_vec(), b"bb".to_vec()]))
            .with("count", NdArray::from_data(vec![1i64, 2]));
        let bytes = table.serialize(&Value::Map(columns)).unwrap();
        assert_eq!(bytes, b"    a\t1\n   bb\t2\n");
        assert_eq!(table.column_names(), ["name", "count"]);

        let value = table.deserialize(&bytes).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("count").and_then(Value::as_array).unwrap().len(), 2);
        assert_eq!(
            map.get("name").and_then(Value::as_array).unwrap().data().get(1),
            Some(Element::Bytes(b"bb".to_vec()))
        );
    }

    #[test]
    fn test_merge_concatenates_rows() {
        let table = AsciiTableSerializer::new().with_format_str("%s\t%d\t%g\n").unwrap();
        let merged = table
            .concatenate(&[row("one", 1, 1.5), Value::Set(vec![row("two", 2, 2.0)])])
            .unwrap();
        assert_eq!(merged, vec![Value::Set(vec![row("one", 1, 1.5), row("two", 2, 2.0)])]);
    }

    #[test]
    fn test_errors_carry_file_offsets() {
        let mut table = AsciiTableSerializer::new().with_format_str("%d\t%d\n").unwrap();
        match table.deserialize(b"# comment\n1\t2\n3\tx\n") {
            Err(CodecError::Format { offset, .. }) => assert_eq!(offset, 16),
            other => panic!("unexpected result: {:?}", other),
        }
        let mut table = AsciiTableSerializer::new();
        assert!(table.deserialize(b"1\t2\n").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_precision_overflow_rejected() {
        let mut table = AsciiTableSerializer::new().with_format_str("%hhd\n").unwrap();
        assert!(table.deserialize(b"300\n").unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_comment_lines() {
        let table = AsciiTableSerializer::new();
        assert!(table.is_comment(b"# %d\n"));
        assert!(table.is_comment(b"  \n"));
        assert!(!table.is_comment(b"1\t2\n"));
        assert_eq!(table.read_mode(), ReadMode::Line);
    }
}
