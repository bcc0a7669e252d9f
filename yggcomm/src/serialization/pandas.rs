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

//! The pandas-style delimited frame serializer.

use crate::datatypes::{ArrayData, Complex, Element, NdArray, Subtype, Value, ValueMap};
use crate::serialization::{CodecError, FormatSerializer};

const NAME: &str = "pandas";

/// Reads and writes data frames as delimited text with a header row.
///
/// A frame is a map of column name to one dimensional array. Column types
/// are inferred on read: integers, then floats, then complex numbers, then
/// text. Appending merges frames row-wise so the file keeps one header.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{NdArray, Value, ValueMap};
/// use yggcomm::serialization::{FormatSerializer, PandasSerializer};
///
/// let frame = ValueMap::new()
///     .with("x", NdArray::from_data(vec![1i64, 2]))
///     .with("y", NdArray::from_data(vec![0.5, 1.0]));
/// let mut serializer = PandasSerializer::default();
/// let bytes = serializer.serialize(&Value::Map(frame.clone())).unwrap();
///
/// assert_eq!(bytes, b"x\ty\n1\t0.5\n2\t1.0\n");
/// assert_eq!(serializer.deserialize(&bytes).unwrap(), Value::Map(frame));
/// ```
#[derive(Debug, Clone)]
pub struct PandasSerializer {
    delimiter: String,
}

impl Default for PandasSerializer {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
        }
    }
}

impl PandasSerializer {
    /// Sets the cell delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    fn frame(&self, value: Value) -> Result<ValueMap, CodecError> {
        match self.normalize(value)? {
            Value::Map(frame) => Ok(frame),
            other => Err(CodecError::mismatch(format!("expected a frame, found a {}", other.kind()))),
        }
    }

    fn cell(&self, element: &Element) -> Result<String, CodecError> {
        let text = match element {
            Element::Int(v) => v.to_string(),
            Element::Uint(v) => v.to_string(),
            Element::Float(v) => format!("{:?}", v),
            Element::Complex(c) => format!(
                "{:?}{}{:?}j",
                c.re,
                if c.im.is_sign_negative() { "" } else { "+" },
                c.im
            ),
            Element::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Element::Unicode(text) => text.clone(),
        };
        if text.contains(self.delimiter.as_str()) || text.contains('\n') {
            return Err(CodecError::mismatch(format!(
                "cell '{}' contains the delimiter or a line break",
                text.escape_default()
            )));
        }
        Ok(text)
    }
}

fn parse_complex(cell: &str) -> Option<Complex> {
    let body = cell.strip_suffix('j')?;
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'))?;
    Some(Complex::new(body[..split].parse().ok()?, body[split..].parse().ok()?))
}

fn infer_column(cells: &[&str]) -> ArrayData {
    if let Some(values) = cells.iter().map(|cell| cell.parse::<i64>().ok()).collect::<Option<Vec<_>>>() {
        return ArrayData::Int(values);
    }
    if let Some(values) = cells.iter().map(|cell| cell.parse::<f64>().ok()).collect::<Option<Vec<_>>>() {
        return ArrayData::Float(values);
    }
    if let Some(values) = cells.iter().map(|cell| parse_complex(cell)).collect::<Option<Vec<_>>>() {
        return ArrayData::Complex(values);
    }
    ArrayData::Unicode(cells.iter().map(|cell| cell.to_string()).collect())
}

fn columns_of(arrays: Vec<&Value>) -> Result<Vec<NdArray>, CodecError> {
    let columns = arrays
        .into_iter()
        .map(|value| match value {
            Value::Array(array) if array.ndim() == 1 => Ok(array.clone()),
            other => Err(CodecError::mismatch(format!(
                "frame columns are one dimensional arrays, not {} values",
                other.kind()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(first) = columns.first() {
        if columns.iter().any(|column| column.len() != first.len()) {
            return Err(CodecError::mismatch("frame columns differ in length"));
        }
    }
    Ok(columns)
}

fn default_names(count: usize) -> impl Iterator<Item = String> {
    (0..count).map(|index| format!("f{}", index))
}

impl FormatSerializer for PandasSerializer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let frame = self.frame(value.clone())?;
        let mut out = String::new();
        let names = frame.keys().map(|name| self.cell(&Element::Unicode(name.to_string()))).collect::<Result<Vec<_>, _>>()?;
        out.push_str(&names.join(&self.delimiter));
        out.push('\n');
        let columns: Vec<&NdArray> = frame.iter().filter_map(|(_, column)| column.as_array()).collect();
        let rows = columns.first().map_or(0, |column| column.len());
        for index in 0..rows {
            let cells = columns
                .iter()
                .map(|column| match column.data().get(index) {
                    Some(element) => self.cell(&element),
                    None => Ok(String::new()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            out.push_str(&cells.join(&self.delimiter));
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|error| CodecError::format(NAME, error.valid_up_to(), "invalid UTF-8"))?;
        let mut lines = text.split_inclusive('\n');
        let Some(header) = lines.next() else {
            return Ok(Value::Map(ValueMap::new()));
        };
        let names: Vec<&str> = header.trim_end_matches(['\r', '\n']).split(self.delimiter.as_str()).collect();
        let mut cells: Vec<Vec<&str>> = vec![Vec::new(); names.len()];
        let mut offset = header.len();
        for line in lines {
            let start = offset;
            offset += line.len();
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            let row: Vec<&str> = line.split(self.delimiter.as_str()).collect();
            if row.len() != names.len() {
                return Err(CodecError::format(
                    NAME,
                    start,
                    format!("row has {} cells but the header names {}", row.len(), names.len()),
                ));
            }
            for (column, cell) in cells.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        Ok(Value::Map(
            names
                .into_iter()
                .zip(cells)
                .map(|(name, column)| (name, Value::Array(NdArray::from_data(infer_column(&column)))))
                .collect(),
        ))
    }

    /// Accepts a frame, a set of one dimensional arrays, or a set of rows;
    /// unnamed columns are called `f0`, `f1`, ...
    fn normalize(&self, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::Map(frame) => {
                let columns = columns_of(frame.iter().map(|(_, column)| column).collect())?;
                Ok(Value::Map(frame.keys().map(str::to_string).zip(columns.into_iter().map(Value::Array)).collect()))
            }
            Value::Set(items) if !items.is_empty() && items.iter().all(|item| matches!(item, Value::Array(_))) => {
                let columns = columns_of(items.iter().collect())?;
                Ok(Value::Map(default_names(columns.len()).zip(columns.into_iter().map(Value::Array)).collect()))
            }
            Value::Set(rows) => {
                let width = rows.first().and_then(Value::as_set).map_or(0, <[Value]>::len);
                let mut columns: Vec<Option<ArrayData>> = vec![None; width];
                for row in &rows {
                    let cells = row
                        .as_set()
                        .filter(|cells| cells.len() == width)
                        .ok_or_else(|| CodecError::mismatch("frame rows must be sets of equal width"))?;
                    for (column, cell) in columns.iter_mut().zip(cells) {
                        let element = cell
                            .as_scalar()
                            .ok_or_else(|| CodecError::mismatch("frame cells must be scalars"))?
                            .value()
                            .clone();
                        match column {
                            Some(data) => data.push(element)?,
                            None => *column = Some(ArrayData::from_elements(element.subtype(), [element])?),
                        }
                    }
                }
                Ok(Value::Map(
                    default_names(width)
                        .zip(columns.into_iter().map(|data| {
                            Value::Array(NdArray::from_data(data.unwrap_or_else(|| ArrayData::empty(Subtype::Float))))
                        }))
                        .collect(),
                ))
            }
            other => Err(CodecError::mismatch(format!(
                "a {} value cannot be read as a frame",
                other.kind()
            ))),
        }
    }

    fn merge(&self, values: &[Value]) -> Result<Value, CodecError> {
        let mut merged: Option<ValueMap> = None;
        for value in values {
            let frame = self.frame(value.clone())?;
            let Some(into) = merged.as_mut() else {
                merged = Some(frame);
                continue;
            };
            if into.len() != frame.len() || frame.keys().any(|name| !into.contains_key(name)) {
                return Err(CodecError::mismatch("frames with different columns cannot be merged"));
            }
            let names: Vec<String> = into.keys().map(str::to_string).collect();
            for name in names {
                let (Some(Value::Array(head)), Some(Value::Array(tail))) = (into.get(&name), frame.get(&name)) else {
                    continue;
                };
                let column = if head.is_empty() {
                    tail.clone()
                } else {
                    let mut data = head.data().clone();
                    data.extend(tail.data())?;
                    let precision = head.precision().max(tail.precision());
                    NdArray::from_data(data).with_precision(precision).with_units(head.units())
                };
                into.insert(name, column);
            }
        }
        Ok(Value::Map(merged.unwrap_or_default()))
    }

    fn merges_on_append(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(x: Vec<i64>, name: Vec<&str>) -> Value {
        Value::Map(
            ValueMap::new()
                .with("x", NdArray::from_data(x))
                .with("name", NdArray::from_data(name.into_iter().map(str::to_string).collect::<Vec<_>>())),
        )
    }

    #[test]
    fn test_round_trip_with_text() {
        let mut serializer = PandasSerializer::default();
        let value = frame(vec![1, 2], vec!["ab", "c"]);
        let bytes = serializer.serialize(&value).unwrap();
        assert_eq!(bytes, b"x\tname\n1\tab\n2\tc\n");
        assert_eq!(serializer.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn test_complex_cells() {
        assert_eq!(parse_complex("1.0+2.5j"), Some(Complex::new(1.0, 2.5)));
        assert_eq!(parse_complex("-1e-3-2.0j"), Some(Complex::new(-0.001, -2.0)));
        assert_eq!(parse_complex("1.0"), None);
        let column = infer_column(&["1.0+1.0j", "0.0-1.0j"]);
        assert_eq!(column.subtype(), Subtype::Complex);
    }

    #[test]
    fn test_merge_appends_rows() {
        let serializer = PandasSerializer::default();
        let merged = serializer
            .merge(&[frame(vec![1], vec!["a"]), frame(vec![2, 3], vec!["b", "c"])])
            .unwrap();
        assert_eq!(merged, frame(vec![1, 2, 3], vec!["a", "b", "c"]));

        let other = Value::Map(ValueMap::new().with("y", NdArray::from_data(vec![1i64])));
        assert!(serializer.merge(&[merged, other]).is_err());
    }

    #[test]
    fn test_normalize_rows() {
        let rows = Value::Set(vec![
            Value::Set(vec![Value::from(1i64), Value::from(0.5)]),
            Value::Set(vec![Value::from(2i64), Value::from(1.5)]),
        ]);
        let value = PandasSerializer::default().normalize(rows).unwrap();
        let frame = value.as_map().unwrap();
        assert_eq!(frame.keys().collect::<Vec<_>>(), ["f0", "f1"]);
        assert_eq!(frame.get("f1").and_then(Value::as_array).unwrap().len(), 2);
    }

    #[test]
    fn test_ragged_row_reports_offset() {
        match PandasSerializer::default().deserialize(b"a\tb\n1\t2\n3\n") {
            Err(CodecError::Format { offset, .. }) => assert_eq!(offset, 8),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_delimiter_in_cells() {
        let mut serializer = PandasSerializer::default();
        assert!(serializer.serialize(&frame(vec![1], vec!["a\tb"])).is_err());
    }
}
