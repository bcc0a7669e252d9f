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

//! Netpbm images.
//!
//! Reads PGM and PPM images in both plain (`P2`, `P3`) and raw (`P5`, `P6`)
//! encodings with up to 8 bits per sample. Each image is one unit, an
//! unsigned 8 bit array shaped `[height, width]` for grayscale or
//! `[height, width, 3]` for color. Writes always use the raw encodings. A
//! file may hold several images back to back.

use crate::comm::dedicated::{remaining, DedicatedFormat, UnitFile, UnitLog};
use crate::comm::{CommError, Direction};
use crate::datatypes::{ArrayData, Element, NdArray, Value};
use crate::serialization::CodecError;
use std::path::Path;
use tracing::debug;

const NAME: &str = "netpbm";

struct Scanner<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Scanner<'a> {
    fn skip_space(&mut self) {
        while let Some(&byte) = self.bytes.get(self.offset) {
            if byte == b'#' {
                while self.bytes.get(self.offset).is_some_and(|&b| b != b'\n') {
                    self.offset += 1;
                }
            } else if byte.is_ascii_whitespace() {
                self.offset += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Option<&'a [u8]> {
        self.skip_space();
        let bytes = self.bytes;
        let start = self.offset;
        while bytes.get(self.offset).is_some_and(|b| !b.is_ascii_whitespace() && *b != b'#') {
            self.offset += 1;
        }
        (self.offset > start).then(|| &bytes[start..self.offset])
    }

    fn number(&mut self, what: &str) -> Result<u64, CodecError> {
        let at = self.offset;
        self.token()
            .and_then(|token| std::str::from_utf8(token).ok())
            .and_then(|token| token.parse().ok())
            .ok_or_else(|| CodecError::format(NAME, at, format!("expected the {}", what)))
    }

    fn size(&mut self, what: &str) -> Result<usize, CodecError> {
        let at = self.offset;
        let value = self.number(what)?;
        usize::try_from(value).map_err(|_| CodecError::format(NAME, at, format!("{} {} is too large", what, value)))
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn at_end(&mut self) -> bool {
        self.skip_space();
        self.offset >= self.bytes.len()
    }
}

fn parse_image(scanner: &mut Scanner<'_>) -> Result<Value, CodecError> {
    let start = scanner.offset;
    let (plain, channels) = match scanner.token() {
        Some(b"P2") => (true, 1),
        Some(b"P3") => (true, 3),
        Some(b"P5") => (false, 1),
        Some(b"P6") => (false, 3),
        _ => return Err(CodecError::format(NAME, start, "expected a P2, P3, P5 or P6 magic number")),
    };
    let width = scanner.size("width")?;
    let height = scanner.size("height")?;
    let maxval_at = scanner.offset;
    let maxval = scanner.number("maximum sample value")?;
    if maxval == 0 || maxval > 255 {
        return Err(CodecError::format(
            NAME,
            maxval_at,
            format!("maximum sample value {} is not in 1..=255", maxval),
        ));
    }

    let count = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(channels))
        .ok_or_else(|| CodecError::format(NAME, start, format!("a {}x{} image is too large", width, height)))?;
    let samples = if plain {
        let mut samples = Vec::with_capacity(count.min(scanner.remaining()));
        for _ in 0..count {
            let at = scanner.offset;
            let sample = scanner.number("sample")?;
            if sample > maxval {
                return Err(CodecError::format(NAME, at, format!("sample {} exceeds {}", sample, maxval)));
            }
            samples.push(sample);
        }
        samples
    } else {
        // exactly one whitespace byte separates the header from raw samples
        let body = scanner.offset + 1;
        let end = body.checked_add(count);
        let Some((raw, end)) = end.and_then(|end| Some((scanner.bytes.get(body..end)?, end))) else {
            return Err(CodecError::format(NAME, body, format!("expected {} raw samples", count)));
        };
        scanner.offset = end;
        raw.iter().map(|&sample| u64::from(sample)).collect()
    };

    let shape = if channels == 1 {
        vec![height, width]
    } else {
        vec![height, width, channels]
    };
    let array = NdArray::new(ArrayData::Uint(samples), shape)?.with_precision(8);
    Ok(Value::Array(array))
}

fn parse_images(bytes: &[u8]) -> Result<Vec<(Value, u64)>, CodecError> {
    let mut scanner = Scanner { bytes, offset: 0 };
    let mut images = Vec::new();
    while !scanner.at_end() {
        let image = parse_image(&mut scanner)?;
        images.push((image, scanner.offset as u64));
    }
    Ok(images)
}

fn encode_image(value: &Value) -> Result<Vec<u8>, CodecError> {
    let Value::Array(array) = value else {
        return Err(CodecError::mismatch(format!("images are arrays, not {} values", value.kind())));
    };
    let (magic, height, width) = match array.shape() {
        &[height, width] => ("P5", height, width),
        &[height, width, 3] => ("P6", height, width),
        shape => return Err(CodecError::mismatch(format!("image shape {:?} is not [h, w] or [h, w, 3]", shape))),
    };
    let mut out = format!("{}\n{} {}\n255\n", magic, width, height).into_bytes();
    for element in array.data().elements() {
        let sample = match element {
            Element::Uint(sample) => u8::try_from(sample).ok(),
            Element::Int(sample) => u8::try_from(sample).ok(),
            _ => None,
        };
        let Some(sample) = sample else {
            return Err(CodecError::mismatch(format!("image sample {} is not in 0..=255", element)));
        };
        out.push(sample);
    }
    Ok(out)
}

/// Reads and writes Netpbm images.
///
/// # Examples
///
/// ```rust
/// use yggcomm::comm::dedicated::NetpbmFormat;
/// use yggcomm::comm::{DedicatedFormat, Direction};
/// use yggcomm::datatypes::{NdArray, Value};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("frame.pgm");
/// let image = NdArray::new(vec![0u64, 128, 255, 64].into(), vec![2, 2]).unwrap().with_precision(8);
///
/// let mut writer = NetpbmFormat::new();
/// writer.open(&path, Direction::Send).unwrap();
/// writer.write_unit(&Value::Array(image.clone())).unwrap();
/// writer.close().unwrap();
///
/// let mut reader = NetpbmFormat::new();
/// reader.open(&path, Direction::Recv).unwrap();
/// assert_eq!(reader.read_unit().unwrap(), Some(Value::Array(image)));
/// ```
#[derive(Debug, Default)]
pub struct NetpbmFormat {
    file: UnitFile,
    log: UnitLog,
}

impl NetpbmFormat {
    /// Creates an adapter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedicatedFormat for NetpbmFormat {
    fn name(&self) -> &'static str {
        NAME
    }

    fn open(&mut self, path: &Path, direction: Direction) -> Result<(), CommError> {
        let contents = self.file.open(path, direction)?;
        if direction == Direction::Recv {
            let images = parse_images(&contents)?;
            debug!(path = %path.display(), images = images.len(), "Loaded image file");
            self.log.load(images);
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
        let bytes = encode_image(value)?;
        self.file.write(NAME, &bytes)
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

    #[test]
    fn test_plain_color_image() {
        let text = b"P3\n# a comment\n2 1\n15\n15 0 0   0 15 0\n";
        let images = parse_images(text).unwrap();
        assert_eq!(images.len(), 1);
        let Value::Array(array) = &images[0].0 else {
            panic!("expected an array");
        };
        assert_eq!(array.shape(), &[1, 2, 3]);
        assert_eq!(array.precision(), 8);
        assert_eq!(array.data(), &ArrayData::Uint(vec![15, 0, 0, 0, 15, 0]));
    }

    #[test]
    fn test_raw_images_back_to_back() {
        let mut bytes = b"P5 2 1 255\n".to_vec();
        bytes.extend([7, 9]);
        bytes.extend(b"P5\n1 1\n255\n");
        bytes.push(b' ');
        let images = parse_images(&bytes).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].1, 13);
        let Value::Array(second) = &images[1].0 else {
            panic!("expected an array");
        };
        assert_eq!(second.data(), &ArrayData::Uint(vec![32]));
    }

    #[test]
    fn test_rejects_bad_images() {
        assert!(parse_images(b"P4\n1 1\n").unwrap_err().is_corrupt());
        assert!(parse_images(b"P5\n4 4\n65535\n").unwrap_err().is_corrupt());
        let error = parse_images(b"P5\n4 4\n255\nabc").unwrap_err();
        assert!(matches!(error, CodecError::Format { offset: 11, .. }));

        let wrong = NdArray::new(ArrayData::Uint(vec![1, 2, 3, 4]), vec![1, 2, 2]).unwrap();
        assert!(encode_image(&Value::Array(wrong)).unwrap_err().is_type_mismatch());
        let big = NdArray::from_data(vec![300i64]).reshape(vec![1, 1]).unwrap();
        assert!(encode_image(&Value::Array(big)).is_err());
    }

    #[test]
    fn test_rejects_impossible_dimensions() {
        let error = parse_images(b"P5 4294967296 4294967296 255\n").unwrap_err();
        assert!(matches!(error, CodecError::Format { offset: 0, .. }));
        assert!(parse_images(b"P6 18446744073709551615 1 255\n").unwrap_err().is_corrupt());
        assert!(parse_images(b"P5 99999999999999999999 1 255\n").unwrap_err().is_corrupt());
        assert!(parse_images(b"P5 3000000 3000000 255\n\x01\x02").unwrap_err().is_corrupt());
        assert!(parse_images(b"P2 3000000 3000000 255\n1 2 3\n").unwrap_err().is_corrupt());
    }
}
