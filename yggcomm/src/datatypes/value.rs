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

//! Host values exchanged over channels.
//!
//! Every message carries exactly one [`Value`]. Numeric values keep the bit
//! width they travel with (`precision`) next to the payload, so that a value
//! decoded from a `float32` message re-encodes to the same bytes.
//!
//! Fixed width encodings are little-endian. String subtypes are fixed width
//! as well: `bytes` uses one byte per character and `unicode` uses UTF-32LE,
//! both zero padded up to the declared precision.

use crate::datatypes::geometry::{ObjMesh, Ply};
use crate::datatypes::DatatypeError;
use std::fmt;

/// The element kind of a scalar or array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// IEEE-754 floating point
    Float,
    /// Pair of floats
    Complex,
    /// Fixed width byte string
    Bytes,
    /// Fixed width UTF-32 string
    Unicode,
}

impl Subtype {
    /// Every subtype, in schema enum order.
    pub const ALL: [Subtype; 6] = [
        Subtype::Int,
        Subtype::Uint,
        Subtype::Float,
        Subtype::Complex,
        Subtype::Bytes,
        Subtype::Unicode,
    ];

    /// Returns the name used in type definitions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Subtype::Int => "int",
            Subtype::Uint => "uint",
            Subtype::Float => "float",
            Subtype::Complex => "complex",
            Subtype::Bytes => "bytes",
            Subtype::Unicode => "unicode",
        }
    }

    /// Parses a subtype name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|subtype| subtype.as_str() == name)
    }

    /// Returns `true` for the numeric subtypes.
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Subtype::Bytes | Subtype::Unicode)
    }

    /// Precision used when a definition names a subtype but no width.
    pub const fn default_precision(self) -> u32 {
        match self {
            Subtype::Int | Subtype::Uint | Subtype::Float => 64,
            Subtype::Complex => 128,
            Subtype::Bytes => 8,
            Subtype::Unicode => 32,
        }
    }

    /// Returns `true` if `precision` bits is a legal width for this subtype.
    pub fn is_valid_precision(self, precision: u32) -> bool {
        match self {
            Subtype::Int | Subtype::Uint => matches!(precision, 8 | 16 | 32 | 64),
            Subtype::Float => matches!(precision, 32 | 64),
            Subtype::Complex => matches!(precision, 64 | 128),
            Subtype::Bytes => precision > 0 && precision % 8 == 0,
            Subtype::Unicode => precision > 0 && precision % 32 == 0,
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complex number.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Complex {
    /// Creates a complex number.
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// A single scalar payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point
    Float(f64),
    /// Complex
    Complex(Complex),
    /// Byte string
    Bytes(Vec<u8>),
    /// Text
    Unicode(String),
}

impl Element {
    /// Returns the subtype of this element.
    pub fn subtype(&self) -> Subtype {
        match self {
            Element::Int(_) => Subtype::Int,
            Element::Uint(_) => Subtype::Uint,
            Element::Float(_) => Subtype::Float,
            Element::Complex(_) => Subtype::Complex,
            Element::Bytes(_) => Subtype::Bytes,
            Element::Unicode(_) => Subtype::Unicode,
        }
    }

    /// The zero value of a subtype.
    pub fn zero(subtype: Subtype) -> Self {
        match subtype {
            Subtype::Int => Element::Int(0),
            Subtype::Uint => Element::Uint(0),
            Subtype::Float => Element::Float(0.0),
            Subtype::Complex => Element::Complex(Complex::default()),
            Subtype::Bytes => Element::Bytes(Vec::new()),
            Subtype::Unicode => Element::Unicode(String::new()),
        }
    }

    /// Smallest precision that holds this element without loss.
    ///
    /// Numeric elements report their subtype's default width; strings report
    /// their length (at least one character).
    pub fn natural_precision(&self) -> u32 {
        match self {
            Element::Bytes(bytes) => 8 * bytes.len().max(1) as u32,
            Element::Unicode(text) => 32 * text.chars().count().max(1) as u32,
            other => other.subtype().default_precision(),
        }
    }

    /// Returns `true` if the element can be stored in `precision` bits.
    pub fn fits(&self, precision: u32) -> bool {
        if !self.subtype().is_valid_precision(precision) {
            return false;
        }
        match self {
            Element::Int(value) => {
                precision >= 64 || {
                    let bound = 1i64 << (precision - 1);
                    (-bound..bound).contains(value)
                }
            }
            Element::Uint(value) => precision >= 64 || *value < (1u64 << precision),
            Element::Float(_) | Element::Complex(_) => true,
            Element::Bytes(bytes) => bytes.len() * 8 <= precision as usize,
            Element::Unicode(text) => text.chars().count() * 32 <= precision as usize,
        }
    }

    /// Returns the element as a float, if numeric and real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Element::Int(value) => Some(*value as f64),
            Element::Uint(value) => Some(*value as f64),
            Element::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Multiplies a numeric element by `factor`.
    ///
    /// Integers only accept factors that keep them integral.
    pub fn scale(&self, factor: f64) -> Option<Element> {
        if factor == 1.0 {
            return Some(self.clone());
        }
        match self {
            Element::Int(value) => {
                let scaled = *value as f64 * factor;
                (scaled.fract() == 0.0).then_some(Element::Int(scaled as i64))
            }
            Element::Uint(value) => {
                let scaled = *value as f64 * factor;
                (scaled.fract() == 0.0 && scaled >= 0.0).then_some(Element::Uint(scaled as u64))
            }
            Element::Float(value) => Some(Element::Float(value * factor)),
            Element::Complex(c) => Some(Element::Complex(Complex::new(c.re * factor, c.im * factor))),
            Element::Bytes(_) | Element::Unicode(_) => None,
        }
    }

    /// Appends the little-endian encoding at `precision` bits.
    ///
    /// The caller must have checked [`fits`](Self::fits).
    pub(crate) fn write_le(&self, precision: u32, out: &mut Vec<u8>) {
        match (self, precision) {
            (Element::Int(v), 8) => out.extend_from_slice(&(*v as i8).to_le_bytes()),
            (Element::Int(v), 16) => out.extend_from_slice(&(*v as i16).to_le_bytes()),
            (Element::Int(v), 32) => out.extend_from_slice(&(*v as i32).to_le_bytes()),
            (Element::Int(v), _) => out.extend_from_slice(&v.to_le_bytes()),
            (Element::Uint(v), 8) => out.extend_from_slice(&(*v as u8).to_le_bytes()),
            (Element::Uint(v), 16) => out.extend_from_slice(&(*v as u16).to_le_bytes()),
            (Element::Uint(v), 32) => out.extend_from_slice(&(*v as u32).to_le_bytes()),
            (Element::Uint(v), _) => out.extend_from_slice(&v.to_le_bytes()),
            (Element::Float(v), 32) => out.extend_from_slice(&(*v as f32).to_le_bytes()),
            (Element::Float(v), _) => out.extend_from_slice(&v.to_le_bytes()),
            (Element::Complex(c), 64) => {
                out.extend_from_slice(&(c.re as f32).to_le_bytes());
                out.extend_from_slice(&(c.im as f32).to_le_bytes());
            }
            (Element::Complex(c), _) => {
                out.extend_from_slice(&c.re.to_le_bytes());
                out.extend_from_slice(&c.im.to_le_bytes());
            }
            (Element::Bytes(bytes), _) => {
                let width = precision as usize / 8;
                out.extend_from_slice(bytes);
                out.resize(out.len() + width.saturating_sub(bytes.len()), 0);
            }
            (Element::Unicode(text), _) => {
                let width = precision as usize / 32;
                let mut count = 0;
                for c in text.chars() {
                    out.extend_from_slice(&(c as u32).to_le_bytes());
                    count += 1;
                }
                out.resize(out.len() + 4 * width.saturating_sub(count), 0);
            }
        }
    }

    /// Decodes one item of `precision / 8` bytes.
    pub(crate) fn read_le(subtype: Subtype, precision: u32, chunk: &[u8]) -> Result<Self, String> {
        fn array<const N: usize>(chunk: &[u8]) -> Result<[u8; N], String> {
            chunk
                .try_into()
                .map_err(|_| format!("expected {} bytes, found {}", N, chunk.len()))
        }
        let element = match (subtype, precision) {
            (Subtype::Int, 8) => Element::Int(i8::from_le_bytes(array(chunk)?) as i64),
            (Subtype::Int, 16) => Element::Int(i16::from_le_bytes(array(chunk)?) as i64),
            (Subtype::Int, 32) => Element::Int(i32::from_le_bytes(array(chunk)?) as i64),
            (Subtype::Int, 64) => Element::Int(i64::from_le_bytes(array(chunk)?)),
            (Subtype::Uint, 8) => Element::Uint(u8::from_le_bytes(array(chunk)?) as u64),
            (Subtype::Uint, 16) => Element::Uint(u16::from_le_bytes(array(chunk)?) as u64),
            (Subtype::Uint, 32) => Element::Uint(u32::from_le_bytes(array(chunk)?) as u64),
            (Subtype::Uint, 64) => Element::Uint(u64::from_le_bytes(array(chunk)?)),
            (Subtype::Float, 32) => Element::Float(f32::from_le_bytes(array(chunk)?) as f64),
            (Subtype::Float, 64) => Element::Float(f64::from_le_bytes(array(chunk)?)),
            (Subtype::Complex, 64) => Element::Complex(Complex::new(
                f32::from_le_bytes(array(&chunk[..4.min(chunk.len())])?) as f64,
                f32::from_le_bytes(array(chunk.get(4..).unwrap_or_default())?) as f64,
            )),
            (Subtype::Complex, 128) => Element::Complex(Complex::new(
                f64::from_le_bytes(array(&chunk[..8.min(chunk.len())])?),
                f64::from_le_bytes(array(chunk.get(8..).unwrap_or_default())?),
            )),
            (Subtype::Bytes, _) => {
                let end = chunk.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                Element::Bytes(chunk[..end].to_vec())
            }
            (Subtype::Unicode, _) => {
                if chunk.len() % 4 != 0 {
                    return Err(format!("{} bytes is not whole UTF-32 characters", chunk.len()));
                }
                let mut text = String::new();
                for unit in chunk.chunks_exact(4) {
                    let code = u32::from_le_bytes(array(unit)?);
                    if code == 0 {
                        continue;
                    }
                    let c = char::from_u32(code)
                        .ok_or_else(|| format!("invalid code point {:#x}", code))?;
                    text.push(c);
                }
                Element::Unicode(text)
            }
            (subtype, precision) => {
                return Err(format!("{} bits is not a valid {} precision", precision, subtype));
            }
        };
        Ok(element)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Int(v) => write!(f, "{}", v),
            Element::Uint(v) => write!(f, "{}", v),
            Element::Float(v) => write!(f, "{}", v),
            Element::Complex(c) => write!(f, "{}{:+}j", c.re, c.im),
            Element::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Element::Unicode(text) => f.write_str(text),
        }
    }
}

/// A scalar value with its wire precision and units.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{Element, Scalar};
///
/// let length = Scalar::float64(1.5).with_units("m");
/// assert_eq!(length.value(), &Element::Float(1.5));
/// assert_eq!(length.precision(), 64);
/// assert_eq!(length.units(), "m");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    value: Element,
    precision: u32,
    units: String,
}

impl Scalar {
    /// Creates a scalar stored at `precision` bits.
    pub fn new(value: Element, precision: u32) -> Self {
        Self {
            value,
            precision,
            units: String::new(),
        }
    }

    /// A signed integer of `precision` bits.
    pub fn int(value: i64, precision: u32) -> Self {
        Self::new(Element::Int(value), precision)
    }

    /// An unsigned integer of `precision` bits.
    pub fn uint(value: u64, precision: u32) -> Self {
        Self::new(Element::Uint(value), precision)
    }

    /// A single precision float.
    pub fn float32(value: f32) -> Self {
        Self::new(Element::Float(value as f64), 32)
    }

    /// A double precision float.
    pub fn float64(value: f64) -> Self {
        Self::new(Element::Float(value), 64)
    }

    /// A complex of `precision` bits (64 or 128).
    pub fn complex(re: f64, im: f64, precision: u32) -> Self {
        Self::new(Element::Complex(Complex::new(re, im)), precision)
    }

    /// A byte string sized to its contents.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        let value = Element::Bytes(value.into());
        let precision = value.natural_precision();
        Self::new(value, precision)
    }

    /// A text string sized to its contents.
    pub fn unicode(value: impl Into<String>) -> Self {
        let value = Element::Unicode(value.into());
        let precision = value.natural_precision();
        Self::new(value, precision)
    }

    /// Attaches units.
    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Returns the payload.
    pub fn value(&self) -> &Element {
        &self.value
    }

    /// Returns the subtype.
    pub fn subtype(&self) -> Subtype {
        self.value.subtype()
    }

    /// Returns the precision in bits.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Returns the units expression (empty when unitless).
    pub fn units(&self) -> &str {
        &self.units
    }

    pub(crate) fn into_parts(self) -> (Element, u32, String) {
        (self.value, self.precision, self.units)
    }
}

/// Column storage for arrays, one vector per subtype.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    /// Signed integers
    Int(Vec<i64>),
    /// Unsigned integers
    Uint(Vec<u64>),
    /// Floats
    Float(Vec<f64>),
    /// Complex numbers
    Complex(Vec<Complex>),
    /// Byte strings
    Bytes(Vec<Vec<u8>>),
    /// Text
    Unicode(Vec<String>),
}

impl ArrayData {
    /// An empty column of `subtype`.
    pub fn empty(subtype: Subtype) -> Self {
        match subtype {
            Subtype::Int => ArrayData::Int(Vec::new()),
            Subtype::Uint => ArrayData::Uint(Vec::new()),
            Subtype::Float => ArrayData::Float(Vec::new()),
            Subtype::Complex => ArrayData::Complex(Vec::new()),
            Subtype::Bytes => ArrayData::Bytes(Vec::new()),
            Subtype::Unicode => ArrayData::Unicode(Vec::new()),
        }
    }

    /// Builds a column from elements that all share `subtype`.
    ///
    /// # Errors
    ///
    /// Returns a mismatch error naming the first element of another subtype.
    pub fn from_elements(
        subtype: Subtype,
        elements: impl IntoIterator<Item = Element>,
    ) -> Result<Self, DatatypeError> {
        let mut data = Self::empty(subtype);
        for element in elements {
            data.push(element)?;
        }
        Ok(data)
    }

    /// Appends one element.
    ///
    /// # Errors
    ///
    /// Fails if the element's subtype differs from the column's.
    pub fn push(&mut self, element: Element) -> Result<(), DatatypeError> {
        match (self, element) {
            (ArrayData::Int(v), Element::Int(x)) => v.push(x),
            (ArrayData::Uint(v), Element::Uint(x)) => v.push(x),
            (ArrayData::Float(v), Element::Float(x)) => v.push(x),
            (ArrayData::Complex(v), Element::Complex(x)) => v.push(x),
            (ArrayData::Bytes(v), Element::Bytes(x)) => v.push(x),
            (ArrayData::Unicode(v), Element::Unicode(x)) => v.push(x),
            (column, element) => {
                return Err(DatatypeError::mismatch(
                    column.subtype().as_str(),
                    format!("cannot store a {} element", element.subtype()),
                ));
            }
        }
        Ok(())
    }

    /// Returns the subtype of the column.
    pub fn subtype(&self) -> Subtype {
        match self {
            ArrayData::Int(_) => Subtype::Int,
            ArrayData::Uint(_) => Subtype::Uint,
            ArrayData::Float(_) => Subtype::Float,
            ArrayData::Complex(_) => Subtype::Complex,
            ArrayData::Bytes(_) => Subtype::Bytes,
            ArrayData::Unicode(_) => Subtype::Unicode,
        }
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Int(v) => v.len(),
            ArrayData::Uint(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Complex(v) => v.len(),
            ArrayData::Bytes(v) => v.len(),
            ArrayData::Unicode(v) => v.len(),
        }
    }

    /// Returns `true` if the column has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns element `index`.
    pub fn get(&self, index: usize) -> Option<Element> {
        Some(match self {
            ArrayData::Int(v) => Element::Int(*v.get(index)?),
            ArrayData::Uint(v) => Element::Uint(*v.get(index)?),
            ArrayData::Float(v) => Element::Float(*v.get(index)?),
            ArrayData::Complex(v) => Element::Complex(*v.get(index)?),
            ArrayData::Bytes(v) => Element::Bytes(v.get(index)?.clone()),
            ArrayData::Unicode(v) => Element::Unicode(v.get(index)?.clone()),
        })
    }

    /// Iterates over the elements by value.
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Smallest precision holding every element; the default width when empty.
    pub fn natural_precision(&self) -> u32 {
        match self {
            ArrayData::Bytes(_) | ArrayData::Unicode(_) => self
                .elements()
                .map(|element| element.natural_precision())
                .max()
                .unwrap_or_else(|| self.subtype().default_precision()),
            _ => self.subtype().default_precision(),
        }
    }

    /// Returns `true` if every element fits in `precision` bits.
    pub fn fits(&self, precision: u32) -> bool {
        self.subtype().is_valid_precision(precision) && self.elements().all(|e| e.fits(precision))
    }

    /// Appends all elements of `other`.
    ///
    /// # Errors
    ///
    /// Fails if the subtypes differ.
    pub fn extend(&mut self, other: &ArrayData) -> Result<(), DatatypeError> {
        for element in other.elements() {
            self.push(element)?;
        }
        Ok(())
    }
}

impl From<Vec<i64>> for ArrayData {
    fn from(values: Vec<i64>) -> Self {
        ArrayData::Int(values)
    }
}

impl From<Vec<u64>> for ArrayData {
    fn from(values: Vec<u64>) -> Self {
        ArrayData::Uint(values)
    }
}

impl From<Vec<f64>> for ArrayData {
    fn from(values: Vec<f64>) -> Self {
        ArrayData::Float(values)
    }
}

impl From<Vec<Complex>> for ArrayData {
    fn from(values: Vec<Complex>) -> Self {
        ArrayData::Complex(values)
    }
}

impl From<Vec<String>> for ArrayData {
    fn from(values: Vec<String>) -> Self {
        ArrayData::Unicode(values)
    }
}

impl From<Vec<Vec<u8>>> for ArrayData {
    fn from(values: Vec<Vec<u8>>) -> Self {
        ArrayData::Bytes(values)
    }
}

/// A row-major N-dimensional array.
///
/// A one-dimensional array travels as `1darray`, anything else as `ndarray`.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::NdArray;
///
/// let grid = NdArray::new(vec![1i64, 2, 3, 4, 5, 6].into(), vec![2, 3]).unwrap();
/// assert_eq!(grid.ndim(), 2);
/// assert_eq!(grid.len(), 6);
/// assert!(NdArray::new(vec![1i64, 2].into(), vec![3]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    data: ArrayData,
    precision: u32,
    shape: Vec<usize>,
    units: String,
}

/// Returns the number of elements `shape` holds, or `None` on overflow.
pub(crate) fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |size, &extent| size.checked_mul(extent))
}

impl NdArray {
    /// Creates an array of the given shape.
    ///
    /// # Errors
    ///
    /// Fails if the shape does not account for exactly every element.
    pub fn new(data: ArrayData, shape: Vec<usize>) -> Result<Self, DatatypeError> {
        let size = element_count(&shape)
            .ok_or_else(|| DatatypeError::mismatch("ndarray", format!("shape {:?} overflows", shape)))?;
        if size != data.len() {
            return Err(DatatypeError::mismatch(
                "ndarray",
                format!("shape {:?} holds {} elements, data has {}", shape, size, data.len()),
            ));
        }
        let precision = data.natural_precision();
        Ok(Self {
            data,
            precision,
            shape,
            units: String::new(),
        })
    }

    /// Creates a one-dimensional array.
    pub fn from_data(data: impl Into<ArrayData>) -> Self {
        let data = data.into();
        let precision = data.natural_precision();
        Self {
            shape: vec![data.len()],
            data,
            precision,
            units: String::new(),
        }
    }

    /// Sets the element precision.
    #[must_use]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Attaches units.
    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Returns the element storage.
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Returns the element subtype.
    pub fn subtype(&self) -> Subtype {
        self.data.subtype()
    }

    /// Returns the element precision in bits.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Returns the shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the units expression.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Returns the same elements under a new shape.
    ///
    /// # Errors
    ///
    /// Fails if the element count differs.
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, DatatypeError> {
        let (precision, units) = (self.precision, self.units);
        Ok(Self::new(self.data, shape)?
            .with_precision(precision)
            .with_units(units))
    }

    pub(crate) fn into_parts(self) -> (ArrayData, u32, Vec<usize>, String) {
        (self.data, self.precision, self.shape, self.units)
    }

    pub(crate) fn from_parts(data: ArrayData, precision: u32, shape: Vec<usize>, units: String) -> Self {
        Self {
            data,
            precision,
            shape,
            units,
        }
    }
}

/// A string-keyed collection that keeps insertion order.
///
/// Equality ignores order: two maps are equal when they hold the same keys
/// with equal values.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`; replacement keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Removes `key`, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combines maps with disjoint keys.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::MergeConflict`] if a key appears twice.
    pub fn merge<'a>(maps: impl IntoIterator<Item = &'a ValueMap>) -> Result<ValueMap, DatatypeError> {
        let mut merged = ValueMap::new();
        for map in maps {
            for (key, value) in map.iter() {
                if merged.contains_key(key) {
                    return Err(DatatypeError::MergeConflict { key: key.to_string() });
                }
                merged.insert(key, value.clone());
            }
        }
        Ok(merged)
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|theirs| theirs == value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A decoded message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single number or string
    Scalar(Scalar),
    /// A one or N-dimensional array
    Array(NdArray),
    /// Keyed container
    Map(ValueMap),
    /// Ordered container
    Set(Vec<Value>),
    /// Polygon mesh in PLY structure
    Ply(Ply),
    /// Polygon mesh in Wavefront OBJ structure
    Obj(ObjMesh),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(array) if array.ndim() == 1 => "1darray",
            Value::Array(_) => "ndarray",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Ply(_) => "ply",
            Value::Obj(_) => "obj",
        }
    }

    /// Returns the scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Returns the array, if this is one.
    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns the map, if this is one.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the set members, if this is a set.
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the PLY mesh, if this is one.
    pub fn as_ply(&self) -> Option<&Ply> {
        match self {
            Value::Ply(ply) => Some(ply),
            _ => None,
        }
    }

    /// Returns the OBJ mesh, if this is one.
    pub fn as_obj(&self) -> Option<&ObjMesh> {
        match self {
            Value::Obj(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<NdArray> for Value {
    fn from(array: NdArray) -> Self {
        Value::Array(array)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Set(items)
    }
}

impl From<Ply> for Value {
    fn from(ply: Ply) -> Self {
        Value::Ply(ply)
    }
}

impl From<ObjMesh> for Value {
    fn from(obj: ObjMesh) -> Self {
        Value::Obj(obj)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::int(value, 64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::float64(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(Scalar::unicode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(element: &Element, precision: u32) -> Vec<u8> {
        let mut out = Vec::new();
        element.write_le(precision, &mut out);
        out
    }

    #[test]
    fn test_integer_widths() {
        assert_eq!(encode(&Element::Int(-2), 8), vec![0xfe]);
        assert_eq!(encode(&Element::Int(1), 32), vec![1, 0, 0, 0]);
        assert_eq!(encode(&Element::Uint(258), 16), vec![2, 1]);
        assert_eq!(Element::read_le(Subtype::Int, 8, &[0xfe]).unwrap(), Element::Int(-2));
        assert_eq!(Element::read_le(Subtype::Uint, 16, &[2, 1]).unwrap(), Element::Uint(258));
    }

    #[test]
    fn test_fits() {
        assert!(Element::Int(127).fits(8));
        assert!(!Element::Int(128).fits(8));
        assert!(Element::Int(-128).fits(8));
        assert!(!Element::Uint(256).fits(8));
        assert!(!Element::Float(1.0).fits(16));
        assert!(Element::Bytes(b"abc".to_vec()).fits(24));
        assert!(!Element::Bytes(b"abcd".to_vec()).fits(24));
    }

    #[test]
    fn test_string_padding_is_stripped() {
        let bytes = encode(&Element::Bytes(b"ab".to_vec()), 40);
        assert_eq!(bytes, b"ab\0\0\0");
        assert_eq!(
            Element::read_le(Subtype::Bytes, 40, &bytes).unwrap(),
            Element::Bytes(b"ab".to_vec())
        );

        let text = encode(&Element::Unicode("hé".to_string()), 96);
        assert_eq!(text.len(), 12);
        assert_eq!(
            Element::read_le(Subtype::Unicode, 96, &text).unwrap(),
            Element::Unicode("hé".to_string())
        );
    }

    #[test]
    fn test_complex_halves() {
        let bytes = encode(&Element::Complex(Complex::new(1.0, -1.0)), 64);
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            Element::read_le(Subtype::Complex, 64, &bytes).unwrap(),
            Element::Complex(Complex::new(1.0, -1.0))
        );
    }

    #[test]
    fn test_scale() {
        assert_eq!(Element::Int(150).scale(0.01), None);
        assert_eq!(Element::Int(3).scale(100.0), Some(Element::Int(300)));
        assert_eq!(Element::Float(2.0).scale(0.5), Some(Element::Float(1.0)));
        assert_eq!(Element::Bytes(vec![1]).scale(2.0), None);
    }

    #[test]
    fn test_array_column_rejects_foreign_elements() {
        let mut column = ArrayData::empty(Subtype::Float);
        column.push(Element::Float(1.0)).unwrap();
        assert!(column.push(Element::Int(1)).is_err());
        assert_eq!(column.len(), 1);
    }

    #[test]
    fn test_string_column_precision() {
        let column = ArrayData::from(vec![b"a".to_vec(), b"abcd".to_vec()]);
        assert_eq!(column.natural_precision(), 32);
        assert_eq!(ArrayData::empty(Subtype::Unicode).natural_precision(), 32);
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = ValueMap::new().with("x", 1i64).with("y", 2.0);
        let b = ValueMap::new().with("y", 2.0).with("x", 1i64);
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_ne!(a, ValueMap::new().with("x", 1i64));
    }

    #[test]
    fn test_map_merge() {
        let a = ValueMap::new().with("x", 1i64);
        let b = ValueMap::new().with("y", 2i64).with("z", 3i64);
        assert_eq!(ValueMap::merge([&a, &b]).unwrap(), ValueMap::merge([&b, &a]).unwrap());
        let error = ValueMap::merge([&a, &a]).unwrap_err();
        assert!(matches!(error, DatatypeError::MergeConflict { key } if key == "x"));
    }

    #[test]
    fn test_reshape() {
        let array = NdArray::from_data(vec![1.0, 2.0, 3.0, 4.0]).with_units("m");
        let square = array.reshape(vec![2, 2]).unwrap();
        assert_eq!(square.shape(), &[2, 2]);
        assert_eq!(square.units(), "m");
        assert!(square.reshape(vec![3]).is_err());
    }

    #[test]
    fn test_shape_overflow_is_an_error() {
        assert_eq!(element_count(&[usize::MAX, 2]), None);
        assert_eq!(element_count(&[]), Some(1));
        let array = NdArray::from_data(vec![1i64]);
        assert!(array.reshape(vec![1 << 32, 1 << 32, 16]).is_err());
    }
}
