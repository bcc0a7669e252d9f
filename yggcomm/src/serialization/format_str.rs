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

//! C-style format strings.
//!
//! An ASCII table describes its row layout with a printf format such as
//! `%5s\t%ld\t%f\n`. [`CFormat`] parses one, formats rows with printf
//! semantics and parses rows back with a restricted scanf:
//!
//! - whitespace in the format matches any run of whitespace, including none;
//! - numeric fields ignore width and read the longest valid number;
//! - `%s` skips leading whitespace and reads up to `width` non-blank
//!   characters, `%c` reads exactly `width` (default 1) characters;
//! - a float directive followed directly by a `+`-flagged float directive
//!   and a literal `j` is one complex field, e.g. `%f%+fj`.
//!
//! Each field corresponds to a [`ColumnType`]; [`cformat2nptype`] and
//! [`nptype2cformat`] convert between the two views.

use crate::datatypes::{Complex, Element, Subtype};
use crate::serialization::CodecError;
use std::fmt;

const FORMAT: &str = "format string";
const ROW: &str = "ascii table";

/// printf flag characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    /// `-`
    pub left: bool,
    /// `+`
    pub plus: bool,
    /// ` `
    pub space: bool,
    /// `0`
    pub zero: bool,
    /// `#`
    pub alternate: bool,
}

/// printf length modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Length {
    /// No modifier
    #[default]
    Default,
    /// `hh`
    Char,
    /// `h`
    Short,
    /// `l`
    Long,
    /// `ll`
    LongLong,
}

impl Length {
    const fn as_str(self) -> &'static str {
        match self {
            Length::Default => "",
            Length::Char => "hh",
            Length::Short => "h",
            Length::Long => "l",
            Length::LongLong => "ll",
        }
    }

    const fn integer_precision(self) -> u32 {
        match self {
            Length::Char => 8,
            Length::Short => 16,
            Length::Default => 32,
            Length::Long | Length::LongLong => 64,
        }
    }

    const fn for_integer_precision(precision: u32) -> Self {
        match precision {
            8 => Length::Char,
            16 => Length::Short,
            32 => Length::Default,
            _ => Length::Long,
        }
    }
}

/// One `%` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Flag characters
    pub flags: Flags,
    /// Minimum field width
    pub width: Option<usize>,
    /// Precision
    pub precision: Option<usize>,
    /// Length modifier
    pub length: Length,
    /// Conversion character
    pub conversion: char,
}

impl Directive {
    /// A directive with no flags, width, precision or length.
    pub fn new(conversion: char) -> Self {
        Self {
            flags: Flags::default(),
            width: None,
            precision: None,
            length: Length::Default,
            conversion,
        }
    }

    const fn is_float(&self) -> bool {
        matches!(self.conversion, 'f' | 'F' | 'e' | 'E' | 'g' | 'G')
    }

    /// Formats one element with printf semantics.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the element does not suit
    /// the conversion.
    pub fn format(&self, element: &Element) -> Result<String, String> {
        match self.conversion {
            'd' | 'i' => match element {
                Element::Int(v) => Ok(self.format_integer(i128::from(*v))),
                Element::Uint(v) => Ok(self.format_integer(i128::from(*v))),
                other => Err(format!("%{} cannot format a {} value", self.conversion, other.subtype())),
            },
            'u' => match element {
                Element::Uint(v) => Ok(self.format_integer(i128::from(*v))),
                Element::Int(v) if *v >= 0 => Ok(self.format_integer(i128::from(*v))),
                other => Err(format!("%u cannot format {}", other)),
            },
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => element
                .as_f64()
                .map(|v| self.format_float(v))
                .ok_or_else(|| format!("%{} cannot format a {} value", self.conversion, element.subtype())),
            's' | 'c' => {
                let text = match element {
                    Element::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    Element::Unicode(text) => text.clone(),
                    other => {
                        return Err(format!("%{} cannot format a {} value", self.conversion, other.subtype()))
                    }
                };
                let text = match (self.conversion, self.precision) {
                    ('c', _) => text.chars().take(self.width.unwrap_or(1)).collect(),
                    (_, Some(precision)) => text.chars().take(precision).collect(),
                    _ => text,
                };
                Ok(self.pad("", &text, false))
            }
            other => Err(format!("unsupported conversion %{}", other)),
        }
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        }
    }

    fn pad(&self, sign: &str, body: &str, zero_fill: bool) -> String {
        let len = sign.chars().count() + body.chars().count();
        let width = self.width.unwrap_or(0);
        if len >= width {
            return format!("{}{}", sign, body);
        }
        let fill = width - len;
        if self.flags.left {
            format!("{}{}{}", sign, body, " ".repeat(fill))
        } else if zero_fill && self.flags.zero {
            format!("{}{}{}", sign, "0".repeat(fill), body)
        } else {
            format!("{}{}{}", " ".repeat(fill), sign, body)
        }
    }

    fn format_integer(&self, value: i128) -> String {
        let mut digits = value.unsigned_abs().to_string();
        if let Some(precision) = self.precision {
            if precision == 0 && value == 0 {
                digits.clear();
            } else if digits.len() < precision {
                digits = format!("{}{}", "0".repeat(precision - digits.len()), digits);
            }
        }
        self.pad(self.sign(value < 0), &digits, self.precision.is_none())
    }

    fn format_float(&self, value: f64) -> String {
        let sign = self.sign(value.is_sign_negative() && !value.is_nan());
        let uppercase = self.conversion.is_ascii_uppercase();
        let magnitude = value.abs();
        if !magnitude.is_finite() {
            let body = if magnitude.is_nan() { "nan" } else { "inf" };
            let body = if uppercase { body.to_ascii_uppercase() } else { body.to_string() };
            return self.pad(sign, &body, false);
        }
        let precision = self.precision.unwrap_or(6);
        let alternate = self.flags.alternate;
        let body = match self.conversion.to_ascii_lowercase() {
            'e' => exponential(magnitude, precision, alternate),
            'g' => general(magnitude, precision, alternate),
            _ => {
                let mut body = format!("{:.*}", precision, magnitude);
                if alternate && precision == 0 {
                    body.push('.');
                }
                body
            }
        };
        let body = if uppercase { body.to_ascii_uppercase() } else { body };
        self.pad(sign, &body, true)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("%")?;
        for (set, flag) in [
            (self.flags.left, '-'),
            (self.flags.plus, '+'),
            (self.flags.space, ' '),
            (self.flags.zero, '0'),
            (self.flags.alternate, '#'),
        ] {
            if set {
                write!(f, "{}", flag)?;
            }
        }
        if let Some(width) = self.width {
            write!(f, "{}", width)?;
        }
        if let Some(precision) = self.precision {
            write!(f, ".{}", precision)?;
        }
        write!(f, "{}{}", self.length.as_str(), self.conversion)
    }
}

fn split_exponent(text: &str) -> (&str, i32) {
    match text.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (text, 0),
    }
}

fn exponential(magnitude: f64, precision: usize, alternate: bool) -> String {
    let rendered = format!("{:.*e}", precision, magnitude);
    let (mantissa, exponent) = split_exponent(&rendered);
    let dot = if alternate && precision == 0 { "." } else { "" };
    format!(
        "{}{}e{}{:02}",
        mantissa,
        dot,
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

fn strip_zeros(body: &str) -> String {
    if body.contains('.') {
        body.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        body.to_string()
    }
}

fn general(magnitude: f64, precision: usize, alternate: bool) -> String {
    let precision = precision.max(1);
    let exponent = if magnitude == 0.0 {
        0
    } else {
        split_exponent(&format!("{:.*e}", precision - 1, magnitude)).1
    };
    if exponent >= -4 && (exponent as i64) < precision as i64 {
        let digits = (precision as i64 - 1 - exponent as i64).max(0) as usize;
        let body = format!("{:.*}", digits, magnitude);
        if alternate {
            body
        } else {
            strip_zeros(&body)
        }
    } else {
        let body = exponential(magnitude, precision - 1, alternate);
        if alternate {
            return body;
        }
        match body.split_once('e') {
            Some((mantissa, exponent)) => format!("{}e{}", strip_zeros(mantissa), exponent),
            None => body,
        }
    }
}

/// One column of a row format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A single directive
    Single(Directive),
    /// A real and an imaginary float directive followed by `j`
    Complex {
        /// Real part
        re: Directive,
        /// Imaginary part, always `+`-flagged
        im: Directive,
    },
}

impl Field {
    /// Returns the column type this field reads and writes.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Field::Complex { .. } => ColumnType::new(Subtype::Complex, 128),
            Field::Single(directive) => match directive.conversion {
                'd' | 'i' => ColumnType::new(Subtype::Int, directive.length.integer_precision()),
                'u' => ColumnType::new(Subtype::Uint, directive.length.integer_precision()),
                's' => ColumnType {
                    subtype: Subtype::Bytes,
                    precision: directive.width.map(|width| 8 * width as u32),
                },
                'c' => ColumnType::new(Subtype::Bytes, 8 * directive.width.unwrap_or(1) as u32),
                _ => ColumnType::new(Subtype::Float, 64),
            },
        }
    }

    fn format(&self, element: &Element) -> Result<String, String> {
        match self {
            Field::Single(directive) => directive.format(element),
            Field::Complex { re, im } => {
                let value = match element {
                    Element::Complex(value) => *value,
                    other => Complex::new(
                        other
                            .as_f64()
                            .ok_or_else(|| format!("complex field cannot format a {} value", other.subtype()))?,
                        0.0,
                    ),
                };
                Ok(format!(
                    "{}{}j",
                    re.format(&Element::Float(value.re))?,
                    im.format(&Element::Float(value.im))?
                ))
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Single(directive) => write!(f, "{}", directive),
            Field::Complex { re, im } => write!(f, "{}{}j", re, im),
        }
    }
}

/// The type of one table column: a subtype and its precision in bits.
///
/// Text columns may leave the precision open until the widest value is
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    /// Element subtype
    pub subtype: Subtype,
    /// Precision in bits
    pub precision: Option<u32>,
}

impl ColumnType {
    /// A column of known precision.
    pub const fn new(subtype: Subtype, precision: u32) -> Self {
        Self {
            subtype,
            precision: Some(precision),
        }
    }

    /// Returns the type that describes `element`.
    pub fn of(element: &Element) -> Self {
        Self::new(element.subtype(), element.natural_precision())
    }

    fn field(&self) -> Field {
        let precision = self.precision.unwrap_or_else(|| self.subtype.default_precision());
        match self.subtype {
            Subtype::Int | Subtype::Uint => Field::Single(Directive {
                length: Length::for_integer_precision(precision),
                ..Directive::new(if self.subtype == Subtype::Int { 'd' } else { 'u' })
            }),
            Subtype::Float => Field::Single(Directive::new('g')),
            Subtype::Complex => {
                let mut im = Directive::new('g');
                im.flags.plus = true;
                Field::Complex {
                    re: Directive::new('g'),
                    im,
                }
            }
            Subtype::Bytes | Subtype::Unicode => {
                let unit = if self.subtype == Subtype::Bytes { 8 } else { 32 };
                Field::Single(Directive {
                    width: self.precision.map(|bits| (bits / unit) as usize),
                    ..Directive::new('s')
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed C format string.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::Element;
/// use yggcomm::serialization::CFormat;
///
/// let format = CFormat::parse("%5s\t%ld\t%.2f\n").unwrap();
/// let row = vec![Element::Bytes(b"one".to_vec()), Element::Int(1), Element::Float(0.5)];
/// let line = format.format_row(&row).unwrap();
/// assert_eq!(line, "  one\t1\t0.50\n");
/// assert_eq!(format.parse_row(&line).unwrap(), row);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CFormat {
    segments: Vec<Segment>,
}

impl CFormat {
    /// Parses a format string.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Format`] at the offending offset for unknown
    /// conversions, unsupported modifiers and unterminated directives.
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let mut raw = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();
        while let Some((start, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.next_if(|&(_, next)| next == '%').is_some() {
                literal.push('%');
                continue;
            }
            let mut directive = Directive::new('\0');
            while let Some((_, flag)) = chars.next_if(|&(_, next)| "-+ 0#".contains(next)) {
                match flag {
                    '-' => directive.flags.left = true,
                    '+' => directive.flags.plus = true,
                    ' ' => directive.flags.space = true,
                    '0' => directive.flags.zero = true,
                    _ => directive.flags.alternate = true,
                }
            }
            directive.width = take_number(&mut chars);
            if chars.next_if(|&(_, next)| next == '.').is_some() {
                directive.precision = Some(take_number(&mut chars).unwrap_or(0));
            }
            directive.length = if chars.next_if(|&(_, next)| next == 'h').is_some() {
                if chars.next_if(|&(_, next)| next == 'h').is_some() {
                    Length::Char
                } else {
                    Length::Short
                }
            } else if chars.next_if(|&(_, next)| next == 'l').is_some() {
                if chars.next_if(|&(_, next)| next == 'l').is_some() {
                    Length::LongLong
                } else {
                    Length::Long
                }
            } else {
                Length::Default
            };
            let Some((offset, conversion)) = chars.next() else {
                return Err(CodecError::format(FORMAT, start, "unterminated directive"));
            };
            if !"diufFeEgGsc".contains(conversion) {
                return Err(CodecError::format(
                    FORMAT,
                    offset,
                    format!("unsupported conversion '%{}'", conversion),
                ));
            }
            directive.conversion = conversion;
            if !literal.is_empty() {
                raw.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            raw.push(Segment::Field(Field::Single(directive)));
        }
        if !literal.is_empty() {
            raw.push(Segment::Literal(literal));
        }
        Ok(Self {
            segments: group_complex(raw),
        })
    }

    /// Builds the format that writes the given column types.
    pub fn from_column_types(columns: &[ColumnType], delimiter: &str, newline: &str) -> Self {
        let mut segments = Vec::with_capacity(2 * columns.len());
        for (index, column) in columns.iter().enumerate() {
            if index > 0 && !delimiter.is_empty() {
                segments.push(Segment::Literal(delimiter.to_string()));
            }
            segments.push(Segment::Field(column.field()));
        }
        if !newline.is_empty() {
            segments.push(Segment::Literal(newline.to_string()));
        }
        Self { segments }
    }

    /// Iterates over the fields in order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(field) => Some(field),
            Segment::Literal(_) => None,
        })
    }

    /// Returns the number of fields.
    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    /// Returns the column type of every field.
    pub fn column_types(&self) -> Vec<ColumnType> {
        self.fields().map(Field::column_type).collect()
    }

    /// Returns the indices of `%s` fields without a width.
    pub fn unsized_text_fields(&self) -> Vec<usize> {
        self.fields()
            .enumerate()
            .filter(|(_, field)| {
                matches!(field, Field::Single(directive) if directive.conversion == 's' && directive.width.is_none())
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Sets the width of text field `index`.
    pub fn set_text_width(&mut self, index: usize, width: usize) {
        let field = self
            .segments
            .iter_mut()
            .filter_map(|segment| match segment {
                Segment::Field(field) => Some(field),
                Segment::Literal(_) => None,
            })
            .nth(index);
        if let Some(Field::Single(directive)) = field {
            if directive.conversion == 's' {
                directive.width = Some(width);
            }
        }
    }

    /// Formats one row.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TypeMismatch`] if the number of values differs
    /// from the number of fields or a value does not suit its field.
    pub fn format_row(&self, values: &[Element]) -> Result<String, CodecError> {
        let count = self.field_count();
        if values.len() != count {
            return Err(CodecError::mismatch(format!(
                "row has {} values but the format has {} fields",
                values.len(),
                count
            )));
        }
        let mut values = values.iter();
        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(field) => {
                    let Some(value) = values.next() else {
                        break;
                    };
                    line.push_str(&field.format(value).map_err(CodecError::mismatch)?);
                }
            }
        }
        Ok(line)
    }

    /// Parses one row.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Format`] with the byte offset into `line` where
    /// the text stopped matching.
    pub fn parse_row(&self, line: &str) -> Result<Vec<Element>, CodecError> {
        let mut scanner = Scanner { text: line, pos: 0 };
        let mut row = Vec::with_capacity(self.field_count());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => scanner.literal(text)?,
                Segment::Field(Field::Complex { .. }) => {
                    let re = scanner.float()?;
                    let im = scanner.float()?;
                    scanner.literal("j")?;
                    row.push(Element::Complex(Complex::new(re, im)));
                }
                Segment::Field(Field::Single(directive)) => row.push(scanner.field(directive)?),
            }
        }
        scanner.skip_whitespace();
        if scanner.pos < line.len() {
            return Err(CodecError::format(ROW, scanner.pos, "unexpected trailing text"));
        }
        Ok(row)
    }
}

impl fmt::Display for CFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(&text.replace('%', "%%"))?,
                Segment::Field(field) => write!(f, "{}", field)?,
            }
        }
        Ok(())
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Option<usize> {
    let mut number: Option<usize> = None;
    while let Some((_, digit)) = chars.next_if(|&(_, next)| next.is_ascii_digit()) {
        let value = digit.to_digit(10).unwrap_or(0) as usize;
        number = Some(number.unwrap_or(0).saturating_mul(10).saturating_add(value));
    }
    number
}

fn group_complex(raw: Vec<Segment>) -> Vec<Segment> {
    let mut grouped: Vec<Segment> = Vec::with_capacity(raw.len());
    let mut items = raw.into_iter().peekable();
    while let Some(segment) = items.next() {
        let Segment::Field(Field::Single(re)) = segment else {
            grouped.push(segment);
            continue;
        };
        let pairs_with_next = re.is_float()
            && matches!(items.peek(), Some(Segment::Field(Field::Single(im))) if im.is_float() && im.flags.plus);
        if !pairs_with_next {
            grouped.push(Segment::Field(Field::Single(re)));
            continue;
        }
        let Some(Segment::Field(Field::Single(im))) = items.next() else {
            continue;
        };
        match items.next_if(|next| matches!(next, Segment::Literal(text) if text.starts_with('j'))) {
            Some(Segment::Literal(text)) => {
                grouped.push(Segment::Field(Field::Complex { re, im }));
                if text.len() > 1 {
                    grouped.push(Segment::Literal(text[1..].to_string()));
                }
            }
            _ => {
                grouped.push(Segment::Field(Field::Single(re)));
                grouped.push(Segment::Field(Field::Single(im)));
            }
        }
    }
    grouped
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl Scanner<'_> {
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, reason: impl Into<String>) -> CodecError {
        CodecError::format(ROW, self.pos, reason)
    }

    fn literal(&mut self, expected: &str) -> Result<(), CodecError> {
        for c in expected.chars() {
            if c.is_whitespace() {
                self.skip_whitespace();
            } else if self.peek() == Some(c) {
                self.pos += c.len_utf8();
            } else {
                return Err(self.error(format!("expected '{}'", c.escape_default())));
            }
        }
        Ok(())
    }

    fn digits(&mut self) -> usize {
        let count = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        self.pos += count;
        count
    }

    fn sign(&mut self) {
        if matches!(self.peek(), Some('+' | '-')) {
            self.pos += 1;
        }
    }

    fn field(&mut self, directive: &Directive) -> Result<Element, CodecError> {
        match directive.conversion {
            'c' => {
                let count = directive.width.unwrap_or(1);
                let text: String = self.rest().chars().take(count).collect();
                if text.chars().count() < count {
                    return Err(self.error(format!("expected {} characters", count)));
                }
                self.pos += text.len();
                Ok(Element::Bytes(text.into_bytes()))
            }
            's' => {
                self.skip_whitespace();
                let limit = directive.width.unwrap_or(usize::MAX);
                let text: String = self
                    .rest()
                    .chars()
                    .take_while(|c| !c.is_whitespace())
                    .take(limit)
                    .collect();
                if text.is_empty() {
                    return Err(self.error("expected a string"));
                }
                self.pos += text.len();
                Ok(Element::Bytes(text.into_bytes()))
            }
            'd' | 'i' | 'u' => {
                self.skip_whitespace();
                let start = self.pos;
                if directive.conversion == 'u' {
                    if self.peek() == Some('+') {
                        self.pos += 1;
                    }
                } else {
                    self.sign();
                }
                if self.digits() == 0 {
                    self.pos = start;
                    return Err(self.error("expected an integer"));
                }
                let text = &self.text[start..self.pos];
                let parsed = if directive.conversion == 'u' {
                    text.trim_start_matches('+').parse().map(Element::Uint)
                } else {
                    text.parse().map(Element::Int)
                };
                parsed.map_err(|error| CodecError::format(ROW, start, format!("'{}': {}", text, error)))
            }
            _ => self.float().map(Element::Float),
        }
    }

    fn float(&mut self) -> Result<f64, CodecError> {
        self.skip_whitespace();
        let start = self.pos;
        self.sign();
        let rest = self.rest().to_ascii_lowercase();
        for word in ["infinity", "inf", "nan"] {
            if rest.starts_with(word) {
                self.pos += word.len();
                return self.float_value(start);
            }
        }
        let mut count = self.digits();
        if self.peek() == Some('.') {
            self.pos += 1;
            count += self.digits();
        }
        if count == 0 {
            self.pos = start;
            return Err(self.error("expected a number"));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.pos += 1;
            self.sign();
            if self.digits() == 0 {
                self.pos = mark;
            }
        }
        self.float_value(start)
    }

    fn float_value(&self, start: usize) -> Result<f64, CodecError> {
        let text = &self.text[start..self.pos];
        text.parse()
            .map_err(|error| CodecError::format(ROW, start, format!("'{}': {}", text, error)))
    }
}

/// Returns the column types of a format string.
///
/// # Errors
///
/// Returns [`CodecError::Format`] if the string does not parse.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::Subtype;
/// use yggcomm::serialization::{cformat2nptype, ColumnType};
///
/// let columns = cformat2nptype("%5s\t%hd\t%f%+fj\n").unwrap();
/// assert_eq!(columns, vec![
///     ColumnType::new(Subtype::Bytes, 40),
///     ColumnType::new(Subtype::Int, 16),
///     ColumnType::new(Subtype::Complex, 128),
/// ]);
/// ```
pub fn cformat2nptype(format_str: &str) -> Result<Vec<ColumnType>, CodecError> {
    Ok(CFormat::parse(format_str)?.column_types())
}

/// Returns a format string that writes the given column types.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::Subtype;
/// use yggcomm::serialization::{nptype2cformat, ColumnType};
///
/// let columns = [ColumnType::new(Subtype::Bytes, 40), ColumnType::new(Subtype::Uint, 8)];
/// assert_eq!(nptype2cformat(&columns, "\t", "\n"), "%5s\t%hhu\n");
/// ```
pub fn nptype2cformat(columns: &[ColumnType], delimiter: &str, newline: &str) -> String {
    CFormat::from_column_types(columns, delimiter, newline).to_string()
}
