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

//! Series address templates.

use crate::comm::CommError;
use std::fmt;
use std::path::PathBuf;

/// A path template with one integer slot, such as `frame%d.ply` or
/// `step_%04d.txt`.
///
/// # Examples
///
/// ```rust
/// use yggcomm::comm::SeriesTemplate;
/// use std::path::PathBuf;
///
/// let template = SeriesTemplate::parse("out/step_%03d.txt").unwrap();
/// assert_eq!(template.path(7), PathBuf::from("out/step_007.txt"));
/// assert!(SeriesTemplate::parse("no_slot.txt").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesTemplate {
    prefix: String,
    suffix: String,
    width: usize,
}

impl SeriesTemplate {
    /// Parses a template. `%%` is a literal percent sign.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Address`] unless the template has exactly one
    /// `%d` or `%0Nd` slot.
    pub fn parse(template: &str) -> Result<Self, CommError> {
        let fail = |reason: &str| CommError::address(template, reason);
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut width = None;
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            let out = if width.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            if width.is_some() {
                return Err(fail("a series template has exactly one index slot"));
            }
            let mut digits = String::new();
            while let Some(digit) = chars.next_if(char::is_ascii_digit) {
                digits.push(digit);
            }
            if chars.next() != Some('d') {
                return Err(fail("index slots are %d or %0Nd"));
            }
            width = Some(match digits.as_str() {
                "" => 0,
                padded if padded.starts_with('0') => padded
                    .parse()
                    .map_err(|_| fail("index slot width is not a number"))?,
                _ => return Err(fail("index slot widths are zero padded, as in %04d")),
            });
        }
        let width = width.ok_or_else(|| fail("a series template needs a %d index slot"))?;
        Ok(Self { prefix, suffix, width })
    }

    /// Returns the path of member `index`.
    pub fn path(&self, index: u64) -> PathBuf {
        PathBuf::from(format!("{}{:0width$}{}", self.prefix, index, self.suffix, width = self.width))
    }
}

impl fmt::Display for SeriesTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escape = |text: &str| text.replace('%', "%%");
        if self.width == 0 {
            write!(f, "{}%d{}", escape(&self.prefix), escape(&self.suffix))
        } else {
            write!(f, "{}%0{}d{}", escape(&self.prefix), self.width, escape(&self.suffix))
        }
    }
}

/// Where a channel's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// One file.
    File(PathBuf),
    /// A numbered sequence of files.
    Series(SeriesTemplate),
}

impl Address {
    /// Resolves `address`, treating it as a template when `is_series` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::Address`] for an empty path or a bad template.
    pub fn resolve(address: &str, is_series: bool) -> Result<Self, CommError> {
        if address.is_empty() {
            return Err(CommError::address(address, "empty path"));
        }
        if is_series {
            SeriesTemplate::parse(address).map(Address::Series)
        } else {
            Ok(Address::File(PathBuf::from(address)))
        }
    }

    /// Returns the file at series position `index`; plain files ignore it.
    pub fn path(&self, index: u64) -> PathBuf {
        match self {
            Address::File(path) => path.clone(),
            Address::Series(template) => template.path(index),
        }
    }

    /// Returns `true` for series addresses.
    pub fn is_series(&self) -> bool {
        matches!(self, Address::Series(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::File(path) => write!(f, "{}", path.display()),
            Address::Series(template) => template.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        let plain = SeriesTemplate::parse("file%d.txt").unwrap();
        assert_eq!(plain.path(0), PathBuf::from("file0.txt"));
        assert_eq!(plain.path(12), PathBuf::from("file12.txt"));
        assert_eq!(plain.to_string(), "file%d.txt");

        let padded = SeriesTemplate::parse("100%%_%05d.dat").unwrap();
        assert_eq!(padded.path(42), PathBuf::from("100%_00042.dat"));
        assert_eq!(padded.to_string(), "100%%_%05d.dat");
    }

    #[test]
    fn test_bad_templates() {
        for template in ["plain.txt", "%d_%d.txt", "%s.txt", "%4d.txt", "trailing%"] {
            let error = SeriesTemplate::parse(template).unwrap_err();
            assert!(matches!(error, CommError::Address { .. }), "{template}");
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            Address::resolve("a%d.txt", false).unwrap(),
            Address::File(PathBuf::from("a%d.txt"))
        );
        let series = Address::resolve("a%d.txt", true).unwrap();
        assert!(series.is_series());
        assert_eq!(series.path(3), PathBuf::from("a3.txt"));
        assert!(Address::resolve("", false).is_err());
    }
}
