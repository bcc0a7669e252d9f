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

//! Physical units.
//!
//! Unit expressions such as `kg*m/s**2`, `g/cm^3` or `km h-1` are parsed into
//! a scale factor relative to SI base units and a vector of exponents over
//! the seven SI base dimensions. Two expressions are convertible when their
//! dimension vectors are equal; converting multiplies by the ratio of their
//! factors.
//!
//! Only multiplicative units are supported. Affine temperature scales
//! (`degC`, `degF`) are rejected.
//!
//! # Examples
//!
//! ```rust
//! use yggcomm::datatypes::units::{are_convertible, conversion_factor};
//!
//! assert!(are_convertible("N", "kg*m/s**2"));
//! assert!(!are_convertible("m", "s"));
//! assert_eq!(conversion_factor("km", "m").unwrap(), 1000.0);
//! ```

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Number of SI base dimensions tracked.
pub const BASE_DIMENSIONS: usize = 7;

/// Names of the base dimensions, in exponent-vector order.
pub const DIMENSION_NAMES: [&str; BASE_DIMENSIONS] = [
    "length",
    "mass",
    "time",
    "current",
    "temperature",
    "amount",
    "luminosity",
];

/// Largest magnitude a dimension exponent may reach.
pub const MAX_EXPONENT: i32 = 64;

/// Errors raised while parsing or converting units.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitsError {
    /// The expression could not be parsed.
    #[error("invalid unit expression '{expression}': {reason}")]
    Invalid {
        /// The offending expression
        expression: String,
        /// What went wrong
        reason: String,
    },

    /// The two expressions measure different dimensions.
    #[error("cannot convert '{from}' to '{to}': incompatible dimensions")]
    Incompatible {
        /// Source units
        from: String,
        /// Target units
        to: String,
    },
}

/// A parsed unit: scale factor to SI base units plus dimension exponents.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    factor: f64,
    dimensions: [i32; BASE_DIMENSIONS],
}

impl Unit {
    /// The dimensionless unit with factor one.
    pub const fn dimensionless() -> Self {
        Self {
            factor: 1.0,
            dimensions: [0; BASE_DIMENSIONS],
        }
    }

    /// Parses a unit expression. The empty string is dimensionless.
    ///
    /// # Errors
    ///
    /// Returns [`UnitsError::Invalid`] for unknown symbols, unbalanced
    /// parentheses, non-integer exponents and affine temperature units.
    pub fn parse(expression: &str) -> Result<Self, UnitsError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() || trimmed == "dimensionless" || trimmed == "1" {
            return Ok(Self::dimensionless());
        }
        let tokens = tokenize(trimmed)?;
        let mut parser = Parser {
            expression: trimmed,
            tokens: tokens.into_iter().peekable(),
        };
        let unit = parser.product()?;
        if let Some(token) = parser.tokens.next() {
            return Err(invalid(trimmed, format!("unexpected {:?}", token)));
        }
        if !unit.factor.is_normal() {
            return Err(invalid(trimmed, format!("scale factor {} is not usable", unit.factor)));
        }
        Ok(unit)
    }

    /// Returns the scale factor relative to SI base units.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Returns the exponents over [`DIMENSION_NAMES`].
    pub fn dimensions(&self) -> &[i32; BASE_DIMENSIONS] {
        &self.dimensions
    }

    /// Returns `true` if every dimension exponent is zero.
    pub fn is_dimensionless(&self) -> bool {
        self.dimensions.iter().all(|exponent| *exponent == 0)
    }

    /// Returns `true` if values in `self` can be expressed in `other`.
    pub fn is_convertible_to(&self, other: &Unit) -> bool {
        self.dimensions == other.dimensions
    }

    fn multiply(&self, other: &Unit) -> Option<Unit> {
        let mut dimensions = self.dimensions;
        for (slot, exponent) in dimensions.iter_mut().zip(other.dimensions) {
            *slot = bounded(slot.checked_add(exponent))?;
        }
        Some(Unit {
            factor: self.factor * other.factor,
            dimensions,
        })
    }

    fn powi(&self, exponent: i32) -> Option<Unit> {
        let mut dimensions = self.dimensions;
        for slot in dimensions.iter_mut() {
            *slot = bounded(slot.checked_mul(exponent))?;
        }
        Some(Unit {
            factor: self.factor.powi(exponent),
            dimensions,
        })
    }
}

fn bounded(exponent: Option<i32>) -> Option<i32> {
    exponent.filter(|exponent| exponent.abs() <= MAX_EXPONENT)
}

/// Returns `true` if both expressions parse and share dimensions.
pub fn are_convertible(from: &str, to: &str) -> bool {
    match (Unit::parse(from), Unit::parse(to)) {
        (Ok(from), Ok(to)) => from.is_convertible_to(&to),
        _ => false,
    }
}

/// Returns the factor converting a value in `from` into `to`.
///
/// # Errors
///
/// Returns an error if either expression is invalid or the dimensions differ.
pub fn conversion_factor(from: &str, to: &str) -> Result<f64, UnitsError> {
    let source = Unit::parse(from)?;
    let target = Unit::parse(to)?;
    if !source.is_convertible_to(&target) {
        return Err(UnitsError::Incompatible {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(source.factor / target.factor)
}

fn invalid(expression: &str, reason: impl Into<String>) -> UnitsError {
    UnitsError::Invalid {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

const L: usize = 0;
const M: usize = 1;
const T: usize = 2;
const I: usize = 3;
const TH: usize = 4;
const N: usize = 5;
const J: usize = 6;

fn dims(pairs: &[(usize, i32)]) -> [i32; BASE_DIMENSIONS] {
    let mut out = [0; BASE_DIMENSIONS];
    for (index, exponent) in pairs {
        out[*index] = *exponent;
    }
    out
}

// (symbol, factor, dimensions, accepts SI prefix)
fn lookup_symbol(symbol: &str) -> Option<(f64, [i32; BASE_DIMENSIONS], bool)> {
    let entry = match symbol {
        "m" => (1.0, dims(&[(L, 1)]), true),
        "g" => (1e-3, dims(&[(M, 1)]), true),
        "s" | "sec" => (1.0, dims(&[(T, 1)]), true),
        "A" => (1.0, dims(&[(I, 1)]), true),
        "K" => (1.0, dims(&[(TH, 1)]), true),
        "mol" => (1.0, dims(&[(N, 1)]), true),
        "cd" => (1.0, dims(&[(J, 1)]), true),
        "N" => (1.0, dims(&[(M, 1), (L, 1), (T, -2)]), true),
        "J" => (1.0, dims(&[(M, 1), (L, 2), (T, -2)]), true),
        "W" => (1.0, dims(&[(M, 1), (L, 2), (T, -3)]), true),
        "Pa" => (1.0, dims(&[(M, 1), (L, -1), (T, -2)]), true),
        "Hz" => (1.0, dims(&[(T, -1)]), true),
        "C" => (1.0, dims(&[(I, 1), (T, 1)]), true),
        "V" => (1.0, dims(&[(M, 1), (L, 2), (T, -3), (I, -1)]), true),
        "L" | "l" => (1e-3, dims(&[(L, 3)]), true),
        "bar" => (1e5, dims(&[(M, 1), (L, -1), (T, -2)]), true),
        "eV" => (1.602_176_634e-19, dims(&[(M, 1), (L, 2), (T, -2)]), true),
        "min" => (60.0, dims(&[(T, 1)]), false),
        "h" | "hr" | "hour" => (3600.0, dims(&[(T, 1)]), false),
        "d" | "day" => (86_400.0, dims(&[(T, 1)]), false),
        "yr" | "year" => (31_557_600.0, dims(&[(T, 1)]), false),
        "atm" => (101_325.0, dims(&[(M, 1), (L, -1), (T, -2)]), false),
        "cal" => (4.184, dims(&[(M, 1), (L, 2), (T, -2)]), true),
        "rad" => (1.0, [0; BASE_DIMENSIONS], false),
        "deg" | "degree" => (std::f64::consts::PI / 180.0, [0; BASE_DIMENSIONS], false),
        "percent" => (0.01, [0; BASE_DIMENSIONS], false),
        _ => return None,
    };
    Some(entry)
}

const PREFIXES: [(&str, f64); 20] = [
    ("da", 1e1),
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
    ("z", 1e-21),
];

fn resolve_symbol(expression: &str, symbol: &str) -> Result<Unit, UnitsError> {
    if matches!(symbol, "degC" | "degF" | "°C" | "°F" | "celsius" | "fahrenheit") {
        return Err(invalid(
            expression,
            format!("affine temperature unit '{}' is not supported", symbol),
        ));
    }
    if let Some((factor, dimensions, _)) = lookup_symbol(symbol) {
        return Ok(Unit { factor, dimensions });
    }
    for (prefix, scale) in PREFIXES {
        if let Some(base) = symbol.strip_prefix(prefix) {
            if let Some((factor, dimensions, true)) = lookup_symbol(base) {
                return Ok(Unit {
                    factor: factor * scale,
                    dimensions,
                });
            }
        }
    }
    Err(invalid(expression, format!("unknown unit '{}'", symbol)))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Symbol(String),
    Number(f64),
    Mul,
    Div,
    Pow,
    Minus,
    Open,
    Close,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, UnitsError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Mul);
                }
            }
            '^' => {
                chars.next();
                tokens.push(Token::Pow);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Div);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '+' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if c.is_ascii_digit() || c == '.' => {
                tokens.push(Token::Number(read_number(expression, &mut chars)?));
            }
            c if c.is_alphabetic() || c == '°' => {
                let mut symbol = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphabetic() || c == '°' {
                        symbol.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Symbol(symbol));
                // Attached exponents: `m2`, `s-1`.
                let mut lookahead = chars.clone();
                let negative = lookahead.peek() == Some(&'-');
                if negative {
                    lookahead.next();
                }
                if lookahead.peek().is_some_and(char::is_ascii_digit) {
                    tokens.push(Token::Pow);
                    if negative {
                        chars.next();
                        tokens.push(Token::Minus);
                    }
                    tokens.push(Token::Number(read_number(expression, &mut chars)?));
                }
            }
            other => {
                return Err(invalid(expression, format!("unexpected character '{}'", other)));
            }
        }
    }
    Ok(tokens)
}

fn read_number(expression: &str, chars: &mut Peekable<Chars<'_>>) -> Result<f64, UnitsError> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || c == '.' {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    text.parse()
        .map_err(|_| invalid(expression, format!("invalid number '{}'", text)))
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Peekable<std::vec::IntoIter<Token>>,
}

impl Parser<'_> {
    fn product(&mut self) -> Result<Unit, UnitsError> {
        let mut unit = self.power()?;
        loop {
            match self.tokens.peek() {
                Some(Token::Mul) => {
                    self.tokens.next();
                    let factor = self.power()?;
                    unit = self.checked(unit.multiply(&factor))?;
                }
                Some(Token::Div) => {
                    self.tokens.next();
                    let divisor = self.power()?;
                    let inverse = self.checked(divisor.powi(-1))?;
                    unit = self.checked(unit.multiply(&inverse))?;
                }
                Some(Token::Symbol(_) | Token::Number(_) | Token::Open) => {
                    let factor = self.power()?;
                    unit = self.checked(unit.multiply(&factor))?;
                }
                _ => return Ok(unit),
            }
        }
    }

    fn power(&mut self) -> Result<Unit, UnitsError> {
        let base = self.atom()?;
        if self.tokens.peek() != Some(&Token::Pow) {
            return Ok(base);
        }
        self.tokens.next();
        let negative = if self.tokens.peek() == Some(&Token::Minus) {
            self.tokens.next();
            true
        } else {
            false
        };
        let exponent = match self.tokens.next() {
            Some(Token::Number(value)) if value.fract() != 0.0 => {
                return Err(invalid(
                    self.expression,
                    format!("exponent {} is not an integer", value),
                ));
            }
            Some(Token::Number(value)) if value > f64::from(MAX_EXPONENT) => {
                return Err(invalid(
                    self.expression,
                    format!("exponent {} exceeds {}", value, MAX_EXPONENT),
                ));
            }
            Some(Token::Number(value)) => value as i32,
            other => {
                return Err(invalid(
                    self.expression,
                    format!("expected exponent, found {:?}", other),
                ));
            }
        };
        self.checked(base.powi(if negative { -exponent } else { exponent }))
    }

    fn checked(&self, unit: Option<Unit>) -> Result<Unit, UnitsError> {
        unit.ok_or_else(|| {
            invalid(
                self.expression,
                format!("dimension exponents exceed {}", MAX_EXPONENT),
            )
        })
    }

    fn atom(&mut self) -> Result<Unit, UnitsError> {
        match self.tokens.next() {
            Some(Token::Symbol(symbol)) => resolve_symbol(self.expression, &symbol),
            Some(Token::Number(value)) => Ok(Unit {
                factor: value,
                dimensions: [0; BASE_DIMENSIONS],
            }),
            Some(Token::Open) => {
                let inner = self.product()?;
                match self.tokens.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(invalid(self.expression, "unbalanced parentheses")),
                }
            }
            other => Err(invalid(
                self.expression,
                format!("expected a unit, found {:?}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_dimensionless() {
        assert!(Unit::parse("").unwrap().is_dimensionless());
        assert!(Unit::parse("dimensionless").unwrap().is_dimensionless());
        assert!(are_convertible("", ""));
        assert!(!are_convertible("", "m"));
    }

    #[test]
    fn test_prefixes() {
        assert!(approx(Unit::parse("km").unwrap().factor(), 1e3));
        assert!(approx(Unit::parse("mm").unwrap().factor(), 1e-3));
        assert!(approx(Unit::parse("kg").unwrap().factor(), 1.0));
        assert!(approx(Unit::parse("hPa").unwrap().factor(), 100.0));
        assert!(approx(Unit::parse("µs").unwrap().factor(), 1e-6));
    }

    #[test]
    fn test_exact_symbols_win_over_prefixes() {
        assert_eq!(Unit::parse("cd").unwrap().dimensions()[J], 1);
        assert!(approx(Unit::parse("min").unwrap().factor(), 60.0));
        assert_eq!(Unit::parse("Pa").unwrap().dimensions()[M], 1);
    }

    #[test]
    fn test_compound_expressions() {
        assert!(are_convertible("N", "kg*m/s**2"));
        assert!(are_convertible("J", "N m"));
        assert!(are_convertible("m s-1", "km/h"));
        assert!(are_convertible("g/cm^3", "kg/m**3"));
        assert!(are_convertible("(kg*m)/(s*s)", "N"));
        assert!(approx(conversion_factor("g/cm^3", "kg/m**3").unwrap(), 1000.0));
        assert!(approx(conversion_factor("km/h", "m/s").unwrap(), 1000.0 / 3600.0));
    }

    #[test]
    fn test_incompatible() {
        let error = conversion_factor("m", "s").unwrap_err();
        assert!(matches!(error, UnitsError::Incompatible { .. }));
    }

    #[test]
    fn test_rejects_affine_and_unknown() {
        assert!(Unit::parse("degC").is_err());
        assert!(Unit::parse("furlong").is_err());
        assert!(Unit::parse("m**1.5").is_err());
        assert!(Unit::parse("(m").is_err());
    }

    #[test]
    fn test_exponents_are_bounded() {
        assert_eq!(Unit::parse("m**64").unwrap().dimensions()[L], 64);
        assert_eq!(Unit::parse("m-64").unwrap().dimensions()[L], -64);
        assert!(Unit::parse("m**65").is_err());
        assert!(Unit::parse("m**2147483647*m").is_err());
        assert!(Unit::parse("m**99999999999").is_err());
        assert!(Unit::parse("m**40*m**40").is_err());
        assert!(Unit::parse("(m**40)**40").is_err());
        assert!(Unit::parse("1/m**40/m**40").is_err());
        assert!(!are_convertible("m**2147483647*m", "m"));
    }

    #[test]
    fn test_unusable_factors() {
        assert!(Unit::parse("0 m").is_err());
        assert!(Unit::parse("1000**60*1000**60").is_err());
    }
}
