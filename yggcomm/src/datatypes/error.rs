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

//! Datatype layer error types.

use crate::datatypes::units::UnitsError;
use crate::schema::SchemaValidationError;
use thiserror::Error;

/// Errors raised by the type registry and the datatype classes.
///
/// [`UnsupportedValue`](Self::UnsupportedValue) is an expected control-flow
/// signal while guessing types: it means "this class does not apply" and is
/// never logged as a failure. Every other variant is a hard failure that
/// propagates to the serialize/deserialize boundary.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::DatatypeError;
///
/// let error = DatatypeError::unsupported("scalar", "value is a map");
/// assert!(error.is_unsupported());
///
/// let error = DatatypeError::corrupt("1darray", "7 bytes is not a multiple of 4");
/// assert!(!error.is_unsupported());
/// ```
#[derive(Debug, Error)]
pub enum DatatypeError {
    /// A class with this type name is already registered.
    #[error("datatype '{typename}' is already registered")]
    DuplicateType {
        /// The conflicting type name
        typename: String,
    },

    /// No class is registered under this type name.
    #[error("unknown datatype '{typename}'")]
    UnknownType {
        /// The type name that was looked up
        typename: String,
    },

    /// Guessing exhausted the registry without a match.
    #[error("no registered datatype can represent a {kind} value")]
    NoMatchingType {
        /// Short description of the value that could not be typed
        kind: String,
    },

    /// The value cannot be represented by this class.
    #[error("{typename} cannot represent the value: {reason}")]
    UnsupportedValue {
        /// The class that rejected the value
        typename: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Encoded bytes do not match their declared type.
    #[error("corrupt {typename} data: {reason}")]
    CorruptData {
        /// The class decoding the data
        typename: String,
        /// What was wrong with the bytes
        reason: String,
    },

    /// A value does not satisfy the type definition it is checked against.
    #[error("value does not match {expected}: {reason}")]
    TypeMismatch {
        /// The expected type name
        expected: String,
        /// What did not match
        reason: String,
    },

    /// Two containers being merged both define the same key.
    #[error("cannot merge containers: key '{key}' is defined more than once")]
    MergeConflict {
        /// The duplicated key
        key: String,
    },

    /// A definition or metadata header failed schema validation.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    /// A unit expression could not be parsed or converted.
    #[error(transparent)]
    Units(#[from] UnitsError),
}

impl DatatypeError {
    /// Creates an [`UnsupportedValue`](Self::UnsupportedValue) error.
    pub fn unsupported(typename: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            typename: typename.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a [`CorruptData`](Self::CorruptData) error.
    pub fn corrupt(typename: &str, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            typename: typename.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a [`TypeMismatch`](Self::TypeMismatch) error.
    pub fn mismatch(expected: &str, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is the "class does not apply" signal.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedValue { .. })
    }

    /// Returns `true` if the error describes malformed encoded bytes.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = DatatypeError::UnknownType {
            typename: "quaternion".to_string(),
        };
        assert_eq!(error.to_string(), "unknown datatype 'quaternion'");

        let error = DatatypeError::MergeConflict { key: "x".to_string() };
        assert!(error.to_string().contains("'x'"));
    }

    #[test]
    fn test_schema_conversion() {
        let error: DatatypeError = SchemaValidationError::missing("subtype").into();
        assert!(matches!(error, DatatypeError::Schema(_)));
        assert!(error.to_string().contains("subtype"));
    }

    #[test]
    fn test_classification() {
        assert!(DatatypeError::corrupt("set", "bad key").is_corrupt());
        assert!(!DatatypeError::mismatch("int32", "too wide").is_corrupt());
    }
}
