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

//! Codec and format serializer error types.

use crate::datatypes::{DatatypeError, GeometryError};
use std::io;
use thiserror::Error;

/// Errors raised while turning values into messages and back.
///
/// Every variant is a hard failure: the codec never hands back bytes or
/// values it could not verify.
///
/// # Examples
///
/// ```rust
/// use yggcomm::serialization::CodecError;
///
/// let error = CodecError::malformed("separator not found");
/// assert!(error.is_malformed());
/// assert_eq!(error.to_string(), "malformed message: separator not found");
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a message: no separator, or the header is not a
    /// valid metadata document.
    #[error("malformed message: {reason}")]
    MalformedMessage {
        /// What was wrong with the bytes
        reason: String,
    },

    /// The codec produced metadata that does not satisfy its own type
    /// definition.
    #[error("encoding invariant violated: {reason}")]
    EncodingInvariant {
        /// Which check failed
        reason: String,
    },

    /// A value or message does not match the codec's bound type definition.
    #[error("type mismatch: {reason}")]
    TypeMismatch {
        /// What did not match
        reason: String,
    },

    /// A file-format document could not be parsed.
    #[error("invalid {format} data at byte {offset}: {reason}")]
    Format {
        /// Name of the format being parsed
        format: &'static str,
        /// Byte offset of the offending input
        offset: usize,
        /// What was expected
        reason: String,
    },

    /// The format has no merge operation.
    #[error("{format} does not support merging")]
    MergeUnsupported {
        /// Name of the format
        format: &'static str,
    },

    /// A record frame exceeds [`MAX_FRAME_SIZE`](crate::serialization::framing::MAX_FRAME_SIZE).
    #[error("frame of {size} bytes exceeds the maximum of {max}")]
    FrameTooLarge {
        /// Size announced or requested
        size: usize,
        /// The configured limit
        max: u32,
    },

    /// A datatype class rejected the value or the bytes.
    #[error(transparent)]
    Datatype(#[from] DatatypeError),

    /// Reading or writing record frames failed.
    #[error("frame I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    /// Creates a [`MalformedMessage`](Self::MalformedMessage) error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a [`TypeMismatch`](Self::TypeMismatch) error.
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            reason: reason.into(),
        }
    }

    /// Creates an [`EncodingInvariant`](Self::EncodingInvariant) error.
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::EncodingInvariant {
            reason: reason.into(),
        }
    }

    /// Creates a [`Format`](Self::Format) error.
    pub fn format(format: &'static str, offset: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            format,
            offset,
            reason: reason.into(),
        }
    }

    /// Returns `true` for [`MalformedMessage`](Self::MalformedMessage).
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMessage { .. })
    }

    /// Returns `true` for the codec's self-check failure.
    #[must_use]
    pub const fn is_encoding_invariant(&self) -> bool {
        matches!(self, Self::EncodingInvariant { .. })
    }

    /// Returns `true` if a value or message did not match its declared type,
    /// including mismatches reported by a datatype class.
    #[must_use]
    pub const fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. } | Self::Datatype(DatatypeError::TypeMismatch { .. })
        )
    }

    /// Returns `true` if on-disk or on-wire content was corrupt.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::Format { .. }
                | Self::FrameTooLarge { .. }
                | Self::Datatype(DatatypeError::CorruptData { .. })
        )
    }
}

impl From<GeometryError> for CodecError {
    fn from(error: GeometryError) -> Self {
        Self::Format {
            format: error.format,
            offset: error.offset,
            reason: error.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(CodecError::mismatch("int vs float").is_type_mismatch());
        assert!(CodecError::from(DatatypeError::mismatch("scalar", "wrong subtype")).is_type_mismatch());
        assert!(CodecError::from(DatatypeError::corrupt("scalar", "short")).is_corrupt());
        assert!(CodecError::invariant("metadata rejected").is_encoding_invariant());
        assert!(!CodecError::malformed("no separator").is_corrupt());
    }

    #[test]
    fn test_format_error_message() {
        let error = CodecError::format("ascii table", 12, "expected an integer");
        assert_eq!(error.to_string(), "invalid ascii table data at byte 12: expected an integer");
    }
}
