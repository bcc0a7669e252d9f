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

//! Top-level error types for yggcomm.
//!
//! Each layer owns its error enum:
//!
//! 1. **Schema**: definitions and metadata that break structural rules ([`SchemaValidationError`])
//! 2. **Datatypes**: registry lookups and value checks ([`DatatypeError`])
//! 3. **Codec**: message framing, encoding invariants and on-disk formats ([`CodecError`])
//! 4. **Comm**: addresses, file handles and channel misuse ([`CommError`])
//!
//! [`YggError`] composes them for callers that drive a whole pipeline.
//!
//! # Error Handling Strategy
//!
//! - **Schema errors** → fix the definition and retry
//! - **Datatype and codec errors** → abort the serialize or deserialize call
//! - **Comm errors** → reported as `false` by polling operations, retried by the driver
//!
//! # Examples
//!
//! ```rust
//! use yggcomm::YggError;
//! use yggcomm::schema::SchemaValidationError;
//! use yggcomm::serialization::CodecError;
//!
//! let error: YggError = SchemaValidationError::missing("typename").into();
//! assert!(error.is_schema_error());
//! assert!(error.is_recoverable());
//!
//! let error: YggError = CodecError::malformed("no separator").into();
//! assert!(error.is_codec_error());
//! assert!(!error.is_recoverable());
//! ```

use crate::comm::CommError;
use crate::datatypes::DatatypeError;
use crate::schema::SchemaValidationError;
use crate::serialization::CodecError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for yggcomm operations.
#[derive(Debug)]
pub enum YggError {
    /// A definition or header failed validation.
    Schema(SchemaValidationError),

    /// A registry lookup or value check failed.
    Datatype(DatatypeError),

    /// Encoding or decoding a message failed.
    Codec(CodecError),

    /// A file channel failed.
    Comm(CommError),
}

impl YggError {
    /// Returns `true` if the root cause is a schema violation, however deep
    /// it was raised.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::Schema(_) => true,
            Self::Datatype(e) => matches!(e, DatatypeError::Schema(_)),
            Self::Codec(CodecError::Datatype(e)) => matches!(e, DatatypeError::Schema(_)),
            Self::Comm(CommError::Codec(CodecError::Datatype(e))) => matches!(e, DatatypeError::Schema(_)),
            _ => false,
        }
    }

    /// Returns `true` if this is a datatype error.
    #[must_use]
    pub const fn is_datatype_error(&self) -> bool {
        matches!(self, Self::Datatype(_))
    }

    /// Returns `true` if this is a codec error.
    #[must_use]
    pub const fn is_codec_error(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// Returns `true` if this is a comm error.
    #[must_use]
    pub const fn is_comm_error(&self) -> bool {
        matches!(self, Self::Comm(_))
    }

    /// Returns `true` if the caller can reasonably retry.
    ///
    /// Schema errors are fixed by correcting the definition. Unsupported
    /// values only mean a datatype does not apply. Comm errors defer to
    /// [`CommError::is_recoverable`]. Everything else signals bad data or a
    /// broken datatype.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Schema(_) => true,
            Self::Datatype(e) => e.is_unsupported() || matches!(e, DatatypeError::Schema(_)),
            Self::Codec(_) => false,
            Self::Comm(e) => e.is_recoverable(),
        }
    }
}

impl fmt::Display for YggError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(e) => write!(f, "schema error: {}", e),
            Self::Datatype(e) => write!(f, "datatype error: {}", e),
            Self::Codec(e) => write!(f, "codec error: {}", e),
            Self::Comm(e) => write!(f, "comm error: {}", e),
        }
    }
}

impl StdError for YggError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::Datatype(e) => Some(e),
            Self::Codec(e) => Some(e),
            Self::Comm(e) => Some(e),
        }
    }
}

impl From<SchemaValidationError> for YggError {
    fn from(error: SchemaValidationError) -> Self {
        Self::Schema(error)
    }
}

impl From<DatatypeError> for YggError {
    fn from(error: DatatypeError) -> Self {
        Self::Datatype(error)
    }
}

impl From<CodecError> for YggError {
    fn from(error: CodecError) -> Self {
        Self::Codec(error)
    }
}

impl From<CommError> for YggError {
    fn from(error: CommError) -> Self {
        Self::Comm(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_layer_predicates() {
        let error = YggError::from(DatatypeError::unsupported("scalar", "not a number"));
        assert!(error.is_datatype_error());
        assert!(!error.is_codec_error());
        assert!(!error.is_comm_error());
        assert!(error.is_recoverable());

        let error = YggError::from(CommError::Closed {
            comm: "out".to_string(),
        });
        assert!(error.is_comm_error());
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_nested_schema_error() {
        let nested = CodecError::Datatype(DatatypeError::Schema(SchemaValidationError::missing("shape")));
        let error = YggError::from(nested);
        assert!(error.is_codec_error());
        assert!(error.is_schema_error());
    }

    #[test]
    fn test_recoverable_io() {
        let error = YggError::from(CommError::Io {
            path: "/tmp/missing".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        assert!(error.is_recoverable());
        assert!(error.to_string().starts_with("comm error: I/O failure on /tmp/missing"));
        assert!(error.source().is_some());
    }
}
