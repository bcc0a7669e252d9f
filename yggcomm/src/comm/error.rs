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

//! Comm layer error types.
//!
//! Channel operations that drivers poll (`open`, `send`) convert these into
//! a logged `false`. Receives propagate them, since a receive failure means
//! the file content is unusable rather than temporarily absent.

use crate::serialization::CodecError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in a file channel.
///
/// # Examples
///
/// ```rust
/// use yggcomm::comm::CommError;
///
/// let error = CommError::Closed { comm: "output".to_string() };
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum CommError {
    /// The configured path cannot be used in the requested direction.
    #[error("invalid address {path}: {reason}")]
    Address {
        /// The offending path or template
        path: PathBuf,
        /// Why the address is unusable
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("I/O failure on {path}: {source}")]
    Io {
        /// The file being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The channel is not open.
    #[error("comm {comm} is closed")]
    Closed {
        /// Name of the channel
        comm: String,
    },

    /// A send on a receiving channel or a receive on a sending one.
    #[error("comm {comm} cannot {operation}: it was opened for {direction}")]
    WrongDirection {
        /// Name of the channel
        comm: String,
        /// The attempted operation
        operation: &'static str,
        /// The direction the channel was created with
        direction: &'static str,
    },

    /// A message or file body could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl CommError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CommError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn address(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CommError::Address {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if retrying the operation later may succeed.
    ///
    /// Filesystem failures and missing addresses are transient from the
    /// channel's point of view (another process may still create or release
    /// the file). Codec failures and misuse are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CommError::Io { .. } | CommError::Address { .. })
    }

    /// Returns `true` for decode failures caused by the stored bytes.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CommError::Codec(error) if error.is_corrupt() || error.is_malformed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let missing = CommError::io("/nope", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(missing.is_recoverable());
        assert!(!missing.is_corrupt());

        let corrupt = CommError::from(CodecError::format("ply", 12, "bad element"));
        assert!(corrupt.is_corrupt());
        assert!(!corrupt.is_recoverable());

        let misuse = CommError::WrongDirection {
            comm: "input".to_string(),
            operation: "send",
            direction: "receive",
        };
        assert_eq!(misuse.to_string(), "comm input cannot send: it was opened for receive");
    }
}
