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

//! File-backed communication channels.
//!
//! A [`FileComm`] moves messages between a model and a file, or a numbered
//! series of files. It is a small state machine:
//!
//! ```text
//! closed --open()--> open --close()--> closed
//! ```
//!
//! Messages either pass through a [`FormatSerializer`] (text tables,
//! meshes, framed records, codec messages) or are handed as values to a
//! [`DedicatedFormat`] adapter that owns the file itself (sequence,
//! alignment and image files).
//!
//! Polling operations report failure the way drivers consume it: `open` and
//! `send` return `false` after logging, and `recv` returns
//! `(false, EOF_SENTINEL)` once no data is left. Corrupt file content is a
//! hard error from `recv`.
//!
//! A channel owns one file handle and is driven by one thread; it is `Send`
//! but performs no internal locking.
//!
//! [`FormatSerializer`]: crate::serialization::FormatSerializer

mod address;
mod config;
pub mod dedicated;
mod error;
mod file;

pub use address::{Address, SeriesTemplate};
pub use config::{FileCommConfig, FileFormat};
pub use dedicated::DedicatedFormat;
pub use error::CommError;
pub use file::FileComm;

/// Payload returned with a `false` flag once a channel has no more data.
pub const EOF_SENTINEL: &[u8] = b"EOF!!!";

/// Returns `true` if `message` is the end-of-stream marker.
pub fn is_eof(message: &[u8]) -> bool {
    message == EOF_SENTINEL
}

/// Which way messages flow through a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The channel writes.
    Send,
    /// The channel reads.
    Recv,
}

impl Direction {
    /// Returns the string name of this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Recv => "receive",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
