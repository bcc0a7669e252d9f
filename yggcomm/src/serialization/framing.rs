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

//! Length-prefixed record framing.
//!
//! Record files store one message per frame: a 4-byte big-endian length
//! followed by that many payload bytes.
//!
//! ```text
//! +------------------+----------------------+
//! | Length (4 bytes) | Payload (N bytes)    |
//! +------------------+----------------------+
//! ```
//!
//! # Examples
//!
//! ```rust
//! use yggcomm::serialization::framing::{read_frame, write_frame};
//!
//! let mut buffer = Vec::new();
//! write_frame(&mut buffer, b"Hello").unwrap();
//! assert_eq!(&buffer[..4], &5u32.to_be_bytes());
//!
//! let mut reader = &buffer[..];
//! assert_eq!(read_frame(&mut reader).unwrap(), Some(b"Hello".to_vec()));
//! assert_eq!(read_frame(&mut reader).unwrap(), None);
//! ```

use crate::serialization::CodecError;
use std::io::{self, Read, Write};

/// Maximum frame size (16 MB).
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Size of the frame length header in bytes.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Writes one length-prefixed frame.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] if the payload exceeds
/// [`MAX_FRAME_SIZE`], or [`CodecError::Io`] if writing fails.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), CodecError> {
    let len = payload.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(CodecError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    writer.write_all(&(len as u32).to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Returns `payload` wrapped in a frame.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] if the payload exceeds
/// [`MAX_FRAME_SIZE`].
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    write_frame(&mut buffer, payload)?;
    Ok(buffer)
}

/// Reads one frame, returning `None` on a clean end of input.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] for an oversized length prefix and
/// [`CodecError::Io`] if the input ends inside a frame.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, CodecError> {
    let mut len_bytes = [0u8; FRAME_HEADER_SIZE];
    let mut filled = 0;
    while filled < FRAME_HEADER_SIZE {
        match reader.read(&mut len_bytes[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(CodecError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input ends inside a frame length",
                )))
            }
            Ok(n) => filled += n,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }

    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: len as usize,
            max: MAX_FRAME_SIZE,
        });
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

/// Splits a buffer of back-to-back frames into their payloads.
///
/// # Errors
///
/// Returns [`CodecError::Format`] naming the offset of a truncated or
/// oversized frame.
pub fn split_frames(bytes: &[u8]) -> Result<Vec<&[u8]>, CodecError> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (len, payload_start) = frame_bounds(bytes, offset)?;
        frames.push(&bytes[payload_start..payload_start + len]);
        offset = payload_start + len;
    }
    Ok(frames)
}

/// Returns the total size (header included) of the frame starting at the
/// beginning of `bytes`, or `None` if `bytes` does not hold a complete frame.
pub fn complete_frame_len(bytes: &[u8]) -> Option<usize> {
    frame_bounds(bytes, 0)
        .ok()
        .map(|(len, payload_start)| payload_start + len)
}

fn frame_bounds(bytes: &[u8], offset: usize) -> Result<(usize, usize), CodecError> {
    let header_end = offset + FRAME_HEADER_SIZE;
    let Some(header) = bytes.get(offset..header_end) else {
        return Err(CodecError::format("framed record", offset, "truncated frame length"));
    };
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if len > MAX_FRAME_SIZE {
        return Err(CodecError::format(
            "framed record",
            offset,
            format!("frame of {} bytes exceeds the maximum of {}", len, MAX_FRAME_SIZE),
        ));
    }
    let len = len as usize;
    if bytes.len() < header_end + len {
        return Err(CodecError::format(
            "framed record",
            offset,
            format!("frame announces {} bytes but {} remain", len, bytes.len() - header_end),
        ));
    }
    Ok((len, header_end))
}
