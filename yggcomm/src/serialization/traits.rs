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

//! The format serializer trait.

use crate::datatypes::Value;
use crate::serialization::CodecError;
use serde::{Deserialize, Serialize};

/// How a file channel carves its file into messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// The whole remaining file is one message, then end of stream.
    #[default]
    All,
    /// Each non-comment line is one message.
    Line,
    /// Each length-prefixed frame is one message.
    Framed,
}

/// Converts values to and from one on-disk format.
///
/// A file channel owns one serializer. Values go through
/// [`serialize`](Self::serialize) on the way out; the bytes a receive
/// yields go through [`deserialize`](Self::deserialize) on the way in.
/// Formats whose files must stay a single coherent document report
/// [`merges_on_append`](Self::merges_on_append); the channel then reads the
/// existing file, [`merge`](Self::merge)s it with the new message and
/// rewrites the file.
pub trait FormatSerializer: Send + 'static {
    /// Short name of the format, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Encodes a value in this format.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the value cannot be represented.
    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// Decodes bytes in this format.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Format`] naming the offending offset when the
    /// bytes are not valid for this format.
    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError>;

    /// Coerces a loosely shaped value into this format's canonical aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has no canonical form here.
    fn normalize(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }

    /// Combines aggregates of this format into one.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MergeUnsupported`] unless the format merges.
    fn merge(&self, values: &[Value]) -> Result<Value, CodecError> {
        let _ = values;
        Err(CodecError::MergeUnsupported { format: self.name() })
    }

    /// Returns what one whole-file read observes after the given values
    /// were sent in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a merging format fails to merge.
    fn concatenate(&self, values: &[Value]) -> Result<Vec<Value>, CodecError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        match self.merge(values) {
            Ok(merged) => Ok(vec![merged]),
            Err(CodecError::MergeUnsupported { .. }) => Ok(values.to_vec()),
            Err(error) => Err(error),
        }
    }

    /// Returns `true` if appending must rewrite the file as one document.
    fn merges_on_append(&self) -> bool {
        false
    }

    /// Returns how a receive carves the file.
    fn read_mode(&self) -> ReadMode {
        ReadMode::All
    }

    /// Returns bytes to write before the first message of an empty file.
    fn file_header(&self) -> Option<Vec<u8>> {
        None
    }

    /// Inspects the complete file before the first receive.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's preamble is unusable.
    fn prepare_read(&mut self, contents: &[u8]) -> Result<(), CodecError> {
        let _ = contents;
        Ok(())
    }

    /// Returns `true` if a line is a comment in line mode.
    fn is_comment(&self, line: &[u8]) -> bool {
        let _ = line;
        false
    }
}
