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

//! Serializers for plain message files.

use crate::datatypes::{Element, Scalar, TypeRegistry, Value};
use crate::serialization::{Codec, CodecError, FormatSerializer};

/// Writes each value as one codec message.
///
/// A plain file holds a single message; receiving reads it whole.
#[derive(Debug, Clone)]
pub struct DefaultSerializer {
    codec: Codec,
}

impl DefaultSerializer {
    /// Wraps a codec.
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// Returns the wrapped codec.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }
}

impl Default for DefaultSerializer {
    fn default() -> Self {
        Self::new(Codec::new(TypeRegistry::global()))
    }
}

impl FormatSerializer for DefaultSerializer {
    fn name(&self) -> &'static str {
        "default"
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self.codec.serialize(value)
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        self.codec.decode_value(bytes)
    }
}

/// Passes raw bytes through untouched.
///
/// Values are byte or text scalars; received bytes come back as a byte
/// scalar. Appending concatenates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSerializer;

fn raw_bytes(value: &Value) -> Result<&[u8], CodecError> {
    match value.as_scalar().map(Scalar::value) {
        Some(Element::Bytes(bytes)) => Ok(bytes),
        Some(Element::Unicode(text)) => Ok(text.as_bytes()),
        _ => Err(CodecError::mismatch(format!(
            "direct files carry bytes or text, not a {} value",
            value.kind()
        ))),
    }
}

impl FormatSerializer for DirectSerializer {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        raw_bytes(value).map(<[u8]>::to_vec)
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        Ok(Value::Scalar(Scalar::bytes(bytes)))
    }

    fn merge(&self, values: &[Value]) -> Result<Value, CodecError> {
        let mut joined = Vec::new();
        for value in values {
            joined.extend_from_slice(raw_bytes(value)?);
        }
        Ok(Value::Scalar(Scalar::bytes(joined)))
    }
}
