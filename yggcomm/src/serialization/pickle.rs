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

//! The framed record serializer.
//!
//! Each value is stored as one codec message inside a length-prefixed
//! frame, so a file is a plain sequence of self-describing records that is
//! appended to and read back one record at a time.

use crate::datatypes::{TypeRegistry, Value};
use crate::serialization::framing::{frame, split_frames};
use crate::serialization::{Codec, CodecError, FormatSerializer, ReadMode};

/// Reads and writes files of framed records.
#[derive(Debug, Clone)]
pub struct PickleSerializer {
    codec: Codec,
}

impl PickleSerializer {
    /// Frames messages produced by `codec`.
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }
}

impl Default for PickleSerializer {
    fn default() -> Self {
        Self::new(Codec::new(TypeRegistry::global()))
    }
}

impl FormatSerializer for PickleSerializer {
    fn name(&self) -> &'static str {
        "pickle"
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        frame(&self.codec.serialize(value)?)
    }

    /// Decodes one record, or a set of every record when `bytes` holds
    /// several frames.
    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        let records = split_frames(bytes)?;
        match records.as_slice() {
            [] => self.codec.empty_value(),
            [record] => self.codec.decode_value(record),
            records => records
                .iter()
                .map(|record| self.codec.decode_value(record))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Set),
        }
    }

    fn read_mode(&self) -> ReadMode {
        ReadMode::Framed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{NdArray, ValueMap};

    #[test]
    fn test_records_round_trip() {
        let mut serializer = PickleSerializer::default();
        let first = Value::from(ValueMap::new().with("a", 1i64));
        let second = Value::from(NdArray::from_data(vec![1.0, 2.0]));
        let mut file = serializer.serialize(&first).unwrap();
        assert_eq!(&file[..4], &((file.len() - 4) as u32).to_be_bytes());
        file.extend(serializer.serialize(&second).unwrap());

        assert_eq!(
            serializer.deserialize(&file).unwrap(),
            Value::Set(vec![first.clone(), second.clone()])
        );
        assert_eq!(
            serializer.concatenate(&[first.clone(), second.clone()]).unwrap(),
            vec![first, second]
        );
    }

    #[test]
    fn test_truncated_record() {
        let mut serializer = PickleSerializer::default();
        let mut file = serializer.serialize(&Value::from(1i64)).unwrap();
        file.pop();
        assert!(serializer.deserialize(&file).unwrap_err().is_corrupt());
    }
}
