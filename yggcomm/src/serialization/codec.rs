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

//! The message codec.
//!
//! A message is a UTF-8 JSON metadata header, the reserved
//! [`MESSAGE_SEPARATOR`], then the raw body produced by the header's
//! datatype class:
//!
//! ```text
//! {"typename":"scalar","subtype":"int","precision":16,"units":""}:YGG_TAG:\x07\x00
//! ```
//!
//! A [`Codec`] bound to a [`TypeDefinition`] coerces outgoing values to that
//! definition and refuses messages that cannot satisfy it. An unbound codec
//! describes each value with the first registered class that accepts it.

use crate::datatypes::{Datatype, Metadata, TypeDefinition, TypeRegistry, Value};
use crate::schema;
use crate::serialization::CodecError;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Separates a message's metadata header from its body.
pub const MESSAGE_SEPARATOR: &[u8] = b":YGG_TAG:";

/// Splits a message at the first [`MESSAGE_SEPARATOR`].
///
/// # Errors
///
/// Returns [`CodecError::MalformedMessage`] if the separator is absent.
///
/// # Examples
///
/// ```rust
/// use yggcomm::serialization::split_message;
///
/// let (header, body) = split_message(b"{}:YGG_TAG:a:YGG_TAG:b").unwrap();
/// assert_eq!(header, b"{}");
/// assert_eq!(body, b"a:YGG_TAG:b");
/// assert!(split_message(b"{}").is_err());
/// ```
pub fn split_message(message: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let position = message
        .windows(MESSAGE_SEPARATOR.len())
        .position(|window| window == MESSAGE_SEPARATOR)
        .ok_or_else(|| CodecError::malformed("message separator not found"))?;
    Ok((
        &message[..position],
        &message[position + MESSAGE_SEPARATOR.len()..],
    ))
}

/// Serializes values into messages and back, optionally bound to one
/// [`TypeDefinition`].
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{Scalar, TypeDefinition, TypeRegistry, Value};
/// use yggcomm::serialization::Codec;
///
/// let definition = TypeDefinition::new("float64").with("units", "m");
/// let codec = Codec::bound(TypeRegistry::global(), definition).unwrap();
///
/// let message = codec.serialize(&Value::from(Scalar::float32(150.0).with_units("cm"))).unwrap();
/// let (value, header) = codec.deserialize(&message).unwrap();
///
/// assert_eq!(value, Value::from(Scalar::float64(1.5).with_units("m")));
/// assert_eq!(header.get_u64("precision"), Some(64));
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<TypeRegistry>,
    binding: Option<Binding>,
}

#[derive(Clone)]
struct Binding {
    definition: TypeDefinition,
    expanded: TypeDefinition,
    class: Arc<dyn Datatype>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("definition", &self.definition)
            .field("class", &self.class.name())
            .finish()
    }
}

impl Codec {
    /// Creates a codec that types each value as it comes.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            binding: None,
        }
    }

    /// Creates a codec bound to `definition`.
    ///
    /// # Errors
    ///
    /// Returns a datatype error if the definition names an unknown type or
    /// fails its class's definition schema.
    pub fn bound(registry: Arc<TypeRegistry>, definition: TypeDefinition) -> Result<Self, CodecError> {
        registry
            .validate_definition(&definition)
            .map_err(crate::datatypes::DatatypeError::from)?;
        let expanded = registry.expand(&definition)?;
        let class = registry.class_for(&expanded)?;
        Ok(Self {
            registry,
            binding: Some(Binding {
                definition,
                expanded,
                class,
            }),
        })
    }

    /// Returns the bound definition, if any.
    pub fn definition(&self) -> Option<&TypeDefinition> {
        self.binding.as_ref().map(|binding| &binding.definition)
    }

    /// Returns the registry this codec resolves type names in.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Serializes `value` into a message.
    ///
    /// # Errors
    ///
    /// See [`serialize_with_header`](Self::serialize_with_header).
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self.serialize_with_header(value, &Map::new())
    }

    /// Serializes `value`, adding `extra` fields to the header.
    ///
    /// A bound codec checks the value against its definition, transforms it
    /// to match exactly, encodes it with the definition's class and then
    /// re-validates the metadata it produced.
    ///
    /// # Errors
    ///
    /// - [`CodecError::TypeMismatch`] if the value cannot satisfy the bound
    ///   definition.
    /// - [`CodecError::EncodingInvariant`] if the produced metadata fails its
    ///   own validation.
    /// - [`CodecError::MalformedMessage`] if an extra field would replace a
    ///   metadata property, or the header would contain the separator.
    /// - [`CodecError::Datatype`] for failures inside the datatype class.
    pub fn serialize_with_header(
        &self,
        value: &Value,
        extra: &Map<String, JsonValue>,
    ) -> Result<Vec<u8>, CodecError> {
        let registry = self.registry.as_ref();
        let (mut metadata, body) = match &self.binding {
            Some(binding) => {
                if !registry.check_decoded(value, &binding.definition) {
                    debug!(kind = value.kind(), definition = %binding.definition, "Value rejected by bound definition");
                    return Err(CodecError::mismatch(format!(
                        "{} value does not satisfy {}",
                        value.kind(),
                        binding.definition
                    )));
                }
                let value = binding.class.transform(value.clone(), &binding.expanded, registry)?;
                let mut metadata = binding.class.encode_type(&value, registry)?;
                let body = binding.class.encode_data(&value, &mut metadata, registry)?;
                (metadata, body)
            }
            None => {
                let class = registry.guess_type_from_data(value)?;
                let mut metadata = class.encode_type(value, registry)?;
                let body = class.encode_data(value, &mut metadata, registry)?;
                (metadata, body)
            }
        };

        if metadata.typename().is_none() {
            return Err(CodecError::invariant("encoded metadata lacks a typename"));
        }
        if !registry.check_encoded(&metadata, self.definition()) {
            return Err(CodecError::invariant(format!(
                "metadata {} does not satisfy its definition",
                metadata
            )));
        }

        for (key, field) in extra {
            if metadata.contains_key(key) {
                return Err(CodecError::malformed(format!(
                    "header field '{}' is reserved by the type metadata",
                    key
                )));
            }
            metadata.insert(key.clone(), field.clone());
        }

        let header = serde_json::to_vec(&metadata)
            .map_err(|error| CodecError::invariant(format!("metadata is not serializable: {}", error)))?;
        if header
            .windows(MESSAGE_SEPARATOR.len())
            .any(|window| window == MESSAGE_SEPARATOR)
        {
            return Err(CodecError::malformed("header contains the message separator"));
        }

        let mut message = Vec::with_capacity(header.len() + MESSAGE_SEPARATOR.len() + body.len());
        message.extend_from_slice(&header);
        message.extend_from_slice(MESSAGE_SEPARATOR);
        message.extend_from_slice(&body);
        Ok(message)
    }

    /// Returns the message that stands for "no value": zero bytes.
    pub fn serialize_empty(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Returns the bound type's canonical empty value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedMessage`] when the codec is unbound.
    pub fn empty_value(&self) -> Result<Value, CodecError> {
        let binding = self
            .binding
            .as_ref()
            .ok_or_else(|| CodecError::malformed("empty message and no bound type definition"))?;
        Ok(binding.class.empty_value(&binding.expanded, &self.registry)?)
    }

    /// Deserializes a message into its value and full header.
    ///
    /// Empty input yields the bound type's empty value together with the
    /// bound definition.
    ///
    /// # Errors
    ///
    /// - [`CodecError::MalformedMessage`] if the separator is absent or the
    ///   header is not valid metadata.
    /// - [`CodecError::TypeMismatch`] if the header cannot satisfy the bound
    ///   definition.
    /// - [`CodecError::Datatype`] if the body does not match its header.
    pub fn deserialize(&self, message: &[u8]) -> Result<(Value, Metadata), CodecError> {
        if message.is_empty() {
            let value = self.empty_value()?;
            let definition = self.definition().cloned().unwrap_or_default();
            return Ok((value, definition));
        }

        let registry = self.registry.as_ref();
        let (header, body) = split_message(message)?;
        let metadata: Metadata = serde_json::from_slice(header)
            .map_err(|error| CodecError::malformed(format!("header is not a JSON object: {}", error)))?;
        schema::validate_metadata(registry, &metadata)
            .map_err(|error| CodecError::malformed(format!("invalid header: {}", error)))?;

        if let Some(binding) = &self.binding {
            if !registry.check_encoded(&metadata, Some(&binding.definition)) {
                return Err(CodecError::mismatch(format!(
                    "header {} does not satisfy {}",
                    metadata, binding.definition
                )));
            }
        }

        let class = registry.class_for(&metadata)?;
        let mut value = class.decode_data(body, &metadata, registry)?;
        if let Some(binding) = &self.binding {
            value = binding.class.transform(value, &binding.expanded, registry)?;
        }
        Ok((value, metadata))
    }

    /// Deserializes a message, discarding the header.
    ///
    /// # Errors
    ///
    /// See [`deserialize`](Self::deserialize).
    pub fn decode_value(&self, message: &[u8]) -> Result<Value, CodecError> {
        self.deserialize(message).map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{NdArray, Scalar, ValueMap};
    use serde_json::json;

    fn bound(definition: TypeDefinition) -> Codec {
        Codec::bound(TypeRegistry::global(), definition).unwrap()
    }

    #[test]
    fn test_wire_layout() {
        let codec = bound(TypeDefinition::new("int16"));
        let message = codec.serialize(&Value::from(Scalar::int(7, 16))).unwrap();
        let (header, body) = split_message(&message).unwrap();
        assert_eq!(body, &[7, 0]);
        let header: JsonValue = serde_json::from_slice(header).unwrap();
        assert_eq!(header["typename"], "scalar");
        assert_eq!(header["subtype"], "int");
        assert_eq!(header["precision"], 16);
    }

    #[test]
    fn test_serialize_widens_and_converts() {
        let codec = bound(TypeDefinition::new("1darray").with("subtype", "float").with("precision", 64).with("units", "m"));
        let array = NdArray::from_data(vec![100.0, 250.0]).with_precision(32).with_units("cm");
        let (value, header) = codec.deserialize(&codec.serialize(&Value::from(array)).unwrap()).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.precision(), 64);
        assert_eq!(array.units(), "m");
        assert_eq!(array.data().get(1).and_then(|e| e.as_f64()), Some(2.5));
        assert_eq!(header.get_u64("length"), Some(2));
    }

    #[test]
    fn test_serialize_rejects_mismatch() {
        let codec = bound(TypeDefinition::new("int32"));
        let error = codec.serialize(&Value::from(1.5)).unwrap_err();
        assert!(error.is_type_mismatch());

        let error = codec.serialize(&Value::from(Scalar::int(1, 64))).unwrap_err();
        assert!(error.is_type_mismatch());
    }

    #[test]
    fn test_unbound_codec_guesses() {
        let codec = Codec::new(TypeRegistry::global());
        let map = ValueMap::new().with("a", 1i64).with("b", "text");
        let message = codec.serialize(&Value::from(map.clone())).unwrap();
        let (value, header) = codec.deserialize(&message).unwrap();
        assert_eq!(value, Value::from(map));
        assert_eq!(header.typename(), Some("map"));
    }

    #[test]
    fn test_extra_header_fields() {
        let codec = Codec::new(TypeRegistry::global());
        let mut extra = Map::new();
        extra.insert("worker".to_string(), json!("w-1"));
        let message = codec.serialize_with_header(&Value::from(3i64), &extra).unwrap();
        let (_, header) = codec.deserialize(&message).unwrap();
        assert_eq!(header.get_str("worker"), Some("w-1"));

        extra.insert("precision".to_string(), json!(8));
        let error = codec.serialize_with_header(&Value::from(3i64), &extra).unwrap_err();
        assert!(error.is_malformed());
    }

    #[test]
    fn test_header_cannot_contain_separator() {
        let codec = Codec::new(TypeRegistry::global());
        let mut extra = Map::new();
        extra.insert("note".to_string(), json!("a:YGG_TAG:b"));
        assert!(codec.serialize_with_header(&Value::from(3i64), &extra).unwrap_err().is_malformed());
    }

    #[test]
    fn test_empty_messages() {
        let map = bound(TypeDefinition::new("map"));
        assert!(map.serialize_empty().is_empty());
        assert_eq!(map.decode_value(&map.serialize_empty()).unwrap(), Value::Map(ValueMap::new()));

        let set = bound(TypeDefinition::new("set"));
        assert_eq!(set.decode_value(b"").unwrap(), Value::Set(Vec::new()));

        let unbound = Codec::new(TypeRegistry::global());
        assert!(unbound.decode_value(b"").unwrap_err().is_malformed());
    }

    #[test]
    fn test_malformed_messages() {
        let codec = Codec::new(TypeRegistry::global());
        assert!(codec.deserialize(b"no separator").unwrap_err().is_malformed());
        assert!(codec.deserialize(b"[1]:YGG_TAG:").unwrap_err().is_malformed());
        assert!(codec
            .deserialize(br#"{"typename":"scalar"}:YGG_TAG:"#)
            .unwrap_err()
            .is_malformed());
    }

    #[test]
    fn test_deserialize_rejects_incompatible_header() {
        let producer = Codec::new(TypeRegistry::global());
        let message = producer.serialize(&Value::from(Scalar::float64(1.0).with_units("s"))).unwrap();
        let consumer = bound(TypeDefinition::new("float64").with("units", "m"));
        assert!(consumer.deserialize(&message).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_corrupt_body() {
        let codec = Codec::new(TypeRegistry::global());
        let message = br#"{"typename":"scalar","subtype":"int","precision":32,"units":""}:YGG_TAG:abc"#;
        assert!(codec.deserialize(message).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_bound_rejects_invalid_definition() {
        assert!(Codec::bound(TypeRegistry::global(), TypeDefinition::new("nope")).is_err());
        assert!(Codec::bound(TypeRegistry::global(), TypeDefinition::new("scalar")).is_err());
    }
}
