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

//! Datatype trait definition.
//!
//! This module defines the core [`Datatype`] trait that every registered
//! type class implements.

use crate::datatypes::{DatatypeError, Metadata, TypeDefinition, TypeRegistry, Value};
use crate::schema::{default_compatible, Schema, SchemaValidationError};
use serde_json::{Map, Value as JsonValue};

/// A registered type class.
///
/// A datatype knows how to describe a [`Value`] (`encode_type`), turn it into
/// canonical bytes (`encode_data`) and back (`decode_data`), and coerce a
/// decoded value toward a compatible definition (`transform`). Classes are
/// stateless; every operation receives the [`TypeRegistry`] so containers can
/// dispatch their nested elements.
///
/// # Thread Safety
///
/// Datatypes must be `Send + Sync + 'static`: one registry instance is
/// shared read-only by every channel in the process.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{Scalar, TypeRegistry, Value};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = TypeRegistry::global();
/// let value = Value::from(Scalar::int(7, 16));
///
/// let class = registry.get_type_class("scalar")?;
/// let mut metadata = class.encode_type(&value, &registry)?;
/// let bytes = class.encode_data(&value, &mut metadata, &registry)?;
/// assert_eq!(bytes, vec![7, 0]);
///
/// let decoded = class.decode_data(&bytes, &metadata, &registry)?;
/// assert_eq!(decoded, value);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub trait Datatype: Send + Sync + 'static {
    /// The `typename` this class is registered under.
    fn name(&self) -> &'static str;

    /// One line human readable description.
    fn description(&self) -> &'static str;

    /// Schema every declared definition of this type must satisfy.
    fn definition_schema(&self) -> Schema;

    /// Schema every encoded metadata header of this type must satisfy.
    fn metadata_schema(&self) -> Schema;

    /// The class this one pins properties of, for fixed aliases.
    fn base(&self) -> Option<&'static str> {
        None
    }

    /// Properties pinned to constants by a fixed alias.
    fn fixed_properties(&self) -> Map<String, JsonValue> {
        Map::new()
    }

    /// Describes `value`, producing its minimal metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::UnsupportedValue`] when this class cannot
    /// represent the value. Type guessing relies on that signal.
    fn encode_type(&self, value: &Value, registry: &TypeRegistry) -> Result<Metadata, DatatypeError>;

    /// Produces the canonical byte encoding of `value`.
    ///
    /// `metadata` is the header produced by [`encode_type`](Self::encode_type)
    /// (possibly adjusted by the caller); implementations may refine it.
    ///
    /// # Errors
    ///
    /// Fails if the value does not agree with the metadata.
    fn encode_data(
        &self,
        value: &Value,
        metadata: &mut Metadata,
        registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError>;

    /// Decodes bytes described by `metadata`.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::CorruptData`] when the bytes do not match
    /// the metadata.
    fn decode_data(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError>;

    /// Coerces `value` to satisfy `definition`: widen precision, convert
    /// units, reshape.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::TypeMismatch`] when the coercion would lose
    /// information.
    fn transform(
        &self,
        value: Value,
        definition: &TypeDefinition,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError>;

    /// Per-property compatibility between a producer's metadata value and a
    /// consumer's definition value.
    fn check_meta_compatible(
        &self,
        key: &str,
        producer: &JsonValue,
        consumer: &JsonValue,
        registry: &TypeRegistry,
    ) -> bool {
        let _ = registry;
        default_compatible(key, producer, consumer)
    }

    /// The value an empty message decodes to.
    ///
    /// # Errors
    ///
    /// Fails if the definition lacks what is needed to build the value.
    fn empty_value(&self, definition: &TypeDefinition, registry: &TypeRegistry) -> Result<Value, DatatypeError>;

    /// Checks constraints a flat schema cannot express, such as legal
    /// subtype/precision pairs or nested container definitions.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    fn validate_semantics(
        &self,
        document: &TypeDefinition,
        registry: &TypeRegistry,
        as_metadata: bool,
    ) -> Result<(), SchemaValidationError> {
        let _ = (document, registry, as_metadata);
        Ok(())
    }
}
