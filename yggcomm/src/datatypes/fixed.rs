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

//! Fixed scalar aliases.
//!
//! An alias is a `scalar` with one or more properties pinned to a constant:
//! `int` pins `subtype`, `float64` pins `subtype` and `precision`. Pinned
//! properties disappear from the alias's schemas; every operation expands the
//! document back to a plain `scalar` definition and delegates.

use crate::datatypes::{
    Datatype, DatatypeError, Metadata, ScalarType, Subtype, TypeDefinition, TypeRegistry, Value,
};
use crate::schema::{Schema, SchemaValidationError};
use serde_json::{Map, Value as JsonValue};

/// A scalar alias with pinned properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarAlias {
    name: &'static str,
    subtype: Subtype,
    precision: Option<u32>,
}

macro_rules! scalar_aliases {
    (@precision $precision:literal) => { Some($precision) };
    (@precision) => { None };
    ($($name:literal => $subtype:ident $(, $precision:literal)?;)*) => {
        /// Every alias, in registration order.
        pub const SCALAR_ALIASES: &[ScalarAlias] = &[
            $(ScalarAlias {
                name: $name,
                subtype: Subtype::$subtype,
                precision: scalar_aliases!(@precision $($precision)?),
            },)*
        ];
    };
}

scalar_aliases! {
    "int" => Int;
    "uint" => Uint;
    "float" => Float;
    "complex" => Complex;
    "bytes" => Bytes;
    "unicode" => Unicode;
    "int8" => Int, 8;
    "int16" => Int, 16;
    "int32" => Int, 32;
    "int64" => Int, 64;
    "uint8" => Uint, 8;
    "uint16" => Uint, 16;
    "uint32" => Uint, 32;
    "uint64" => Uint, 64;
    "float32" => Float, 32;
    "float64" => Float, 64;
    "complex64" => Complex, 64;
    "complex128" => Complex, 128;
}

impl ScalarAlias {
    /// Returns the pinned subtype.
    pub const fn subtype(&self) -> Subtype {
        self.subtype
    }

    /// Returns the pinned precision, if any.
    pub const fn precision(&self) -> Option<u32> {
        self.precision
    }

    fn expanded(&self, document: &TypeDefinition) -> TypeDefinition {
        let mut expanded = TypeDefinition::new("scalar");
        for (key, value) in document.iter() {
            if key != "typename" {
                expanded.insert(key.clone(), value.clone());
            }
        }
        expanded.extend(&self.fixed_properties());
        expanded
    }

    fn pinned_match(&self, metadata: &Metadata) -> bool {
        metadata.get_str("subtype") == Some(self.subtype.as_str())
            && self
                .precision
                .map_or(true, |bits| metadata.get_u64("precision") == Some(u64::from(bits)))
    }

    fn restrict(&self, schema: Schema) -> Schema {
        let mut schema = schema.without("subtype");
        if self.precision.is_some() {
            schema = schema.without("precision");
        }
        let required: Vec<String> = schema.required().iter().skip(1).cloned().collect();
        let mut renamed = Schema::new(self.name);
        for name in ["precision", "units"] {
            if let Some(rule) = schema.rule(name) {
                renamed = renamed.property(name, rule.clone());
            }
        }
        for name in required {
            renamed = renamed.require(name);
        }
        renamed
    }
}

impl Datatype for ScalarAlias {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "A scalar with pinned subtype and optionally precision"
    }

    fn definition_schema(&self) -> Schema {
        self.restrict(ScalarType.definition_schema())
    }

    fn metadata_schema(&self) -> Schema {
        self.restrict(ScalarType.metadata_schema())
    }

    fn base(&self) -> Option<&'static str> {
        Some("scalar")
    }

    fn fixed_properties(&self) -> Map<String, JsonValue> {
        let mut fixed = Map::new();
        fixed.insert("subtype".to_string(), JsonValue::from(self.subtype.as_str()));
        if let Some(bits) = self.precision {
            fixed.insert("precision".to_string(), JsonValue::from(bits));
        }
        fixed
    }

    fn encode_type(&self, value: &Value, registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        let mut metadata = ScalarType.encode_type(value, registry)?;
        if !self.pinned_match(&metadata) {
            return Err(DatatypeError::unsupported(self.name, format!("value is {}", metadata)));
        }
        metadata.set_typename(self.name);
        metadata.remove("subtype");
        if self.precision.is_some() {
            metadata.remove("precision");
        }
        Ok(metadata)
    }

    fn encode_data(
        &self,
        value: &Value,
        metadata: &mut Metadata,
        registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        let mut expanded = self.expanded(metadata);
        ScalarType.encode_data(value, &mut expanded, registry)
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        ScalarType.decode_data(bytes, &self.expanded(metadata), registry)
    }

    fn transform(
        &self,
        value: Value,
        definition: &TypeDefinition,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        ScalarType.transform(value, &self.expanded(definition), registry)
    }

    fn empty_value(&self, definition: &TypeDefinition, registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        ScalarType.empty_value(&self.expanded(definition), registry)
    }

    fn validate_semantics(
        &self,
        document: &TypeDefinition,
        registry: &TypeRegistry,
        as_metadata: bool,
    ) -> Result<(), SchemaValidationError> {
        ScalarType.validate_semantics(&self.expanded(document), registry, as_metadata)
    }
}
