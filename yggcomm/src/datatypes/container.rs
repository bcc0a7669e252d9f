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

//! The `map` and `set` container datatypes.
//!
//! A container's body is a JSON object with one entry per member, each value
//! the standard base64 encoding of that member's own body. Map members are
//! keyed by the user's key, set members by their stringified index (`"0"`,
//! `"1"`, ...). Member types travel in the header under `contents`: an
//! object of definitions for a map, an array of definitions for a set.

use crate::datatypes::{Datatype, DatatypeError, Metadata, TypeDefinition, TypeRegistry, Value, ValueMap};
use crate::schema::{check_encoded, validate_definition, validate_metadata, PropertyRule, Schema, SchemaValidationError};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

fn member_definition(key: &str, raw: &JsonValue) -> Result<TypeDefinition, DatatypeError> {
    TypeDefinition::from_json(raw.clone())
        .map_err(|error| DatatypeError::Schema(error.nested(&format!("contents.{}", key))))
}

fn encode_member(
    value: &Value,
    definition: Option<TypeDefinition>,
    registry: &TypeRegistry,
) -> Result<(JsonValue, TypeDefinition), DatatypeError> {
    let mut definition = match definition {
        Some(definition) => definition,
        None => registry.encode_type(value)?,
    };
    let class = registry.class_for(&definition)?;
    let bytes = class.encode_data(value, &mut definition, registry)?;
    Ok((JsonValue::from(STANDARD.encode(bytes)), definition))
}

fn decode_member(
    typename: &str,
    key: &str,
    encoded: &JsonValue,
    definition: &TypeDefinition,
    registry: &TypeRegistry,
) -> Result<Value, DatatypeError> {
    let text = encoded
        .as_str()
        .ok_or_else(|| DatatypeError::corrupt(typename, format!("member '{}' is not a base64 string", key)))?;
    let bytes = STANDARD
        .decode(text)
        .map_err(|error| DatatypeError::corrupt(typename, format!("member '{}': {}", key, error)))?;
    registry.class_for(definition)?.decode_data(&bytes, definition, registry)
}

fn parse_body(typename: &str, bytes: &[u8]) -> Result<Map<String, JsonValue>, DatatypeError> {
    match serde_json::from_slice(bytes) {
        Ok(JsonValue::Object(body)) => Ok(body),
        Ok(other) => Err(DatatypeError::corrupt(typename, format!("body is not an object: {}", other))),
        Err(error) => Err(DatatypeError::corrupt(typename, error.to_string())),
    }
}

fn render_body(body: Map<String, JsonValue>) -> Vec<u8> {
    JsonValue::Object(body).to_string().into_bytes()
}

fn transform_member(value: Value, definition: &TypeDefinition, registry: &TypeRegistry) -> Result<Value, DatatypeError> {
    let expanded = registry.expand(definition)?;
    registry.class_for(&expanded)?.transform(value, &expanded, registry)
}

fn validate_member(
    key: &str,
    raw: &JsonValue,
    registry: &TypeRegistry,
    as_metadata: bool,
) -> Result<(), SchemaValidationError> {
    let path = format!("contents.{}", key);
    let definition = TypeDefinition::from_json(raw.clone()).map_err(|error| error.nested(&path))?;
    let outcome = if as_metadata {
        validate_metadata(registry, &definition)
    } else {
        validate_definition(registry, &definition)
    };
    outcome.map_err(|error| error.nested(&path))
}

fn members_compatible(key: &str, producer: &JsonValue, consumer: &JsonValue, registry: &TypeRegistry) -> bool {
    let (Ok(produced), Ok(expected)) = (
        TypeDefinition::from_json(producer.clone()),
        TypeDefinition::from_json(consumer.clone()),
    ) else {
        return false;
    };
    let compatible = check_encoded(registry, &produced, Some(&expected));
    if !compatible {
        debug!(member = %key, "Container member types are incompatible");
    }
    compatible
}

/// A keyed container of arbitrary values.
///
/// `contents` is optional in a definition (any members are accepted) and
/// required in metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapType;

impl MapType {
    fn contents(document: &TypeDefinition) -> Option<&Map<String, JsonValue>> {
        document.get("contents").and_then(JsonValue::as_object)
    }
}

impl Datatype for MapType {
    fn name(&self) -> &'static str {
        "map"
    }

    fn description(&self) -> &'static str {
        "A container of named values"
    }

    fn definition_schema(&self) -> Schema {
        Schema::new("map").property(
            "contents",
            PropertyRule::object().with_description("definition of each member by key"),
        )
    }

    fn metadata_schema(&self) -> Schema {
        self.definition_schema().require("contents")
    }

    fn encode_type(&self, value: &Value, registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        let Value::Map(map) = value else {
            return Err(DatatypeError::unsupported("map", format!("value is a {}", value.kind())));
        };
        let mut contents = Map::new();
        for (key, member) in map.iter() {
            contents.insert(key.to_string(), registry.encode_type(member)?.into());
        }
        Ok(TypeDefinition::new("map").with("contents", contents))
    }

    fn encode_data(
        &self,
        value: &Value,
        metadata: &mut Metadata,
        registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        let Value::Map(map) = value else {
            return Err(DatatypeError::mismatch("map", format!("value is a {}", value.kind())));
        };
        let declared = Self::contents(metadata).cloned().unwrap_or_default();
        let mut body = Map::new();
        let mut contents = Map::new();
        for (key, member) in map.iter() {
            let definition = declared.get(key).map(|raw| member_definition(key, raw)).transpose()?;
            let (encoded, definition) = encode_member(member, definition, registry)?;
            body.insert(key.to_string(), encoded);
            contents.insert(key.to_string(), definition.into());
        }
        metadata.insert("contents", contents);
        Ok(render_body(body))
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let body = parse_body("map", bytes)?;
        let contents = Self::contents(metadata)
            .ok_or_else(|| DatatypeError::corrupt("map", "metadata lacks contents"))?;
        if body.len() != contents.len() || body.keys().any(|key| !contents.contains_key(key)) {
            let found: Vec<&String> = body.keys().collect();
            let expected: Vec<&String> = contents.keys().collect();
            return Err(DatatypeError::corrupt(
                "map",
                format!("members {:?} do not match contents {:?}", found, expected),
            ));
        }
        let mut map = ValueMap::new();
        for (key, encoded) in &body {
            let definition = member_definition(key, &contents[key])?;
            map.insert(key.clone(), decode_member("map", key, encoded, &definition, registry)?);
        }
        Ok(Value::Map(map))
    }

    fn transform(
        &self,
        value: Value,
        definition: &TypeDefinition,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let Value::Map(map) = value else {
            return Err(DatatypeError::mismatch("map", format!("value is a {}", value.kind())));
        };
        let Some(contents) = Self::contents(definition) else {
            return Ok(Value::Map(map));
        };
        if map.len() != contents.len() || map.keys().any(|key| !contents.contains_key(key)) {
            return Err(DatatypeError::mismatch(
                "map",
                format!("value has {} members, definition declares {}", map.len(), contents.len()),
            ));
        }
        let mut out = ValueMap::new();
        for (key, member) in map {
            let definition = member_definition(&key, &contents[&key])?;
            out.insert(key, transform_member(member, &definition, registry)?);
        }
        Ok(Value::Map(out))
    }

    fn check_meta_compatible(
        &self,
        key: &str,
        producer: &JsonValue,
        consumer: &JsonValue,
        registry: &TypeRegistry,
    ) -> bool {
        if key != "contents" {
            return crate::schema::default_compatible(key, producer, consumer);
        }
        let (Some(produced), Some(expected)) = (producer.as_object(), consumer.as_object()) else {
            return false;
        };
        produced.len() == expected.len()
            && expected.iter().all(|(member, wanted)| {
                produced
                    .get(member)
                    .is_some_and(|actual| members_compatible(member, actual, wanted, registry))
            })
    }

    fn empty_value(&self, _definition: &TypeDefinition, _registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        Ok(Value::Map(ValueMap::new()))
    }

    fn validate_semantics(
        &self,
        document: &TypeDefinition,
        registry: &TypeRegistry,
        as_metadata: bool,
    ) -> Result<(), SchemaValidationError> {
        for (key, raw) in Self::contents(document).into_iter().flatten() {
            validate_member(key, raw, registry, as_metadata)?;
        }
        Ok(())
    }
}

/// An ordered container of arbitrary values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetType;

impl SetType {
    fn contents(document: &TypeDefinition) -> Option<&Vec<JsonValue>> {
        document.get("contents").and_then(JsonValue::as_array)
    }
}

impl Datatype for SetType {
    fn name(&self) -> &'static str {
        "set"
    }

    fn description(&self) -> &'static str {
        "An ordered sequence of values"
    }

    fn definition_schema(&self) -> Schema {
        Schema::new("set").property(
            "contents",
            PropertyRule::array()
                .with_items(PropertyRule::object())
                .with_description("definition of each member by position"),
        )
    }

    fn metadata_schema(&self) -> Schema {
        self.definition_schema().require("contents")
    }

    fn encode_type(&self, value: &Value, registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        let Value::Set(items) = value else {
            return Err(DatatypeError::unsupported("set", format!("value is a {}", value.kind())));
        };
        let contents = items
            .iter()
            .map(|item| registry.encode_type(item).map(JsonValue::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypeDefinition::new("set").with("contents", contents))
    }

    fn encode_data(
        &self,
        value: &Value,
        metadata: &mut Metadata,
        registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        let Value::Set(items) = value else {
            return Err(DatatypeError::mismatch("set", format!("value is a {}", value.kind())));
        };
        let declared = Self::contents(metadata).cloned().unwrap_or_default();
        if !declared.is_empty() && declared.len() != items.len() {
            return Err(DatatypeError::mismatch(
                "set",
                format!("value has {} members, header declares {}", items.len(), declared.len()),
            ));
        }
        let mut body = Map::new();
        let mut contents = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let key = index.to_string();
            let definition = declared.get(index).map(|raw| member_definition(&key, raw)).transpose()?;
            let (encoded, definition) = encode_member(item, definition, registry)?;
            body.insert(key, encoded);
            contents.push(JsonValue::from(definition));
        }
        metadata.insert("contents", contents);
        Ok(render_body(body))
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let body = parse_body("set", bytes)?;
        let contents = Self::contents(metadata)
            .ok_or_else(|| DatatypeError::corrupt("set", "metadata lacks contents"))?;
        if body.len() != contents.len() {
            return Err(DatatypeError::corrupt(
                "set",
                format!("body has {} members, contents declares {}", body.len(), contents.len()),
            ));
        }
        let mut items = Vec::with_capacity(contents.len());
        for (index, raw) in contents.iter().enumerate() {
            let key = index.to_string();
            let encoded = body
                .get(&key)
                .ok_or_else(|| DatatypeError::corrupt("set", format!("body lacks member '{}'", key)))?;
            let definition = member_definition(&key, raw)?;
            items.push(decode_member("set", &key, encoded, &definition, registry)?);
        }
        Ok(Value::Set(items))
    }

    fn transform(
        &self,
        value: Value,
        definition: &TypeDefinition,
        registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let Value::Set(items) = value else {
            return Err(DatatypeError::mismatch("set", format!("value is a {}", value.kind())));
        };
        let Some(contents) = Self::contents(definition) else {
            return Ok(Value::Set(items));
        };
        if items.len() != contents.len() {
            return Err(DatatypeError::mismatch(
                "set",
                format!("value has {} members, definition declares {}", items.len(), contents.len()),
            ));
        }
        items
            .into_iter()
            .zip(contents)
            .enumerate()
            .map(|(index, (item, raw))| {
                let definition = member_definition(&index.to_string(), raw)?;
                transform_member(item, &definition, registry)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Set)
    }

    fn check_meta_compatible(
        &self,
        key: &str,
        producer: &JsonValue,
        consumer: &JsonValue,
        registry: &TypeRegistry,
    ) -> bool {
        if key != "contents" {
            return crate::schema::default_compatible(key, producer, consumer);
        }
        let (Some(produced), Some(expected)) = (producer.as_array(), consumer.as_array()) else {
            return false;
        };
        produced.len() == expected.len()
            && produced
                .iter()
                .zip(expected)
                .enumerate()
                .all(|(index, (actual, wanted))| members_compatible(&index.to_string(), actual, wanted, registry))
    }

    fn empty_value(&self, _definition: &TypeDefinition, _registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        Ok(Value::Set(Vec::new()))
    }

    fn validate_semantics(
        &self,
        document: &TypeDefinition,
        registry: &TypeRegistry,
        as_metadata: bool,
    ) -> Result<(), SchemaValidationError> {
        for (index, raw) in Self::contents(document).into_iter().flatten().enumerate() {
            validate_member(&index.to_string(), raw, registry, as_metadata)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{NdArray, Scalar};
    use serde_json::json;

    fn registry() -> std::sync::Arc<TypeRegistry> {
        TypeRegistry::global()
    }

    fn sample_map() -> Value {
        Value::Map(
            ValueMap::new()
                .with("count", Scalar::int(3, 32))
                .with("name", Scalar::unicode("sensor"))
                .with("series", NdArray::from_data(vec![0.5, 1.5])),
        )
    }

    #[test]
    fn test_map_wire_format() {
        let value = Value::Map(ValueMap::new().with("a", Scalar::uint(1, 8)));
        let mut metadata = MapType.encode_type(&value, &registry()).unwrap();
        let bytes = MapType.encode_data(&value, &mut metadata, &registry()).unwrap();
        assert_eq!(bytes, br#"{"a":"AQ=="}"#);
        assert_eq!(metadata.get("contents").unwrap()["a"]["typename"], json!("scalar"));
    }

    #[test]
    fn test_map_round_trip_keeps_order() {
        let value = sample_map();
        let mut metadata = MapType.encode_type(&value, &registry()).unwrap();
        let bytes = MapType.encode_data(&value, &mut metadata, &registry()).unwrap();
        let decoded = MapType.decode_data(&bytes, &metadata, &registry()).unwrap();
        assert_eq!(decoded, value);
        let keys: Vec<&str> = decoded.as_map().unwrap().keys().collect();
        assert_eq!(keys, ["count", "name", "series"]);
    }

    #[test]
    fn test_map_key_mismatch_is_corrupt() {
        let value = sample_map();
        let mut metadata = MapType.encode_type(&value, &registry()).unwrap();
        MapType.encode_data(&value, &mut metadata, &registry()).unwrap();
        let error = MapType
            .decode_data(br#"{"count":"AwAAAA=="}"#, &metadata, &registry())
            .unwrap_err();
        assert!(error.is_corrupt());
    }

    #[test]
    fn test_set_uses_index_keys() {
        let value = Value::Set(vec![Value::from(Scalar::int(1, 8)), Value::from(Scalar::int(2, 8))]);
        let mut metadata = SetType.encode_type(&value, &registry()).unwrap();
        let bytes = SetType.encode_data(&value, &mut metadata, &registry()).unwrap();
        assert_eq!(bytes, br#"{"0":"AQ==","1":"Ag=="}"#);
        assert_eq!(SetType.decode_data(&bytes, &metadata, &registry()).unwrap(), value);
    }

    #[test]
    fn test_contents_compatibility() {
        let producer = json!({"x": {"typename": "scalar", "subtype": "int", "precision": 16, "units": ""}});
        let consumer = json!({"x": {"typename": "int32"}});
        assert!(MapType.check_meta_compatible("contents", &producer, &consumer, &registry()));
        let extra = json!({"x": {"typename": "int32"}, "y": {"typename": "int32"}});
        assert!(!MapType.check_meta_compatible("contents", &producer, &extra, &registry()));

        let producer = json!([{"typename": "scalar", "subtype": "float", "precision": 64, "units": "m"}]);
        let consumer = json!([{"typename": "float64", "units": "km"}]);
        assert!(SetType.check_meta_compatible("contents", &producer, &consumer, &registry()));
        assert!(!SetType.check_meta_compatible("contents", &producer, &json!([]), &registry()));
    }

    #[test]
    fn test_nested_validation_paths() {
        let document = TypeDefinition::new("map").with("contents", json!({"x": {"typename": "scalar"}}));
        let error = validate_definition(&registry(), &document).unwrap_err();
        assert_eq!(error.path(), "contents.x.subtype");
    }

    #[test]
    fn test_transform_converts_members() {
        let value = Value::Map(ValueMap::new().with("d", Scalar::float64(2.0).with_units("km")));
        let definition = TypeDefinition::new("map")
            .with("contents", json!({"d": {"typename": "float64", "units": "m"}}));
        let out = MapType.transform(value, &definition, &registry()).unwrap();
        assert_eq!(
            out.as_map().unwrap().get("d"),
            Some(&Value::from(Scalar::float64(2000.0).with_units("m")))
        );
    }

    #[test]
    fn test_empty_values() {
        let definition = TypeDefinition::new("map");
        assert_eq!(MapType.empty_value(&definition, &registry()).unwrap(), Value::Map(ValueMap::new()));
        assert_eq!(SetType.empty_value(&definition, &registry()).unwrap(), Value::Set(vec![]));
    }
}
