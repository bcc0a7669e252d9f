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

//! Type definitions and metadata headers.

use crate::schema::SchemaValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A mapping from property name to value describing a datatype.
///
/// Always carries `typename`, the key into the
/// [`TypeRegistry`](crate::datatypes::TypeRegistry), plus type specific
/// properties. Property order is preserved so that encoded headers and
/// container contents keep insertion order on the wire.
///
/// The same structure doubles as [`Metadata`]: the header stamped on every
/// encoded message, which adds observed runtime facts to the definition.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::TypeDefinition;
///
/// let def = TypeDefinition::new("scalar")
///     .with("subtype", "float")
///     .with("precision", 64)
///     .with("units", "m");
///
/// assert_eq!(def.typename(), Some("scalar"));
/// assert_eq!(def.get_u64("precision"), Some(64));
/// assert_eq!(def.get_str("units"), Some("m"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDefinition(Map<String, JsonValue>);

/// The header describing what was actually encoded in one message.
pub type Metadata = TypeDefinition;

impl TypeDefinition {
    /// Creates a definition containing only `typename`.
    pub fn new(typename: &str) -> Self {
        let mut map = Map::new();
        map.insert("typename".to_string(), JsonValue::from(typename));
        Self(map)
    }

    /// Wraps an existing JSON object.
    pub fn from_map(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }

    /// Converts a JSON value into a definition.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object.
    pub fn from_json(value: JsonValue) -> Result<Self, SchemaValidationError> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(SchemaValidationError::new(
                "",
                format!("type definition must be an object, found {}", other),
            )),
        }
    }

    /// Returns the `typename` property.
    pub fn typename(&self) -> Option<&str> {
        self.get_str("typename")
    }

    /// Replaces the `typename` property.
    pub fn set_typename(&mut self, typename: &str) {
        self.0
            .insert("typename".to_string(), JsonValue::from(typename));
    }

    /// Returns the raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Returns `key` as a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    /// Returns `key` as an unsigned integer.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(JsonValue::as_u64)
    }

    /// Returns `key` as a list of unsigned integers (e.g. `shape`).
    pub fn get_usize_list(&self, key: &str) -> Option<Vec<usize>> {
        self.0.get(key)?.as_array()?.iter().map(|item| item.as_u64().map(|n| n as usize)).collect()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Inserts a property, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Option<JsonValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.0.shift_remove(key)
    }

    /// Copies every property of `other` into `self`, overwriting on conflict.
    pub fn extend(&mut self, other: &Map<String, JsonValue>) {
        for (key, value) in other {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// Returns the number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no properties at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Converts into the underlying JSON object.
    pub fn into_map(self) -> Map<String, JsonValue> {
        self.0
    }

    /// Converts into a JSON value.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", JsonValue::Object(self.0.clone()))
    }
}

impl From<TypeDefinition> for JsonValue {
    fn from(definition: TypeDefinition) -> Self {
        JsonValue::Object(definition.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insertion_order_is_preserved() {
        let def = TypeDefinition::new("map").with("z", 1).with("a", 2);
        let keys: Vec<&String> = def.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["typename", "z", "a"]);
        assert_eq!(serde_json::to_string(&def).unwrap(), r#"{"typename":"map","z":1,"a":2}"#);
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(TypeDefinition::from_json(json!({"typename": "set"})).is_ok());
        assert!(TypeDefinition::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_usize_list() {
        let def = TypeDefinition::new("ndarray").with("shape", json!([2, 3]));
        assert_eq!(def.get_usize_list("shape"), Some(vec![2, 3]));
        let bad = TypeDefinition::new("ndarray").with("shape", json!([2, "x"]));
        assert_eq!(bad.get_usize_list("shape"), None);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut def = TypeDefinition::new("scalar").with("a", 1).with("b", 2).with("c", 3);
        def.remove("b");
        let keys: Vec<&String> = def.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["typename", "a", "c"]);
    }
}
