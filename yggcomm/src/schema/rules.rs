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

//! Property rules and schemas.
//!
//! A [`Schema`] is an ordered list of [`PropertyRule`]s plus the set of
//! required property names. Rules cover the subset of JSON-schema the type
//! system relies on: accepted JSON kinds, enumerations, numeric minimums and
//! homogeneous array items.

use crate::datatypes::TypeDefinition;
use crate::schema::SchemaValidationError;
use serde_json::{json, Map, Value as JsonValue};

/// JSON value kinds a property may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// A JSON string.
    String,
    /// A JSON number without a fractional part.
    Integer,
    /// Any JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
}

impl JsonKind {
    /// Returns the JSON-schema keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Returns `true` if `value` is of this kind.
    pub fn matches(&self, value: &JsonValue) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for JsonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint on a single property value.
///
/// # Examples
///
/// ```rust
/// use yggcomm::schema::PropertyRule;
/// use serde_json::json;
///
/// let rule = PropertyRule::integer().with_enum([json!(8), json!(16), json!(32), json!(64)]);
/// assert!(rule.check("precision", &json!(32)).is_ok());
/// assert!(rule.check("precision", &json!(12)).is_err());
/// assert!(rule.check("precision", &json!("32")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRule {
    kinds: Vec<JsonKind>,
    enum_values: Option<Vec<JsonValue>>,
    minimum: Option<f64>,
    items: Option<Box<PropertyRule>>,
    description: &'static str,
}

impl PropertyRule {
    /// Creates a rule accepting any of the given kinds.
    pub fn of_kinds(kinds: impl IntoIterator<Item = JsonKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            enum_values: None,
            minimum: None,
            items: None,
            description: "",
        }
    }

    /// A rule accepting only strings.
    pub fn string() -> Self {
        Self::of_kinds([JsonKind::String])
    }

    /// A rule accepting only integers.
    pub fn integer() -> Self {
        Self::of_kinds([JsonKind::Integer])
    }

    /// A rule accepting any number.
    pub fn number() -> Self {
        Self::of_kinds([JsonKind::Number])
    }

    /// A rule accepting only arrays.
    pub fn array() -> Self {
        Self::of_kinds([JsonKind::Array])
    }

    /// A rule accepting only objects.
    pub fn object() -> Self {
        Self::of_kinds([JsonKind::Object])
    }

    /// Restricts the accepted values to the given enumeration.
    #[must_use]
    pub fn with_enum(mut self, values: impl IntoIterator<Item = JsonValue>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    /// Requires numeric values to be at least `minimum`.
    #[must_use]
    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Requires every element of an array value to satisfy `items`.
    #[must_use]
    pub fn with_items(mut self, items: PropertyRule) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Attaches a human readable description used when rendering the schema.
    #[must_use]
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Returns the kinds accepted by this rule.
    pub fn kinds(&self) -> &[JsonKind] {
        &self.kinds
    }

    /// Checks `value` against this rule.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaValidationError`] naming `path` and the first
    /// violated constraint.
    pub fn check(&self, path: &str, value: &JsonValue) -> Result<(), SchemaValidationError> {
        if !self.kinds.is_empty() && !self.kinds.iter().any(|kind| kind.matches(value)) {
            let expected: Vec<&str> = self.kinds.iter().map(JsonKind::as_str).collect();
            return Err(SchemaValidationError::new(
                path,
                format!("expected {}, found {}", expected.join(" or "), value),
            ));
        }
        if let Some(values) = &self.enum_values {
            if !values.iter().any(|candidate| json_equal(candidate, value)) {
                let rendered: Vec<String> = values.iter().map(JsonValue::to_string).collect();
                return Err(SchemaValidationError::new(
                    path,
                    format!("{} is not one of [{}]", value, rendered.join(", ")),
                ));
            }
        }
        if let (Some(minimum), Some(number)) = (self.minimum, value.as_f64()) {
            if number < minimum {
                return Err(SchemaValidationError::new(
                    path,
                    format!("{} is less than the minimum of {}", number, minimum),
                ));
            }
        }
        if let (Some(items), Some(array)) = (&self.items, value.as_array()) {
            for (index, item) in array.iter().enumerate() {
                items.check(&format!("{}.{}", path, index), item)?;
            }
        }
        Ok(())
    }

    /// Renders the rule as a JSON-schema fragment.
    pub fn to_json(&self) -> JsonValue {
        let mut out = Map::new();
        match self.kinds.as_slice() {
            [] => {}
            [single] => {
                out.insert("type".into(), json!(single.as_str()));
            }
            many => {
                let names: Vec<&str> = many.iter().map(JsonKind::as_str).collect();
                out.insert("type".into(), json!(names));
            }
        }
        if !self.description.is_empty() {
            out.insert("description".into(), json!(self.description));
        }
        if let Some(values) = &self.enum_values {
            out.insert("enum".into(), JsonValue::Array(values.clone()));
        }
        if let Some(minimum) = self.minimum {
            out.insert("minimum".into(), json!(minimum));
        }
        if let Some(items) = &self.items {
            out.insert("items".into(), items.to_json());
        }
        JsonValue::Object(out)
    }
}

// Integers decoded from JSON may land in either u64 or i64 storage.
fn json_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

/// Structural contract for a type definition or metadata header.
///
/// # Examples
///
/// ```rust
/// use yggcomm::schema::{PropertyRule, Schema};
/// use yggcomm::datatypes::TypeDefinition;
///
/// let schema = Schema::new("scalar")
///     .property("subtype", PropertyRule::string())
///     .require("subtype");
///
/// let good = TypeDefinition::new("scalar").with("subtype", "int");
/// assert!(schema.validate(&good).is_ok());
///
/// let missing = TypeDefinition::new("scalar");
/// assert!(schema.validate(&missing).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    title: String,
    required: Vec<String>,
    properties: Vec<(String, PropertyRule)>,
}

impl Schema {
    /// Creates a schema for documents whose `typename` equals `title`.
    ///
    /// The `typename` property is always required and pinned to `title`.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            properties: vec![(
                "typename".to_string(),
                PropertyRule::string().with_enum([json!(title.clone())]),
            )],
            required: vec!["typename".to_string()],
            title,
        }
    }

    /// Adds (or replaces) the rule for `name`.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, rule: PropertyRule) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = rule,
            None => self.properties.push((name, rule)),
        }
        self
    }

    /// Marks `name` as required.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Removes `name` from the schema entirely.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.properties.retain(|(existing, _)| existing != name);
        self.required.retain(|existing| existing != name);
        self
    }

    /// Returns the type name this schema describes.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the required property names, `typename` first.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Returns the rule for `name`, if declared.
    pub fn rule(&self, name: &str) -> Option<&PropertyRule> {
        self.properties
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, rule)| rule)
    }

    /// Returns `true` if `name` is declared by this schema.
    pub fn declares(&self, name: &str) -> bool {
        self.rule(name).is_some()
    }

    /// Validates a document against the schema.
    ///
    /// Undeclared properties are permitted; they carry caller provenance
    /// such as worker ids.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self, document: &TypeDefinition) -> Result<(), SchemaValidationError> {
        for name in &self.required {
            if !document.contains_key(name) {
                return Err(SchemaValidationError::missing(name));
            }
        }
        for (name, rule) in &self.properties {
            if let Some(value) = document.get(name) {
                rule.check(name, value)?;
            }
        }
        Ok(())
    }

    /// Renders the schema as a JSON-schema document.
    pub fn to_json(&self) -> JsonValue {
        let mut properties = Map::new();
        for (name, rule) in &self.properties {
            properties.insert(name.clone(), rule.to_json());
        }
        json!({
            "title": self.title,
            "type": "object",
            "required": self.required,
            "properties": properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precision_rule() -> PropertyRule {
        PropertyRule::integer().with_enum([json!(8), json!(16), json!(32), json!(64)])
    }

    #[test]
    fn test_kind_mismatch() {
        let error = PropertyRule::string().check("units", &json!(3)).unwrap_err();
        assert_eq!(error.path(), "units");
        assert!(error.message().contains("expected string"));
    }

    #[test]
    fn test_enum_accepts_unsigned_and_signed_storage() {
        let rule = precision_rule();
        assert!(rule.check("precision", &json!(64u64)).is_ok());
        assert!(rule.check("precision", &json!(64i64)).is_ok());
        assert!(rule.check("precision", &json!(12)).is_err());
    }

    #[test]
    fn test_minimum() {
        let rule = PropertyRule::integer().with_minimum(0.0);
        assert!(rule.check("length", &json!(0)).is_ok());
        assert!(rule.check("length", &json!(-1)).is_err());
    }

    #[test]
    fn test_items_report_index() {
        let rule = PropertyRule::array().with_items(PropertyRule::integer().with_minimum(0.0));
        let error = rule.check("shape", &json!([2, -3])).unwrap_err();
        assert_eq!(error.path(), "shape.1");
    }

    #[test]
    fn test_schema_pins_typename() {
        let schema = Schema::new("scalar");
        let wrong = TypeDefinition::new("map");
        let error = schema.validate(&wrong).unwrap_err();
        assert_eq!(error.path(), "typename");
    }

    #[test]
    fn test_schema_allows_extra_properties() {
        let schema = Schema::new("scalar");
        let doc = TypeDefinition::new("scalar").with("worker_id", 3);
        assert!(schema.validate(&doc).is_ok());
    }

    #[test]
    fn test_without_removes_requirement() {
        let schema = Schema::new("scalar")
            .property("subtype", PropertyRule::string())
            .require("subtype")
            .without("subtype");
        assert!(!schema.declares("subtype"));
        assert!(schema.validate(&TypeDefinition::new("scalar")).is_ok());
    }

    #[test]
    fn test_to_json_shape() {
        let schema = Schema::new("scalar")
            .property("precision", precision_rule())
            .require("precision");
        let rendered = schema.to_json();
        assert_eq!(rendered["required"], json!(["typename", "precision"]));
        assert_eq!(rendered["properties"]["precision"]["type"], json!("integer"));
    }
}
