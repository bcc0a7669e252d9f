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

//! Definition validation and producer/consumer compatibility.

use crate::datatypes::{units, Metadata, TypeDefinition, TypeRegistry};
use crate::schema::SchemaValidationError;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Validates a type definition against its class's definition schema.
///
/// Nested definitions (container contents) are validated recursively.
///
/// # Errors
///
/// Returns the first violated constraint. An unknown `typename` is reported
/// as a violation of the `typename` property.
pub fn validate_definition(
    registry: &TypeRegistry,
    definition: &TypeDefinition,
) -> Result<(), SchemaValidationError> {
    let class = lookup(registry, definition)?;
    class.definition_schema().validate(definition)?;
    class.validate_semantics(definition, registry, false)
}

/// Validates a metadata header against its class's metadata schema.
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_metadata(
    registry: &TypeRegistry,
    metadata: &Metadata,
) -> Result<(), SchemaValidationError> {
    let class = lookup(registry, metadata)?;
    class.metadata_schema().validate(metadata)?;
    class.validate_semantics(metadata, registry, true)
}

fn lookup(
    registry: &TypeRegistry,
    document: &TypeDefinition,
) -> Result<std::sync::Arc<dyn crate::datatypes::Datatype>, SchemaValidationError> {
    let typename = document
        .typename()
        .ok_or_else(|| SchemaValidationError::missing("typename"))?;
    registry
        .get_type_class(typename)
        .map_err(|_| SchemaValidationError::new("typename", format!("unknown type '{}'", typename)))
}

/// Checks that encoded `metadata` satisfies the consumer's `definition`.
///
/// The metadata is validated against its own class's metadata schema. When a
/// definition is supplied it is validated against its definition schema, both
/// documents are expanded to their base type (fixed aliases contribute their
/// pinned properties), and every property the definition declares is compared
/// with the class's per-property compatibility relation.
///
/// This is a query: any failure yields `false`.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{TypeDefinition, TypeRegistry};
/// use yggcomm::schema::check_encoded;
///
/// let registry = TypeRegistry::global();
/// let produced = TypeDefinition::new("scalar")
///     .with("subtype", "float")
///     .with("precision", 32)
///     .with("units", "cm");
/// let expected = TypeDefinition::new("float64").with("units", "m");
///
/// assert!(check_encoded(&registry, &produced, Some(&expected)));
/// ```
pub fn check_encoded(
    registry: &TypeRegistry,
    metadata: &Metadata,
    definition: Option<&TypeDefinition>,
) -> bool {
    if let Err(error) = validate_metadata(registry, metadata) {
        debug!(%error, "Metadata failed validation");
        return false;
    }
    let Some(definition) = definition else {
        return true;
    };
    if let Err(error) = validate_definition(registry, definition) {
        debug!(%error, "Type definition failed validation");
        return false;
    }
    let (Ok(produced), Ok(expected)) = (registry.expand(metadata), registry.expand(definition))
    else {
        return false;
    };
    if produced.typename() != expected.typename() {
        debug!(
            produced = ?produced.typename(),
            expected = ?expected.typename(),
            "Type names are incompatible"
        );
        return false;
    }
    let Ok(class) = registry.class_for(&expected) else {
        return false;
    };
    let declared = class.metadata_schema();
    for (key, wanted) in expected.iter() {
        if key == "typename" || !declared.declares(key) {
            continue;
        }
        let Some(actual) = produced.get(key) else {
            debug!(property = %key, "Metadata lacks a property the definition requires");
            return false;
        };
        if !class.check_meta_compatible(key, actual, wanted, registry) {
            debug!(property = %key, %actual, %wanted, "Property values are incompatible");
            return false;
        }
    }
    true
}

/// The default per-property compatibility relation.
///
/// - `precision`: the producer's precision must not exceed the consumer's.
/// - `units`: the two unit expressions must be dimensionally convertible.
///   An empty expression on either side means "unspecified" and matches.
/// - anything else: equality.
///
/// # Examples
///
/// ```rust
/// use yggcomm::schema::default_compatible;
/// use serde_json::json;
///
/// assert!(default_compatible("precision", &json!(32), &json!(64)));
/// assert!(!default_compatible("precision", &json!(64), &json!(32)));
/// assert!(default_compatible("units", &json!("cm"), &json!("km")));
/// assert!(!default_compatible("units", &json!("cm"), &json!("s")));
/// ```
pub fn default_compatible(key: &str, producer: &JsonValue, consumer: &JsonValue) -> bool {
    match key {
        "precision" => match (producer.as_u64(), consumer.as_u64()) {
            (Some(produced), Some(expected)) => produced <= expected,
            _ => false,
        },
        "units" => match (producer.as_str(), consumer.as_str()) {
            (Some(""), Some(_)) | (Some(_), Some("")) => true,
            (Some(produced), Some(expected)) => units::are_convertible(produced, expected),
            _ => false,
        },
        _ => json_equivalent(producer, consumer),
    }
}

/// Structural equality that ignores integer storage differences.
pub(crate) fn json_equivalent(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_equivalent(x, y))
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, value)| y.get(key).is_some_and(|other| json_equivalent(value, other)))
        }
        _ => a == b,
    }
}
