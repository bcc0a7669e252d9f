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

//! The type registry.

use crate::datatypes::{
    ArrayType, Datatype, DatatypeError, MapType, Metadata, ObjType, PlyType, ScalarType, SetType,
    TypeDefinition, Value, SCALAR_ALIASES,
};
use crate::schema::{self, SchemaValidationError};
use crate::serialization::{split_message, CodecError};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// Maps `typename` strings to datatype classes.
///
/// A registry is populated once, then shared read-only. Registration order
/// matters: [`guess_type_from_data`](Self::guess_type_from_data) returns the
/// first class that accepts a value, so a value two classes could both
/// describe goes to whichever was registered first. The default order is
/// `scalar`, `1darray`, `ndarray`, `map`, `set`, `ply`, `obj`, then the fixed
/// scalar aliases, which are therefore never guessed.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{NdArray, TypeRegistry, Value};
///
/// let registry = TypeRegistry::global();
/// let value = Value::from(NdArray::from_data(vec![1.0, 2.0]));
/// let class = registry.guess_type_from_data(&value).unwrap();
/// assert_eq!(class.name(), "1darray");
/// ```
pub struct TypeRegistry {
    classes: Vec<Arc<dyn Datatype>>,
    index: HashMap<&'static str, usize>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.classes.iter().map(|class| class.name()).collect();
        f.debug_struct("TypeRegistry").field("classes", &names).finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a registry holding every built-in class in the default order.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let builtins: Vec<Arc<dyn Datatype>> = vec![
            Arc::new(ScalarType),
            Arc::new(ArrayType::one_dimensional()),
            Arc::new(ArrayType::n_dimensional()),
            Arc::new(MapType),
            Arc::new(SetType),
            Arc::new(PlyType),
            Arc::new(ObjType),
        ];
        let aliases = SCALAR_ALIASES
            .iter()
            .map(|alias| Arc::new(*alias) as Arc<dyn Datatype>);
        for class in builtins.into_iter().chain(aliases) {
            // Built-in names are distinct.
            let _ = registry.register(class);
        }
        registry
    }

    /// Returns the process-wide registry of built-in classes.
    pub fn global() -> Arc<TypeRegistry> {
        static GLOBAL: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(TypeRegistry::with_defaults())))
    }

    /// Adds a class.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::DuplicateType`] if the name is taken.
    pub fn register(&mut self, class: Arc<dyn Datatype>) -> Result<(), DatatypeError> {
        let name = class.name();
        if self.index.contains_key(name) {
            return Err(DatatypeError::DuplicateType {
                typename: name.to_string(),
            });
        }
        trace!(typename = name, "Registered datatype");
        self.index.insert(name, self.classes.len());
        self.classes.push(class);
        Ok(())
    }

    /// Looks up a class by name.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::UnknownType`] if absent.
    pub fn get_type_class(&self, typename: &str) -> Result<Arc<dyn Datatype>, DatatypeError> {
        self.index
            .get(typename)
            .map(|slot| Arc::clone(&self.classes[*slot]))
            .ok_or_else(|| DatatypeError::UnknownType {
                typename: typename.to_string(),
            })
    }

    /// Looks up the class named by a definition's `typename`.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::UnknownType`] if absent or missing.
    pub fn class_for(&self, definition: &TypeDefinition) -> Result<Arc<dyn Datatype>, DatatypeError> {
        self.get_type_class(definition.typename().unwrap_or_default())
    }

    /// Returns `true` if `typename` is registered.
    pub fn contains(&self, typename: &str) -> bool {
        self.index.contains_key(typename)
    }

    /// Iterates over registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.classes.iter().map(|class| class.name())
    }

    /// Returns the first class, in registration order, able to describe
    /// `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::NoMatchingType`] when no class applies.
    pub fn guess_type_from_data(&self, value: &Value) -> Result<Arc<dyn Datatype>, DatatypeError> {
        for class in &self.classes {
            match class.encode_type(value, self) {
                Ok(_) => return Ok(Arc::clone(class)),
                Err(error) if error.is_unsupported() => {}
                Err(error) => {
                    debug!(typename = class.name(), %error, "Datatype rejected value");
                }
            }
        }
        Err(DatatypeError::NoMatchingType {
            kind: value.kind().to_string(),
        })
    }

    /// Guesses the class of `value` and describes it.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::NoMatchingType`] when no class applies.
    pub fn encode_type(&self, value: &Value) -> Result<Metadata, DatatypeError> {
        self.guess_type_from_data(value)?.encode_type(value, self)
    }

    /// Returns the class named in a message's header.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedMessage`] if the separator is absent,
    /// the header is not a JSON object, or it lacks `typename`; an unknown
    /// type name is reported as a datatype error.
    pub fn guess_type_from_message(&self, message: &[u8]) -> Result<Arc<dyn Datatype>, CodecError> {
        let (header, _) = split_message(message)?;
        let metadata: TypeDefinition = serde_json::from_slice(header)
            .map_err(|error| CodecError::malformed(format!("header is not a JSON object: {}", error)))?;
        let typename = metadata
            .typename()
            .ok_or_else(|| CodecError::malformed("header lacks a typename"))?;
        Ok(self.get_type_class(typename)?)
    }

    /// Rewrites a fixed alias definition as a definition of its base class.
    ///
    /// Pinned properties override anything the document says. Definitions of
    /// non-alias classes are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DatatypeError::UnknownType`] for unregistered names.
    pub fn expand(&self, definition: &TypeDefinition) -> Result<TypeDefinition, DatatypeError> {
        let class = self.class_for(definition)?;
        let Some(base) = class.base() else {
            return Ok(definition.clone());
        };
        let mut expanded = TypeDefinition::new(base);
        for (key, value) in definition.iter() {
            if key != "typename" {
                expanded.insert(key.clone(), value.clone());
            }
        }
        expanded.extend(&class.fixed_properties());
        self.expand(&expanded)
    }

    /// Validates a definition against its class's definition schema.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate_definition(&self, definition: &TypeDefinition) -> Result<(), SchemaValidationError> {
        schema::validate_definition(self, definition)
    }

    /// See [`check_encoded`](crate::schema::check_encoded).
    pub fn check_encoded(&self, metadata: &Metadata, definition: Option<&TypeDefinition>) -> bool {
        schema::check_encoded(self, metadata, definition)
    }

    /// Returns `true` if `value` can be sent to a consumer expecting
    /// `definition`: the definition's base class describes the value and the
    /// resulting metadata passes [`check_encoded`](Self::check_encoded).
    pub fn check_decoded(&self, value: &Value, definition: &TypeDefinition) -> bool {
        let Ok(expanded) = self.expand(definition) else {
            return false;
        };
        let Ok(class) = self.class_for(&expanded) else {
            return false;
        };
        match class.encode_type(value, self) {
            Ok(metadata) => self.check_encoded(&metadata, Some(definition)),
            Err(error) => {
                debug!(%error, "Value does not match the definition's class");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{NdArray, Scalar, ValueMap};
    use serde_json::json;

    #[test]
    fn test_duplicate_registration() {
        let mut registry = TypeRegistry::new();
        registry.register(Arc::new(ScalarType)).unwrap();
        let error = registry.register(Arc::new(ScalarType)).unwrap_err();
        assert!(matches!(error, DatatypeError::DuplicateType { typename } if typename == "scalar"));
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::new();
        let error = registry.get_type_class("scalar").err().expect("expected error");
        assert!(matches!(error, DatatypeError::UnknownType { .. }));
    }

    #[test]
    fn test_default_order() {
        let registry = TypeRegistry::with_defaults();
        let names: Vec<&str> = registry.names().take(7).collect();
        assert_eq!(names, ["scalar", "1darray", "ndarray", "map", "set", "ply", "obj"]);
        assert!(registry.contains("complex128"));
    }

    #[test]
    fn test_guess_type_from_data() {
        let registry = TypeRegistry::global();
        let guess = |value: Value| registry.guess_type_from_data(&value).unwrap().name();
        assert_eq!(guess(Value::from(Scalar::int(1, 8))), "scalar");
        assert_eq!(guess(Value::from(NdArray::from_data(vec![1i64]))), "1darray");
        assert_eq!(
            guess(Value::from(NdArray::new(vec![1i64, 2].into(), vec![1, 2]).unwrap())),
            "ndarray"
        );
        assert_eq!(guess(Value::Map(ValueMap::new())), "map");
        assert_eq!(guess(Value::Set(vec![])), "set");
    }

    #[test]
    fn test_guess_without_match() {
        let registry = TypeRegistry::new();
        let error = registry.guess_type_from_data(&Value::Set(vec![])).err().expect("expected error");
        assert!(matches!(error, DatatypeError::NoMatchingType { .. }));
    }

    #[test]
    fn test_guess_type_from_message() {
        let registry = TypeRegistry::global();
        let class = registry
            .guess_type_from_message(br#"{"typename":"set","contents":[]}:YGG_TAG:{}"#)
            .unwrap();
        assert_eq!(class.name(), "set");
        assert!(registry.guess_type_from_message(b"no separator").is_err());
        assert!(registry.guess_type_from_message(b"[1]:YGG_TAG:").is_err());
    }

    #[test]
    fn test_expand_alias() {
        let registry = TypeRegistry::global();
        let expanded = registry
            .expand(&TypeDefinition::new("uint16").with("units", "s").with("precision", 64))
            .unwrap();
        assert_eq!(expanded.typename(), Some("scalar"));
        assert_eq!(expanded.get_str("subtype"), Some("uint"));
        assert_eq!(expanded.get("precision"), Some(&json!(16)));
        assert_eq!(expanded.get_str("units"), Some("s"));
    }

    #[test]
    fn test_check_decoded() {
        let registry = TypeRegistry::global();
        let float64 = TypeDefinition::new("float64").with("units", "m");
        assert!(registry.check_decoded(&Value::from(Scalar::float32(1.0).with_units("mm")), &float64));
        assert!(!registry.check_decoded(&Value::from(Scalar::int(1, 32)), &float64));
        assert!(!registry.check_decoded(&Value::Set(vec![]), &float64));
    }
}
