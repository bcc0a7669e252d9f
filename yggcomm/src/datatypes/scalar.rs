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

//! The `scalar` datatype and the numeric property helpers shared with arrays.

use crate::datatypes::units::{self, Unit, UnitsError};
use crate::datatypes::{
    Datatype, DatatypeError, Element, Metadata, Scalar, Subtype, TypeDefinition, TypeRegistry, Value,
};
use crate::schema::{PropertyRule, Schema, SchemaValidationError};
use serde_json::json;

/// Schema with the `subtype`, `precision` and `units` properties declared.
pub(crate) fn numeric_schema(typename: &str) -> Schema {
    Schema::new(typename)
        .property(
            "subtype",
            PropertyRule::string()
                .with_enum(Subtype::ALL.iter().map(|subtype| json!(subtype.as_str())))
                .with_description("element kind"),
        )
        .property(
            "precision",
            PropertyRule::integer()
                .with_minimum(1.0)
                .with_description("element width in bits"),
        )
        .property(
            "units",
            PropertyRule::string().with_description("physical units expression"),
        )
}

/// Rejects subtype/precision pairs that cannot be encoded.
pub(crate) fn check_subtype_precision(document: &TypeDefinition) -> Result<(), SchemaValidationError> {
    let (Some(subtype), Some(precision)) = (
        document.get_str("subtype").and_then(Subtype::parse),
        document.get_u64("precision"),
    ) else {
        return Ok(());
    };
    if u32::try_from(precision).is_ok_and(|bits| subtype.is_valid_precision(bits)) {
        Ok(())
    } else {
        Err(SchemaValidationError::new(
            "precision",
            format!("{} bits is not a valid {} precision", precision, subtype),
        ))
    }
}

/// Reads the `subtype` property of a validated document.
pub(crate) fn read_subtype(typename: &str, document: &TypeDefinition) -> Result<Subtype, DatatypeError> {
    document
        .get_str("subtype")
        .and_then(Subtype::parse)
        .ok_or_else(|| DatatypeError::corrupt(typename, "metadata lacks a valid subtype"))
}

/// Reads the `precision` property, if any.
pub(crate) fn read_precision(document: &TypeDefinition) -> Option<u32> {
    document.get_u64("precision").and_then(|bits| u32::try_from(bits).ok())
}

/// Rejects a unit expression that cannot be parsed.
pub(crate) fn check_units(typename: &str, expression: &str) -> Result<(), DatatypeError> {
    if expression.is_empty() {
        return Ok(());
    }
    Unit::parse(expression)
        .map(|_| ())
        .map_err(|error| DatatypeError::unsupported(typename, error.to_string()))
}

/// Precision a value must take to satisfy `definition`. Narrowing fails.
pub(crate) fn target_precision(
    typename: &str,
    current: u32,
    definition: &TypeDefinition,
) -> Result<u32, DatatypeError> {
    match read_precision(definition) {
        Some(wanted) if wanted < current => Err(DatatypeError::mismatch(
            typename,
            format!("narrowing precision from {} to {} bits would lose data", current, wanted),
        )),
        Some(wanted) => Ok(wanted),
        None => Ok(current),
    }
}

/// Factor and resulting units for moving `current` units to the definition's.
///
/// An empty expression on either side leaves the values untouched.
pub(crate) fn target_units(current: &str, definition: &TypeDefinition) -> Result<(f64, String), UnitsError> {
    let wanted = definition.get_str("units").unwrap_or_default();
    if wanted.is_empty() {
        return Ok((1.0, current.to_string()));
    }
    if current.is_empty() || current == wanted {
        return Ok((1.0, wanted.to_string()));
    }
    Ok((units::conversion_factor(current, wanted)?, wanted.to_string()))
}

/// Checks a requested subtype against the value's.
pub(crate) fn check_subtype(
    typename: &str,
    actual: Subtype,
    definition: &TypeDefinition,
) -> Result<(), DatatypeError> {
    match definition.get_str("subtype") {
        Some(wanted) if wanted != actual.as_str() => Err(DatatypeError::mismatch(
            typename,
            format!("value has subtype {}, definition requires {}", actual, wanted),
        )),
        _ => Ok(()),
    }
}

/// A single number or fixed width string.
///
/// Definition properties: `subtype`, `precision` (required), `units`.
/// Metadata properties: `subtype`, `precision`, `units` (all required).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarType;

impl Datatype for ScalarType {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn description(&self) -> &'static str {
        "A scalar number or string with precision and units"
    }

    fn definition_schema(&self) -> Schema {
        numeric_schema("scalar").require("subtype").require("precision")
    }

    fn metadata_schema(&self) -> Schema {
        self.definition_schema().require("units")
    }

    fn encode_type(&self, value: &Value, _registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        let Value::Scalar(scalar) = value else {
            return Err(DatatypeError::unsupported("scalar", format!("value is a {}", value.kind())));
        };
        if !scalar.value().fits(scalar.precision()) {
            return Err(DatatypeError::unsupported(
                "scalar",
                format!("{} does not fit in {} bits", scalar.value(), scalar.precision()),
            ));
        }
        check_units("scalar", scalar.units())?;
        Ok(TypeDefinition::new("scalar")
            .with("subtype", scalar.subtype().as_str())
            .with("precision", scalar.precision())
            .with("units", scalar.units()))
    }

    fn encode_data(
        &self,
        value: &Value,
        metadata: &mut Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        let Value::Scalar(scalar) = value else {
            return Err(DatatypeError::mismatch("scalar", format!("value is a {}", value.kind())));
        };
        check_subtype("scalar", scalar.subtype(), metadata)?;
        let precision = read_precision(metadata).unwrap_or(scalar.precision());
        if !scalar.value().fits(precision) {
            return Err(DatatypeError::mismatch(
                "scalar",
                format!("{} does not fit in {} bits", scalar.value(), precision),
            ));
        }
        let mut out = Vec::with_capacity(precision as usize / 8);
        scalar.value().write_le(precision, &mut out);
        Ok(out)
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let subtype = read_subtype("scalar", metadata)?;
        let precision = read_precision(metadata)
            .ok_or_else(|| DatatypeError::corrupt("scalar", "metadata lacks a precision"))?;
        let itemsize = precision as usize / 8;
        if bytes.len() != itemsize {
            return Err(DatatypeError::corrupt(
                "scalar",
                format!("expected {} bytes for {} bits, found {}", itemsize, precision, bytes.len()),
            ));
        }
        let element = Element::read_le(subtype, precision, bytes)
            .map_err(|reason| DatatypeError::corrupt("scalar", reason))?;
        let units = metadata.get_str("units").unwrap_or_default();
        Ok(Value::Scalar(Scalar::new(element, precision).with_units(units)))
    }

    fn transform(
        &self,
        value: Value,
        definition: &TypeDefinition,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let Value::Scalar(scalar) = value else {
            return Err(DatatypeError::mismatch("scalar", format!("value is a {}", value.kind())));
        };
        check_subtype("scalar", scalar.subtype(), definition)?;
        let precision = target_precision("scalar", scalar.precision(), definition)?;
        let (element, _, units) = scalar.into_parts();
        let (factor, units) = target_units(&units, definition)?;
        let element = element.scale(factor).ok_or_else(|| {
            DatatypeError::mismatch("scalar", format!("cannot convert {} to {} exactly", element, units))
        })?;
        if !element.fits(precision) {
            return Err(DatatypeError::mismatch(
                "scalar",
                format!("{} does not fit in {} bits", element, precision),
            ));
        }
        Ok(Value::Scalar(Scalar::new(element, precision).with_units(units)))
    }

    fn empty_value(&self, definition: &TypeDefinition, _registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        let subtype = read_subtype("scalar", definition)?;
        let precision = read_precision(definition).unwrap_or(subtype.default_precision());
        let units = definition.get_str("units").unwrap_or_default();
        Ok(Value::Scalar(Scalar::new(Element::zero(subtype), precision).with_units(units)))
    }

    fn validate_semantics(
        &self,
        document: &TypeDefinition,
        _registry: &TypeRegistry,
        _as_metadata: bool,
    ) -> Result<(), SchemaValidationError> {
        check_subtype_precision(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> std::sync::Arc<TypeRegistry> {
        TypeRegistry::global()
    }

    #[test]
    fn test_encode_type_describes_value() {
        let value = Value::from(Scalar::float32(2.5).with_units("cm"));
        let metadata = ScalarType.encode_type(&value, &registry()).unwrap();
        assert_eq!(metadata.get_str("subtype"), Some("float"));
        assert_eq!(metadata.get_u64("precision"), Some(32));
        assert_eq!(metadata.get_str("units"), Some("cm"));
    }

    #[test]
    fn test_encode_type_rejects_other_values() {
        let error = ScalarType
            .encode_type(&Value::Set(vec![]), &registry())
            .unwrap_err();
        assert!(error.is_unsupported());
        let overflow = Value::from(Scalar::int(300, 8));
        assert!(ScalarType.encode_type(&overflow, &registry()).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let metadata = TypeDefinition::new("scalar")
            .with("subtype", "int")
            .with("precision", 32)
            .with("units", "");
        let error = ScalarType.decode_data(&[1, 2, 3], &metadata, &registry()).unwrap_err();
        assert!(error.is_corrupt());
    }

    #[test]
    fn test_transform_widens_and_converts() {
        let value = Value::from(Scalar::float32(150.0).with_units("cm"));
        let definition = TypeDefinition::new("scalar")
            .with("subtype", "float")
            .with("precision", 64)
            .with("units", "m");
        let out = ScalarType.transform(value, &definition, &registry()).unwrap();
        assert_eq!(out, Value::from(Scalar::float64(1.5).with_units("m")));
    }

    #[test]
    fn test_transform_refuses_to_narrow() {
        let value = Value::from(Scalar::int(1, 64));
        let definition = TypeDefinition::new("scalar").with("subtype", "int").with("precision", 32);
        let error = ScalarType.transform(value, &definition, &registry()).unwrap_err();
        assert!(matches!(error, DatatypeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_transform_inexact_integer_conversion() {
        let value = Value::from(Scalar::int(150, 64).with_units("cm"));
        let definition = TypeDefinition::new("scalar").with("units", "m");
        assert!(ScalarType.transform(value, &definition, &registry()).is_err());
    }

    #[test]
    fn test_empty_value_is_zero() {
        let definition = TypeDefinition::new("scalar").with("subtype", "uint").with("precision", 8);
        let empty = ScalarType.empty_value(&definition, &registry()).unwrap();
        assert_eq!(empty, Value::from(Scalar::uint(0, 8)));
    }

    #[test]
    fn test_invalid_precision_pair() {
        let document = TypeDefinition::new("scalar").with("subtype", "float").with("precision", 16);
        assert_eq!(check_subtype_precision(&document).unwrap_err().path(), "precision");
        let document = TypeDefinition::new("scalar").with("subtype", "bytes").with("precision", 40);
        assert!(check_subtype_precision(&document).is_ok());
    }
}
