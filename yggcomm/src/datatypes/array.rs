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

//! The `1darray` and `ndarray` datatypes.
//!
//! Both encode their elements back to back in row-major order, each element
//! `precision / 8` bytes wide. A `1darray` header records the observed
//! `length`; an `ndarray` header records the `shape`.

use crate::datatypes::scalar::{
    check_subtype, check_subtype_precision, check_units, numeric_schema, read_precision, read_subtype,
    target_precision, target_units,
};
use crate::datatypes::{
    ArrayData, Datatype, DatatypeError, Element, Metadata, NdArray, TypeDefinition, TypeRegistry, Value,
};
use crate::datatypes::value::element_count;
use crate::schema::{PropertyRule, Schema, SchemaValidationError};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimensionality {
    One,
    Many,
}

/// A homogeneous array of numbers or fixed width strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayType {
    dimensionality: Dimensionality,
}

impl ArrayType {
    /// The `1darray` class.
    pub const fn one_dimensional() -> Self {
        Self {
            dimensionality: Dimensionality::One,
        }
    }

    /// The `ndarray` class.
    pub const fn n_dimensional() -> Self {
        Self {
            dimensionality: Dimensionality::Many,
        }
    }

    fn typename(&self) -> &'static str {
        match self.dimensionality {
            Dimensionality::One => "1darray",
            Dimensionality::Many => "ndarray",
        }
    }

    fn expect_array(&self, value: Value) -> Result<NdArray, DatatypeError> {
        match value {
            Value::Array(array) => Ok(array),
            other => Err(DatatypeError::mismatch(self.typename(), format!("value is a {}", other.kind()))),
        }
    }
}

impl Datatype for ArrayType {
    fn name(&self) -> &'static str {
        self.typename()
    }

    fn description(&self) -> &'static str {
        match self.dimensionality {
            Dimensionality::One => "A one dimensional array of scalars",
            Dimensionality::Many => "A multi dimensional array of scalars",
        }
    }

    fn definition_schema(&self) -> Schema {
        let schema = numeric_schema(self.typename()).require("subtype").require("precision");
        match self.dimensionality {
            Dimensionality::One => schema.property(
                "length",
                PropertyRule::integer()
                    .with_minimum(0.0)
                    .with_description("number of elements"),
            ),
            Dimensionality::Many => schema.property(
                "shape",
                PropertyRule::array()
                    .with_items(PropertyRule::integer().with_minimum(0.0))
                    .with_description("extent of each dimension"),
            ),
        }
    }

    fn metadata_schema(&self) -> Schema {
        let schema = self.definition_schema().require("units");
        match self.dimensionality {
            Dimensionality::One => schema.require("length"),
            Dimensionality::Many => schema.require("shape"),
        }
    }

    fn encode_type(&self, value: &Value, _registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        let Value::Array(array) = value else {
            return Err(DatatypeError::unsupported(self.typename(), format!("value is a {}", value.kind())));
        };
        if self.dimensionality == Dimensionality::One && array.ndim() != 1 {
            return Err(DatatypeError::unsupported(
                self.typename(),
                format!("array has {} dimensions", array.ndim()),
            ));
        }
        if !array.data().fits(array.precision()) {
            return Err(DatatypeError::unsupported(
                self.typename(),
                format!("elements do not fit in {} bits", array.precision()),
            ));
        }
        check_units(self.typename(), array.units())?;
        let metadata = TypeDefinition::new(self.typename())
            .with("subtype", array.subtype().as_str())
            .with("precision", array.precision())
            .with("units", array.units());
        Ok(match self.dimensionality {
            Dimensionality::One => metadata.with("length", array.len()),
            Dimensionality::Many => metadata.with("shape", json!(array.shape())),
        })
    }

    fn encode_data(
        &self,
        value: &Value,
        metadata: &mut Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        let Value::Array(array) = value else {
            return Err(DatatypeError::mismatch(self.typename(), format!("value is a {}", value.kind())));
        };
        check_subtype(self.typename(), array.subtype(), metadata)?;
        let precision = read_precision(metadata).unwrap_or(array.precision());
        if !array.data().fits(precision) {
            return Err(DatatypeError::mismatch(
                self.typename(),
                format!("elements do not fit in {} bits", precision),
            ));
        }
        let mut out = Vec::with_capacity(array.len() * precision as usize / 8);
        for element in array.data().elements() {
            element.write_le(precision, &mut out);
        }
        Ok(out)
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        metadata: &Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let typename = self.typename();
        let subtype = read_subtype(typename, metadata)?;
        let precision = read_precision(metadata)
            .ok_or_else(|| DatatypeError::corrupt(typename, "metadata lacks a precision"))?;
        let itemsize = (precision as usize / 8).max(1);
        if bytes.len() % itemsize != 0 {
            return Err(DatatypeError::corrupt(
                typename,
                format!("{} bytes is not a multiple of the {} byte item size", bytes.len(), itemsize),
            ));
        }
        let count = bytes.len() / itemsize;
        let shape = match self.dimensionality {
            Dimensionality::One => {
                let length = metadata.get_u64("length").map_or(count, |n| n as usize);
                if length != count {
                    return Err(DatatypeError::corrupt(
                        typename,
                        format!("header declares {} elements, payload holds {}", length, count),
                    ));
                }
                vec![count]
            }
            Dimensionality::Many => {
                let shape = metadata.get_usize_list("shape").unwrap_or_else(|| vec![count]);
                let size = element_count(&shape).ok_or_else(|| {
                    DatatypeError::corrupt(typename, format!("shape {:?} overflows the element count", shape))
                })?;
                if size != count {
                    return Err(DatatypeError::corrupt(
                        typename,
                        format!("shape {:?} holds {} elements, payload holds {}", shape, size, count),
                    ));
                }
                shape
            }
        };
        let elements = bytes
            .chunks_exact(itemsize)
            .map(|chunk| Element::read_le(subtype, precision, chunk))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| DatatypeError::corrupt(typename, reason))?;
        let data = ArrayData::from_elements(subtype, elements)?;
        let units = metadata.get_str("units").unwrap_or_default().to_string();
        Ok(Value::Array(NdArray::from_parts(data, precision, shape, units)))
    }

    fn transform(
        &self,
        value: Value,
        definition: &TypeDefinition,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        let typename = self.typename();
        let array = self.expect_array(value)?;
        check_subtype(typename, array.subtype(), definition)?;
        let precision = target_precision(typename, array.precision(), definition)?;
        let (data, _, shape, units) = array.into_parts();
        let (factor, units) = target_units(&units, definition)?;
        let subtype = data.subtype();
        let scaled = data
            .elements()
            .map(|element| element.scale(factor))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| DatatypeError::mismatch(typename, format!("cannot convert elements to {} exactly", units)))?;
        let data = ArrayData::from_elements(subtype, scaled)?;
        if !data.fits(precision) {
            return Err(DatatypeError::mismatch(typename, format!("elements do not fit in {} bits", precision)));
        }
        let shape = match self.dimensionality {
            Dimensionality::One => {
                if let Some(length) = definition.get_u64("length") {
                    if length as usize != data.len() {
                        return Err(DatatypeError::mismatch(
                            typename,
                            format!("array has {} elements, definition requires {}", data.len(), length),
                        ));
                    }
                }
                vec![data.len()]
            }
            Dimensionality::Many => definition.get_usize_list("shape").unwrap_or(shape),
        };
        Ok(Value::Array(
            NdArray::new(data, shape)?
                .with_precision(precision)
                .with_units(units),
        ))
    }

    fn empty_value(&self, definition: &TypeDefinition, _registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        let subtype = read_subtype(self.typename(), definition)?;
        let precision = read_precision(definition).unwrap_or(subtype.default_precision());
        let units = definition.get_str("units").unwrap_or_default().to_string();
        Ok(Value::Array(NdArray::from_parts(
            ArrayData::empty(subtype),
            precision,
            vec![0],
            units,
        )))
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
    use crate::datatypes::Subtype;

    fn registry() -> std::sync::Arc<TypeRegistry> {
        TypeRegistry::global()
    }

    #[test]
    fn test_one_dimensional_rejects_matrices() {
        let matrix = Value::from(NdArray::new(vec![1i64, 2, 3, 4].into(), vec![2, 2]).unwrap());
        let error = ArrayType::one_dimensional()
            .encode_type(&matrix, &registry())
            .unwrap_err();
        assert!(error.is_unsupported());
        let metadata = ArrayType::n_dimensional().encode_type(&matrix, &registry()).unwrap();
        assert_eq!(metadata.get_usize_list("shape"), Some(vec![2, 2]));
    }

    #[test]
    fn test_encode_decode_int16() {
        let class = ArrayType::one_dimensional();
        let value = Value::from(NdArray::from_data(vec![1i64, -1, 256]).with_precision(16));
        let mut metadata = class.encode_type(&value, &registry()).unwrap();
        assert_eq!(metadata.get_u64("length"), Some(3));
        let bytes = class.encode_data(&value, &mut metadata, &registry()).unwrap();
        assert_eq!(bytes, vec![1, 0, 0xff, 0xff, 0, 1]);
        assert_eq!(class.decode_data(&bytes, &metadata, &registry()).unwrap(), value);
    }

    #[test]
    fn test_decode_rejects_partial_items() {
        let metadata = TypeDefinition::new("1darray")
            .with("subtype", "float")
            .with("precision", 32)
            .with("units", "")
            .with("length", 2);
        let error = ArrayType::one_dimensional()
            .decode_data(&[0; 7], &metadata, &registry())
            .unwrap_err();
        assert!(error.is_corrupt());
        let error = ArrayType::one_dimensional()
            .decode_data(&[0; 4], &metadata, &registry())
            .unwrap_err();
        assert!(error.is_corrupt());
    }

    #[test]
    fn test_decode_rejects_overflowing_shape() {
        let metadata = TypeDefinition::new("ndarray")
            .with("subtype", "int")
            .with("precision", 32)
            .with("units", "")
            .with("shape", json!([4294967296u64, 4294967296u64, 16]));
        let error = ArrayType::n_dimensional()
            .decode_data(&[], &metadata, &registry())
            .unwrap_err();
        assert!(error.is_corrupt());

        let metadata = metadata.with("shape", json!([usize::MAX, 0]));
        let error = ArrayType::n_dimensional()
            .decode_data(&[0; 4], &metadata, &registry())
            .unwrap_err();
        assert!(error.is_corrupt());
    }

    #[test]
    fn test_transform_reshapes() {
        let flat = Value::from(NdArray::from_data(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        let definition = TypeDefinition::new("ndarray")
            .with("subtype", "float")
            .with("precision", 64)
            .with("shape", json!([3, 2]));
        let out = ArrayType::n_dimensional()
            .transform(flat, &definition, &registry())
            .unwrap();
        assert_eq!(out.as_array().unwrap().shape(), &[3, 2]);

        let wrong = TypeDefinition::new("ndarray").with("shape", json!([4, 2]));
        let flat = Value::from(NdArray::from_data(vec![1.0, 2.0]));
        assert!(ArrayType::n_dimensional().transform(flat, &wrong, &registry()).is_err());
    }

    #[test]
    fn test_transform_converts_units() {
        let value = Value::from(NdArray::from_data(vec![1.0, 2.5]).with_units("km"));
        let definition = TypeDefinition::new("1darray").with("units", "m");
        let out = ArrayType::one_dimensional()
            .transform(value, &definition, &registry())
            .unwrap();
        let array = out.as_array().unwrap();
        assert_eq!(array.data(), &ArrayData::Float(vec![1000.0, 2500.0]));
        assert_eq!(array.units(), "m");
    }

    #[test]
    fn test_empty_value() {
        let definition = TypeDefinition::new("1darray").with("subtype", "int").with("precision", 32);
        let empty = ArrayType::one_dimensional().empty_value(&definition, &registry()).unwrap();
        let array = empty.as_array().unwrap();
        assert!(array.is_empty());
        assert_eq!(array.subtype(), Subtype::Int);
        assert_eq!(array.precision(), 32);
    }
}
