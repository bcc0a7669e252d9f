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

//! The `ply` and `obj` geometry datatypes. Bodies are the ASCII documents.

use crate::datatypes::{
    Datatype, DatatypeError, Metadata, ObjMesh, Ply, TypeDefinition, TypeRegistry, Value,
};
use crate::schema::Schema;

fn body_text<'a>(typename: &str, bytes: &'a [u8]) -> Result<&'a str, DatatypeError> {
    std::str::from_utf8(bytes).map_err(|error| DatatypeError::corrupt(typename, error.to_string()))
}

/// A mesh in PLY structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlyType;

impl Datatype for PlyType {
    fn name(&self) -> &'static str {
        "ply"
    }

    fn description(&self) -> &'static str {
        "A polygon mesh in Stanford PLY structure"
    }

    fn definition_schema(&self) -> Schema {
        Schema::new("ply")
    }

    fn metadata_schema(&self) -> Schema {
        Schema::new("ply")
    }

    fn encode_type(&self, value: &Value, _registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        match value {
            Value::Ply(_) => Ok(TypeDefinition::new("ply")),
            other => Err(DatatypeError::unsupported("ply", format!("value is a {}", other.kind()))),
        }
    }

    fn encode_data(
        &self,
        value: &Value,
        _metadata: &mut Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        match value {
            Value::Ply(mesh) => Ok(mesh.clone().normalize().to_ply_text().into_bytes()),
            other => Err(DatatypeError::mismatch("ply", format!("value is a {}", other.kind()))),
        }
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        _metadata: &Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        Ply::from_ply_text(body_text("ply", bytes)?)
            .map(Value::Ply)
            .map_err(|error| DatatypeError::corrupt("ply", error.to_string()))
    }

    fn transform(
        &self,
        value: Value,
        _definition: &TypeDefinition,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        match value {
            Value::Ply(mesh) => Ok(Value::Ply(mesh.normalize())),
            other => Err(DatatypeError::mismatch("ply", format!("value is a {}", other.kind()))),
        }
    }

    fn empty_value(&self, _definition: &TypeDefinition, _registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        Ok(Value::Ply(Ply::new()))
    }
}

/// A mesh in Wavefront OBJ structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjType;

impl Datatype for ObjType {
    fn name(&self) -> &'static str {
        "obj"
    }

    fn description(&self) -> &'static str {
        "A polygon mesh in Wavefront OBJ structure"
    }

    fn definition_schema(&self) -> Schema {
        Schema::new("obj")
    }

    fn metadata_schema(&self) -> Schema {
        Schema::new("obj")
    }

    fn encode_type(&self, value: &Value, _registry: &TypeRegistry) -> Result<Metadata, DatatypeError> {
        match value {
            Value::Obj(_) => Ok(TypeDefinition::new("obj")),
            other => Err(DatatypeError::unsupported("obj", format!("value is a {}", other.kind()))),
        }
    }

    fn encode_data(
        &self,
        value: &Value,
        _metadata: &mut Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Vec<u8>, DatatypeError> {
        match value {
            Value::Obj(mesh) => Ok(mesh.to_obj_text().into_bytes()),
            other => Err(DatatypeError::mismatch("obj", format!("value is a {}", other.kind()))),
        }
    }

    fn decode_data(
        &self,
        bytes: &[u8],
        _metadata: &Metadata,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        ObjMesh::from_obj_text(body_text("obj", bytes)?)
            .map(Value::Obj)
            .map_err(|error| DatatypeError::corrupt("obj", error.to_string()))
    }

    fn transform(
        &self,
        value: Value,
        _definition: &TypeDefinition,
        _registry: &TypeRegistry,
    ) -> Result<Value, DatatypeError> {
        match value {
            Value::Obj(mesh) => Ok(Value::Obj(mesh)),
            other => Err(DatatypeError::mismatch("obj", format!("value is a {}", other.kind()))),
        }
    }

    fn empty_value(&self, _definition: &TypeDefinition, _registry: &TypeRegistry) -> Result<Value, DatatypeError> {
        Ok(Value::Obj(ObjMesh::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Vertex;

    #[test]
    fn test_ply_body_is_document() {
        let registry = TypeRegistry::global();
        let mut mesh = Ply::new();
        mesh.vertices.push(Vertex::new(1.0, 2.0, 3.0).with_color([1, 2, 3]));
        let value = Value::Ply(mesh);
        let mut metadata = PlyType.encode_type(&value, &registry).unwrap();
        let bytes = PlyType.encode_data(&value, &mut metadata, &registry).unwrap();
        assert!(bytes.starts_with(b"ply\n"));
        assert_eq!(PlyType.decode_data(&bytes, &metadata, &registry).unwrap(), value);
    }

    #[test]
    fn test_corrupt_documents() {
        let registry = TypeRegistry::global();
        let metadata = TypeDefinition::new("obj");
        let error = ObjType.decode_data(b"f 1 2 3\n", &metadata, &registry).unwrap_err();
        assert!(error.is_corrupt());
        let error = PlyType.decode_data(&[0xff, 0xfe], &metadata, &registry).unwrap_err();
        assert!(error.is_corrupt());
    }
}
