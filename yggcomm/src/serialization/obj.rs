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

//! The Wavefront OBJ file serializer.

use crate::datatypes::{ObjFaceVertex, ObjMesh, Value};
use crate::serialization::ply::{array_rows, index};
use crate::serialization::{CodecError, FormatSerializer};

/// Reads and writes Wavefront OBJ documents; appending merges meshes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjSerializer;

impl ObjSerializer {
    fn mesh(&self, value: Value) -> Result<ObjMesh, CodecError> {
        match self.normalize(value)? {
            Value::Obj(mesh) => Ok(mesh),
            other => Err(CodecError::mismatch(format!("expected an obj mesh, found a {}", other.kind()))),
        }
    }
}

fn triples(rows: Vec<Vec<f64>>, name: &str) -> Result<Vec<[f64; 3]>, CodecError> {
    rows.into_iter()
        .map(|row| match row.as_slice() {
            [x, y, z] => Ok([*x, *y, *z]),
            other => Err(CodecError::mismatch(format!("{} rows have 3 columns, not {}", name, other.len()))),
        })
        .collect()
}

impl FormatSerializer for ObjSerializer {
    fn name(&self) -> &'static str {
        "obj"
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(self.mesh(value.clone())?.to_obj_text().into_bytes())
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|error| CodecError::format("obj", error.valid_up_to(), "invalid UTF-8"))?;
        Ok(Value::Obj(ObjMesh::from_obj_text(text)?))
    }

    /// Accepts an [`ObjMesh`], or a map with `vertices` (and optionally
    /// `normals`) arrays of `[x, y, z]` rows and a `faces` array of
    /// zero-based vertex index rows.
    fn normalize(&self, value: Value) -> Result<Value, CodecError> {
        let map = match value {
            Value::Obj(mesh) => return Ok(Value::Obj(mesh)),
            Value::Map(map) => map,
            other => {
                return Err(CodecError::mismatch(format!(
                    "a {} value cannot be read as an obj mesh",
                    other.kind()
                )))
            }
        };
        let rows = |key: &str| -> Result<Vec<Vec<f64>>, CodecError> {
            match map.get(key) {
                None => Ok(Vec::new()),
                Some(value) => {
                    let array = value
                        .as_array()
                        .ok_or_else(|| CodecError::mismatch(format!("{} must be an array", key)))?;
                    array_rows(array, key)
                }
            }
        };
        let mut mesh = ObjMesh::new();
        mesh.vertices = triples(rows("vertices")?, "vertices")?;
        mesh.normals = triples(rows("normals")?, "normals")?;
        for row in rows("faces")? {
            let face = row
                .iter()
                .map(|value| {
                    let vertex = index(*value, "faces")?;
                    if vertex >= mesh.vertices.len() {
                        return Err(CodecError::mismatch(format!(
                            "face refers to vertex {} of {}",
                            vertex,
                            mesh.vertices.len()
                        )));
                    }
                    Ok(ObjFaceVertex::new(vertex))
                })
                .collect::<Result<Vec<_>, _>>()?;
            mesh.faces.push(face);
        }
        Ok(Value::Obj(mesh))
    }

    fn merge(&self, values: &[Value]) -> Result<Value, CodecError> {
        let meshes = values
            .iter()
            .map(|value| self.mesh(value.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Obj(ObjMesh::merge(&meshes)))
    }

    fn merges_on_append(&self) -> bool {
        true
    }
}
