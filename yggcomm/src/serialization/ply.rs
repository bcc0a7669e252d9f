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

//! The PLY file serializer.

use crate::datatypes::{NdArray, Ply, Value, Vertex};
use crate::serialization::{CodecError, FormatSerializer};

/// Returns a two dimensional numeric array as rows of floats.
pub(crate) fn array_rows(array: &NdArray, name: &str) -> Result<Vec<Vec<f64>>, CodecError> {
    let columns = match array.shape() {
        [_, columns] => *columns,
        [_] => array.len(),
        shape => {
            return Err(CodecError::mismatch(format!(
                "{} must be a two dimensional array, not shape {:?}",
                name, shape
            )))
        }
    };
    let values = array
        .data()
        .elements()
        .map(|element| element.as_f64())
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| CodecError::mismatch(format!("{} must be a real numeric array", name)))?;
    if columns == 0 {
        return Ok(Vec::new());
    }
    Ok(values.chunks(columns).map(<[f64]>::to_vec).collect())
}

/// Converts a float to a vertex index.
pub(crate) fn index(value: f64, name: &str) -> Result<usize, CodecError> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(CodecError::mismatch(format!("{} holds the invalid index {}", name, value)));
    }
    Ok(value as usize)
}

fn channel(value: f64) -> Result<u8, CodecError> {
    if !(0.0..=255.0).contains(&value) || value.fract() != 0.0 {
        return Err(CodecError::mismatch(format!("{} is not an 8-bit color channel", value)));
    }
    Ok(value as u8)
}

/// Reads and writes Stanford PLY documents.
///
/// Files stay a single document: appending merges the new mesh into the
/// existing one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlySerializer;

impl PlySerializer {
    fn mesh(&self, value: Value) -> Result<Ply, CodecError> {
        match self.normalize(value)? {
            Value::Ply(mesh) => Ok(mesh),
            other => Err(CodecError::mismatch(format!("expected a ply mesh, found a {}", other.kind()))),
        }
    }
}

impl FormatSerializer for PlySerializer {
    fn name(&self) -> &'static str {
        "ply"
    }

    fn serialize(&mut self, value: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(self.mesh(value.clone())?.to_ply_text().into_bytes())
    }

    fn deserialize(&mut self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|error| CodecError::format("ply", error.valid_up_to(), "invalid UTF-8"))?;
        Ok(Value::Ply(Ply::from_ply_text(text)?))
    }

    /// Accepts a [`Ply`], or a map with a `vertices` array of `[x, y, z]`
    /// or `[x, y, z, red, green, blue]` rows and a `faces` array of
    /// zero-based vertex index rows.
    fn normalize(&self, value: Value) -> Result<Value, CodecError> {
        let map = match value {
            Value::Ply(mesh) => return Ok(Value::Ply(mesh.normalize())),
            Value::Map(map) => map,
            other => {
                return Err(CodecError::mismatch(format!(
                    "a {} value cannot be read as a ply mesh",
                    other.kind()
                )))
            }
        };
        let mut mesh = Ply::new();
        if let Some(vertices) = map.get("vertices") {
            let vertices = vertices
                .as_array()
                .ok_or_else(|| CodecError::mismatch("vertices must be an array"))?;
            for row in array_rows(vertices, "vertices")? {
                let vertex = match row.as_slice() {
                    [x, y, z] => Vertex::new(*x, *y, *z),
                    [x, y, z, r, g, b] => Vertex::new(*x, *y, *z).with_color([channel(*r)?, channel(*g)?, channel(*b)?]),
                    other => {
                        return Err(CodecError::mismatch(format!(
                            "vertex rows have 3 or 6 columns, not {}",
                            other.len()
                        )))
                    }
                };
                mesh.vertices.push(vertex);
            }
        }
        if let Some(faces) = map.get("faces") {
            let faces = faces
                .as_array()
                .ok_or_else(|| CodecError::mismatch("faces must be an array"))?;
            for row in array_rows(faces, "faces")? {
                let indices = row
                    .iter()
                    .map(|value| index(*value, "faces"))
                    .collect::<Result<Vec<_>, _>>()?;
                mesh.add_face(indices)
                    .map_err(|error| CodecError::mismatch(error.reason))?;
            }
        }
        Ok(Value::Ply(mesh.normalize()))
    }

    fn merge(&self, values: &[Value]) -> Result<Value, CodecError> {
        let meshes = values
            .iter()
            .map(|value| self.mesh(value.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Ply(Ply::merge(&meshes)))
    }

    fn merges_on_append(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::ValueMap;

    fn triangle(offset: f64) -> Ply {
        let mut mesh = Ply::new();
        mesh.vertices.push(Vertex::new(offset, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(offset + 1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(offset, 1.0, 0.0));
        mesh.add_face([0, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut serializer = PlySerializer;
        let value = Value::Ply(triangle(0.0));
        let bytes = serializer.serialize(&value).unwrap();
        assert!(bytes.starts_with(b"ply\nformat ascii 1.0\n"));
        assert_eq!(serializer.deserialize(&bytes).unwrap(), value);
    }

    #[test]
    fn test_merge_offsets_faces() {
        let serializer = PlySerializer;
        let merged = serializer
            .merge(&[Value::Ply(triangle(0.0)), Value::Ply(triangle(5.0))])
            .unwrap();
        let mesh = merged.as_ply().unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.faces[1].vertex_index, vec![3, 4, 5]);
        assert_eq!(serializer.concatenate(&[merged.clone()]).unwrap(), vec![merged]);
    }

    #[test]
    fn test_normalize_from_arrays() {
        let vertices = NdArray::new(
            vec![0.0, 0.0, 0.0, 255.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 255.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 255.0].into(),
            vec![3, 6],
        )
        .unwrap();
        let faces = NdArray::new(vec![0i64, 1, 2].into(), vec![1, 3]).unwrap();
        let map = ValueMap::new().with("vertices", vertices).with("faces", faces);
        let value = PlySerializer.normalize(Value::Map(map)).unwrap();
        let mesh = value.as_ply().unwrap();
        assert_eq!(mesh.vertices[1].color, Some([0, 255, 0]));
        assert_eq!(mesh.faces[0].vertex_index, vec![0, 1, 2]);
    }

    #[test]
    fn test_normalize_rejects_bad_faces() {
        let vertices = NdArray::new(vec![0.0; 3].into(), vec![1, 3]).unwrap();
        let faces = NdArray::new(vec![0i64, 1, 2].into(), vec![1, 3]).unwrap();
        let map = ValueMap::new().with("vertices", vertices).with("faces", faces);
        assert!(PlySerializer.normalize(Value::Map(map)).unwrap_err().is_type_mismatch());
        assert!(PlySerializer.normalize(Value::from(1i64)).is_err());
    }

    #[test]
    fn test_corrupt_document_reports_offset() {
        let error = PlySerializer.deserialize(b"ply\nformat ascii 1.0\nelement vertex 1\nend_header\nx\n").unwrap_err();
        assert!(error.is_corrupt());
    }
}
