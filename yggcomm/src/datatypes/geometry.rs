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

//! Polygon meshes in PLY and Wavefront OBJ structure.
//!
//! Both meshes are stored with zero-based indices and written as ASCII text.
//! Merging renumbers cross references so that the faces of every input keep
//! pointing at their own vertices.

use thiserror::Error;

/// A mesh document could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {format} document at byte {offset}: {reason}")]
pub struct GeometryError {
    /// `"ply"` or `"obj"`
    pub format: &'static str,
    /// Byte offset of the offending line
    pub offset: usize,
    /// What was wrong
    pub reason: String,
}

impl GeometryError {
    fn ply(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            format: "ply",
            offset,
            reason: reason.into(),
        }
    }

    fn obj(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            format: "obj",
            offset,
            reason: reason.into(),
        }
    }
}

/// Iterates over lines with the byte offset each starts at.
fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        (start, line.trim_end_matches(['\r', '\n']))
    })
}

/// A PLY vertex with an optional RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    /// Vertex color
    pub color: Option<[u8; 3]>,
}

impl Vertex {
    /// An uncolored vertex.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, color: None }
    }

    /// Attaches a color.
    #[must_use]
    pub const fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Some(color);
        self
    }
}

/// A PLY face: indices into the vertex list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Face {
    /// Zero-based vertex indices
    pub vertex_index: Vec<usize>,
}

/// A mesh in PLY structure.
///
/// # Examples
///
/// ```rust
/// use yggcomm::datatypes::{Ply, Vertex};
///
/// let mut mesh = Ply::new();
/// mesh.vertices.push(Vertex::new(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::new(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::new(0.0, 1.0, 0.0));
/// mesh.add_face([0, 1, 2]).unwrap();
///
/// let text = mesh.to_ply_text();
/// assert_eq!(Ply::from_ply_text(&text).unwrap(), mesh);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ply {
    /// Vertex list
    pub vertices: Vec<Vertex>,
    /// Face list
    pub faces: Vec<Face>,
}

impl Ply {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a face after checking its indices.
    ///
    /// # Errors
    ///
    /// Fails if an index does not refer to an existing vertex.
    pub fn add_face(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<(), GeometryError> {
        let vertex_index: Vec<usize> = indices.into_iter().collect();
        if let Some(bad) = vertex_index.iter().find(|index| **index >= self.vertices.len()) {
            return Err(GeometryError::ply(
                0,
                format!("face refers to vertex {} of {}", bad, self.vertices.len()),
            ));
        }
        self.faces.push(Face { vertex_index });
        Ok(())
    }

    /// Returns `true` if any vertex carries a color.
    pub fn has_colors(&self) -> bool {
        self.vertices.iter().any(|vertex| vertex.color.is_some())
    }

    /// Gives every vertex a color (black) when any vertex has one.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.has_colors() {
            for vertex in &mut self.vertices {
                vertex.color.get_or_insert([0, 0, 0]);
            }
        }
        self
    }

    /// Combines meshes, offsetting each mesh's face indices by the number of
    /// vertices that precede it.
    pub fn merge<'a>(meshes: impl IntoIterator<Item = &'a Ply>) -> Ply {
        let mut merged = Ply::new();
        for mesh in meshes {
            let offset = merged.vertices.len();
            merged.vertices.extend_from_slice(&mesh.vertices);
            merged.faces.extend(mesh.faces.iter().map(|face| Face {
                vertex_index: face.vertex_index.iter().map(|index| index + offset).collect(),
            }));
        }
        merged.normalize()
    }

    /// Writes the mesh as an ASCII PLY document.
    pub fn to_ply_text(&self) -> String {
        let colored = self.has_colors();
        let mut out = String::from("ply\nformat ascii 1.0\n");
        out.push_str(&format!("element vertex {}\n", self.vertices.len()));
        out.push_str("property double x\nproperty double y\nproperty double z\n");
        if colored {
            out.push_str("property uchar red\nproperty uchar green\nproperty uchar blue\n");
        }
        out.push_str(&format!("element face {}\n", self.faces.len()));
        out.push_str("property list uchar int vertex_index\nend_header\n");
        for vertex in &self.vertices {
            out.push_str(&format!("{} {} {}", vertex.x, vertex.y, vertex.z));
            if colored {
                let [r, g, b] = vertex.color.unwrap_or([0, 0, 0]);
                out.push_str(&format!(" {} {} {}", r, g, b));
            }
            out.push('\n');
        }
        for face in &self.faces {
            out.push_str(&face.vertex_index.len().to_string());
            for index in &face.vertex_index {
                out.push_str(&format!(" {}", index));
            }
            out.push('\n');
        }
        out
    }

    /// Parses an ASCII PLY document.
    ///
    /// Vertex properties other than position and color are ignored, as are
    /// elements other than `vertex` and `face`.
    ///
    /// # Errors
    ///
    /// Returns the byte offset of the first malformed line.
    pub fn from_ply_text(text: &str) -> Result<Ply, GeometryError> {
        struct ElementSpec {
            name: String,
            count: usize,
            properties: Vec<String>,
        }

        let mut lines = lines_with_offsets(text);
        match lines.next() {
            Some((_, "ply")) => {}
            other => {
                return Err(GeometryError::ply(0, format!("expected 'ply' magic, found {:?}", other)));
            }
        }
        let mut elements: Vec<ElementSpec> = Vec::new();
        let mut end = None;
        for (offset, line) in lines.by_ref() {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["format", "ascii", _] => {}
                ["format", other, ..] => {
                    return Err(GeometryError::ply(offset, format!("unsupported format '{}'", other)));
                }
                ["comment", ..] | ["obj_info", ..] | [] => {}
                ["element", name, count] => {
                    let count = count
                        .parse()
                        .map_err(|_| GeometryError::ply(offset, format!("bad element count '{}'", count)))?;
                    elements.push(ElementSpec {
                        name: name.to_string(),
                        count,
                        properties: Vec::new(),
                    });
                }
                ["property", "list", _, _, name] | ["property", _, name] => {
                    let element = elements
                        .last_mut()
                        .ok_or_else(|| GeometryError::ply(offset, "property before any element"))?;
                    element.properties.push(name.to_string());
                }
                ["end_header"] => {
                    end = Some(offset + line.len());
                    break;
                }
                _ => return Err(GeometryError::ply(offset, format!("unexpected header line '{}'", line))),
            }
        }
        let end = end.ok_or_else(|| GeometryError::ply(text.len(), "missing end_header"))?;

        let mut mesh = Ply::new();
        let mut body = lines.filter(|(_, line)| !line.trim().is_empty());
        for element in &elements {
            for _ in 0..element.count {
                let (offset, line) = body
                    .next()
                    .ok_or_else(|| GeometryError::ply(text.len(), format!("truncated '{}' element", element.name)))?;
                let fields: Vec<&str> = line.split_whitespace().collect();
                match element.name.as_str() {
                    "vertex" => mesh.vertices.push(parse_ply_vertex(offset, &element.properties, &fields)?),
                    "face" => mesh.faces.push(parse_ply_face(offset, &fields)?),
                    _ => {}
                }
            }
        }
        let count = mesh.vertices.len();
        for face in &mesh.faces {
            if let Some(bad) = face.vertex_index.iter().find(|index| **index >= count) {
                return Err(GeometryError::ply(end, format!("face refers to vertex {} of {}", bad, count)));
            }
        }
        Ok(mesh)
    }
}

fn parse_ply_vertex(offset: usize, properties: &[String], fields: &[&str]) -> Result<Vertex, GeometryError> {
    if fields.len() < properties.len() {
        return Err(GeometryError::ply(
            offset,
            format!("vertex has {} fields, header declares {}", fields.len(), properties.len()),
        ));
    }
    let mut vertex = Vertex::new(0.0, 0.0, 0.0);
    let mut color = [0u8; 3];
    let mut colored = false;
    for (name, field) in properties.iter().zip(fields) {
        let bad = || GeometryError::ply(offset, format!("bad {} value '{}'", name, field));
        match name.as_str() {
            "x" => vertex.x = field.parse().map_err(|_| bad())?,
            "y" => vertex.y = field.parse().map_err(|_| bad())?,
            "z" => vertex.z = field.parse().map_err(|_| bad())?,
            "red" | "green" | "blue" => {
                let slot = match name.as_str() {
                    "red" => 0,
                    "green" => 1,
                    _ => 2,
                };
                color[slot] = field.parse().map_err(|_| bad())?;
                colored = true;
            }
            _ => {}
        }
    }
    if colored {
        vertex.color = Some(color);
    }
    Ok(vertex)
}

fn parse_ply_face(offset: usize, fields: &[&str]) -> Result<Face, GeometryError> {
    let bad = |field: &str| GeometryError::ply(offset, format!("bad face index '{}'", field));
    let (count, rest) = fields
        .split_first()
        .ok_or_else(|| GeometryError::ply(offset, "empty face"))?;
    let count: usize = count.parse().map_err(|_| bad(count))?;
    if rest.len() < count {
        return Err(GeometryError::ply(offset, format!("face declares {} indices, has {}", count, rest.len())));
    }
    let vertex_index = rest[..count]
        .iter()
        .map(|field| field.parse().map_err(|_| bad(field)))
        .collect::<Result<_, _>>()?;
    Ok(Face { vertex_index })
}

/// One corner of an OBJ face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjFaceVertex {
    /// Zero-based vertex index
    pub vertex: usize,
    /// Zero-based texture coordinate index
    pub texcoord: Option<usize>,
    /// Zero-based normal index
    pub normal: Option<usize>,
}

impl ObjFaceVertex {
    /// A corner referring only to a vertex.
    pub const fn new(vertex: usize) -> Self {
        Self {
            vertex,
            texcoord: None,
            normal: None,
        }
    }
}

/// A mesh in Wavefront OBJ structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjMesh {
    /// `v` records
    pub vertices: Vec<[f64; 3]>,
    /// `vt` records
    pub texcoords: Vec<[f64; 2]>,
    /// `vn` records
    pub normals: Vec<[f64; 3]>,
    /// `f` records
    pub faces: Vec<Vec<ObjFaceVertex>>,
}

impl ObjMesh {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Combines meshes, offsetting every index kind independently.
    pub fn merge<'a>(meshes: impl IntoIterator<Item = &'a ObjMesh>) -> ObjMesh {
        let mut merged = ObjMesh::new();
        for mesh in meshes {
            let (v, t, n) = (merged.vertices.len(), merged.texcoords.len(), merged.normals.len());
            merged.vertices.extend_from_slice(&mesh.vertices);
            merged.texcoords.extend_from_slice(&mesh.texcoords);
            merged.normals.extend_from_slice(&mesh.normals);
            merged.faces.extend(mesh.faces.iter().map(|face| {
                face.iter()
                    .map(|corner| ObjFaceVertex {
                        vertex: corner.vertex + v,
                        texcoord: corner.texcoord.map(|index| index + t),
                        normal: corner.normal.map(|index| index + n),
                    })
                    .collect()
            }));
        }
        merged
    }

    /// Writes the mesh as OBJ text with one-based indices.
    pub fn to_obj_text(&self) -> String {
        let mut out = String::new();
        for [x, y, z] in &self.vertices {
            out.push_str(&format!("v {} {} {}\n", x, y, z));
        }
        for [u, v] in &self.texcoords {
            out.push_str(&format!("vt {} {}\n", u, v));
        }
        for [x, y, z] in &self.normals {
            out.push_str(&format!("vn {} {} {}\n", x, y, z));
        }
        for face in &self.faces {
            out.push('f');
            for corner in face {
                out.push_str(&format!(" {}", corner.vertex + 1));
                match (corner.texcoord, corner.normal) {
                    (None, None) => {}
                    (Some(t), None) => out.push_str(&format!("/{}", t + 1)),
                    (None, Some(n)) => out.push_str(&format!("//{}", n + 1)),
                    (Some(t), Some(n)) => out.push_str(&format!("/{}/{}", t + 1, n + 1)),
                }
            }
            out.push('\n');
        }
        out
    }

    /// Parses OBJ text. Negative indices count back from the most recent
    /// record; grouping, material and smoothing statements are ignored.
    ///
    /// # Errors
    ///
    /// Returns the byte offset of the first malformed line.
    pub fn from_obj_text(text: &str) -> Result<ObjMesh, GeometryError> {
        let mut mesh = ObjMesh::new();
        for (offset, line) in lines_with_offsets(text) {
            let line = line.split('#').next().unwrap_or_default();
            let words: Vec<&str> = line.split_whitespace().collect();
            let Some((keyword, args)) = words.split_first() else {
                continue;
            };
            match *keyword {
                "v" => {
                    let [x, y, z] = parse_floats::<3>(offset, args)?;
                    mesh.vertices.push([x, y, z]);
                }
                "vt" => {
                    let [u, v] = parse_floats::<2>(offset, args)?;
                    mesh.texcoords.push([u, v]);
                }
                "vn" => {
                    let [x, y, z] = parse_floats::<3>(offset, args)?;
                    mesh.normals.push([x, y, z]);
                }
                "f" => {
                    if args.len() < 3 {
                        return Err(GeometryError::obj(offset, "face needs at least three corners"));
                    }
                    let face = args
                        .iter()
                        .map(|corner| parse_corner(offset, corner, &mesh))
                        .collect::<Result<_, _>>()?;
                    mesh.faces.push(face);
                }
                _ => {}
            }
        }
        Ok(mesh)
    }
}

fn parse_floats<const N: usize>(offset: usize, args: &[&str]) -> Result<[f64; N], GeometryError> {
    if args.len() < N {
        return Err(GeometryError::obj(offset, format!("expected {} coordinates, found {}", N, args.len())));
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse()
            .map_err(|_| GeometryError::obj(offset, format!("bad coordinate '{}'", arg)))?;
    }
    Ok(out)
}

fn resolve_index(offset: usize, field: &str, count: usize) -> Result<usize, GeometryError> {
    let raw: i64 = field
        .parse()
        .map_err(|_| GeometryError::obj(offset, format!("bad index '{}'", field)))?;
    let resolved = match raw {
        0 => None,
        n if n > 0 => Some(n as usize - 1),
        n => count.checked_sub(n.unsigned_abs() as usize),
    };
    match resolved {
        Some(index) if index < count => Ok(index),
        _ => Err(GeometryError::obj(offset, format!("index {} out of range for {} records", raw, count))),
    }
}

fn parse_corner(offset: usize, corner: &str, mesh: &ObjMesh) -> Result<ObjFaceVertex, GeometryError> {
    let mut parts = corner.split('/');
    let vertex = resolve_index(offset, parts.next().unwrap_or_default(), mesh.vertices.len())?;
    let texcoord = match parts.next() {
        None | Some("") => None,
        Some(field) => Some(resolve_index(offset, field, mesh.texcoords.len())?),
    };
    let normal = match parts.next() {
        None | Some("") => None,
        Some(field) => Some(resolve_index(offset, field, mesh.normals.len())?),
    };
    Ok(ObjFaceVertex { vertex, texcoord, normal })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(shift: f64) -> Ply {
        let mut mesh = Ply::new();
        mesh.vertices.push(Vertex::new(shift, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(shift + 1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::new(shift, 1.0, 0.5));
        mesh.add_face([0, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn test_ply_text_round_trip() {
        let mesh = triangle(0.25);
        let text = mesh.to_ply_text();
        assert!(text.starts_with("ply\nformat ascii 1.0\nelement vertex 3\n"));
        assert_eq!(Ply::from_ply_text(&text).unwrap(), mesh);
    }

    #[test]
    fn test_ply_merge_offsets_faces() {
        let merged = Ply::merge([&triangle(0.0), &triangle(2.0)]);
        assert_eq!(merged.vertices.len(), 6);
        assert_eq!(merged.faces[1].vertex_index, vec![3, 4, 5]);
    }

    #[test]
    fn test_ply_merge_fills_missing_colors() {
        let mut colored = triangle(0.0);
        colored.vertices[0].color = Some([255, 0, 0]);
        let merged = Ply::merge([&colored, &triangle(1.0)]);
        assert!(merged.vertices.iter().all(|vertex| vertex.color.is_some()));
        assert_eq!(merged.vertices[4].color, Some([0, 0, 0]));
    }

    #[test]
    fn test_ply_errors_carry_offsets() {
        let text = "ply\nformat binary_little_endian 1.0\n";
        let error = Ply::from_ply_text(text).unwrap_err();
        assert_eq!(error.offset, 4);

        let truncated = "ply\nformat ascii 1.0\nelement vertex 2\nproperty double x\nend_header\n1\n";
        assert!(Ply::from_ply_text(truncated).is_err());

        let mut mesh = Ply::new();
        assert!(mesh.add_face([0]).is_err());
    }

    #[test]
    fn test_obj_parse_forms() {
        let text = "# cube corner\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\ng part\nf 1/1/1 2//1 -1\n";
        let mesh = ObjMesh::from_obj_text(text).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces[0][0], ObjFaceVertex { vertex: 0, texcoord: Some(0), normal: Some(0) });
        assert_eq!(mesh.faces[0][1], ObjFaceVertex { vertex: 1, texcoord: None, normal: Some(0) });
        assert_eq!(mesh.faces[0][2], ObjFaceVertex::new(2));
        assert_eq!(ObjMesh::from_obj_text(&mesh.to_obj_text()).unwrap(), mesh);
    }

    #[test]
    fn test_obj_rejects_out_of_range() {
        let error = ObjMesh::from_obj_text("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert_eq!(error.offset, 8);
    }

    #[test]
    fn test_obj_merge() {
        let one = ObjMesh::from_obj_text("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let merged = ObjMesh::merge([&one, &one]);
        assert_eq!(merged.faces[1][0].vertex, 3);
    }
}
