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

//! Datatypes and the type registry.
//!
//! A [`Datatype`] is a registered class that describes, encodes, decodes and
//! coerces one category of [`Value`]. The built-in classes are:
//!
//! | typename | value | body |
//! |---|---|---|
//! | `scalar` | [`Scalar`] | one little-endian item |
//! | `1darray` | one dimensional [`NdArray`] | items back to back |
//! | `ndarray` | [`NdArray`] | items back to back, row-major |
//! | `map` | [`ValueMap`] | JSON object of base64 member bodies |
//! | `set` | `Vec<Value>` | JSON object keyed `"0"`, `"1"`, ... |
//! | `ply` | [`Ply`] | ASCII PLY document |
//! | `obj` | [`ObjMesh`] | OBJ document |
//!
//! plus the fixed scalar aliases (`int32`, `float64`, `unicode`, ...), each a
//! `scalar` with pinned properties.
//!
//! Classes are looked up through a [`TypeRegistry`]; [`TypeRegistry::global`]
//! holds the built-ins and is shared read-only by the whole process.

mod array;
mod container;
mod definition;
mod error;
mod fixed;
pub mod geometry;
mod mesh;
mod registry;
mod scalar;
mod traits;
pub mod units;
mod value;

pub use array::ArrayType;
pub use container::{MapType, SetType};
pub use definition::{Metadata, TypeDefinition};
pub use error::DatatypeError;
pub use fixed::{ScalarAlias, SCALAR_ALIASES};
pub use geometry::{Face, GeometryError, ObjFaceVertex, ObjMesh, Ply, Vertex};
pub use mesh::{ObjType, PlyType};
pub use registry::TypeRegistry;
pub use scalar::ScalarType;
pub use traits::Datatype;
pub use value::{ArrayData, Complex, Element, NdArray, Scalar, Subtype, Value, ValueMap};
