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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # yggcomm - typed messages for coupled simulation models
//!
//! yggcomm moves typed data between independently written models:
//!
//! - **Type registry**: datatypes (scalars, arrays, maps, sets, PLY and OBJ
//!   meshes) with a canonical byte encoding each
//! - **Metadata schemas**: structural validation of type definitions and
//!   message headers, plus the compatibility check between them
//! - **Message codec**: JSON header, `:YGG_TAG:` separator, raw body
//! - **Format serializers**: ASCII tables driven by C format strings, PLY,
//!   OBJ, delimited tables with a header row and framed records
//! - **File channels**: single files or numbered series, append-merge for
//!   single-document formats, dedicated adapters for sequence, alignment
//!   and image files
//!
//! ## Architecture
//!
//! - **[`schema`]**: definition and header validation
//! - **[`datatypes`]**: values, datatypes and the registry
//! - **[`serialization`]**: the codec and the per-format serializers
//! - **[`comm`]**: file channels
//! - **[`observability`]**: channel counters and error logging
//!
//! ## Quick Start
//!
//! ```rust
//! use yggcomm::datatypes::{NdArray, TypeRegistry, Value, ValueMap};
//! use yggcomm::serialization::Codec;
//!
//! let codec = Codec::new(TypeRegistry::global());
//! let value = Value::from(
//!     ValueMap::new()
//!         .with("time", 0.5)
//!         .with("positions", NdArray::from_data(vec![1.0, 2.0, 3.0])),
//! );
//!
//! let message = codec.serialize(&value).unwrap();
//! let (decoded, header) = codec.deserialize(&message).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(header.typename(), Some("map"));
//! ```

pub mod comm;
pub mod datatypes;
pub mod error;
pub mod observability;
pub mod schema;
pub mod serialization;

pub use comm::{CommError, Direction, FileComm, FileCommConfig, FileFormat, EOF_SENTINEL};
pub use datatypes::{Datatype, DatatypeError, TypeDefinition, TypeRegistry, Value};
pub use error::YggError;
pub use observability::{log_error, CommMetrics, ErrorMetrics};
pub use schema::SchemaValidationError;
pub use serialization::{Codec, CodecError, FormatSerializer};
