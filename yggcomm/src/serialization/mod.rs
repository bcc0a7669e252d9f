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

//! Message codec and file-format serializers.
//!
//! # Overview
//!
//! - **[`Codec`]**: turns [`Value`](crate::datatypes::Value)s into wire
//!   messages (`<JSON header>:YGG_TAG:<body>`) and back, optionally bound to
//!   one [`TypeDefinition`](crate::datatypes::TypeDefinition).
//! - **[`FormatSerializer`] trait**: one implementation per on-disk format,
//!   used by [`FileComm`](crate::comm::FileComm).
//! - **[`framing`] module**: length-prefixed record frames.
//! - **[`CFormat`]**: printf/scanf row formats for ASCII tables.
//!
//! # Formats
//!
//! | serializer | file contents | appending |
//! |---|---|---|
//! | [`DefaultSerializer`] | one codec message | plain |
//! | [`DirectSerializer`] | raw bytes | plain |
//! | [`AsciiTableSerializer`] | header comments and formatted rows | plain, one row per line |
//! | [`PandasSerializer`] | header row and delimited cells | merges frames |
//! | [`PlySerializer`] | ASCII PLY document | merges meshes |
//! | [`ObjSerializer`] | OBJ document | merges meshes |
//! | [`PickleSerializer`] | framed codec messages | plain, one record per frame |

mod ascii_table;
mod codec;
mod default;
mod error;
mod format_str;
pub mod framing;
mod obj;
mod pandas;
mod pickle;
mod ply;
mod traits;

pub use ascii_table::AsciiTableSerializer;
pub use codec::{split_message, Codec, MESSAGE_SEPARATOR};
pub use default::{DefaultSerializer, DirectSerializer};
pub use error::CodecError;
pub use format_str::{cformat2nptype, nptype2cformat, CFormat, ColumnType, Directive, Field, Flags, Length};
pub use obj::ObjSerializer;
pub use pandas::PandasSerializer;
pub use pickle::PickleSerializer;
pub use ply::PlySerializer;
pub use traits::{FormatSerializer, ReadMode};
