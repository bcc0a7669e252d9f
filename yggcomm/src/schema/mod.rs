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

//! Metadata schema validation.
//!
//! Every datatype declares two schemas:
//!
//! - a **definition schema**, which a [`TypeDefinition`] declared by a channel
//!   endpoint must satisfy. Its required properties are the class's
//!   definition properties plus `typename`.
//! - a **metadata schema**, which the header stamped on every encoded message
//!   must satisfy. Its required properties are a superset carrying runtime
//!   facts such as an array's observed `length`.
//!
//! [`check_encoded`] combines both to decide whether a producer's message can
//! be delivered to a consumer expecting a given definition. Compatibility is
//! per property: exact equality by default, `precision` may widen, `units`
//! must be dimensionally convertible.
//!
//! The rules reproduced here are the subset of JSON-schema the type system
//! needs; no general JSON-schema engine is involved. [`Schema::to_json`]
//! renders them as a JSON-schema document for external tools.
//!
//! [`TypeDefinition`]: crate::datatypes::TypeDefinition

mod compat;
mod error;
mod rules;

pub use compat::{check_encoded, default_compatible, validate_definition, validate_metadata};
pub(crate) use compat::json_equivalent;
pub use error::SchemaValidationError;
pub use rules::{JsonKind, PropertyRule, Schema};
