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

//! Schema validation error type.

use thiserror::Error;

/// A type definition or metadata header violated a structural rule.
///
/// Only the first violated constraint is reported. The `path` names the
/// offending property using dotted notation (`contents.x.precision`), or is
/// empty when the document as a whole is at fault.
///
/// # Examples
///
/// ```rust
/// use yggcomm::schema::SchemaValidationError;
///
/// let error = SchemaValidationError::new("precision", "expected one of [8, 16, 32, 64]");
/// assert_eq!(error.path(), "precision");
/// assert!(error.to_string().contains("precision"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema validation failed at '{path}': {message}")]
pub struct SchemaValidationError {
    path: String,
    message: String,
}

impl SchemaValidationError {
    /// Creates a new validation error for the property at `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error for a missing required property.
    pub fn missing(property: &str) -> Self {
        Self::new(property, "missing required property")
    }

    /// Returns the dotted path of the offending property.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a description of the violated constraint.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefixes the path with a parent property name.
    ///
    /// Used when validating nested definitions so that the reported path
    /// points from the outermost document to the failing leaf.
    #[must_use]
    pub fn nested(self, parent: &str) -> Self {
        let path = if self.path.is_empty() {
            parent.to_string()
        } else {
            format!("{}.{}", parent, self.path)
        };
        Self {
            path,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_property() {
        let error = SchemaValidationError::missing("subtype");
        assert_eq!(error.path(), "subtype");
        assert_eq!(error.message(), "missing required property");
    }

    #[test]
    fn test_nested_path() {
        let error = SchemaValidationError::new("precision", "too small")
            .nested("x")
            .nested("contents");
        assert_eq!(error.path(), "contents.x.precision");
    }

    #[test]
    fn test_nested_empty_path() {
        let error = SchemaValidationError::new("", "not an object").nested("contents");
        assert_eq!(error.path(), "contents");
    }
}
