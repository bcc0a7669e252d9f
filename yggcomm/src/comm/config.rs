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

//! File channel configuration.

use crate::datatypes::TypeDefinition;
use crate::serialization::ReadMode;
use serde::{Deserialize, Serialize};

/// The on-disk format a file channel reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Codec messages, one per file or per series member.
    #[default]
    Default,
    /// Raw bytes with no header.
    Direct,
    /// Delimited text rows described by a C format string.
    Table,
    /// Stanford PLY meshes, merged on append.
    Ply,
    /// Wavefront OBJ meshes, merged on append.
    Obj,
    /// Delimited text with a column header row, merged on append.
    Pandas,
    /// Length-prefixed codec messages.
    Pickle,
    /// FASTA sequence records.
    Fasta,
    /// FASTQ sequence records.
    Fastq,
    /// SAM alignment records.
    Sam,
    /// Netpbm (PGM/PPM) images.
    Netpbm,
}

impl FileFormat {
    /// Returns the string name of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Direct => "direct",
            Self::Table => "table",
            Self::Ply => "ply",
            Self::Obj => "obj",
            Self::Pandas => "pandas",
            Self::Pickle => "pickle",
            Self::Fasta => "fasta",
            Self::Fastq => "fastq",
            Self::Sam => "sam",
            Self::Netpbm => "netpbm",
        }
    }

    /// Returns `true` for formats handled by a dedicated adapter.
    pub fn is_dedicated(&self) -> bool {
        matches!(self, Self::Fasta | Self::Fastq | Self::Sam | Self::Netpbm)
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration for a [`FileComm`](crate::comm::FileComm).
///
/// The driver layer usually hands this over from YAML or JSON; missing
/// fields take their defaults.
///
/// # Examples
///
/// ```rust
/// use yggcomm::comm::{FileCommConfig, FileFormat};
///
/// let config = FileCommConfig::new(FileFormat::Table)
///     .with_append(true)
///     .with_format_str("%5s\t%ld\t%f\n")
///     .with_column_names(["name", "count", "size"]);
/// assert!(config.append);
/// assert_eq!(config.column_names.len(), 3);
///
/// let parsed: FileCommConfig = serde_json::from_str(r#"{"format": "ply", "append": true}"#).unwrap();
/// assert_eq!(parsed.format, FileFormat::Ply);
/// assert_eq!(parsed.comment, "# ");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCommConfig {
    /// On-disk format
    pub format: FileFormat,
    /// Keep existing content when opening for send
    pub append: bool,
    /// Treat the address as a `%d` template
    pub is_series: bool,
    /// First series index
    pub series_start: u64,
    /// Last series index, inclusive
    pub series_end: Option<u64>,
    /// Overrides how receives carve the file
    pub read_mode: Option<ReadMode>,
    /// Comment marker for text tables
    pub comment: String,
    /// Row terminator for text formats
    pub newline: String,
    /// Delimiter between columns for text tables
    pub delimiter: String,
    /// Row layout for text tables
    pub format_str: Option<String>,
    /// Column names for text tables
    pub column_names: Vec<String>,
    /// Receive tables as columns instead of rows
    pub as_array: bool,
    /// Expected datatype of codec messages
    pub datatype: Option<TypeDefinition>,
}

impl Default for FileCommConfig {
    fn default() -> Self {
        Self {
            format: FileFormat::Default,
            append: false,
            is_series: false,
            series_start: 0,
            series_end: None,
            read_mode: None,
            comment: "# ".to_string(),
            newline: "\n".to_string(),
            delimiter: "\t".to_string(),
            format_str: None,
            column_names: Vec::new(),
            as_array: false,
            datatype: None,
        }
    }
}

impl FileCommConfig {
    /// Creates a configuration for `format` with every other field defaulted.
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Sets whether sends keep the existing file content.
    #[must_use]
    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Reads or writes a numbered series of files.
    #[must_use]
    pub fn with_series(mut self, start: u64, end: Option<u64>) -> Self {
        self.is_series = true;
        self.series_start = start;
        self.series_end = end;
        self
    }

    /// Overrides the format's own read mode.
    #[must_use]
    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = Some(read_mode);
        self
    }

    /// Sets the comment marker.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the row terminator.
    #[must_use]
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    /// Sets the column delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the row format string.
    #[must_use]
    pub fn with_format_str(mut self, format_str: impl Into<String>) -> Self {
        self.format_str = Some(format_str.into());
        self
    }

    /// Sets the column names.
    #[must_use]
    pub fn with_column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.column_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether tables are received as columns.
    #[must_use]
    pub fn with_as_array(mut self, as_array: bool) -> Self {
        self.as_array = as_array;
        self
    }

    /// Binds codec messages to a datatype.
    #[must_use]
    pub fn with_datatype(mut self, datatype: TypeDefinition) -> Self {
        self.datatype = Some(datatype);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let config = FileCommConfig::new(FileFormat::Pickle)
            .with_series(1, Some(4))
            .with_read_mode(ReadMode::Framed)
            .with_datatype(TypeDefinition::new("map"));
        let json = serde_json::to_string(&config).unwrap();
        let back: FileCommConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(json.contains(r#""read_mode":"framed""#));
    }

    #[test]
    fn test_dedicated_formats() {
        assert!(FileFormat::Sam.is_dedicated());
        assert!(!FileFormat::Pandas.is_dedicated());
        assert_eq!(FileFormat::Netpbm.to_string(), "netpbm");
    }
}
