//! Exporter configuration

use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Where and how schema documents are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Directory receiving the documents
    pub output_dir: PathBuf,
    /// Spaces per indentation level
    pub indent_width: usize,
    /// Appended to the type name to form the file name
    pub file_suffix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            indent_width: 4,
            file_suffix: "_schema.json".to_string(),
        }
    }
}

impl ExportConfig {
    /// Default configuration writing into `output_dir`.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indent_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "indent_width".to_string(),
                value: self.indent_width.to_string(),
                reason: "indent_width must be greater than 0".to_string(),
            });
        }

        if self.file_suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "file_suffix".to_string(),
                value: String::new(),
                reason: "file_suffix must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Output path for the document of `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", name, self.file_suffix))
    }
}
