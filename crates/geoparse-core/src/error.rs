//! Custom error types for `GeoParse` operations.
//!
//! This module provides structured error handling using `thiserror`. Every
//! failure raised while converting records carries enough context (option
//! name, record index, field name) to point the caller at the offending input.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for `GeoParse` operations.
///
/// This is the root error type that encompasses all domain-specific errors.
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum GeoParseError {
    /// Invalid or insufficient settings
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A record's geometry field could not be decoded
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// I/O errors while reading records or writing documents
    #[error(transparent)]
    Io(#[from] IoError),

    /// The document could not be expressed with the `geojson` crate types
    #[error("Document is not valid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Configuration errors.
///
/// These are raised while resolving settings, before any feature is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `crs` member has the wrong shape
    #[error("Invalid CRS. {message}")]
    InvalidCrs {
        /// What is wrong with the CRS object
        message: String,
    },

    /// No geometry mapping was configured
    #[error("No geometry attributes specified")]
    NoGeometryAttributes,

    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },
}

/// Per-record geometry errors.
///
/// Any of these aborts the whole batch.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The field holds text that is not JSON
    #[error("Failed to parse geometry field '{field}' of record {record}: {source}")]
    Parse {
        /// Zero-based index of the record in the input
        record: usize,
        /// The geometry source field
        field: String,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The field holds a value that cannot carry coordinates
    #[error("Geometry field '{field}' of record {record} holds {found}, expected JSON-encoded coordinates")]
    UnexpectedValue {
        /// Zero-based index of the record in the input
        record: usize,
        /// The geometry source field
        field: String,
        /// Kind of value found
        found: String,
    },
}

/// I/O related errors.
///
/// These errors occur while reading record files or writing the output
/// document.
#[derive(Debug, Error)]
pub enum IoError {
    /// Failed to read from a file
    #[error("Failed to read {format} file '{path}': {source}")]
    Read {
        /// The format being read (e.g., "CSV", "JSON")
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write to a file
    #[error("Failed to write {format} file '{path}': {source}")]
    Write {
        /// The format being written
        format: String,
        /// The file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File was not found
    #[error("File not found: '{path}'")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
    },

    /// The record format is not known
    #[error("Record format '{name}' not found. Available formats: {available}")]
    UnsupportedFormat {
        /// The requested format name
        name: String,
        /// Comma-separated list of available formats
        available: String,
    },

    /// The file parsed but does not contain records
    #[error("{format} file '{path}' does not contain records: {message}")]
    NotRecords {
        /// The format being read
        format: String,
        /// The file path
        path: PathBuf,
        /// What was found instead
        message: String,
    },
}

/// Type alias for Results using `GeoParseError`.
pub type Result<T> = std::result::Result<T, GeoParseError>;

impl GeoParseError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Geometry(e) => e.user_message(),
            Self::Io(e) => e.user_message(),
            Self::GeoJson(e) => format!("GeoJSON error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.recovery_suggestion(),
            Self::Geometry(_) => Some(
                "Geometry fields must hold JSON coordinate arrays, e.g. \"[[1,2],[3,4]]\"."
                    .to_string(),
            ),
            Self::Io(e) => e.recovery_suggestion(),
            Self::GeoJson(_) => {
                Some("Check that every geometry has numeric coordinates.".to_string())
            },
        }
    }

    /// Check if this error is potentially recoverable.
    ///
    /// Configuration errors are fixed by the caller and the call retried;
    /// per-record errors need the input data to change.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl ConfigError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidCrs { .. } => Some(
                "Use {\"type\": \"name\", \"properties\": {\"name\": ...}} or \
                 {\"type\": \"link\", \"properties\": {\"href\": ..., \"type\": ...}}."
                    .to_string(),
            ),
            Self::NoGeometryAttributes => Some(
                "Map at least one geometry type, e.g. {\"Point\": [\"lat\", \"lng\"]}.".to_string(),
            ),
            Self::InvalidOption { .. } => None,
        }
    }
}

impl GeometryError {
    fn user_message(&self) -> String {
        match self {
            Self::Parse { record, field, .. } | Self::UnexpectedValue { record, field, .. } => {
                format!("Record {record} has an unreadable geometry in field '{field}': {self}")
            },
        }
    }
}

impl IoError {
    fn user_message(&self) -> String {
        match self {
            Self::Read { format, path, .. } => {
                format!("Failed to read {} file: {}", format, path.display())
            },
            Self::Write { format, path, .. } => {
                format!("Failed to write {} file: {}", format, path.display())
            },
            Self::FileNotFound { path } => {
                format!("File not found: {}", path.display())
            },
            Self::UnsupportedFormat { name, available } => {
                format!(
                    "Record format '{name}' not found.\n\nAvailable formats:\n{}",
                    available
                        .split(", ")
                        .map(|d| format!("  - {d}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                )
            },
            Self::NotRecords { .. } => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Check that the file path is correct and the file exists.".to_string())
            },
            Self::UnsupportedFormat { .. } => {
                Some("Run 'geoparse formats' to see all record formats.".to_string())
            },
            Self::NotRecords { .. } => {
                Some("Records must be JSON objects, one per array element or line.".to_string())
            },
            _ => None,
        }
    }
}

/// Extension trait for adding I/O context to errors.
///
/// This trait provides convenient methods to wrap errors with file and format
/// context, creating more informative error messages.
pub trait IoErrorExt<T> {
    /// Add read context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Read`] if the underlying operation fails.
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;

    /// Add write context to an error.
    ///
    /// # Errors
    ///
    /// Returns an [`IoError::Write`] if the underlying operation fails.
    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T, E> IoErrorExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_read_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            GeoParseError::Io(IoError::Read {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }

    fn with_write_context(self, format: &str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            GeoParseError::Io(IoError::Write {
                format: format.to_string(),
                path: path.into(),
                source: Box::new(e),
            })
        })
    }
}

/// Helper to create `IoError::UnsupportedFormat` listing the known formats.
#[must_use]
pub fn format_not_found(name: &str) -> IoError {
    use crate::io::get_format_names;

    IoError::UnsupportedFormat {
        name: name.to_string(),
        available: get_format_names().join(", "),
    }
}
