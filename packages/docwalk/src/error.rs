//! Error types for docwalk.
//!
//! Cancellation and missing attributes are not errors: a cancelled run ends
//! with [`Outcome::Cancelled`](crate::parser::Outcome) and attribute reads
//! return empty sentinels. Everything here is a real failure of one run.

use thiserror::Error;

/// Main error type for the docwalk library.
#[derive(Debug, Error)]
pub enum DocwalkError {
    /// No registered decoder matches the document name.
    #[error("Format not supported: '{name}'. Available formats: {}", .available.join(", "))]
    FormatNotSupported {
        name: String,
        available: Vec<String>,
    },

    /// Document is malformed or unreadable for its decoder.
    #[error("Failed to decode {format} document: {message}")]
    DecodeFailure { format: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Archive could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Plugin manifest is invalid.
    #[error("Invalid plugin manifest {path}: {message}")]
    PluginManifest { path: String, message: String },

    /// Invalid date bound.
    #[error("Invalid date format: '{0}'. Expected YYYY-MM-DD (e.g., 2025-01-01)")]
    InvalidDate(String),

    /// Invalid filter pattern.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A chain was asked to run without an input.
    #[error("Parsing chain has no input bound")]
    ChainUnbound,

    /// Two pipeline fragments cannot be joined.
    #[error("Cannot connect pipeline fragments: {0}")]
    InvalidConnection(String),

    /// Writing output through an exporter failed.
    #[error("Export failed ({writer}): {source}")]
    Export {
        writer: String,
        #[source]
        source: std::io::Error,
    },
}

impl DocwalkError {
    /// Build a decode failure for a format.
    pub fn decode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            format: format.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for docwalk operations.
pub type Result<T> = std::result::Result<T, DocwalkError>;
