//! Error types for the transpatch string patcher.
//!
//! Only conditions that abort an operation live here. Recoverable outcomes
//! (a translation that does not fit, a missing glyph table, an unknown
//! glyph codepage) are logged and reported through the patch reports instead.

use crate::core::address::Rva;
use thiserror::Error;

/// Main error type for transpatch operations.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The executable could not be parsed by the section reader
    #[error("Invalid executable format: {0}")]
    InvalidFormat(String),

    /// A section index requested by the configuration does not exist
    #[error("Section #{index} not found (image has {count} sections)")]
    SectionNotFound { index: usize, count: usize },

    /// No file offset maps to the given RVA
    #[error("No file offset for RVA {rva}")]
    AddressOutOfRange { rva: Rva },

    /// The encoding or codepage name could not be resolved
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Text contains characters the encoding cannot represent
    #[error("Cannot encode {text:?} with {encoding}")]
    UnencodableText { text: String, encoding: String },

    /// Malformed translation dictionary
    #[error("Dictionary error at line {line}: {message}")]
    Dictionary { line: u64, message: String },

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file exceeds the configured size limit
    #[error("File size of {found} bytes exceeds the maximum allowed size of {limit} bytes")]
    FileTooLarge { limit: u64, found: u64 },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for transpatch operations
pub type Result<T> = std::result::Result<T, PatchError>;

impl From<object::read::Error> for PatchError {
    fn from(err: object::read::Error) -> Self {
        PatchError::InvalidFormat(err.to_string())
    }
}

impl From<serde_json::Error> for PatchError {
    fn from(err: serde_json::Error) -> Self {
        PatchError::Config(err.to_string())
    }
}
