//! Error types for the bbx library.

use thiserror::Error;

/// Result type for bbx operations.
pub type Result<T> = std::result::Result<T, BbxError>;

/// Error types that can occur while building or transforming box collections.
#[derive(Error, Debug)]
pub enum BbxError {
    /// Coordinate or field data has the wrong dimensionality or length.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A requested field is not present on the collection.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field already exists and overwriting was not allowed.
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// Unrecognized aspect-ratio or reduction policy.
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Index used for slicing is past the end of the collection.
    #[error("Index {index} out of range for {len} boxes")]
    IndexOutOfRange { index: usize, len: usize },

    /// Invalid suppression threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
