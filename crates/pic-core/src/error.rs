//! Error types for pic repositories, connectors and the ingestion pipeline.
//!
//! Errors carry the context a caller needs to act on them (filenames,
//! URLs, tool output) rather than generic messages.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pic operations.
#[derive(Error, Debug)]
pub enum PicError {
    /// URL scheme has no connector implementation
    #[error("no connector for URL scheme '{0}'")]
    UrlNotSupported(String),

    /// The URL parser rejected the input
    #[error("invalid URL '{input}': {reason}")]
    InvalidUri { input: String, reason: String },

    /// Operation requires a connected connector
    #[error("connector for '{0}' is not connected")]
    NotConnected(String),

    /// `connect` called on an already-connected connector
    #[error("connector for '{0}' is already connected")]
    AlreadyConnected(String),

    /// Transport setup failed
    #[error("cannot connect to '{url}': {reason}")]
    ConnectionError { url: String, reason: String },

    /// Base or control directory missing on load
    #[error("no repository found at '{0}'")]
    RepoNotFound(String),

    /// The serialized index cannot be read
    #[error("cannot parse index '{path}': {reason}")]
    IndexParse { path: PathBuf, reason: String },

    /// `add` with a filename already present in the index
    #[error("picture '{0}' is already indexed")]
    PictureAlreadyIndexed(String),

    /// `remove`/`replace` on a filename absent from the index
    #[error("picture '{0}' is not indexed")]
    PictureNotIndexed(String),

    /// A processing step returned failure
    #[error("worker '{worker}' failed on '{filename}': {reason}")]
    WorkerFailed {
        worker: String,
        filename: String,
        reason: String,
    },

    /// A filename with a directory component was handed to a Picture
    #[error("'{0}' is not a bare filename")]
    InvalidFilename(String),

    /// Unknown worker kind named in a recipe
    #[error("unknown worker kind '{0}' in recipe")]
    UnknownWorkerKind(String),

    /// Configuration read/parse failure
    #[error("configuration error: {0}")]
    Config(String),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors (index file)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for pic results.
pub type Result<T> = std::result::Result<T, PicError>;
