//! Application-wide error types.
//!
//! Library modules return [`Result`] with the [`Error`] enum below, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - One variant per failure kind the sorting engine distinguishes
//!   (decode, split export, rename, tag)
//! - Every error is caught at the file level by the sorter and turned into a
//!   per-file outcome; none of them abort a traversal
//!
//! # Example
//!
//! ```ignore
//! use camelot_sort::error::{Error, Result};
//!
//! fn process_file(path: &Path) -> Result<()> {
//!     let duration = codec::probe_duration(path, hint)?; // Decode errors propagate
//!     std::fs::remove_file(path)?;                       // IO errors auto-convert
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File unreadable or unsupported by the audio codec
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// A segment of a long recording failed to export
    #[error("Failed to export part {part} of {path}: {message}")]
    SplitExport {
        path: PathBuf,
        part: usize,
        message: String,
    },

    /// Filesystem rename failed (permissions, cross-device, ...)
    #[error("Failed to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata reading/writing error
    #[error("Tag error for {path}: {message}")]
    Tag { path: PathBuf, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File or directory not found
    #[error("Not found: {0}")]
    NotFound(PathBuf),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a decode error.
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a split export error for the 1-indexed `part`.
    pub fn split_export(path: impl Into<PathBuf>, part: usize, message: impl ToString) -> Self {
        Self::SplitExport {
            path: path.into(),
            part,
            message: message.to_string(),
        }
    }

    /// Create a tag error.
    pub fn tag(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Tag {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Short machine-friendly name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Decode { .. } => "decode",
            Error::SplitExport { .. } => "split_export",
            Error::Rename { .. } => "rename",
            Error::Tag { .. } => "tag",
            Error::Config(_) => "config",
            Error::NotFound(_) => "not_found",
            Error::WithContext { source, .. } => source.kind(),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
