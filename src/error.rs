//! Error types for the docreader library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`DocReaderError`]: **Fatal.** Nothing can be converted at all (bad
//!   configuration, unusable staging directory, CLI input not found).
//!   Returned as `Err(DocReaderError)` from constructors and CLI helpers.
//!
//! * [`FileError`]: **Non-fatal.** One uploaded file could not be turned
//!   into text. Stored in the batch report next to the successful results so
//!   the rest of the batch is unaffected. Every variant names the file.
//!
//! * [`crate::engine::EngineError`]: raised inside a conversion engine and
//!   folded into [`FileError::Conversion`] at the per-file boundary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docreader library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::BatchReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DocReaderError {
    // ── Input errors (CLI) ────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Staging errors ────────────────────────────────────────────────────
    /// The staging root cannot be created or written to.
    #[error("Staging directory '{path}' is unusable: {source}")]
    StagingUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The configured conversion engine cannot be constructed.
    #[error("Conversion engine '{engine}' is not available: {detail}")]
    EngineUnavailable { engine: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The batch had no successful conversion to export.
    #[error("Nothing to export: none of the {total} files converted successfully")]
    NothingToExport { total: usize },

    /// Building the combined zip archive failed.
    #[error("Failed to build export archive: {detail}")]
    ExportFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single uploaded file.
///
/// Every variant carries the declared filename so the user-visible warning
/// can name the offending upload. The batch continues with the next file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileError {
    /// The filename extension is not one the engine accepts.
    #[error("{file}: unsupported file type '{extension}'")]
    UnsupportedFormat { file: String, extension: String },

    /// The upload exceeds the configured per-file size limit.
    #[error("{file}: {size} bytes exceeds the {limit}-byte upload limit")]
    TooLarge { file: String, size: u64, limit: u64 },

    /// The blob could not be written to temporary storage.
    #[error("{file}: could not stage upload: {detail}")]
    Staging { file: String, detail: String },

    /// The engine failed to extract text.
    #[error("{file}: conversion failed: {detail}")]
    Conversion { file: String, detail: String },

    /// The conversion did not finish within the configured timeout.
    #[error("{file}: conversion timed out after {secs}s")]
    Timeout { file: String, secs: u64 },
}

impl FileError {
    /// The declared filename of the upload that failed.
    pub fn file(&self) -> &str {
        match self {
            FileError::UnsupportedFormat { file, .. }
            | FileError::TooLarge { file, .. }
            | FileError::Staging { file, .. }
            | FileError::Conversion { file, .. }
            | FileError::Timeout { file, .. } => file,
        }
    }

    /// Warning shown to the user in place of the extracted content.
    pub fn user_message(&self) -> String {
        match self {
            FileError::UnsupportedFormat { file, extension } => format!(
                "Could not read {file}. Files of type '{extension}' are not supported."
            ),
            FileError::TooLarge { file, limit, .. } => format!(
                "Could not read {file}. The file is larger than the {limit}-byte limit."
            ),
            FileError::Timeout { file, secs } => {
                format!("Could not read {file}. Conversion took longer than {secs}s.")
            }
            FileError::Staging { file, .. } | FileError::Conversion { file, .. } => {
                format!("Could not read {file}. Please check the format.")
            }
        }
    }
}
