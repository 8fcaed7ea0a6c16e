//! Conversion engines: the capability that turns a staged document into text.
//!
//! The rest of the crate only ever talks to [`ConversionEngine`]. It has one
//! operation, takes a file-system path plus a format hint, and either returns
//! the extracted text or a single [`EngineError`]. Nothing partial comes back:
//! a document converts completely or not at all.
//!
//! Two engines ship with the crate:
//!
//! | Engine | Selected by | How it converts |
//! |--------|-------------|-----------------|
//! | [`BuiltinEngine`] | `EngineChoice::Builtin` (default) | in-process: zip + quick-xml for OOXML, calamine for spreadsheets, pdf-extract, html2md |
//! | [`CommandEngine`] | `EngineChoice::Command` | runs an external program such as `markitdown {path}` and reads its stdout |
//!
//! Engines are built once by [`build_engine`] and shared by handle
//! (`Arc<dyn ConversionEngine>`) between every request.

mod builtin;
mod command;
mod html;
mod ooxml;
mod pdf;
mod spreadsheet;
mod table;

pub use builtin::BuiltinEngine;
pub use command::CommandEngine;

use crate::config::{EngineChoice, ReaderConfig};
use crate::error::DocReaderError;
use crate::format::DocumentFormat;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A component that extracts text from a document on disk.
///
/// Implementations are called from tokio's blocking pool and may block for as
/// long as they need; the caller bounds the call with a timeout. They must be
/// `Send + Sync` because one instance serves every request.
pub trait ConversionEngine: Send + Sync {
    /// Short name used in logs and the health endpoint.
    fn name(&self) -> &str;

    /// Extract the text of the document at `path`.
    ///
    /// `format` is derived from the declared filename; the staged file keeps
    /// the same extension, so engines that sniff the path agree with it.
    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, EngineError>;
}

/// Errors raised inside a conversion engine.
///
/// Folded into [`crate::error::FileError::Conversion`] at the per-file
/// boundary, so the variants only need to read well in a log line.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The file is not a readable zip container (docx/xlsx/pptx/zip).
    #[error("not a valid {format} container: {detail}")]
    Archive {
        format: DocumentFormat,
        detail: String,
    },

    /// A required part is missing from an OOXML package.
    #[error("missing part '{part}'")]
    MissingPart { part: String },

    /// An XML part could not be parsed.
    #[error("malformed XML in '{part}': {detail}")]
    Xml { part: String, detail: String },

    /// calamine rejected the workbook.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// pdf-extract rejected the document. Its message already starts with
    /// `PDF error:`.
    #[error("{0}")]
    Pdf(String),

    /// A zip member decompresses past the configured limit.
    #[error("archive member '{member}' exceeds {limit} bytes")]
    EntryTooLarge { member: String, limit: u64 },

    /// An archive's members, nested archives included, decompress past the
    /// total budget.
    #[error("archive decompresses past {limit} bytes in total")]
    ArchiveTooLarge { limit: u64 },

    /// A zip member failed to convert.
    #[error("archive member '{member}': {source}")]
    Member {
        member: String,
        #[source]
        source: Box<EngineError>,
    },

    /// An external engine exited unsuccessfully or could not be run.
    #[error("external command failed: {0}")]
    Command(String),

    /// The engine does not handle this format.
    #[error("{engine} does not support {format} documents")]
    Unsupported {
        engine: String,
        format: DocumentFormat,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Construct the engine selected by `config`.
pub fn build_engine(config: &ReaderConfig) -> Result<Arc<dyn ConversionEngine>, DocReaderError> {
    match &config.engine {
        EngineChoice::Builtin => Ok(Arc::new(BuiltinEngine::new(
            config.zip_max_depth,
            config.zip_max_entry_bytes,
        ))),
        EngineChoice::Command { program, args } => {
            if program.trim().is_empty() {
                return Err(DocReaderError::EngineUnavailable {
                    engine: "command".to_string(),
                    detail: "no program configured".to_string(),
                });
            }
            Ok(Arc::new(CommandEngine::new(
                program.clone(),
                args.clone(),
                Duration::from_secs(config.conversion_timeout_secs),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_builtin_by_default() {
        let engine = build_engine(&ReaderConfig::default()).unwrap();
        assert_eq!(engine.name(), "builtin");
    }

    #[test]
    fn command_engine_needs_a_program() {
        let config = ReaderConfig {
            engine: EngineChoice::Command {
                program: "  ".into(),
                args: vec![],
            },
            ..ReaderConfig::default()
        };
        assert!(matches!(
            build_engine(&config),
            Err(DocReaderError::EngineUnavailable { .. })
        ));
    }

    #[test]
    fn member_error_display_names_member() {
        let e = EngineError::Member {
            member: "docs/a.pdf".into(),
            source: Box::new(EngineError::Pdf("bad xref".into())),
        };
        let msg = e.to_string();
        assert!(msg.contains("docs/a.pdf"), "got: {msg}");
        assert!(msg.contains("bad xref"), "got: {msg}");
    }
}
