//! Document formats accepted by the reader and their filename-based detection.
//!
//! Format is inferred from the declared filename's extension, never from the
//! bytes: the upload control only offers the extensions below, and a path-based
//! engine such as `markitdown` infers the format the same way. The staging
//! step keeps the extension on the temporary file so both agree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A document format the conversion engines understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Xlsx,
    Pptx,
    Pdf,
    Html,
    Zip,
}

impl DocumentFormat {
    /// Every accepted format, in the order shown by the upload control.
    pub const ALL: [DocumentFormat; 6] = [
        DocumentFormat::Docx,
        DocumentFormat::Xlsx,
        DocumentFormat::Pptx,
        DocumentFormat::Pdf,
        DocumentFormat::Html,
        DocumentFormat::Zip,
    ];

    /// Parse a bare extension (no dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "xlsx" => Some(DocumentFormat::Xlsx),
            "pptx" => Some(DocumentFormat::Pptx),
            "pdf" => Some(DocumentFormat::Pdf),
            "html" | "htm" => Some(DocumentFormat::Html),
            "zip" => Some(DocumentFormat::Zip),
            _ => None,
        }
    }

    /// Detect the format of a declared filename.
    pub fn from_filename(name: &str) -> Option<Self> {
        extension_of(name).and_then(Self::from_extension)
    }

    /// Canonical extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Pptx => "pptx",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Html => "html",
            DocumentFormat::Zip => "zip",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            DocumentFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Html => "text/html",
            DocumentFormat::Zip => "application/zip",
        }
    }

    /// Value for an HTML `<input type="file" accept="…">` attribute.
    pub fn accept_attribute() -> String {
        Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extension of a declared filename, if any.
///
/// Only the final path component is considered, so `../x.pdf` and
/// `C:\docs\x.pdf` both yield `pdf`.
pub fn extension_of(name: &str) -> Option<&str> {
    let base = base_name(name);
    Path::new(base)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Declared filename without its last extension (`report.final.pdf` → `report.final`).
///
/// Falls back to `"document"` when nothing usable remains.
pub fn file_stem(name: &str) -> String {
    let base = base_name(name);
    match Path::new(base).file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "document".to_string(),
    }
}

/// Last component of a filename that may use either separator.
fn base_name(name: &str) -> &str {
    name.rsplit(&['/', '\\'][..]).next().unwrap_or(name)
}
