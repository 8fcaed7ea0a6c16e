//! Result types: per-file outcomes, downloads and the batch report.

use crate::error::{DocReaderError, FileError};
use crate::format::{file_stem, DocumentFormat};
use crate::metrics::ResultMetrics;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Outcome of one upload: the extracted text, or why there is none.
pub type FileOutcome = Result<ConversionResult, FileError>;

// ── Per-file result ──────────────────────────────────────────────────────

/// A successfully converted upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    /// Declared filename, as uploaded.
    pub source_name: String,
    pub format: DocumentFormat,
    pub source_size_bytes: u64,
    /// Engine output after post-processing. Downloads carry these exact bytes,
    /// and the converted size and reduction in `metrics` are measured on this
    /// cleaned text, not on the raw engine output.
    pub extracted_text: String,
    pub metrics: ResultMetrics,
}

impl ConversionResult {
    pub fn new(
        source_name: impl Into<String>,
        format: DocumentFormat,
        source_size_bytes: u64,
        extracted_text: String,
        words_per_minute: u32,
    ) -> Self {
        let metrics = ResultMetrics::compute(source_size_bytes, &extracted_text, words_per_minute);
        Self {
            source_name: source_name.into(),
            format,
            source_size_bytes,
            extracted_text,
            metrics,
        }
    }

    /// Byte length of the extracted text.
    pub fn converted_size_bytes(&self) -> u64 {
        self.extracted_text.len() as u64
    }

    /// Declared filename without its last extension.
    pub fn stem(&self) -> String {
        file_stem(&self.source_name)
    }

    pub fn download(&self, kind: DownloadKind) -> DownloadArtifact {
        DownloadArtifact {
            kind,
            file_name: format!("{}_converted.{}", self.stem(), kind.extension()),
            content_type: kind.content_type(),
            bytes: self.extracted_text.as_bytes().to_vec(),
        }
    }

    /// The `.md` and `.txt` artifacts, in that order.
    pub fn downloads(&self) -> [DownloadArtifact; 2] {
        DownloadKind::ALL.map(|kind| self.download(kind))
    }
}

// ── Downloads ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    Markdown,
    Text,
}

impl DownloadKind {
    pub const ALL: [DownloadKind; 2] = [DownloadKind::Markdown, DownloadKind::Text];

    pub fn extension(self) -> &'static str {
        match self {
            DownloadKind::Markdown => "md",
            DownloadKind::Text => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DownloadKind::Markdown => "text/markdown",
            DownloadKind::Text => "text/plain",
        }
    }

    /// Button caption on the results page.
    pub fn label(self) -> &'static str {
        match self {
            DownloadKind::Markdown => "Download Markdown (.md)",
            DownloadKind::Text => "Download Text (.txt)",
        }
    }
}

/// A file the user can save. Both kinds hold the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub kind: DownloadKind,
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// Inline `data:` URL for an `<a download>` link.
    pub fn data_url(&self) -> String {
        data_url(self.content_type, &self.bytes)
    }
}

/// `data:{content_type};charset=utf-8;base64,…`
pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};charset=utf-8;base64,{}", STANDARD.encode(bytes))
}

// ── Batch report ─────────────────────────────────────────────────────────

/// Every outcome of one request, in upload order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: String,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ConversionResult> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Build one zip holding `{stem}_converted.md` for every success.
    ///
    /// Repeated names get ` (2)`, ` (3)`… before the extension.
    pub fn export_zip(&self) -> Result<Vec<u8>, DocReaderError> {
        if self.success_count() == 0 {
            return Err(DocReaderError::NothingToExport { total: self.len() });
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut taken = HashSet::new();

        for result in self.successes() {
            let artifact = result.download(DownloadKind::Markdown);
            let name = unique_name(&mut taken, &artifact.file_name);
            writer
                .start_file(name, options)
                .map_err(|e| DocReaderError::ExportFailed {
                    detail: e.to_string(),
                })?;
            writer
                .write_all(&artifact.bytes)
                .map_err(|e| DocReaderError::ExportFailed {
                    detail: e.to_string(),
                })?;
        }

        let cursor = writer.finish().map_err(|e| DocReaderError::ExportFailed {
            detail: e.to_string(),
        })?;
        Ok(cursor.into_inner())
    }

    /// The JSON shape served by the API and printed by `convert --json`.
    pub fn view(&self) -> BatchReportView<'_> {
        BatchReportView {
            batch_id: &self.batch_id,
            total: self.len(),
            succeeded: self.success_count(),
            failed: self.len() - self.success_count(),
            files: self.outcomes.iter().map(FileView::from_outcome).collect(),
        }
    }
}

impl Serialize for BatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

/// `name`, or `name` with ` (n)` before the extension if already taken.
pub(crate) fn unique_name(taken: &mut HashSet<String>, name: &str) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (base, ext) = match name.rfind('.') {
        Some(i) => (&name[..i], &name[i..]),
        None => (name, ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{base} ({n}){ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

// ── JSON views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BatchReportView<'a> {
    pub batch_id: &'a str,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub files: Vec<FileView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FileView<'a> {
    pub source_name: &'a str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DocumentFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<&'a ResultMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<DownloadView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct DownloadView {
    pub kind: DownloadKind,
    pub file_name: String,
    pub content_type: &'static str,
    pub size_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorView<'a> {
    pub message: String,
    pub detail: &'a FileError,
}

impl<'a> FileView<'a> {
    fn from_outcome(outcome: &'a FileOutcome) -> Self {
        match outcome {
            Ok(result) => FileView {
                source_name: &result.source_name,
                status: "ok",
                format: Some(result.format),
                extracted_text: Some(&result.extracted_text),
                metrics: Some(&result.metrics),
                downloads: result
                    .downloads()
                    .into_iter()
                    .map(|a| DownloadView {
                        kind: a.kind,
                        size_bytes: a.bytes.len(),
                        file_name: a.file_name,
                        content_type: a.content_type,
                    })
                    .collect(),
                error: None,
            },
            Err(error) => FileView {
                source_name: error.file(),
                status: "error",
                format: None,
                extracted_text: None,
                metrics: None,
                downloads: Vec::new(),
                error: Some(ErrorView {
                    message: error.user_message(),
                    detail: error,
                }),
            },
        }
    }
}
