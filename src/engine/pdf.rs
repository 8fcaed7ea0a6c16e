//! PDF text-layer extraction via pdf-extract.
//!
//! Scanned PDFs without a text layer come back as an empty string, which is a
//! successful (empty) conversion, not an error.
//!
//! pdf-extract can panic on some malformed inputs instead of returning an
//! error. The caller runs engines on the blocking pool and turns a panic into
//! a per-file conversion failure, so nothing is caught here.

use super::EngineError;

pub(crate) fn extract_pdf(bytes: &[u8]) -> Result<String, EngineError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| EngineError::Pdf(e.to_string()))
}
