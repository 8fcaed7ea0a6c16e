//! HTML to Markdown via html2md.

/// Convert an HTML page to Markdown.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected; html2md
/// itself never fails.
pub(crate) fn extract_html(bytes: &[u8]) -> String {
    let html = String::from_utf8_lossy(bytes);
    html2md::parse_html(&html)
}
