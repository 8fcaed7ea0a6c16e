//! HTML rendering for the upload page and the results page.
//!
//! Pages are assembled with `format!` and every user-controlled string
//! (filenames, extracted text, error messages) goes through [`escape_html`].

use crate::error::FileError;
use crate::format::DocumentFormat;
use crate::metrics::ResultMetrics;
use crate::output::{data_url, BatchReport, ConversionResult, DownloadKind};
use std::fmt::Write as _;

pub const TITLE: &str = "Universal Document Reader";
pub const UPLOAD_PROMPT: &str = "Drag and drop multiple files at once";
pub const FOOTER_CAPTION: &str = "Professional-grade document-to-text converter.";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { margin-bottom: 1.5rem; }
form.upload { border: 2px dashed #aaa; border-radius: 8px; padding: 1.5rem; }
details.file { border: 1px solid #ddd; border-radius: 8px; margin: 1rem 0; padding: 0.5rem 1rem; }
details.file summary { font-weight: 600; cursor: pointer; }
textarea { width: 100%; height: 300px; font-family: ui-monospace, monospace; }
table.sizes { border-collapse: collapse; margin: 0.75rem 0; }
table.sizes th, table.sizes td { border: 1px solid #ddd; padding: 0.25rem 0.75rem; text-align: right; }
.downloads a { display: inline-block; margin-right: 1rem; padding: 0.4rem 0.8rem; border: 1px solid #888; border-radius: 6px; text-decoration: none; color: inherit; }
.warning { background: #fff4e5; border-left: 4px solid #f0a020; padding: 0.75rem 1rem; }
.notice { color: #666; }
footer { margin-top: 2rem; color: #777; font-size: 0.9rem; }
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `GET /`: the upload form on its own.
pub fn render_upload_page() -> String {
    layout(&upload_form())
}

/// `POST /convert`: the upload form followed by one section per file.
pub fn render_results_page(report: &BatchReport) -> String {
    let mut body = upload_form();

    if report.is_empty() {
        body.push_str(r#"<p class="notice">No files were uploaded.</p>"#);
        return layout(&body);
    }

    if let Ok(zip) = report.export_zip() {
        let _ = write!(
            body,
            r#"<p class="downloads"><a href="{}" download="converted.zip">Download all (.zip)</a></p>"#,
            data_url("application/zip", &zip)
        );
    }

    for (idx, outcome) in report.outcomes.iter().enumerate() {
        match outcome {
            Ok(result) => body.push_str(&result_section(idx, result)),
            Err(error) => body.push_str(&error_section(error)),
        }
    }
    layout(&body)
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>📄 {title}</h1>
{body}
<hr>
<footer>{FOOTER_CAPTION}</footer>
</body>
</html>
"#,
        title = TITLE,
    )
}

fn upload_form() -> String {
    format!(
        r#"<form class="upload" action="/convert" method="post" enctype="multipart/form-data">
<label for="files">{UPLOAD_PROMPT}</label><br>
<input id="files" type="file" name="files" multiple accept="{accept}">
<button type="submit">Convert</button>
</form>
"#,
        accept = DocumentFormat::accept_attribute(),
    )
}

fn result_section(idx: usize, result: &ConversionResult) -> String {
    let name = escape_html(&result.source_name);
    let mut html = format!(
        r#"<details class="file" open>
<summary>👁️ Preview: {name}</summary>
<label for="text-{idx}">Extracted Content</label>
<textarea id="text-{idx}" readonly>{text}</textarea>
"#,
        text = escape_html(&result.extracted_text),
    );
    html.push_str(&metrics_table(&result.metrics));

    html.push_str(r#"<p class="downloads">"#);
    for kind in DownloadKind::ALL {
        let artifact = result.download(kind);
        let _ = write!(
            html,
            r#"<a href="{href}" download="{file}" type="{mime}">{label}</a>"#,
            href = artifact.data_url(),
            file = escape_html(&artifact.file_name),
            mime = artifact.content_type,
            label = kind.label(),
        );
    }
    html.push_str("</p>\n</details>\n");
    html
}

fn metrics_table(m: &ResultMetrics) -> String {
    format!(
        r#"<table class="sizes">
<tr><th>Original size</th><th>Converted size</th><th>Reduction</th></tr>
<tr><td>{:.2} MB</td><td>{:.2} MB</td><td>{}</td></tr>
</table>
<p class="reading-time">⏱️ Estimated reading time: {} min ({} words)</p>
"#,
        m.source_size_mb,
        m.converted_size_mb,
        m.reduction_label(),
        m.reading_time_minutes,
        m.word_count,
    )
}

fn error_section(error: &FileError) -> String {
    format!(
        r#"<details class="file" open>
<summary>👁️ Preview: {name}</summary>
<p class="warning">⚠️ {message}</p>
</details>
"#,
        name = escape_html(error.file()),
        message = escape_html(&error.user_message()),
    )
}
