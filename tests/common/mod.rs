//! Shared fixtures for the integration tests: in-memory office documents
//! and stub engines.

#![allow(dead_code)]

use docreader::{ConversionEngine, Converter, DocumentFormat, EngineError, ReaderConfig};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// ── Document fixtures ────────────────────────────────────────────────────────

pub fn zip_of(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A `.docx` whose body holds one paragraph per entry.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    zip_of(&[("word/document.xml", xml.as_bytes())])
}

/// A `.pptx` with one titled slide per entry.
pub fn pptx(titles: &[&str]) -> Vec<u8> {
    let slides: Vec<(String, String)> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let xml = format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree>
<p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#
            );
            (format!("ppt/slides/slide{}.xml", i + 1), xml)
        })
        .collect();
    let members: Vec<(&str, &[u8])> = slides
        .iter()
        .map(|(name, xml)| (name.as_str(), xml.as_bytes()))
        .collect();
    zip_of(&members)
}

/// A one-sheet `.xlsx` named `Stock` with a header row and one data row.
pub fn xlsx() -> Vec<u8> {
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;
    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;
    let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Stock" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;
    let sheet = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>Item</t></is></c><c r="B1" t="inlineStr"><is><t>Qty</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>apple</t></is></c><c r="B2"><v>3</v></c></row>
</sheetData></worksheet>"#;
    zip_of(&[
        ("[Content_Types].xml", content_types.as_bytes()),
        ("_rels/.rels", root_rels.as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
    ])
}

/// `n` space-separated words.
pub fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

/// A one-page PDF whose text layer reads `text`, with a valid xref table.
pub fn pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 700 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
         /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

/// A stored (uncompressed) zip holding `data` as `name`, with one byte of the
/// member data flipped so the CRC no longer matches.
pub fn zip_with_bad_crc(name: &str, data: &[u8]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(
            name,
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
        )
        .unwrap();
    writer.write_all(data).unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    let at = bytes
        .windows(data.len())
        .position(|w| w == data)
        .expect("member data is stored verbatim");
    bytes[at] ^= 0x20;
    bytes
}

// ── Stub engines ─────────────────────────────────────────────────────────────

/// Returns the staged bytes as text; fails on files whose content is `corrupt`.
pub struct EchoEngine;

impl ConversionEngine for EchoEngine {
    fn name(&self) -> &str {
        "echo"
    }

    fn convert(&self, path: &Path, _format: DocumentFormat) -> Result<String, EngineError> {
        let bytes = std::fs::read(path)?;
        if bytes == b"corrupt" {
            return Err(EngineError::Command("unreadable document".into()));
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Sleeps before answering, to trip the conversion timeout.
pub struct SleepyEngine(pub Duration);

impl ConversionEngine for SleepyEngine {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn convert(&self, _path: &Path, _format: DocumentFormat) -> Result<String, EngineError> {
        std::thread::sleep(self.0);
        Ok("late".into())
    }
}

// ── Converters ───────────────────────────────────────────────────────────────

pub fn config(staging: &Path) -> ReaderConfig {
    ReaderConfig::builder()
        .staging_dir(staging)
        .build()
        .unwrap()
}

pub fn builtin_converter(staging: &Path) -> Converter {
    Converter::new(config(staging)).unwrap()
}

pub fn echo_converter(staging: &Path) -> Converter {
    Converter::with_engine(config(staging), Arc::new(EchoEngine)).unwrap()
}

/// Number of entries left under the staging root.
pub fn staged_entries(staging: &Path) -> usize {
    std::fs::read_dir(staging).map(|d| d.count()).unwrap_or(0)
}
