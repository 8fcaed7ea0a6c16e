//! Word (`.docx`) and PowerPoint (`.pptx`) text extraction.
//!
//! Both formats are zip packages of WordprocessingML / DrawingML parts that
//! share the same skeleton: paragraphs (`p`) made of runs (`r`) holding text
//! (`t`), and tables (`tbl` → `tr` → `tc`) whose cells contain paragraphs.
//! One streaming quick-xml pass over local names handles both; the only
//! format-specific bits are how a heading is spotted (`w:pStyle` in Word,
//! a `title` placeholder in PowerPoint) and which parts are read.

use super::table::render_markdown_table;
use super::EngineError;
use crate::format::DocumentFormat;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{self, Cursor, Read};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

const DOCX_BODY: &str = "word/document.xml";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Open an OOXML (or plain zip) container held in memory.
pub(crate) fn open_package(bytes: &[u8], format: DocumentFormat) -> Result<Package<'_>, EngineError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| EngineError::Archive {
        format,
        detail: e.to_string(),
    })
}

/// Read one part, refusing to decompress more than `limit` bytes.
pub(crate) fn read_part(
    package: &mut Package<'_>,
    name: &str,
    limit: u64,
) -> Result<Vec<u8>, EngineError> {
    let entry = match package.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(EngineError::MissingPart {
                part: name.to_string(),
            })
        }
        Err(e) => return Err(EngineError::Io(io::Error::new(io::ErrorKind::InvalidData, e))),
    };
    let mut out = Vec::new();
    entry.take(limit.saturating_add(1)).read_to_end(&mut out)?;
    if out.len() as u64 > limit {
        return Err(EngineError::EntryTooLarge {
            member: name.to_string(),
            limit,
        });
    }
    Ok(out)
}

/// Extract a Word document as Markdown-ish text.
pub(crate) fn extract_docx(bytes: &[u8], part_limit: u64) -> Result<String, EngineError> {
    let mut package = open_package(bytes, DocumentFormat::Docx)?;
    let xml = read_part(&mut package, DOCX_BODY, part_limit)?;
    let blocks = extract_blocks(&xml, DOCX_BODY)?;
    Ok(blocks.join("\n\n"))
}

/// Extract every slide of a presentation, in slide order.
pub(crate) fn extract_pptx(bytes: &[u8], part_limit: u64) -> Result<String, EngineError> {
    let mut package = open_package(bytes, DocumentFormat::Pptx)?;

    let mut slides: Vec<(u32, String)> = package
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            number.parse::<u32>().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    if slides.is_empty() {
        return Err(EngineError::MissingPart {
            part: format!("{SLIDE_PREFIX}1.xml"),
        });
    }
    slides.sort_by_key(|(n, _)| *n);
    debug!("pptx has {} slides", slides.len());

    let mut sections = Vec::with_capacity(slides.len());
    for (number, name) in slides {
        let xml = read_part(&mut package, &name, part_limit)?;
        let blocks = extract_blocks(&xml, &name)?;
        let mut section = format!("<!-- Slide number: {number} -->");
        for block in blocks {
            section.push('\n');
            section.push_str(&block);
        }
        sections.push(section);
    }
    Ok(sections.join("\n\n"))
}

// ── Streaming block extraction ───────────────────────────────────────────────

#[derive(Default)]
struct Paragraph {
    text: String,
    heading: Option<usize>,
    list_item: bool,
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Vec<String>,
}

#[derive(Default)]
struct BlockParser {
    blocks: Vec<String>,
    paragraphs: Vec<Paragraph>,
    tables: Vec<TableBuilder>,
    /// One entry per open `p:sp` shape; `true` when it is a title placeholder.
    shapes: Vec<bool>,
    run_depth: usize,
    in_text: bool,
}

impl BlockParser {
    fn start(&mut self, e: &BytesStart<'_>, part: &str) -> Result<(), EngineError> {
        match e.local_name().as_ref() {
            b"p" => {
                let heading = if self.shapes.last().copied().unwrap_or(false) {
                    Some(1)
                } else {
                    None
                };
                self.paragraphs.push(Paragraph {
                    heading,
                    ..Paragraph::default()
                });
            }
            b"r" => self.run_depth += 1,
            b"t" => self.in_text = true,
            b"tbl" => self.tables.push(TableBuilder::default()),
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.row.clear();
                }
            }
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    table.cell.clear();
                }
            }
            b"sp" => self.shapes.push(false),
            _ => self.empty(e, part)?,
        }
        Ok(())
    }

    /// Self-closing elements (also reached for the start tag of the same names).
    fn empty(&mut self, e: &BytesStart<'_>, part: &str) -> Result<(), EngineError> {
        match e.local_name().as_ref() {
            b"tab" if self.run_depth > 0 => self.push_text("\t"),
            b"br" | b"cr" => self.push_text("\n"),
            b"numPr" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.list_item = true;
                }
            }
            b"pStyle" => {
                if let Some(style) = attribute(e, b"val", part)? {
                    if let Some(p) = self.paragraphs.last_mut() {
                        p.heading = heading_level(&style);
                    }
                }
            }
            b"ph" => {
                if let Some(kind) = attribute(e, b"type", part)? {
                    if kind == "title" || kind == "ctrTitle" {
                        if let Some(shape) = self.shapes.last_mut() {
                            *shape = true;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local_name: &[u8]) {
        match local_name {
            b"p" => self.finish_paragraph(),
            b"r" => self.run_depth = self.run_depth.saturating_sub(1),
            b"t" => self.in_text = false,
            b"tc" => {
                if let Some(table) = self.tables.last_mut() {
                    let cell = std::mem::take(&mut table.cell).join(" ");
                    table.row.push(cell);
                }
            }
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            b"tbl" => self.finish_table(),
            b"sp" => {
                self.shapes.pop();
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(p) = self.paragraphs.last_mut() {
            p.text.push_str(text);
        }
    }

    fn finish_paragraph(&mut self) {
        let Some(p) = self.paragraphs.pop() else {
            return;
        };
        let text = p.text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(table) = self.tables.last_mut() {
            table.cell.push(text.to_string());
            return;
        }
        let line = match (p.heading, p.list_item) {
            (Some(level), _) => format!("{} {}", "#".repeat(level), text),
            (None, true) => format!("- {text}"),
            (None, false) => text.to_string(),
        };
        self.blocks.push(line);
    }

    fn finish_table(&mut self) {
        let Some(table) = self.tables.pop() else {
            return;
        };
        match self.tables.last_mut() {
            // Nested table: flatten into the enclosing cell.
            Some(parent) => {
                let flat = table
                    .rows
                    .iter()
                    .map(|r| r.join(" "))
                    .collect::<Vec<_>>()
                    .join(" ");
                if !flat.trim().is_empty() {
                    parent.cell.push(flat);
                }
            }
            None => {
                let rendered = render_markdown_table(&table.rows);
                if !rendered.is_empty() {
                    self.blocks.push(rendered);
                }
            }
        }
    }
}

/// Walk one XML part and collect its Markdown blocks.
fn extract_blocks(xml: &[u8], part: &str) -> Result<Vec<String>, EngineError> {
    let mut reader = Reader::from_reader(xml);
    let mut parser = BlockParser::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.start(&e, part)?,
            Ok(Event::Empty(e)) => parser.empty(&e, part)?,
            Ok(Event::End(e)) => parser.end(e.local_name().as_ref()),
            Ok(Event::Text(t)) if parser.in_text => {
                let text = t.unescape().map_err(|e| xml_error(part, e))?;
                parser.push_text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.blocks)
}

fn attribute(e: &BytesStart<'_>, local: &[u8], part: &str) -> Result<Option<String>, EngineError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(part, err))?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(|err| xml_error(part, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `Heading1`…`Heading9` map to `#`…`######`; `Title` is a top-level heading.
fn heading_level(style: &str) -> Option<usize> {
    if style.eq_ignore_ascii_case("title") {
        return Some(1);
    }
    let digits = style
        .strip_prefix("Heading")
        .or_else(|| style.strip_prefix("heading"))?;
    digits.trim().parse::<usize>().ok().map(|n| n.clamp(1, 6))
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::Xml {
        part: part.to_string(),
        detail: err.to_string(),
    }
}
