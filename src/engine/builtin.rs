//! The in-process engine: one extractor per format, zip archives recurse.

use super::html::extract_html;
use super::ooxml::{extract_docx, extract_pptx};
use super::pdf::extract_pdf;
use super::spreadsheet::extract_xlsx;
use super::{ConversionEngine, EngineError};
use crate::format::{extension_of, DocumentFormat};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// Members with these extensions are copied into the archive output verbatim.
const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "csv", "json", "xml"];

/// Total decompressed bytes one upload may expand to, in multiples of the
/// per-member limit.
const ARCHIVE_BUDGET_FACTOR: u64 = 4;

/// Converts every supported format without leaving the process.
#[derive(Debug, Clone)]
pub struct BuiltinEngine {
    zip_max_depth: u8,
    max_entry_bytes: u64,
}

impl BuiltinEngine {
    /// `zip_max_depth` bounds archive nesting (1 = members of the upload
    /// itself only). `max_entry_bytes` caps how far any single archive member
    /// or OOXML part may decompress.
    pub fn new(zip_max_depth: u8, max_entry_bytes: u64) -> Self {
        Self {
            zip_max_depth: zip_max_depth.max(1),
            max_entry_bytes,
        }
    }

    fn archive_budget(&self) -> u64 {
        self.max_entry_bytes.saturating_mul(ARCHIVE_BUDGET_FACTOR)
    }

    fn convert_bytes(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        depth: u8,
    ) -> Result<String, EngineError> {
        let mut budget = self.archive_budget();
        self.convert_within(bytes, format, depth, &mut budget)
    }

    /// `budget` is the decompressed byte allowance left for archive members,
    /// shared by every nesting level of one upload.
    fn convert_within(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        depth: u8,
        budget: &mut u64,
    ) -> Result<String, EngineError> {
        match format {
            DocumentFormat::Docx => extract_docx(bytes, self.max_entry_bytes),
            DocumentFormat::Pptx => extract_pptx(bytes, self.max_entry_bytes),
            DocumentFormat::Xlsx => extract_xlsx(bytes),
            DocumentFormat::Pdf => extract_pdf(bytes),
            DocumentFormat::Html => Ok(extract_html(bytes)),
            DocumentFormat::Zip => self.extract_archive(bytes, depth, budget),
        }
    }

    /// Convert each supported member of an archive into a `## File:` section.
    ///
    /// Members are visited in central-directory order. Unsupported members and
    /// archives nested deeper than the limit are skipped; any member that is
    /// supported but fails aborts the whole archive.
    fn extract_archive(
        &self,
        bytes: &[u8],
        depth: u8,
        budget: &mut u64,
    ) -> Result<String, EngineError> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| EngineError::Archive {
                format: DocumentFormat::Zip,
                detail: e.to_string(),
            })?;

        let mut sections = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| EngineError::Archive {
                format: DocumentFormat::Zip,
                detail: e.to_string(),
            })?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if name.starts_with("__MACOSX/") || name.contains("/__MACOSX/") {
                continue;
            }

            let Some(ext) = extension_of(&name).map(str::to_ascii_lowercase) else {
                debug!(member = %name, "skipping archive member without extension");
                continue;
            };
            let is_text = PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str());
            let format = DocumentFormat::from_extension(&ext);
            if !is_text && format.is_none() {
                debug!(member = %name, "skipping unsupported archive member");
                continue;
            }
            if format == Some(DocumentFormat::Zip) && depth + 1 >= self.zip_max_depth {
                debug!(member = %name, depth, "skipping nested archive beyond depth limit");
                continue;
            }

            let mut data = Vec::new();
            (&mut entry)
                .take(self.max_entry_bytes + 1)
                .read_to_end(&mut data)
                .map_err(|e| wrap_member(&name, EngineError::Io(e)))?;
            if data.len() as u64 > self.max_entry_bytes {
                return Err(EngineError::EntryTooLarge {
                    member: name,
                    limit: self.max_entry_bytes,
                });
            }
            drop(entry);
            *budget = budget
                .checked_sub(data.len() as u64)
                .ok_or(EngineError::ArchiveTooLarge {
                    limit: self.archive_budget(),
                })?;

            let text = match format {
                Some(format) if !is_text => self
                    .convert_within(&data, format, depth + 1, budget)
                    .map_err(|e| match e {
                        EngineError::ArchiveTooLarge { .. } => e,
                        other => wrap_member(&name, other),
                    })?,
                _ => String::from_utf8_lossy(&data).into_owned(),
            };
            sections.push(format!("## File: {name}\n\n{}", text.trim_end()));
        }

        Ok(sections.join("\n\n"))
    }
}

fn wrap_member(member: &str, source: EngineError) -> EngineError {
    EngineError::Member {
        member: member.to_string(),
        source: Box::new(source),
    }
}

impl ConversionEngine for BuiltinEngine {
    fn name(&self) -> &str {
        "builtin"
    }

    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, EngineError> {
        let bytes = std::fs::read(path)?;
        self.convert_bytes(&bytes, format, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_of(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn engine() -> BuiltinEngine {
        BuiltinEngine::new(2, 1024 * 1024)
    }

    #[test]
    fn archive_sections_follow_member_order() {
        let bytes = zip_of(&[
            ("notes.txt", "first".as_bytes()),
            ("page.html", "<p>second</p>".as_bytes()),
            ("image.png", [0x89u8, b'P', b'N', b'G'].as_slice()),
        ]);
        let out = engine().convert_bytes(&bytes, DocumentFormat::Zip, 0).unwrap();
        let first = out.find("## File: notes.txt").unwrap();
        let second = out.find("## File: page.html").unwrap();
        assert!(first < second, "got: {out}");
        assert!(out.contains("first"));
        assert!(out.contains("second"));
        assert!(!out.contains("image.png"), "unsupported member leaked: {out}");
    }

    #[test]
    fn nested_archive_respects_depth() {
        let inner = zip_of(&[("deep.txt", "deep text".as_bytes())]);
        let outer = zip_of(&[("inner.zip", inner.as_slice())]);

        let shallow = BuiltinEngine::new(1, 1024 * 1024)
            .convert_bytes(&outer, DocumentFormat::Zip, 0)
            .unwrap();
        assert!(!shallow.contains("deep text"), "got: {shallow}");

        let nested = engine().convert_bytes(&outer, DocumentFormat::Zip, 0).unwrap();
        assert!(nested.contains("## File: inner.zip"), "got: {nested}");
        assert!(nested.contains("## File: deep.txt"), "got: {nested}");
        assert!(nested.contains("deep text"), "got: {nested}");
    }

    #[test]
    fn oversized_member_is_rejected() {
        let big = vec![b'a'; 64];
        let bytes = zip_of(&[("big.txt", big.as_slice())]);
        let err = BuiltinEngine::new(2, 16)
            .convert_bytes(&bytes, DocumentFormat::Zip, 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::EntryTooLarge { .. }), "got: {err:?}");
    }

    #[test]
    fn archive_total_is_bounded() {
        let chunk = vec![b'a'; 16];
        let members: Vec<(String, &[u8])> = (0..5)
            .map(|i| (format!("part{i}.txt"), chunk.as_slice()))
            .collect();
        let members: Vec<(&str, &[u8])> =
            members.iter().map(|(n, d)| (n.as_str(), *d)).collect();
        let bytes = zip_of(&members);

        // Each member fits the 16-byte limit; five of them exceed 4 × 16.
        let err = BuiltinEngine::new(2, 16)
            .convert_bytes(&bytes, DocumentFormat::Zip, 0)
            .unwrap_err();
        assert!(
            matches!(err, EngineError::ArchiveTooLarge { limit: 64 }),
            "got: {err:?}"
        );

        let four = zip_of(&members[..4]);
        assert!(BuiltinEngine::new(2, 16)
            .convert_bytes(&four, DocumentFormat::Zip, 0)
            .is_ok());
    }

    #[test]
    fn nested_archives_share_the_budget() {
        let chunk = vec![b'b'; 1000];
        let inner = zip_of(&[
            ("a.txt", chunk.as_slice()),
            ("b.txt", chunk.as_slice()),
            ("c.txt", chunk.as_slice()),
        ]);
        let outer = zip_of(&[("one.txt", chunk.as_slice()), ("inner.zip", inner.as_slice())]);
        let engine = BuiltinEngine::new(3, 1024);

        assert!(engine.convert_bytes(&inner, DocumentFormat::Zip, 0).is_ok());
        let err = engine
            .convert_bytes(&outer, DocumentFormat::Zip, 0)
            .unwrap_err();
        assert!(
            matches!(err, EngineError::ArchiveTooLarge { limit: 4096 }),
            "got: {err:?}"
        );
    }

    #[test]
    fn failing_member_fails_archive() {
        let bytes = zip_of(&[("ok.txt", "fine".as_bytes()), ("broken.docx", "not a zip".as_bytes())]);
        let err = engine()
            .convert_bytes(&bytes, DocumentFormat::Zip, 0)
            .unwrap_err();
        match err {
            EngineError::Member { member, .. } => assert_eq!(member, "broken.docx"),
            other => panic!("expected member error, got {other:?}"),
        }
    }

    #[test]
    fn macosx_metadata_is_skipped() {
        let bytes = zip_of(&[("__MACOSX/._a.txt", "junk".as_bytes()), ("a.txt", "real".as_bytes())]);
        let out = engine().convert_bytes(&bytes, DocumentFormat::Zip, 0).unwrap();
        assert!(!out.contains("junk"), "got: {out}");
        assert!(out.contains("real"));
    }

    #[test]
    fn not_a_zip_is_archive_error() {
        let err = engine()
            .convert_bytes(b"plain bytes", DocumentFormat::Zip, 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::Archive { .. }), "got: {err:?}");
    }

    #[test]
    fn convert_reads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<h1>Title</h1>").unwrap();
        let out = engine().convert(&path, DocumentFormat::Html).unwrap();
        assert!(out.contains("Title"), "got: {out}");
    }
}
