//! End-to-end tests for the library API: batches of in-memory documents
//! through the built-in engine and through stub engines.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

mod common;

use common::*;
use docreader::{
    convert_stream, write_results, Converter, DocReaderError, DocumentFormat, DownloadKind,
    FileError, ReaderConfig, Upload,
};
use futures::StreamExt;
use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ── Built-in engine ──────────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_batch_keeps_order_and_isolates_failures() {
    let staging = tempfile::tempdir().unwrap();
    let converter = builtin_converter(staging.path());

    let good_docx = docx(&["Hello world", "Second paragraph"]);
    let truncated = good_docx[..good_docx.len() / 2].to_vec();

    let report = converter
        .convert_batch(vec![
            Upload::new("letter.docx", good_docx.clone()),
            Upload::new("broken.docx", truncated),
            Upload::new("deck.pptx", pptx(&["Intro", "Plan"])),
            Upload::new("notes.rtf", b"{\\rtf1 hi}".to_vec()),
            Upload::new("stock.xlsx", xlsx()),
            Upload::new("page.HTML", b"<h1>Title</h1><p>Body text</p>".to_vec()),
            Upload::new("scan.pdf", pdf("Hello PDF")),
        ])
        .await;

    assert_eq!(report.len(), 7);
    assert_eq!(report.success_count(), 5);

    let letter = report.outcomes[0].as_ref().unwrap();
    assert_eq!(letter.source_name, "letter.docx");
    assert_eq!(letter.format, DocumentFormat::Docx);
    assert_eq!(letter.extracted_text, "Hello world\n\nSecond paragraph");

    match &report.outcomes[1] {
        Err(FileError::Conversion { file, .. }) => assert_eq!(file, "broken.docx"),
        other => panic!("expected conversion failure, got {other:?}"),
    }

    let deck = report.outcomes[2].as_ref().unwrap();
    assert_eq!(
        deck.extracted_text,
        "<!-- Slide number: 1 -->\n# Intro\n\n<!-- Slide number: 2 -->\n# Plan"
    );

    match &report.outcomes[3] {
        Err(FileError::UnsupportedFormat { file, extension }) => {
            assert_eq!(file, "notes.rtf");
            assert_eq!(extension, "rtf");
        }
        other => panic!("expected unsupported format, got {other:?}"),
    }

    let stock = report.outcomes[4].as_ref().unwrap();
    assert_eq!(
        stock.extracted_text,
        "## Stock\n\n| Item | Qty |\n| --- | --- |\n| apple | 3 |"
    );

    let page = report.outcomes[5].as_ref().unwrap();
    assert_eq!(page.format, DocumentFormat::Html);
    assert!(page.extracted_text.contains("Title"), "got: {}", page.extracted_text);
    assert!(page.extracted_text.contains("Body text"));

    let scan = report.outcomes[6].as_ref().unwrap();
    assert_eq!(scan.format, DocumentFormat::Pdf);
    assert!(scan.extracted_text.contains("Hello PDF"), "got: {}", scan.extracted_text);

    assert_eq!(staged_entries(staging.path()), 0, "staging not cleaned up");
}

#[tokio::test]
async fn zip_upload_lists_each_member() {
    let staging = tempfile::tempdir().unwrap();
    let converter = builtin_converter(staging.path());

    let archive = zip_of(&[
        ("a.docx", docx(&["From the archive"]).as_slice()),
        ("readme.txt", b"plain notes".as_slice()),
    ]);
    let outcome = converter
        .convert_one(Upload::new("bundle.zip", archive))
        .await
        .unwrap();

    let text = &outcome.extracted_text;
    let a = text.find("## File: a.docx").unwrap();
    let b = text.find("## File: readme.txt").unwrap();
    assert!(a < b, "got: {text}");
    assert!(text.contains("From the archive"));
    assert!(text.contains("plain notes"));
}

#[tokio::test]
async fn garbage_with_a_supported_extension_fails_cleanly() {
    let staging = tempfile::tempdir().unwrap();
    let converter = builtin_converter(staging.path());

    let report = converter
        .convert_batch(vec![
            Upload::new("fake.pdf", b"not a pdf at all".to_vec()),
            Upload::new("fake.xlsx", b"not a workbook".to_vec()),
            Upload::new("empty.pptx", zip_of(&[("other.xml", b"<x/>".as_slice())])),
        ])
        .await;

    assert_eq!(report.success_count(), 0);
    for outcome in &report.outcomes {
        let err = outcome.as_ref().unwrap_err();
        assert!(matches!(err, FileError::Conversion { .. }), "got: {err:?}");
        assert!(err.user_message().ends_with("Please check the format."));
    }
    assert_eq!(staged_entries(staging.path()), 0);
}

#[tokio::test]
async fn damaged_pdf_and_zip_fail_without_stopping_the_batch() {
    let staging = tempfile::tempdir().unwrap();
    let converter = builtin_converter(staging.path());

    let good = pdf("Hello PDF");
    let truncated = good[..good.len() / 2].to_vec();

    let report = converter
        .convert_batch(vec![
            Upload::new("trunc.pdf", truncated),
            Upload::new("after-pdf.html", b"<p>still here</p>".to_vec()),
            Upload::new("bad.zip", zip_with_bad_crc("a.txt", b"hello world")),
            Upload::new("after-zip.html", b"<p>also here</p>".to_vec()),
        ])
        .await;

    assert_eq!(report.len(), 4);
    assert_eq!(report.success_count(), 2);

    match &report.outcomes[0] {
        Err(FileError::Conversion { file, detail }) => {
            assert_eq!(file, "trunc.pdf");
            assert!(!detail.contains("PDF error: PDF error"), "got: {detail}");
        }
        other => panic!("expected conversion failure, got {other:?}"),
    }
    match &report.outcomes[2] {
        Err(FileError::Conversion { file, detail }) => {
            assert_eq!(file, "bad.zip");
            assert!(detail.contains("a.txt"), "got: {detail}");
        }
        other => panic!("expected conversion failure, got {other:?}"),
    }

    assert!(report.outcomes[1]
        .as_ref()
        .unwrap()
        .extracted_text
        .contains("still here"));
    assert!(report.outcomes[3]
        .as_ref()
        .unwrap()
        .extracted_text
        .contains("also here"));

    assert_eq!(staged_entries(staging.path()), 0, "staging not cleaned up");
}

// ── Metrics and downloads ────────────────────────────────────────────────────

#[tokio::test]
async fn reading_time_and_word_counts() {
    let staging = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    let report = converter
        .convert_batch(vec![
            Upload::new("long.html", words(400)),
            Upload::new("one.html", "word"),
            Upload::new("empty.html", Vec::<u8>::new()),
        ])
        .await;

    let minutes: Vec<u64> = report
        .successes()
        .map(|r| r.metrics.reading_time_minutes)
        .collect();
    assert_eq!(minutes, vec![2, 1, 1]);

    let long = report.outcomes[0].as_ref().unwrap();
    assert_eq!(long.metrics.word_count, 400);

    // Empty text is still a success; a zero-byte source has no reduction figure.
    let empty = report.outcomes[2].as_ref().unwrap();
    assert_eq!(empty.extracted_text, "");
    assert_eq!(empty.metrics.size_reduction_percent, None);
    assert_eq!(empty.metrics.reduction_label(), "n/a");
}

#[tokio::test]
async fn size_reduction_is_relative_to_source() {
    let staging = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    // 100 visible bytes followed by 100 spaces that normalisation trims.
    let source = format!("{}{}", "a".repeat(100), " ".repeat(100));
    let result = converter
        .convert_one(Upload::new("half.html", source))
        .await
        .unwrap();

    assert_eq!(result.metrics.source_size_bytes, 200);
    assert_eq!(result.metrics.converted_size_bytes, 100);
    assert_eq!(
        result.metrics.converted_size_bytes,
        result.extracted_text.len() as u64
    );
    assert_eq!(result.metrics.size_reduction_percent, Some(50.0));
}

#[tokio::test]
async fn markdown_and_text_downloads_are_identical() {
    let staging = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    let result = converter
        .convert_one(Upload::new("Quarterly Report.docx", "# Q3\n\nRevenue up"))
        .await
        .unwrap();

    let md = result.download(DownloadKind::Markdown);
    let txt = result.download(DownloadKind::Text);
    assert_eq!(md.file_name, "Quarterly Report_converted.md");
    assert_eq!(txt.file_name, "Quarterly Report_converted.txt");
    assert_eq!(md.bytes, txt.bytes);
    assert_eq!(md.bytes, result.extracted_text.as_bytes());
    assert_ne!(md.content_type, txt.content_type);
}

// ── Same-name uploads and export ─────────────────────────────────────────────

#[tokio::test]
async fn same_name_uploads_stay_separate() {
    let staging = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    let report = converter
        .convert_batch(vec![
            Upload::new("report.docx", "first copy"),
            Upload::new("report.docx", "second copy"),
        ])
        .await;

    let texts: Vec<&str> = report
        .successes()
        .map(|r| r.extracted_text.as_str())
        .collect();
    assert_eq!(texts, vec!["first copy", "second copy"]);

    let zip = report.export_zip().unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(zip)).unwrap();
    let names: BTreeSet<String> = archive.file_names().map(str::to_string).collect();
    assert_eq!(
        names,
        BTreeSet::from([
            "report_converted.md".to_string(),
            "report_converted (2).md".to_string(),
        ])
    );

    let mut second = String::new();
    archive
        .by_name("report_converted (2).md")
        .unwrap()
        .read_to_string(&mut second)
        .unwrap();
    assert_eq!(second, "second copy");
}

#[tokio::test]
async fn export_with_no_successes_is_an_error() {
    let staging = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    let report = converter
        .convert_batch(vec![Upload::new("bad.pdf", "corrupt")])
        .await;

    match report.export_zip() {
        Err(DocReaderError::NothingToExport { total }) => assert_eq!(total, 1),
        other => panic!("expected NothingToExport, got {other:?}"),
    }
}

#[tokio::test]
async fn write_results_names_files_after_sources() {
    let staging = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    let report = converter
        .convert_batch(vec![
            Upload::new("a.html", "alpha"),
            Upload::new("b.pdf", "corrupt"),
            Upload::new("c.pptx", "gamma"),
        ])
        .await;

    let written = write_results(&report, out.path(), DownloadKind::Text)
        .await
        .unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a_converted.txt", "c_converted.txt"]);
    assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "gamma");
}

// ── Timeouts and staging ─────────────────────────────────────────────────────

#[tokio::test]
async fn timeout_fails_only_that_file_and_cleans_up() {
    let staging = tempfile::tempdir().unwrap();
    let config = ReaderConfig::builder()
        .staging_dir(staging.path())
        .conversion_timeout_secs(1)
        .build()
        .unwrap();
    let converter =
        Converter::with_engine(config, Arc::new(SleepyEngine(Duration::from_millis(1500))))
            .unwrap();

    let started = Instant::now();
    let outcome = converter.convert_one(Upload::new("slow.pdf", "x")).await;
    assert!(started.elapsed() < Duration::from_millis(1450));

    match outcome {
        Err(FileError::Timeout { file, secs }) => {
            assert_eq!(file, "slow.pdf");
            assert_eq!(secs, 1);
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    // The abandoned conversion removes its staged file once the engine returns.
    let deadline = Instant::now() + Duration::from_secs(5);
    while staged_entries(staging.path()) > 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(staged_entries(staging.path()), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let staging = tempfile::tempdir().unwrap();
    let config = ReaderConfig::builder()
        .staging_dir(staging.path())
        .max_file_bytes(8)
        .build()
        .unwrap();
    let converter = Converter::with_engine(config, Arc::new(EchoEngine)).unwrap();

    let report = converter
        .convert_batch(vec![
            Upload::new("big.html", "more than eight bytes"),
            Upload::new("ok.html", "tiny"),
        ])
        .await;

    assert!(matches!(
        report.outcomes[0],
        Err(FileError::TooLarge { limit: 8, .. })
    ));
    assert_eq!(report.outcomes[1].as_ref().unwrap().extracted_text, "tiny");
}

#[tokio::test]
async fn empty_batch_is_an_empty_report() {
    let staging = tempfile::tempdir().unwrap();
    let report = echo_converter(staging.path()).convert_batch(Vec::new()).await;
    assert!(report.is_empty());
    assert_eq!(report.view().total, 0);
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_in_upload_order() {
    let staging = tempfile::tempdir().unwrap();
    let converter = echo_converter(staging.path());

    let names: Vec<String> = convert_stream(
        &converter,
        vec![
            Upload::new("1.html", "one"),
            Upload::new("2.exe", "two"),
            Upload::new("3.html", "three"),
        ],
    )
    .map(|outcome| match outcome {
        Ok(r) => r.source_name,
        Err(e) => e.file().to_string(),
    })
    .collect()
    .await;

    assert_eq!(names, vec!["1.html", "2.exe", "3.html"]);
    assert_eq!(staged_entries(staging.path()), 0);
}

// ── Inputs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_paths_reads_local_files() {
    let staging = tempfile::tempdir().unwrap();
    let inputs = tempfile::tempdir().unwrap();
    let path = inputs.path().join("memo.docx");
    std::fs::write(&path, docx(&["Memo body"])).unwrap();

    let converter = builtin_converter(staging.path());
    let report = converter
        .convert_paths(&[path.to_string_lossy().into_owned()])
        .await
        .unwrap();

    let memo = report.outcomes[0].as_ref().unwrap();
    assert_eq!(memo.source_name, "memo.docx");
    assert_eq!(memo.extracted_text, "Memo body");
}

#[tokio::test]
async fn convert_paths_missing_file_is_fatal() {
    let staging = tempfile::tempdir().unwrap();
    let converter = builtin_converter(staging.path());

    let err = converter
        .convert_paths(&["/definitely/not/here.docx"])
        .await
        .unwrap_err();
    assert!(matches!(err, DocReaderError::FileNotFound { .. }), "got: {err:?}");
}
