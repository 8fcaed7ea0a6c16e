//! # docreader
//!
//! A universal document reader: upload Word, Excel, PowerPoint, PDF, HTML or
//! zip files and get their text back as Markdown, with a preview, `.md` /
//! `.txt` downloads, before/after sizes and a reading-time estimate.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Upload { name, bytes }
//!  │
//!  ├─ 1. Detect   format from the declared extension, size limit
//!  ├─ 2. Stage    uniquely named temp file in a request-scoped directory
//!  ├─ 3. Convert  ConversionEngine on the blocking pool, under a timeout
//!  ├─ 4. Release  staged file removed on every exit path
//!  ├─ 5. Polish   deterministic text cleanup
//!  └─ 6. Present  metrics + downloads, or a per-file warning
//! ```
//!
//! Files in a batch are processed one at a time in upload order; a failure in
//! one file is reported next to it and never stops the rest.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docreader::{Converter, ReaderConfig, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = Converter::new(ReaderConfig::default())?;
//!     let upload = Upload::new("report.docx", std::fs::read("report.docx")?);
//!     let report = converter.convert_batch(vec![upload]).await;
//!     for outcome in &report.outcomes {
//!         match outcome {
//!             Ok(r) => println!("{} ({} min read)\n{}",
//!                 r.source_name, r.metrics.reading_time_minutes, r.extracted_text),
//!             Err(e) => eprintln!("{}", e.user_message()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP server: upload page, results page, JSON API |
//! | `cli`    | on      | Enables the `docreader` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable both when using only the library:
//! ```toml
//! docreader = { version = "0.1", default-features = false }
//! ```
//!
//! ## Engines
//!
//! | Engine | Formats | Notes |
//! |--------|---------|-------|
//! | builtin | docx, xlsx, pptx, pdf, html, zip | in-process; default |
//! | command | whatever the program handles | e.g. `markitdown {path}`; stdout is the text |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod format;
pub mod metrics;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EngineChoice, ReaderConfig, ReaderConfigBuilder};
pub use convert::{write_atomic, write_results, Converter};
pub use engine::{build_engine, BuiltinEngine, CommandEngine, ConversionEngine, EngineError};
pub use error::{DocReaderError, FileError};
pub use format::DocumentFormat;
pub use metrics::ResultMetrics;
pub use output::{
    BatchReport, ConversionResult, DownloadArtifact, DownloadKind, FileOutcome,
};
pub use pipeline::input::{resolve_input, Upload};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, FileStream};
