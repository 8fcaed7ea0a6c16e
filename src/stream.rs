//! Streaming conversion API: emit file outcomes as they complete.
//!
//! Unlike [`crate::convert::Converter::convert_batch`], which returns only
//! after every file finishes, [`convert_stream`] yields each [`FileOutcome`]
//! through a `Stream` as soon as that file is done. Files are still processed
//! one at a time, so items always arrive in upload order.

use crate::convert::Converter;
use crate::output::FileOutcome;
use crate::pipeline::input::Upload;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;
use uuid::Uuid;

/// A boxed stream of per-file outcomes.
pub type FileStream = Pin<Box<dyn Stream<Item = FileOutcome> + Send>>;

/// Convert `uploads` lazily, one file per poll of the stream.
///
/// The batch staging directory is created up front and removed once the
/// stream (and any conversion it started) is dropped. Progress callbacks fire
/// exactly as they do for a batch, except `on_batch_complete`, which has no
/// natural point in a stream the caller may stop early.
///
/// # Example
/// ```rust,no_run
/// use docreader::{convert_stream, Converter, ReaderConfig, Upload};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Converter::new(ReaderConfig::default())?;
/// let uploads = vec![Upload::new("report.docx", std::fs::read("report.docx")?)];
/// let mut outcomes = convert_stream(&converter, uploads);
/// while let Some(outcome) = outcomes.next().await {
///     match outcome {
///         Ok(r) => println!("{}: {} words", r.source_name, r.metrics.word_count),
///         Err(e) => eprintln!("{}", e.user_message()),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(converter: &Converter, uploads: Vec<Upload>) -> FileStream {
    let batch_id = Uuid::new_v4().to_string();
    let total = uploads.len();
    info!(batch_id = %batch_id, files = total, "Starting streaming batch");

    let staging = Arc::new(converter.open_batch(&batch_id));
    if let Some(ref cb) = converter.config().progress_callback {
        cb.on_batch_start(total);
    }

    let converter = converter.clone();
    let s = stream::iter(uploads.into_iter().enumerate()).then(move |(idx, upload)| {
        let converter = converter.clone();
        let staging = Arc::clone(&staging);
        async move { converter.convert_at(&staging, idx + 1, total, upload).await }
    });

    Box::pin(s)
}
