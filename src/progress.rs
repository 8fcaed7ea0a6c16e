//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ReaderConfigBuilder::progress_callback`] to receive events
//! as the converter works through a batch. The CLI drives its progress bar
//! from these; a server could forward them to a channel or a log.
//!
//! # Example
//!
//! ```rust
//! use docreader::{BatchProgressCallback, ReaderConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, position: usize, total: usize, name: &str, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{position}/{total} {name} ({text_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ReaderConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FileError;
use std::sync::Arc;

/// Called by the converter as it processes each file of a batch.
///
/// Files are processed one at a time in upload order, so calls never overlap
/// within one batch; concurrent batches on a shared callback can interleave.
/// All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a file is staged.
    ///
    /// # Arguments
    /// * `position`: 1-indexed position in the batch
    /// * `total`   : files in the batch
    /// * `name`    : declared filename
    fn on_file_start(&self, position: usize, total: usize, name: &str) {
        let _ = (position, total, name);
    }

    /// Called when a file converted; `text_len` is the byte length of the text.
    fn on_file_complete(&self, position: usize, total: usize, name: &str, text_len: usize) {
        let _ = (position, total, name, text_len);
    }

    /// Called when a file failed.
    fn on_file_error(&self, position: usize, total: usize, error: &FileError) {
        let _ = (position, total, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReaderConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
