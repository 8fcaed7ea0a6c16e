//! Batch conversion entry points.
//!
//! [`Converter`] is built once (engine + staging root + config) and shared by
//! every request. A batch is processed sequentially in upload order; each file
//! runs stage → convert → release as one blocking unit under a timeout, and a
//! failing file never affects the others. Use [`crate::stream::convert_stream`]
//! to receive outcomes one at a time instead of a finished [`BatchReport`].

use crate::config::ReaderConfig;
use crate::engine::{build_engine, ConversionEngine};
use crate::error::{DocReaderError, FileError};
use crate::format::{extension_of, DocumentFormat};
use crate::output::{unique_name, BatchReport, ConversionResult, DownloadKind, FileOutcome};
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::{self, Upload};
use crate::pipeline::postprocess;
use crate::pipeline::stage::{BatchStaging, StagingArea};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shared handle to the conversion machinery.
///
/// Cheap to clone: the engine, staging area and config sit behind `Arc`s.
#[derive(Clone)]
pub struct Converter {
    engine: Arc<dyn ConversionEngine>,
    staging: Arc<StagingArea>,
    config: Arc<ReaderConfig>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("engine", &self.engine.name())
            .field("staging_root", &self.staging.root())
            .field("config", &self.config)
            .finish()
    }
}

/// Staging for one batch, or the reason it could not be created.
pub(crate) type BatchStagingSlot = Result<BatchStaging, String>;

impl Converter {
    /// Build the engine selected by `config` and validate the staging root.
    ///
    /// # Errors
    /// [`DocReaderError::EngineUnavailable`] or
    /// [`DocReaderError::StagingUnavailable`].
    pub fn new(config: ReaderConfig) -> Result<Self, DocReaderError> {
        let engine = build_engine(&config)?;
        Self::with_engine(config, engine)
    }

    /// Use a caller-supplied engine, e.g. a stub in tests.
    pub fn with_engine(
        config: ReaderConfig,
        engine: Arc<dyn ConversionEngine>,
    ) -> Result<Self, DocReaderError> {
        let staging = StagingArea::new(config.staging_dir.as_deref())?;
        info!(
            engine = engine.name(),
            staging = %staging.root().display(),
            "converter ready"
        );
        Ok(Self {
            engine,
            staging: Arc::new(staging),
            config: Arc::new(config),
        })
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn staging_root(&self) -> &Path {
        self.staging.root()
    }

    /// Convert every upload in order and collect the outcomes.
    ///
    /// Never fails as a whole: problems with one file (including an
    /// unusable staging directory) are recorded as that file's [`FileError`].
    pub async fn convert_batch(&self, uploads: Vec<Upload>) -> BatchReport {
        let batch_id = Uuid::new_v4().to_string();
        let total = uploads.len();
        let span = info_span!("batch", batch_id = %batch_id, files = total);

        async move {
            let start = Instant::now();
            info!("Starting batch of {} files", total);
            let staging = self.open_batch(&batch_id);

            if let Some(ref cb) = self.config.progress_callback {
                cb.on_batch_start(total);
            }

            let mut outcomes = Vec::with_capacity(total);
            for (idx, upload) in uploads.into_iter().enumerate() {
                outcomes.push(self.convert_at(&staging, idx + 1, total, upload).await);
            }

            let report = BatchReport { batch_id, outcomes };
            let succeeded = report.success_count();
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_batch_complete(total, succeeded);
            }
            info!(
                "Batch done: {}/{} converted in {}ms",
                succeeded,
                total,
                start.elapsed().as_millis()
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Convert one upload as a batch of one.
    pub async fn convert_one(&self, upload: Upload) -> FileOutcome {
        let mut report = self.convert_batch(vec![upload]).await;
        report.outcomes.pop().unwrap_or_else(|| {
            Err(FileError::Staging {
                file: String::new(),
                detail: "empty batch".into(),
            })
        })
    }

    /// Convert one upload inside an already open batch directory.
    ///
    /// Checks run in order: format from the declared extension, size limit,
    /// then staging + engine under the configured timeout, then text cleanup.
    pub async fn convert_upload(
        &self,
        staging: &BatchStaging,
        position: usize,
        upload: Upload,
    ) -> FileOutcome {
        let name = upload.name.clone();

        let format = DocumentFormat::from_filename(&name).ok_or_else(|| {
            FileError::UnsupportedFormat {
                file: name.clone(),
                extension: extension_of(&name).unwrap_or("(none)").to_string(),
            }
        })?;

        let size = upload.size_bytes();
        if size > self.config.max_file_bytes {
            return Err(FileError::TooLarge {
                file: name,
                size,
                limit: self.config.max_file_bytes,
            });
        }

        debug!(file = %name, %format, size, position, "converting");
        let raw = extract_text(
            Arc::clone(&self.engine),
            staging.clone(),
            position,
            upload,
            format,
            Duration::from_secs(self.config.conversion_timeout_secs),
        )
        .await?;

        let text = if self.config.normalize_text {
            postprocess::clean_text(&raw)
        } else {
            raw
        };

        Ok(ConversionResult::new(
            name,
            format,
            size,
            text,
            self.config.words_per_minute,
        ))
    }

    /// Blocking wrapper around [`convert_batch`](Self::convert_batch).
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn convert_batch_sync(&self, uploads: Vec<Upload>) -> Result<BatchReport, DocReaderError> {
        Ok(tokio::runtime::Runtime::new()
            .map_err(|e| DocReaderError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.convert_batch(uploads)))
    }

    /// Resolve local paths / URLs and convert them as one batch.
    ///
    /// # Errors
    /// The first input that cannot be read or downloaded aborts the call.
    pub async fn convert_paths<S: AsRef<str>>(
        &self,
        inputs: &[S],
    ) -> Result<BatchReport, DocReaderError> {
        let mut uploads = Vec::with_capacity(inputs.len());
        for input in inputs {
            uploads.push(
                input::resolve_input(input.as_ref(), self.config.download_timeout_secs).await?,
            );
        }
        Ok(self.convert_batch(uploads).await)
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    pub(crate) fn open_batch(&self, batch_id: &str) -> BatchStagingSlot {
        self.staging.batch(batch_id).map_err(|e| {
            warn!(error = %e, "could not create batch staging directory");
            e.to_string()
        })
    }

    /// [`convert_upload`](Self::convert_upload) plus progress events and the
    /// per-file staging failure when the batch directory is missing.
    pub(crate) async fn convert_at(
        &self,
        staging: &BatchStagingSlot,
        position: usize,
        total: usize,
        upload: Upload,
    ) -> FileOutcome {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_file_start(position, total, &upload.name);
        }

        let name = upload.name.clone();
        let outcome = match staging {
            Ok(staging) => self.convert_upload(staging, position, upload).await,
            Err(detail) => Err(FileError::Staging {
                file: upload.name,
                detail: detail.clone(),
            }),
        };

        match &outcome {
            Ok(result) => {
                info!(file = %name, chars = result.extracted_text.len(), "converted");
                if let Some(cb) = cb {
                    cb.on_file_complete(position, total, &name, result.extracted_text.len());
                }
            }
            Err(e) => {
                warn!(file = %name, error = %e, "file failed");
                if let Some(cb) = cb {
                    cb.on_file_error(position, total, e);
                }
            }
        }
        outcome
    }
}

// ── Writing results ──────────────────────────────────────────────────────

/// Write every successful result into `dir` as `{stem}_converted.{ext}`.
///
/// Uses atomic writes (temp file + rename) so a crash never leaves a partial
/// file. Repeated names get ` (2)`, ` (3)`… suffixes. Returns the written
/// paths in upload order.
pub async fn write_results(
    report: &BatchReport,
    dir: impl AsRef<Path>,
    kind: DownloadKind,
) -> Result<Vec<PathBuf>, DocReaderError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DocReaderError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut taken = HashSet::new();
    let mut written = Vec::new();
    for result in report.successes() {
        let artifact = result.download(kind);
        let file_name = unique_name(&mut taken, &artifact.file_name);
        let path = dir.join(&file_name);
        write_atomic(&path, &artifact.bytes).await?;
        written.push(path);
    }
    Ok(written)
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocReaderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocReaderError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| DocReaderError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| DocReaderError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(())
}
