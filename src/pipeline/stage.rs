//! Transient staging: write each upload to a uniquely named temp file that
//! lives exactly as long as the conversion consuming it.
//!
//! Engines want a file-system path, so every blob is written to disk before
//! conversion. Three scopes nest:
//!
//! ```text
//! StagingArea   root directory (OS temp dir by default), lives with the server
//!  └─ BatchStaging   docreader-{batch_id}-XXXX/, one per request
//!      └─ StagedFile   {position}-{stem}-XXXXXX.{ext}, one per upload
//! ```
//!
//! Names are random and created exclusively, so two uploads called
//! `report.pdf`, in one batch or in concurrent batches, never share a path.
//! The extension is kept so engines that look at the path infer the same
//! format as the declared filename.
//!
//! Removal happens on every exit path: [`StagedFile::release`] on the normal
//! path, `Drop` on panic or when a timed-out task finally finishes. Removal
//! failures are logged and never change a conversion outcome.

use super::input::Upload;
use crate::error::DocReaderError;
use crate::format::{extension_of, file_stem};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

/// Longest sanitised stem kept in a staged filename.
const MAX_STEM_CHARS: usize = 40;

/// Root directory under which request-scoped staging directories are made.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Use `root`, or the OS temp dir when `None`. The root is created if
    /// missing and probed for writability.
    pub fn new(root: Option<&Path>) -> Result<Self, DocReaderError> {
        let root = root.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&root).map_err(|source| DocReaderError::StagingUnavailable {
            path: root.clone(),
            source,
        })?;
        tempfile::Builder::new()
            .prefix(".docreader-probe-")
            .tempfile_in(&root)
            .map_err(|source| DocReaderError::StagingUnavailable {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the staging directory for one batch.
    pub fn batch(&self, batch_id: &str) -> io::Result<BatchStaging> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("docreader-{batch_id}-"))
            .rand_bytes(4)
            .tempdir_in(&self.root)?;
        debug!(dir = %dir.path().display(), "created batch staging directory");
        Ok(BatchStaging { dir: Arc::new(dir) })
    }
}

/// A request-scoped staging directory.
///
/// Cheap to clone. The directory is removed once the batch and every file
/// staged in it have been dropped, so a conversion still running on the
/// blocking pool after its timeout keeps its directory alive.
#[derive(Debug, Clone)]
pub struct BatchStaging {
    dir: Arc<TempDir>,
}

impl BatchStaging {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `upload` to a fresh file in this directory.
    pub fn stage(&self, position: usize, upload: &Upload) -> io::Result<StagedFile> {
        let prefix = format!("{position}-{}-", sanitise_stem(&file_stem(&upload.name)));
        let suffix = extension_of(&upload.name)
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .rand_bytes(6)
            .tempfile_in(self.dir.path())?;
        file.write_all(&upload.bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!(path = %path.display(), bytes = upload.bytes.len(), "staged upload");
        Ok(StagedFile {
            file: Some(file),
            path,
            _dir: Arc::clone(&self.dir),
        })
    }
}

/// One staged upload. Deleted by [`release`](Self::release) or on drop.
#[derive(Debug)]
pub struct StagedFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
    _dir: Arc<TempDir>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file now. Failures are logged, never returned.
    pub fn release(mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                warn!(path = %self.path.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}

/// Reduce a declared stem to `[A-Za-z0-9_-]`, capped in length.
fn sanitise_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
