//! Configuration types for document conversion.
//!
//! All reader behaviour is controlled through [`ReaderConfig`], built via its
//! [`ReaderConfigBuilder`]. One struct holds every knob, so a config can be
//! shared by every request of a server and logged in one line.

use crate::error::DocReaderError;
use crate::metrics::DEFAULT_WORDS_PER_MINUTE;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const MIB: u64 = 1024 * 1024;

/// Which conversion engine the reader uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineChoice {
    /// In-process extraction for every supported format. (default)
    #[default]
    Builtin,
    /// An external program, e.g. `markitdown`, whose stdout is the text.
    ///
    /// `{path}` in `args` is replaced by the staged file path; without a
    /// placeholder the path is appended.
    Command { program: String, args: Vec<String> },
}

impl EngineChoice {
    /// Parse a shell-style command line (`"markitdown {path}"`) into a
    /// [`EngineChoice::Command`]. Splits on whitespace; no quoting.
    pub fn command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(EngineChoice::Command {
            program,
            args: parts.collect(),
        })
    }
}

/// Configuration for a document reader.
///
/// Built via [`ReaderConfig::builder()`] or using [`ReaderConfig::default()`].
///
/// # Example
/// ```rust
/// use docreader::ReaderConfig;
///
/// let config = ReaderConfig::builder()
///     .conversion_timeout_secs(30)
///     .words_per_minute(250)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReaderConfig {
    /// Engine used for every file. Default: [`EngineChoice::Builtin`].
    pub engine: EngineChoice,

    /// Root under which request-scoped staging directories are created.
    /// Default: the OS temp dir.
    pub staging_dir: Option<PathBuf>,

    /// Upper bound on staging + conversion of one file, in seconds. Default: 120.
    ///
    /// Expiry fails that file with [`crate::error::FileError::Timeout`]; the
    /// rest of the batch continues.
    pub conversion_timeout_secs: u64,

    /// Largest accepted upload in bytes. Default: 200 MiB.
    pub max_file_bytes: u64,

    /// Reading speed used for the reading-time estimate. Default: 200.
    pub words_per_minute: u32,

    /// Run [`crate::pipeline::postprocess::clean_text`] over engine output. Default: true.
    pub normalize_text: bool,

    /// Deepest archive nesting the builtin engine follows. Default: 2.
    pub zip_max_depth: u8,

    /// Largest decompressed size of one archive member or package part. Default: 50 MiB.
    pub zip_max_entry_bytes: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-file progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            engine: EngineChoice::default(),
            staging_dir: None,
            conversion_timeout_secs: 120,
            max_file_bytes: 200 * MIB,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            normalize_text: true,
            zip_max_depth: 2,
            zip_max_entry_bytes: 50 * MIB,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("engine", &self.engine)
            .field("staging_dir", &self.staging_dir)
            .field("conversion_timeout_secs", &self.conversion_timeout_secs)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("words_per_minute", &self.words_per_minute)
            .field("normalize_text", &self.normalize_text)
            .field("zip_max_depth", &self.zip_max_depth)
            .field("zip_max_entry_bytes", &self.zip_max_entry_bytes)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ReaderConfig {
    /// Create a new builder for `ReaderConfig`.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn engine(mut self, engine: EngineChoice) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    pub fn conversion_timeout_secs(mut self, secs: u64) -> Self {
        self.config.conversion_timeout_secs = secs;
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn words_per_minute(mut self, wpm: u32) -> Self {
        self.config.words_per_minute = wpm;
        self
    }

    pub fn normalize_text(mut self, v: bool) -> Self {
        self.config.normalize_text = v;
        self
    }

    pub fn zip_max_depth(mut self, depth: u8) -> Self {
        self.config.zip_max_depth = depth;
        self
    }

    pub fn zip_max_entry_bytes(mut self, bytes: u64) -> Self {
        self.config.zip_max_entry_bytes = bytes;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, DocReaderError> {
        let c = &self.config;
        if c.conversion_timeout_secs == 0 {
            return Err(DocReaderError::InvalidConfig(
                "conversion timeout must be ≥ 1 second".into(),
            ));
        }
        if c.words_per_minute == 0 {
            return Err(DocReaderError::InvalidConfig(
                "words per minute must be ≥ 1".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(DocReaderError::InvalidConfig(
                "max file size must be ≥ 1 byte".into(),
            ));
        }
        if !(1..=8).contains(&c.zip_max_depth) {
            return Err(DocReaderError::InvalidConfig(format!(
                "zip depth must be 1–8, got {}",
                c.zip_max_depth
            )));
        }
        if let EngineChoice::Command { program, .. } = &c.engine {
            if program.trim().is_empty() {
                return Err(DocReaderError::InvalidConfig(
                    "command engine needs a program".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
