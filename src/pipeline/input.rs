//! Uploads and CLI input resolution.
//!
//! An [`Upload`] is what every entry point hands the converter: a declared
//! filename plus the raw bytes. The server builds them from multipart parts;
//! the CLI builds them with [`resolve_input`] from a local path or a URL.

use crate::error::DocReaderError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name used for URL downloads whose path carries no usable filename.
pub const DEFAULT_DOWNLOAD_NAME: &str = "downloaded.html";

/// One uploaded document: declared filename + raw bytes.
///
/// The name is only used for format detection and display; it is never
/// joined onto a file-system path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a CLI argument to an [`Upload`].
///
/// URLs are downloaded (bounded by `timeout_secs`); anything else must be a
/// readable local file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Upload, DocReaderError> {
    if input.trim().is_empty() {
        return Err(DocReaderError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input)).await
    }
}

async fn resolve_local(path: &Path) -> Result<Upload, DocReaderError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocReaderError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(DocReaderError::FileNotFound {
                path: PathBuf::from(path),
            });
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    debug!(path = %path.display(), bytes = bytes.len(), "resolved local input");
    Ok(Upload::new(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, DocReaderError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocReaderError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocReaderError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocReaderError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocReaderError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            DocReaderError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocReaderError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    info!(name = %name, bytes = bytes.len(), "download complete");
    Ok(Upload::new(name, bytes.to_vec()))
}

/// Last path segment of `url` if it looks like a filename, else
/// [`DEFAULT_DOWNLOAD_NAME`].
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    DEFAULT_DOWNLOAD_NAME.to_string()
}
