//! The per-file unit of work: stage → convert → release, on the blocking pool,
//! bounded by a timeout.

use super::input::Upload;
use super::stage::BatchStaging;
use crate::engine::ConversionEngine;
use crate::error::FileError;
use crate::format::DocumentFormat;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Stage `upload`, run the engine on it and release the staged file.
///
/// Runs on `spawn_blocking` so a slow engine never stalls the async runtime.
/// On timeout the task is abandoned, not cancelled: it finishes in the
/// background and its staged file is removed when it does. A panicking engine
/// becomes [`FileError::Conversion`] and its staged file is removed while
/// unwinding.
pub(crate) async fn extract_text(
    engine: Arc<dyn ConversionEngine>,
    staging: BatchStaging,
    position: usize,
    upload: Upload,
    format: DocumentFormat,
    timeout: Duration,
) -> Result<String, FileError> {
    let name = upload.name.clone();
    let task_name = name.clone();

    let task = tokio::task::spawn_blocking(move || -> Result<String, FileError> {
        let staged = staging
            .stage(position, &upload)
            .map_err(|e| FileError::Staging {
                file: task_name.clone(),
                detail: e.to_string(),
            })?;
        drop(upload);

        let result = engine.convert(staged.path(), format);
        staged.release();
        result.map_err(|e| FileError::Conversion {
            file: task_name,
            detail: e.to_string(),
        })
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(text))) => {
            debug!(file = %name, chars = text.len(), "engine finished");
            Ok(text)
        }
        Ok(Ok(Err(e))) => Err(e),
        Ok(Err(join_err)) => {
            let detail = if join_err.is_panic() {
                format!("engine panicked: {}", panic_message(join_err.into_panic()))
            } else {
                "conversion task was cancelled".to_string()
            };
            warn!(file = %name, %detail, "conversion task failed");
            Err(FileError::Conversion { file: name, detail })
        }
        Err(_) => {
            warn!(file = %name, secs = timeout.as_secs(), "conversion timed out");
            Err(FileError::Timeout {
                file: name,
                secs: timeout.as_secs(),
            })
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
