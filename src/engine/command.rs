//! External-program engine: run a converter such as `markitdown {path}` and
//! take its stdout as the document text.

use super::{ConversionEngine, EngineError};
use crate::format::DocumentFormat;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Placeholder replaced by the staged file path in the argument list.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Runs `program args…` once per document.
///
/// Every argument containing `{path}` has it replaced by the staged path; if
/// no argument does, the path is appended as the last argument. The child is
/// killed once `timeout` elapses so a hung converter never outlives the
/// request that started it.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(program: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program,
            args,
            timeout,
        }
    }

    fn build_args(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(PATH_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(PATH_PLACEHOLDER, &path)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(path.into_owned());
        }
        args
    }
}

impl ConversionEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, EngineError> {
        let args = self.build_args(path);
        debug!(program = %self.program, ?args, %format, "spawning converter");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EngineError::Command(format!("failed to spawn {}: {e}", self.program)))?;

        // Drain both pipes on their own threads so a chatty child never
        // blocks on a full pipe while we poll for exit.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        // On expiry the reader threads are left detached; a grandchild that
        // inherited the pipes could keep them open past the kill.
        let Some(status) = wait_with_deadline(&mut child, self.timeout)? else {
            warn!(program = %self.program, secs = self.timeout.as_secs(), "converter timed out, killed");
            return Err(EngineError::Command(format!(
                "{} did not finish within {}s",
                self.program,
                self.timeout.as_secs()
            )));
        };
        let stdout = join_output(stdout);
        let stderr = join_output(stderr);

        if status.success() {
            Ok(String::from_utf8_lossy(&stdout).into_owned())
        } else {
            let detail = String::from_utf8_lossy(&stderr).trim().to_string();
            Err(EngineError::Command(if detail.is_empty() {
                format!("{} exited with {status}", self.program)
            } else {
                detail
            }))
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_output(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Wait for `child` until `timeout`; kill it and return `None` on expiry.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>, EngineError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
