//! `git blame` as a [`BlameSource`].

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::parser::BlameLineBuffer;
use super::{BlameError, BlameResult, BlameSource};
use crate::types::ChangeRecord;

/// Size of each stdout read.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Shown when the version-control executable is missing.
const GIT_INSTALL_HINT: &str =
    "Install git (https://git-scm.com/downloads) or disable history lenses with `history-lenses: false`.";

/// How stderr output from the history subprocess is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StderrPolicy {
    /// Fail only on a non-zero exit; stderr from a successful run is logged.
    #[default]
    ExitStatus,
    /// Fail whenever anything is written to stderr, even on a successful exit.
    Strict,
}

/// Runs `git blame -c -M -w -- <file name>` in the file's directory.
///
/// The process is spawned as soon as [`BlameSource::blame`] is called. Its
/// output is read when the returned future is first polled.
#[derive(Debug, Clone)]
pub struct GitBlame {
    program: String,
    stderr_policy: StderrPolicy,
}

impl Default for GitBlame {
    fn default() -> Self {
        Self::new("git", StderrPolicy::default())
    }
}

impl GitBlame {
    /// Create a fetcher that runs `program` with the blame arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, stderr_policy: StderrPolicy) -> Self {
        Self {
            program: program.into(),
            stderr_policy,
        }
    }

    /// The executable that is run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for a copy- and move-detecting, whitespace-insensitive blame
    /// in annotate format.
    #[must_use]
    pub fn args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["blame", "-c", "-M", "-w", "--"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(path.as_os_str().to_os_string());
        args
    }

    fn spawn(&self, path: &Path) -> BlameResult<Child> {
        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        // Relative to the working directory, so relative inputs work too.
        let file_name = path.file_name().map_or(path, Path::new);
        if !directory.is_dir() {
            return Err(BlameError::Spawn {
                program: self.program.clone(),
                source: std::sync::Arc::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("directory not found: {}", directory.display()),
                )),
            });
        }

        debug!(
            program = %self.program,
            file = %path.display(),
            cwd = %directory.display(),
            "Starting history query"
        );

        Command::new(&self.program)
            .args(Self::args(file_name))
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BlameError::NotFound {
                        program: self.program.clone(),
                        install_hint: GIT_INSTALL_HINT.to_string(),
                    }
                } else {
                    BlameError::Spawn {
                        program: self.program.clone(),
                        source: std::sync::Arc::new(e),
                    }
                }
            })
    }
}

impl BlameSource for GitBlame {
    fn blame(&self, path: &Path) -> BoxFuture<'static, BlameResult<Vec<ChangeRecord>>> {
        match self.spawn(path) {
            Ok(child) => collect(child, self.stderr_policy).boxed(),
            Err(e) => {
                debug!(error = %e, "History query could not start");
                future::ready(Err(e)).boxed()
            }
        }
    }
}

/// Drain stdout and stderr concurrently, then wait for exit.
async fn collect(mut child: Child, policy: StderrPolicy) -> BlameResult<Vec<ChangeRecord>> {
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let (records, stderr) = tokio::try_join!(read_records(stdout), read_stderr(stderr))?;
    let status = child.wait().await?;

    debug!(
        records = records.len(),
        exit_code = ?status.code(),
        stderr_len = stderr.len(),
        "History query finished"
    );

    settle(policy, status.success(), status.code(), records, stderr)
}

async fn read_records<R: AsyncRead + Unpin>(mut stdout: R) -> std::io::Result<Vec<ChangeRecord>> {
    let mut buffer = BlameLineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let read = stdout.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.push(&chunk[..read]);
    }

    Ok(buffer.finish())
}

async fn read_stderr<R: AsyncRead + Unpin>(mut stderr: R) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    stderr.read_to_end(&mut bytes).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decide the outcome of a finished history query.
fn settle(
    policy: StderrPolicy,
    success: bool,
    code: Option<i32>,
    records: Vec<ChangeRecord>,
    stderr: String,
) -> BlameResult<Vec<ChangeRecord>> {
    if !success {
        return Err(BlameError::Failed {
            code,
            stderr: stderr.trim_end().to_string(),
        });
    }

    if !stderr.is_empty() {
        match policy {
            StderrPolicy::Strict => return Err(BlameError::Stderr(stderr.trim_end().to_string())),
            StderrPolicy::ExitStatus => {
                warn!(stderr = %stderr.trim_end(), "History query wrote to stderr");
            }
        }
    }

    Ok(records)
}
