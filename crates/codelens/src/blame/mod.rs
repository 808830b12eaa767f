//! Version-control history for a file, fetched once and shared by every lens.
//!
//! A [`BlameSource`] starts the history query and returns a future of the
//! file's [`ChangeRecord`]s. [`PendingHistory`] wraps that future so any number
//! of history lenses can await it while the query itself runs exactly once.
//!
//! ## Usage
//!
//! ```no_run
//! use codelens::blame::{BlameSource, GitBlame, PendingHistory};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), codelens::blame::BlameError> {
//! let git = GitBlame::default();
//! let history = PendingHistory::new(git.blame(Path::new("/repo/src/lib.rs")));
//!
//! // Both awaits share one `git blame` process.
//! let first = history.records().await?;
//! let second = history.clone().records().await?;
//! assert_eq!(first.len(), second.len());
//! # Ok(())
//! # }
//! ```

mod git;
mod parser;

pub use git::{GitBlame, StderrPolicy};
pub use parser::{BlameLineBuffer, parse_line, parse_timestamp};

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use thiserror::Error;

use crate::types::ChangeRecord;

/// Errors from the history subprocess.
///
/// Cloneable: one failure is handed to every lens awaiting the same history.
#[derive(Debug, Clone, Error)]
pub enum BlameError {
    /// The version-control executable is not installed.
    #[error("{program} not found\n\n{install_hint}")]
    NotFound {
        /// The program that could not be found.
        program: String,
        /// Installation instructions.
        install_hint: String,
    },

    /// The subprocess could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that failed to spawn.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Reading the subprocess output failed.
    #[error("failed to read history output: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// The subprocess exited unsuccessfully.
    #[error("history query exited with {}: {stderr}", exit_code_label(.code))]
    Failed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Everything the subprocess wrote to stderr.
        stderr: String,
    },

    /// The subprocess wrote to stderr under [`StderrPolicy::Strict`].
    #[error("history query reported: {0}")]
    Stderr(String),
}

#[allow(clippy::ref_option)] // called with a field reference from the error attribute
fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
}

impl From<std::io::Error> for BlameError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(Arc::new(error))
    }
}

/// Result type for history queries.
pub type BlameResult<T> = std::result::Result<T, BlameError>;

/// Starts a history query for a file.
///
/// Implementations should start the expensive work immediately and return a
/// future that completes it; the future may be polled much later, or never.
pub trait BlameSource: Send + Sync {
    /// Begin fetching the change records for `path`.
    fn blame(&self, path: &Path) -> BoxFuture<'static, BlameResult<Vec<ChangeRecord>>>;
}

type SharedRecords = Shared<BoxFuture<'static, BlameResult<Arc<[ChangeRecord]>>>>;

/// A file's change records, pending until the first lens awaits them.
///
/// Cloning is cheap and every clone observes the same single result.
#[derive(Clone)]
pub struct PendingHistory {
    inner: SharedRecords,
}

impl PendingHistory {
    /// Wrap a history future so it can be awaited many times.
    pub fn new<F>(fetch: F) -> Self
    where
        F: Future<Output = BlameResult<Vec<ChangeRecord>>> + Send + 'static,
    {
        Self {
            inner: fetch
                .map_ok(|records| Arc::<[ChangeRecord]>::from(records))
                .boxed()
                .shared(),
        }
    }

    /// History that is already known.
    #[must_use]
    pub fn ready(records: Vec<ChangeRecord>) -> Self {
        Self::new(futures::future::ready(Ok(records)))
    }

    /// History that has already failed.
    #[must_use]
    pub fn failed(error: BlameError) -> Self {
        Self::new(futures::future::ready(Err(error)))
    }

    /// Await the change records, in the order the tool printed them.
    ///
    /// # Errors
    ///
    /// Returns the shared [`BlameError`] if the history query failed.
    pub async fn records(&self) -> BlameResult<Arc<[ChangeRecord]>> {
        self.inner.clone().await
    }

    /// The result, if the history has already settled.
    #[must_use]
    pub fn peek(&self) -> Option<&BlameResult<Arc<[ChangeRecord]>>> {
        self.inner.peek()
    }

    /// Returns `true` if both handles share the same underlying query.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl fmt::Debug for PendingHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.peek() {
            None => "pending".to_string(),
            Some(Ok(records)) => format!("{} records", records.len()),
            Some(Err(e)) => format!("failed: {e}"),
        };
        f.debug_struct("PendingHistory").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(line: u32) -> ChangeRecord {
        ChangeRecord {
            sha: format!("sha{line}"),
            author: "Alice".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            line,
            code: String::new(),
        }
    }

    #[tokio::test]
    async fn shared_history_runs_the_query_once() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&polls);
        let history = PendingHistory::new(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![record(1), record(2)])
        });

        let a = history.clone();
        let b = history.clone();
        let (first, second) = tokio::join!(a.records(), b.records());
        let third = history.records().await;

        assert_eq!(first.unwrap().len(), 2);
        assert_eq!(second.unwrap().len(), 2);
        assert_eq!(third.unwrap().len(), 2);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_delivered_to_every_awaiter() {
        let history = PendingHistory::failed(BlameError::Stderr("fatal: no such path".to_string()));

        for _ in 0..3 {
            let result = history.clone().records().await;
            assert!(matches!(result, Err(BlameError::Stderr(ref s)) if s == "fatal: no such path"));
        }
    }

    #[tokio::test]
    async fn peek_reports_settled_state() {
        let history = PendingHistory::ready(vec![record(1)]);
        assert!(history.peek().is_none());

        history.records().await.unwrap();
        assert!(matches!(history.peek(), Some(Ok(records)) if records.len() == 1));
    }

    #[test]
    fn clones_share_the_same_query() {
        let history = PendingHistory::ready(Vec::new());
        let other = PendingHistory::ready(Vec::new());

        assert!(history.ptr_eq(&history.clone()));
        assert!(!history.ptr_eq(&other));
    }

    #[test]
    fn failed_error_mentions_exit_code() {
        let error = BlameError::Failed {
            code: Some(128),
            stderr: "fatal: not a git repository".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("code 128"));
        assert!(display.contains("not a git repository"));
    }
}
