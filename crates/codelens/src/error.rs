//! Error types for lens operations.
//!
//! Errors are layered the same way the work is:
//!
//! - **`BlameError`** (in [`crate::blame`]): the version-control subprocess failed.
//!   It is cloneable because one failure is shared by every history lens of a file.
//! - **`QueryError`** (in [`crate::services`]): a symbol-tree or reference query failed.
//! - **`Error`**: the top-level error returned by [`crate::LensProvider`].
//!
//! ## Failure Scope
//!
//! A failure is local to the smallest affected unit. A failed symbol-tree query
//! fails the whole lens-list request; a failed reference query fails one usage
//! lens; a failed history batch fails every history lens of that file and nothing
//! else. Failed lenses are never modified, so the host simply sees them unresolved.

use std::path::PathBuf;
use thiserror::Error;

use crate::blame::BlameError;
use crate::services::QueryError;

/// Result type for lens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for lens operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// The symbol tree for a file could not be produced.
    #[error("symbol tree query failed for {path}")]
    SymbolTree {
        /// File the tree was requested for.
        path: PathBuf,
        /// The underlying query failure.
        #[source]
        source: QueryError,
    },

    /// A reference query for a usage lens failed.
    #[error("reference query failed")]
    References(#[source] QueryError),

    /// The history batch for the lens's file failed.
    #[error("history unavailable: {0}")]
    History(#[from] BlameError),

    /// No change record falls within a history lens's line range.
    #[error("no change attributed to lines {start_line}..={end_line} of {path}")]
    EmptyAttribution {
        /// File the lens belongs to.
        path: PathBuf,
        /// First line of the lens range (0-indexed).
        start_line: u32,
        /// Last line of the lens range (0-indexed).
        end_line: u32,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file path could not be turned into a document URI.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

impl Error {
    /// Returns `true` if this error only means the lens has nothing to show.
    ///
    /// Hosts typically log these at a lower level than real failures.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Cancelled | Self::EmptyAttribution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_attribution_display_includes_range_and_path() {
        let error = Error::EmptyAttribution {
            path: PathBuf::from("src/Widget.cs"),
            start_line: 4,
            end_line: 9,
        };

        let display = error.to_string();
        assert!(display.contains("4..=9"));
        assert!(display.contains("src/Widget.cs"));
    }

    #[test]
    fn cancellation_and_empty_attribution_are_benign() {
        assert!(Error::Cancelled.is_benign());
        assert!(
            Error::EmptyAttribution {
                path: PathBuf::from("a.rs"),
                start_line: 0,
                end_line: 0,
            }
            .is_benign()
        );
        assert!(!Error::Config("bad".to_string()).is_benign());
    }

    #[test]
    fn history_error_converts_from_blame_error() {
        let error: Error = BlameError::Stderr("fatal: no such path".to_string()).into();
        assert!(matches!(error, Error::History(_)));
        assert!(error.to_string().contains("fatal: no such path"));
    }
}
