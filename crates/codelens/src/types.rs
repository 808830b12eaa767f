//! Domain types shared by the walker, the fetcher, and the resolvers.
//!
//! - **Inputs**: `SourceFile`, `DeclarationNode` (produced by a symbol-tree service)
//! - **History**: `ChangeRecord` (produced by the blame fetcher)
//!
//! Geometry (`Range`, `Position`, `Uri`) is borrowed from `lsp-types`, which is
//! what hosts speak. All lens-side lines and columns are 0-indexed; only
//! `ChangeRecord::line` and `ReferenceQuery` positions are 1-indexed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lsp_types::{Range, Uri};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Characters escaped when a filesystem path becomes a `file://` URI.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// ============================================================================
// Languages
// ============================================================================

/// Languages with built-in symbol-tree and language-server support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Rust source files (`.rs`)
    Rust,
    /// C# source files (`.cs`)
    CSharp,
}

impl Language {
    /// Detect language from file extension.
    ///
    /// # Returns
    ///
    /// `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(Self::Rust),
            "cs" => Some(Self::CSharp),
            _ => None,
        }
    }

    /// Detect language from a file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Language identifier used in `textDocument/didOpen`.
    #[must_use]
    pub fn language_id(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::CSharp => "csharp",
        }
    }
}

// ============================================================================
// Files
// ============================================================================

/// A file that lenses are produced for.
///
/// The URI is computed once when the lens list is requested and then copied into
/// every command that refers to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    uri: Uri,
}

impl SourceFile {
    /// Create a source file from a path.
    ///
    /// Relative paths are canonicalized; absolute paths are used as given.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if a relative path cannot be resolved or
    /// the path is not valid UTF-8.
    pub fn new(path: &Path) -> Result<Self> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            path.canonicalize().map_err(|e| {
                Error::InvalidPath(format!(
                    "cannot canonicalize path '{}': {e}",
                    path.display()
                ))
            })?
        };
        let uri = path_to_uri(&path)?;
        Ok(Self { path, uri })
    }

    /// Filesystem path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URI of the file.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Directory containing the file, used as the working directory for
    /// version-control queries.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Convert an absolute filesystem path to a `file://` URI.
///
/// On Unix: `/home/user/file.rs` becomes `file:///home/user/file.rs`.
/// On Windows: `C:\Users\file.rs` becomes `file:///C:/Users/file.rs`.
pub(crate) fn path_to_uri(path: &Path) -> Result<Uri> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::InvalidPath(format!("path contains invalid UTF-8: {}", path.display())))?;

    #[cfg(windows)]
    let path_str = format!("/{}", path_str.replace('\\', "/"));

    let uri_string = format!("file://{}", utf8_percent_encode(&path_str, PATH_ESCAPES));

    uri_string
        .parse()
        .map_err(|e| Error::InvalidPath(format!("invalid URI '{uri_string}': {e}")))
}

// ============================================================================
// Symbol tree
// ============================================================================

/// Coarse declaration kinds; only the distinction between methods and
/// everything else affects lens generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Method, function, or constructor
    Method,
    /// Class, struct, interface, enum, trait, or impl block
    Type,
    /// Namespaces, modules, fields, properties, constants
    Other,
}

/// A node of a file's declaration tree.
///
/// Mirrors LSP `DocumentSymbol`: `range` spans the whole declaration including
/// its body, `selection_range` spans the identifier, and `text` is the
/// identifier as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationNode {
    /// Declaration kind.
    pub kind: NodeKind,
    /// Declared name.
    pub text: String,
    /// Full extent of the declaration.
    pub range: Range,
    /// Extent of the declared name.
    pub selection_range: Range,
    /// Nested declarations, in source order.
    pub children: Vec<DeclarationNode>,
}

impl DeclarationNode {
    /// Create a leaf node.
    #[must_use]
    pub fn new(kind: NodeKind, text: impl Into<String>, range: Range, selection_range: Range) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
            selection_range,
            children: Vec::new(),
        }
    }

    /// Attach children to this node.
    #[must_use]
    pub fn with_children(mut self, children: Vec<DeclarationNode>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in this subtree, including this one.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(DeclarationNode::subtree_len)
            .sum::<usize>()
    }
}

// ============================================================================
// History
// ============================================================================

/// One line of version-control attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Commit identifier as printed by the tool (may carry a `^` boundary marker).
    pub sha: String,
    /// Author name.
    pub author: String,
    /// Commit timestamp.
    pub timestamp: DateTime<Utc>,
    /// Line number in the current file (1-indexed, as reported by the tool).
    pub line: u32,
    /// Source text of the line.
    pub code: String,
}

impl ChangeRecord {
    /// Returns `true` if this record attributes a line inside `range`.
    ///
    /// `range` uses 0-indexed lines; record line `n` covers lens line `n - 1`.
    #[must_use]
    pub fn covers(&self, range: &Range) -> bool {
        let line = u64::from(self.line);
        line > u64::from(range.start.line) && line <= u64::from(range.end.line) + 1
    }
}
