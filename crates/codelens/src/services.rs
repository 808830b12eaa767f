//! Contracts for the external services lenses are built from.
//!
//! The core never parses source code or answers reference queries itself. It
//! asks a [`SymbolTreeService`] for a file's declarations and a
//! [`ReferenceService`] for usages. Two implementations ship with the crate:
//! [`crate::symbols::TreeSitterSymbols`] (offline, symbol trees only) and
//! [`crate::lsp::LspServices`] (both contracts, backed by a language server).

use async_trait::async_trait;
use lsp_types::Location;
use thiserror::Error;

use crate::lsp::LspError;
use crate::types::{DeclarationNode, SourceFile};

/// Errors reported by symbol-tree and reference services.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The language server failed.
    #[error(transparent)]
    Lsp(#[from] LspError),

    /// Reading the source file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No support exists for this file type.
    #[error("unsupported language for {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter parsing infrastructure failed.
    #[error("parser error: {0}")]
    Parser(String),

    /// The service is not available in this configuration.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Result type for service queries.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Produces the declaration tree of a file.
#[async_trait]
pub trait SymbolTreeService: Send + Sync {
    /// Return the top-level declarations of `file`, with nested members as children.
    async fn symbol_tree(&self, file: &SourceFile) -> QueryResult<Vec<DeclarationNode>>;
}

/// A "find references" request for the declaration at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceQuery {
    /// File containing the declaration.
    pub file: SourceFile,
    /// Line of the declaration (1-indexed).
    pub line: u32,
    /// Column of the declaration (1-indexed).
    pub column: u32,
    /// Leave the declaration itself out of the results.
    pub exclude_definition: bool,
    /// Search the whole workspace rather than only `file`.
    pub whole_workspace: bool,
}

/// Answers reference queries.
#[async_trait]
pub trait ReferenceService: Send + Sync {
    /// Find the locations referencing the declaration at the query position.
    ///
    /// `Ok(None)` means the service had no answer for that position.
    async fn find_references(&self, query: &ReferenceQuery) -> QueryResult<Option<Vec<Location>>>;
}

/// Reference service used when no language server is configured.
///
/// Every query fails with [`QueryError::Unavailable`], so usage lenses stay
/// unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

#[async_trait]
impl ReferenceService for NoReferences {
    async fn find_references(&self, _query: &ReferenceQuery) -> QueryResult<Option<Vec<Location>>> {
        Err(QueryError::Unavailable(
            "no reference service configured".to_string(),
        ))
    }
}
