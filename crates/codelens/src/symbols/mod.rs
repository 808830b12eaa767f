//! Offline symbol trees built with tree-sitter.
//!
//! [`TreeSitterSymbols`] answers [`SymbolTreeService`] queries for Rust and C#
//! files without a language server. Ranges follow the LSP `DocumentSymbol`
//! shape: the full declaration and the declared name.
//!
//! ## Adding a New Language
//!
//! 1. Add the variant to `Language` in `types.rs`
//! 2. Create a module with a `declarations(tree, content)` builder
//! 3. Register it in [`parse`]

mod csharp;
mod rust;
mod tree_sitter_utils;

use async_trait::async_trait;
use tracing::debug;

use crate::services::{QueryError, QueryResult, SymbolTreeService};
use crate::types::{DeclarationNode, Language, SourceFile};

/// Parse `content` as `language` and build its declaration tree.
///
/// # Errors
///
/// Returns `QueryError::Parser` if the grammar cannot be loaded or parsing is
/// aborted.
pub fn parse(language: Language, content: &str) -> QueryResult<Vec<DeclarationNode>> {
    let grammar: tree_sitter::Language = match language {
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
    };

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| QueryError::Parser(e.to_string()))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| QueryError::Parser("parsing was aborted".to_string()))?;

    let bytes = content.as_bytes();
    Ok(match language {
        Language::Rust => rust::declarations(&tree, bytes),
        Language::CSharp => csharp::declarations(&tree, bytes),
    })
}

/// Symbol trees from tree-sitter grammars.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterSymbols;

#[async_trait]
impl SymbolTreeService for TreeSitterSymbols {
    async fn symbol_tree(&self, file: &SourceFile) -> QueryResult<Vec<DeclarationNode>> {
        let language = Language::from_path(file.path())
            .ok_or_else(|| QueryError::UnsupportedLanguage(file.path().display().to_string()))?;

        let content = tokio::fs::read_to_string(file.path()).await?;
        let nodes = parse(language, &content)?;

        debug!(
            file = %file.path().display(),
            language = ?language,
            roots = nodes.len(),
            "Built symbol tree"
        );
        Ok(nodes)
    }
}
