//! Symbol-tree and reference services backed by a running language server.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lsp_types::{DocumentSymbol, DocumentSymbolResponse, Location, Position, SymbolInformation, SymbolKind};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::Result;
use super::provider::{LanguageServer, LspProvider};
use super::transport::LspClient;
use crate::services::{QueryError, QueryResult, ReferenceQuery, ReferenceService, SymbolTreeService};
use crate::types::{DeclarationNode, Language, NodeKind, SourceFile};

/// How long to wait for servers that load their workspace after initialize.
const WORKSPACE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Files whose presence marks a workspace root.
const WORKSPACE_MARKERS: &[&str] = &["Cargo.lock", "Cargo.toml", ".git"];

/// Maximum directory depth to traverse when searching for a workspace root.
const MAX_TRAVERSAL_DEPTH: usize = 256;

struct Session {
    client: LspClient,
    opened: HashSet<String>,
}

/// Both service contracts, answered by one language server.
///
/// Queries are serialized over the single connection. Each document is sent
/// with `didOpen` before its first query.
pub struct LspServices {
    language: Language,
    session: Mutex<Session>,
}

impl LspServices {
    /// Start the language server for `language` rooted at `workspace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be started or initialized.
    pub async fn start(language: Language, workspace: &Path) -> Result<Self> {
        let server = LanguageServer::for_language(language);
        let mut client = LspClient::start(&server, workspace).await?;

        if server.loads_workspace() {
            let loaded = client.wait_for_workspace_load(WORKSPACE_LOAD_TIMEOUT).await?;
            debug!(loaded, command = server.command(), "Workspace load wait finished");
        }

        Ok(Self::with_client(language, client))
    }

    /// Wrap an already-initialized client.
    #[must_use]
    pub fn with_client(language: Language, client: LspClient) -> Self {
        Self {
            language,
            session: Mutex::new(Session {
                client,
                opened: HashSet::new(),
            }),
        }
    }

    /// Shut the server down.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown exchange fails.
    pub async fn shutdown(self) -> Result<()> {
        self.session.into_inner().client.shutdown().await
    }

    async fn ensure_open(&self, session: &mut Session, file: &SourceFile) -> QueryResult<()> {
        let key = file.uri().as_str().to_string();
        if session.opened.contains(&key) {
            return Ok(());
        }

        let content = tokio::fs::read_to_string(file.path()).await?;
        let language = Language::from_path(file.path()).unwrap_or(self.language);

        // The didOpen frame is queued on the first poll, so a dropped query
        // still leaves the document open on the server.
        session.opened.insert(key.clone());
        if let Err(e) = session
            .client
            .did_open(file.uri(), &content, language.language_id())
            .await
        {
            session.opened.remove(&key);
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl SymbolTreeService for LspServices {
    async fn symbol_tree(&self, file: &SourceFile) -> QueryResult<Vec<DeclarationNode>> {
        let mut session = self.session.lock().await;
        self.ensure_open(&mut session, file).await?;

        let response = session.client.document_symbols(file.uri()).await?;
        let nodes = match response {
            None => Vec::new(),
            Some(DocumentSymbolResponse::Nested(symbols)) => {
                symbols.into_iter().map(declaration_from_symbol).collect()
            }
            Some(DocumentSymbolResponse::Flat(symbols)) => symbols
                .into_iter()
                .filter(|s| s.location.uri == *file.uri())
                .map(declaration_from_information)
                .collect(),
        };

        trace!(file = %file.path().display(), roots = nodes.len(), "Received document symbols");
        Ok(nodes)
    }
}

#[async_trait]
impl ReferenceService for LspServices {
    async fn find_references(&self, query: &ReferenceQuery) -> QueryResult<Option<Vec<Location>>> {
        if !query.whole_workspace {
            return Err(QueryError::Unavailable(
                "language servers only search the whole workspace".to_string(),
            ));
        }

        let mut session = self.session.lock().await;
        self.ensure_open(&mut session, &query.file).await?;

        let position = Position::new(
            query.line.saturating_sub(1),
            query.column.saturating_sub(1),
        );
        let locations = session
            .client
            .find_references(query.file.uri(), position, !query.exclude_definition)
            .await?;
        Ok(locations)
    }
}

/// Map a language-server symbol kind onto the kinds lens generation cares about.
#[must_use]
pub fn node_kind(kind: SymbolKind) -> NodeKind {
    match kind {
        SymbolKind::METHOD | SymbolKind::FUNCTION | SymbolKind::CONSTRUCTOR => NodeKind::Method,
        SymbolKind::CLASS | SymbolKind::STRUCT | SymbolKind::INTERFACE | SymbolKind::ENUM => {
            NodeKind::Type
        }
        _ => NodeKind::Other,
    }
}

fn declaration_from_symbol(symbol: DocumentSymbol) -> DeclarationNode {
    let children = symbol
        .children
        .unwrap_or_default()
        .into_iter()
        .map(declaration_from_symbol)
        .collect();

    DeclarationNode::new(
        node_kind(symbol.kind),
        symbol.name,
        symbol.range,
        symbol.selection_range,
    )
    .with_children(children)
}

fn declaration_from_information(symbol: SymbolInformation) -> DeclarationNode {
    let range = symbol.location.range;
    DeclarationNode::new(node_kind(symbol.kind), symbol.name, range, range)
}

/// Find the directory a language server should treat as the workspace root.
///
/// Walks up from `start` to the nearest directory holding a workspace marker
/// (`Cargo.lock`, `Cargo.toml`, `.git`, or a `.sln` file). Falls back to `start`.
#[must_use]
pub fn find_workspace_root(start: &Path) -> PathBuf {
    let mut current = Some(start);
    let mut depth = 0;

    while let Some(dir) = current {
        if depth >= MAX_TRAVERSAL_DEPTH {
            break;
        }
        if WORKSPACE_MARKERS.iter().any(|m| dir.join(m).exists()) || has_solution_file(dir) {
            return dir.to_path_buf();
        }
        current = dir.parent();
        depth += 1;
    }

    start.to_path_buf()
}

fn has_solution_file(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(std::result::Result::ok)
            .any(|e| e.path().extension().is_some_and(|ext| ext == "sln"))
    })
}
