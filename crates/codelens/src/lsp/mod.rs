//! Language-server client used for symbol trees and reference counts.
//!
//! A thin async JSON-RPC transport over a server's stdio, plus [`LspServices`],
//! which implements both [`crate::services::SymbolTreeService`] and
//! [`crate::services::ReferenceService`] on top of it.
//!
//! ## Usage
//!
//! ```no_run
//! use codelens::lsp::{LspServices, find_workspace_root};
//! use codelens::types::Language;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), codelens::lsp::LspError> {
//! let root = find_workspace_root(Path::new("/path/to/project/src"));
//! let services = LspServices::start(Language::Rust, &root).await?;
//!
//! // ... hand `services` to a LensProvider ...
//!
//! services.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Protocol
//!
//! Messages are framed as `Content-Length: N\r\n\r\n{json}` and typed with
//! `lsp-types`. One request is in flight at a time; notifications that arrive
//! before its response are skipped, and requests from the server (progress
//! tokens, configuration) are answered with `null` so it never stalls.
//! Reference positions in [`crate::ReferenceQuery`] are 1-based and are
//! converted to protocol positions here.

mod error;
mod provider;
mod service;
mod transport;

pub use error::LspError;
pub use provider::{LanguageServer, LspProvider};
pub use service::{LspServices, find_workspace_root, node_kind};
pub use transport::LspClient;

/// Result type for language-server operations.
pub type Result<T> = std::result::Result<T, LspError>;
