//! # Codelens: History and Usage Annotations for Declarations
//!
//! Codelens produces "lenses", inline annotations anchored above type and
//! member declarations. Two kinds are supported:
//!
//! - **History**: the most recent change to the declaration's code, e.g.
//!   `Alice, 3 days ago`, linked to the file's history.
//! - **Usages**: how often the declaration is referenced, e.g. `4 references`,
//!   linked to the reference list.
//!
//! ## Lifecycle
//!
//! A lens-list request starts a single `git blame` for the file, asks a
//! [`SymbolTreeService`] for the declaration tree, and walks it into unresolved
//! [`Lens`] placeholders. Each placeholder is later resolved on its own. Every
//! history lens of a file awaits the same blame output, so the subprocess
//! runs once per request no matter how many lenses resolve.
//!
//! ## Quick Start
//!
//! ```no_run
//! use codelens::{LensConfig, LensProvider, NoReferences, TreeSitterSymbols};
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> codelens::Result<()> {
//! let provider = LensProvider::new(
//!     Arc::new(TreeSitterSymbols),
//!     Arc::new(NoReferences),
//!     LensConfig::default(),
//! );
//! let cancel = CancellationToken::new();
//!
//! let lenses = provider.provide_lenses(Path::new("/repo/src/lib.rs"), &cancel).await?;
//! for lens in lenses {
//!     if let Ok(resolved) = provider.resolve_lens(lens, &cancel).await {
//!         println!("{:?}", resolved.label());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod blame;
pub mod config;
mod error;
pub mod lens;
pub mod lsp;
mod provider;
pub mod resolve;
pub mod services;
pub mod symbols;
pub mod types;
pub mod walker;

pub use blame::{BlameError, BlameSource, GitBlame, PendingHistory, StderrPolicy};
pub use config::LensConfig;
pub use error::{Error, Result};
pub use lens::{Lens, LensKind};
pub use provider::LensProvider;
pub use services::{
    NoReferences, QueryError, ReferenceQuery, ReferenceService, SymbolTreeService,
};
pub use symbols::TreeSitterSymbols;
pub use types::{ChangeRecord, DeclarationNode, Language, NodeKind, SourceFile};
