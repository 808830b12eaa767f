//! The lens provider: lens lists on request, resolution on demand.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::blame::{BlameSource, PendingHistory};
use crate::config::LensConfig;
use crate::error::{Error, Result};
use crate::lens::Lens;
use crate::resolve;
use crate::services::{ReferenceService, SymbolTreeService};
use crate::types::SourceFile;
use crate::walker;

/// Produces lenses for files and resolves them one at a time.
///
/// Configuration is fixed at construction. Every [`provide_lenses`] call
/// starts one history query for its file (unless history lenses are
/// disabled); all history lenses of that call share it.
///
/// [`provide_lenses`]: LensProvider::provide_lenses
pub struct LensProvider {
    symbols: Arc<dyn SymbolTreeService>,
    references: Arc<dyn ReferenceService>,
    blame: Arc<dyn BlameSource>,
    config: LensConfig,
    clock: fn() -> DateTime<Utc>,
}

impl LensProvider {
    /// Create a provider that fetches history with the configured `git blame`.
    #[must_use]
    pub fn new(
        symbols: Arc<dyn SymbolTreeService>,
        references: Arc<dyn ReferenceService>,
        config: LensConfig,
    ) -> Self {
        let blame = Arc::new(config.blame.git_blame());
        Self {
            symbols,
            references,
            blame,
            config,
            clock: Utc::now,
        }
    }

    /// Replace the history source.
    #[must_use]
    pub fn with_blame_source(mut self, blame: Arc<dyn BlameSource>) -> Self {
        self.blame = blame;
        self
    }

    /// Replace the clock used for relative-time labels.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// The configuration this provider was built with.
    #[must_use]
    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    /// Produce the unresolved lenses for a file.
    ///
    /// The history query is started before the symbol tree is requested and
    /// is not awaited here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `cancel` fires first, `Error::InvalidPath`
    /// if the path cannot be turned into a URI, and `Error::SymbolTree` if the
    /// declaration tree cannot be produced.
    pub async fn provide_lenses(&self, path: &Path, cancel: &CancellationToken) -> Result<Vec<Lens>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let file = Arc::new(SourceFile::new(path)?);
        let history = self
            .config
            .history_lenses
            .then(|| PendingHistory::new(self.blame.blame(file.path())));

        let nodes = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.symbols.symbol_tree(&file) => result.map_err(|source| Error::SymbolTree {
                path: file.path().to_path_buf(),
                source,
            })?,
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let lenses = walker::walk(&nodes, &file, history.as_ref());
        debug!(
            file = %file.path().display(),
            roots = nodes.len(),
            lenses = lenses.len(),
            history = history.is_some(),
            "Produced lenses"
        );
        Ok(lenses)
    }

    /// Resolve one lens.
    ///
    /// On success the returned lens may carry a command; on failure the
    /// caller's lens stays as it was.
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` if `cancel` fires first, otherwise the
    /// error of the lens kind's resolver.
    pub async fn resolve_lens(&self, lens: Lens, cancel: &CancellationToken) -> Result<Lens> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let line = lens.range().start.line;
        let kind = lens.kind().tag();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = resolve::resolve(lens, self.references.as_ref(), (self.clock)()) => result,
        };

        match &result {
            Ok(lens) => trace!(kind, line, label = ?lens.label(), "Resolved lens"),
            Err(e) if e.is_benign() => trace!(kind, line, reason = %e, "Lens left unresolved"),
            Err(e) => debug!(kind, line, error = %e, "Lens resolution failed"),
        }
        result
    }
}
