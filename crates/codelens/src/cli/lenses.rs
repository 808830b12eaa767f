//! List (and optionally resolve) the lenses of a file.

use std::path::Path;
use std::sync::Arc;

use codelens::lsp::{LspServices, find_workspace_root};
use codelens::{
    Error, Language, LensProvider, NoReferences, QueryError, SourceFile, TreeSitterSymbols,
};
use colored::Colorize;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::display::{LensRow, print_lens_rows};

/// Flags of the `lenses` command.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    pub resolve: bool,
    pub lsp: bool,
    pub no_history: bool,
    pub json: bool,
    pub verbose: bool,
}

/// Run the lenses command.
pub async fn run(path: &Path, config: Option<&Path>, options: Options) -> Result<(), Error> {
    let file = SourceFile::new(path)?;
    let mut config = super::load_config(&file, config).await?;
    if options.no_history {
        config.history_lenses = false;
    }

    let services = if options.lsp {
        Some(Arc::new(start_language_server(&file).await?))
    } else {
        None
    };

    let provider = match &services {
        Some(server) => LensProvider::new(server.clone(), server.clone(), config),
        None => LensProvider::new(Arc::new(TreeSitterSymbols), Arc::new(NoReferences), config),
    };

    let cancel = CancellationToken::new();
    let lenses = provider.provide_lenses(file.path(), &cancel).await?;

    let rows: Vec<LensRow> = if options.resolve {
        join_all(lenses.into_iter().map(|lens| {
            let provider = &provider;
            let cancel = &cancel;
            async move {
                let unresolved = lens.clone();
                match provider.resolve_lens(lens, cancel).await {
                    Ok(resolved) => LensRow::resolved(resolved),
                    Err(e) => LensRow::failed(unresolved, &e),
                }
            }
        }))
        .await
    } else {
        lenses.into_iter().map(LensRow::pending).collect()
    };

    if options.json {
        let code_lenses: Vec<_> = rows.iter().map(|row| row.lens.to_code_lens()).collect();
        serde_json::to_writer_pretty(std::io::stdout().lock(), &code_lenses)
            .map_err(std::io::Error::from)?;
        println!();
    } else {
        println!(
            "{} {}",
            "Lenses for".cyan().bold(),
            file.path().display().to_string().white().bold()
        );
        println!();
        print_lens_rows(&rows, options.verbose);
    }

    drop(provider);
    if let Some(server) = services {
        shutdown_language_server(server).await;
    }

    Ok(())
}

async fn start_language_server(file: &SourceFile) -> Result<LspServices, Error> {
    let language = Language::from_path(file.path()).ok_or_else(|| Error::SymbolTree {
        path: file.path().to_path_buf(),
        source: QueryError::UnsupportedLanguage(file.path().display().to_string()),
    })?;
    let workspace = find_workspace_root(file.directory());

    LspServices::start(language, &workspace)
        .await
        .map_err(|e| Error::SymbolTree {
            path: file.path().to_path_buf(),
            source: QueryError::Lsp(e),
        })
}

async fn shutdown_language_server(server: Arc<LspServices>) {
    match Arc::try_unwrap(server) {
        Ok(server) => {
            if let Err(e) = server.shutdown().await {
                warn!(error = %e, "Language server did not shut down cleanly");
            }
        }
        // Still shared; the process is killed when the last handle drops.
        Err(_) => warn!("Language server still in use at exit"),
    }
}
