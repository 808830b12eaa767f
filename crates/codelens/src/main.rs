//! Codelens CLI - history and usage lenses from the command line.
//!
//! Lists the lenses a file's declarations would carry in an editor, and
//! optionally resolves them to their labels.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Codelens: git-blame and reference annotations for declarations.
#[derive(Parser)]
#[command(name = "codelens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to the nearest .codelens.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the lenses of a source file
    Lenses {
        /// Source file (.rs or .cs)
        file: PathBuf,

        /// Resolve every lens to its label
        #[arg(short, long)]
        resolve: bool,

        /// Use a language server for symbols and references
        #[arg(long)]
        lsp: bool,

        /// Skip history lenses (no git subprocess is started)
        #[arg(long)]
        no_history: bool,

        /// Print the lenses as JSON code lenses
        #[arg(long)]
        json: bool,
    },

    /// Show the change record of every line in a file
    Blame {
        /// File to attribute
        file: PathBuf,

        /// Treat any stderr output from git as a failure
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Lenses {
            file,
            resolve,
            lsp,
            no_history,
            json,
        } => {
            let options = cli::lenses::Options {
                resolve,
                lsp,
                no_history,
                json,
                verbose: cli.verbose > 0,
            };
            cli::lenses::run(&file, config, options).await
        }
        Commands::Blame { file, strict } => cli::blame::run(&file, config, strict).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
