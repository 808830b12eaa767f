//! Language servers that can answer symbol and reference queries.

use serde_json::Value;

use crate::types::Language;

/// How to launch a language server and what to expect from it.
///
/// # Example
///
/// ```rust
/// use codelens::lsp::LspProvider;
///
/// struct Pyright;
///
/// impl LspProvider for Pyright {
///     fn command(&self) -> &str { "pyright-langserver" }
///     fn args(&self) -> &[&str] { &["--stdio"] }
/// }
/// ```
pub trait LspProvider: Send + Sync {
    /// Executable to spawn.
    fn command(&self) -> &str;

    /// Command-line arguments.
    fn args(&self) -> &[&str] {
        &[]
    }

    /// `initializationOptions` for the initialize request.
    fn initialize_options(&self) -> Option<Value> {
        None
    }

    /// Shown when the executable is missing.
    fn install_hint(&self) -> &str {
        "Install the language server and make sure it is on PATH."
    }

    /// Whether reference answers are incomplete until the server reports the
    /// end of its workspace load.
    fn loads_workspace(&self) -> bool {
        false
    }
}

/// The built-in server for one of the supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageServer {
    language: Language,
    command: &'static str,
    install_hint: &'static str,
    loads_workspace: bool,
}

const RUST_ANALYZER: LanguageServer = LanguageServer {
    language: Language::Rust,
    command: "rust-analyzer",
    install_hint: "Install rust-analyzer: rustup component add rust-analyzer",
    loads_workspace: false,
};

// csharp-ls answers with empty results while the solution is still loading.
const CSHARP_LS: LanguageServer = LanguageServer {
    language: Language::CSharp,
    command: "csharp-ls",
    install_hint: "Install csharp-ls: dotnet tool install --global csharp-ls",
    loads_workspace: true,
};

impl LanguageServer {
    /// The server used for `language`.
    #[must_use]
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Rust => RUST_ANALYZER,
            Language::CSharp => CSHARP_LS,
        }
    }

    /// Language this server is used for.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }
}

impl LspProvider for LanguageServer {
    fn command(&self) -> &str {
        self.command
    }

    fn install_hint(&self) -> &str {
        self.install_hint
    }

    fn loads_workspace(&self) -> bool {
        self.loads_workspace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::rust(Language::Rust, "rust-analyzer", false)]
    #[case::csharp(Language::CSharp, "csharp-ls", true)]
    fn each_language_has_a_server(
        #[case] language: Language,
        #[case] command: &str,
        #[case] loads_workspace: bool,
    ) {
        let server = LanguageServer::for_language(language);

        assert_eq!(server.language(), language);
        assert_eq!(server.command(), command);
        assert_eq!(server.loads_workspace(), loads_workspace);
        assert!(server.install_hint().contains(command));
        assert!(server.args().is_empty());
        assert!(server.initialize_options().is_none());
    }

    #[test]
    fn custom_providers_get_defaults() {
        struct Custom;
        impl LspProvider for Custom {
            fn command(&self) -> &str {
                "custom-ls"
            }
        }

        assert!(Custom.args().is_empty());
        assert!(!Custom.loads_workspace());
        assert!(Custom.install_hint().contains("PATH"));
    }
}
