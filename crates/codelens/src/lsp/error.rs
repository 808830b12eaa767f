//! Error types for language-server communication.

use thiserror::Error;

/// Failures of a language-server session.
#[derive(Debug, Error)]
pub enum LspError {
    /// The server executable is not installed.
    #[error(
        "{command} not found\n\nReference counts need a language server.\n{install_hint}\n\nTo produce lenses without one, omit the --lsp flag."
    )]
    NotInstalled {
        /// Executable that was looked up.
        command: String,
        /// How to install it.
        install_hint: String,
    },

    /// The server process could not be started.
    #[error("failed to launch '{command}': {source}")]
    Launch {
        /// Executable that was launched.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the server failed.
    #[error("language server I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An outgoing message could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// An incoming message could not be decoded.
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A message was not framed as `Content-Length: N\r\n\r\n{json}`.
    #[error("bad message framing: {0}")]
    Framing(String),

    /// A workspace or document path has no `file://` form.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The server answered a request with a JSON-RPC error.
    #[error("server error {code}: {message}")]
    Server {
        /// JSON-RPC error code.
        code: i64,
        /// Server-provided message.
        message: String,
    },

    /// A response arrived for a request other than the one in flight.
    #[error("expected response {expected}, got {actual}")]
    UnexpectedResponse {
        /// Id of the request in flight.
        expected: i64,
        /// Id carried by the response.
        actual: i64,
    },

    /// The server closed its output stream.
    #[error("language server disconnected")]
    Disconnected,

    /// The initialize exchange did not complete.
    #[error("initialize failed: {0}")]
    Handshake(String),
}

impl LspError {
    /// Classify a spawn failure: a missing executable gets an install hint.
    #[must_use]
    pub fn launch(command: &str, install_hint: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotInstalled {
                command: command.to_string(),
                install_hint: install_hint.to_string(),
            }
        } else {
            Self::Launch {
                command: command.to_string(),
                source,
            }
        }
    }
}
