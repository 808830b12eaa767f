//! JSON-RPC transport over a language server's stdio.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use lsp_types::{
    ClientCapabilities, DidOpenTextDocumentParams, DocumentSymbolClientCapabilities,
    DocumentSymbolParams, DocumentSymbolResponse, InitializeParams, InitializeResult, Location,
    PartialResultParams, Position, ReferenceContext, ReferenceParams,
    TextDocumentClientCapabilities, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, Uri, WindowClientCapabilities, WorkDoneProgressParams,
    WorkspaceFolder,
    notification::{DidOpenTextDocument, Exit, Initialized, Notification},
    request::{DocumentSymbolRequest, Initialize, References, Request, Shutdown},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::Result;
use super::error::LspError;
use super::provider::LspProvider;
use crate::types::path_to_uri;

type Reader = Box<dyn AsyncRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Largest message body accepted from a server.
const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Async client for one language server.
///
/// Requests are strictly sequential: each call writes one request and reads
/// until the matching response arrives.
///
/// Every call may be dropped at an await point without corrupting the
/// stream. Partial frames stay buffered in `inbox` and `outbox` until the
/// next call, and responses to abandoned requests are skipped by id.
pub struct LspClient {
    process: Option<Child>,
    reader: Reader,
    writer: Writer,
    inbox: Vec<u8>,
    outbox: Vec<u8>,
    request_id: i64,
}

impl LspClient {
    /// Start a language server and perform the initialize handshake.
    ///
    /// The server process is killed if the client is dropped without
    /// [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// Returns an error if the executable is not found, the server fails to
    /// start, or the initialize handshake fails.
    ///
    /// # Panics
    ///
    /// Panics if stdin/stdout are not available after spawning the process.
    /// This cannot happen when `Stdio::piped()` is used.
    pub async fn start(provider: &dyn LspProvider, workspace_path: &Path) -> Result<Self> {
        let command = provider.command();
        let args = provider.args();

        debug!(
            command = command,
            args = ?args,
            workspace = %workspace_path.display(),
            "Starting language server"
        );

        let mut process = Command::new(command)
            .args(args)
            .current_dir(workspace_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LspError::launch(command, provider.install_hint(), e))?;

        let stdin = process.stdin.take().expect("stdin was piped");
        let stdout = process.stdout.take().expect("stdout was piped");

        let mut client = Self::from_streams(stdout, stdin);
        client.process = Some(process);

        client
            .initialize(workspace_path, provider.initialize_options())
            .await?;

        Ok(client)
    }

    /// Build a client over existing streams, without a server process.
    #[must_use]
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            process: None,
            reader: Box::new(reader),
            writer: Box::new(writer),
            inbox: Vec::new(),
            outbox: Vec::new(),
            request_id: 0,
        }
    }

    /// Perform the initialize handshake.
    async fn initialize(&mut self, workspace_path: &Path, init_options: Option<Value>) -> Result<()> {
        let workspace_uri =
            path_to_uri(workspace_path).map_err(|e| LspError::InvalidPath(e.to_string()))?;
        let name = workspace_path
            .file_name()
            .map_or_else(|| "workspace".to_string(), |n| n.to_string_lossy().into_owned());

        // Server->client requests are answered with null, which satisfies the
        // progress protocol.
        let capabilities = ClientCapabilities {
            window: Some(WindowClientCapabilities {
                work_done_progress: Some(true),
                ..Default::default()
            }),
            text_document: Some(TextDocumentClientCapabilities {
                document_symbol: Some(DocumentSymbolClientCapabilities {
                    hierarchical_document_symbol_support: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: workspace_uri,
                name,
            }]),
            capabilities,
            initialization_options: init_options,
            ..Default::default()
        };

        let _result: InitializeResult = self
            .send_request::<Initialize>(params)
            .await
            .map_err(|e| LspError::Handshake(e.to_string()))?;

        self.send_notification::<Initialized>(lsp_types::InitializedParams {})
            .await?;

        debug!("Language server initialize handshake complete");
        Ok(())
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or reading fails, the server answers with an
    /// error, or the response ID does not match.
    pub async fn send_request<R>(&mut self, params: R::Params) -> Result<R::Result>
    where
        R: Request,
        R::Params: Serialize,
        R::Result: DeserializeOwned,
    {
        self.request_id += 1;
        let id = self.request_id;

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": R::METHOD,
            "params": params,
        });

        trace!(method = R::METHOD, id = id, "Sending LSP request");

        self.write_message(&request).await?;
        self.read_response(id).await
    }

    /// Send a notification (no response expected).
    ///
    /// # Errors
    ///
    /// Returns an error if the params cannot be serialized or writing fails.
    pub async fn send_notification<N>(&mut self, params: N::Params) -> Result<()>
    where
        N: Notification,
        N::Params: Serialize,
    {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": N::METHOD,
            "params": params,
        });

        trace!(method = N::METHOD, "Sending LSP notification");
        self.write_message(&notification).await
    }

    /// Queue a framed message, then flush everything queued.
    async fn write_message(&mut self, message: &Value) -> Result<()> {
        let body = serde_json::to_vec(message).map_err(LspError::Encode)?;

        trace!(body_len = body.len(), "Writing LSP message");

        self.outbox
            .extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
        self.outbox.extend_from_slice(&body);
        self.flush_outbox().await
    }

    async fn flush_outbox(&mut self) -> Result<()> {
        while !self.outbox.is_empty() {
            let written = self.writer.write(&self.outbox).await?;
            if written == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WriteZero).into());
            }
            self.outbox.drain(..written);
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Read the next framed message.
    async fn read_message(&mut self) -> Result<Value> {
        loop {
            if let Some(body) = take_frame(&mut self.inbox)? {
                return serde_json::from_slice(&body).map_err(LspError::Decode);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = self.reader.read(&mut chunk).await?;
            if read == 0 {
                return Err(LspError::Disconnected);
            }
            self.inbox.extend_from_slice(&chunk[..read]);
        }
    }

    /// Handle a server-initiated message. Returns its method.
    ///
    /// Server requests (method and id) are acknowledged with a null result;
    /// notifications (method only) are skipped.
    async fn handle_server_message(&mut self, message: &Value) -> Result<Option<String>> {
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            return Ok(None);
        };
        let method = method.to_string();

        if let Some(request_id) = message.get("id") {
            trace!(method = %method, "Acknowledging server request");
            let response = json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "result": null,
            });
            self.write_message(&response).await?;
        } else {
            trace!(method = %method, "Skipping LSP notification");
        }

        Ok(Some(method))
    }

    async fn read_response<T: DeserializeOwned>(&mut self, expected_id: i64) -> Result<T> {
        loop {
            let message = self.read_message().await?;

            if self.handle_server_message(&message).await?.is_some() {
                continue;
            }

            trace!(response = %message, "Received LSP response");

            let actual_id = message["id"].as_i64();
            if let Some(actual_id) = actual_id.filter(|&id| id < expected_id) {
                trace!(expected = expected_id, actual = actual_id, "Skipping response to abandoned request");
                continue;
            }

            if let Some(error) = message.get("error") {
                let code = error["code"].as_i64().unwrap_or(-1);
                let text = error["message"].as_str().unwrap_or("unknown error");
                return Err(LspError::Server {
                    code,
                    message: text.into(),
                });
            }

            let actual_id = actual_id.ok_or_else(|| {
                LspError::Framing("response missing 'id' field".to_string())
            })?;

            if actual_id != expected_id {
                return Err(LspError::UnexpectedResponse {
                    expected: expected_id,
                    actual: actual_id,
                });
            }

            let result = message.get("result").cloned().unwrap_or(Value::Null);
            return serde_json::from_value(result).map_err(LspError::Decode);
        }
    }

    /// Notify the server that a document is open.
    ///
    /// Some servers only answer queries about documents they were told about.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails.
    pub async fn did_open(&mut self, uri: &Uri, content: &str, language_id: &str) -> Result<()> {
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: language_id.to_string(),
                version: 1,
                text: content.to_string(),
            },
        };

        self.send_notification::<DidOpenTextDocument>(params).await?;
        trace!(uri = uri.as_str(), "Sent didOpen notification");
        Ok(())
    }

    /// Request the declarations of a document.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails.
    pub async fn document_symbols(&mut self, uri: &Uri) -> Result<Option<DocumentSymbolResponse>> {
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier::new(uri.clone()),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };

        self.send_request::<DocumentSymbolRequest>(params).await
    }

    /// Find references to the symbol at a 0-indexed position.
    ///
    /// `Ok(None)` means the server had no answer for the position.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails.
    pub async fn find_references(
        &mut self,
        uri: &Uri,
        position: Position,
        include_declaration: bool,
    ) -> Result<Option<Vec<Location>>> {
        let params = ReferenceParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier::new(uri.clone()),
                position,
            },
            context: ReferenceContext {
                include_declaration,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };

        self.send_request::<References>(params).await
    }

    /// Wait for the server to finish loading its workspace.
    ///
    /// Watches `$/progress` notifications for a "begin" titled
    /// `Loading workspace` and returns `Ok(true)` at its matching "end".
    /// Returns `Ok(false)` if `timeout` passes first.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails.
    pub async fn wait_for_workspace_load(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut loading_token: Option<String> = None;

        debug!(timeout_secs = timeout.as_secs(), "Waiting for workspace to load");

        loop {
            let Ok(message) = tokio::time::timeout_at(deadline, self.read_message()).await else {
                if loading_token.is_some() {
                    warn!("Timeout waiting for workspace load to complete");
                } else {
                    debug!("Timeout reached without seeing workspace load progress");
                }
                return Ok(false);
            };
            let message = message?;

            if self.handle_server_message(&message).await?.as_deref() != Some("$/progress") {
                continue;
            }

            let params = &message["params"];
            let token = params["token"]
                .as_str()
                .map(String::from)
                .or_else(|| params["token"].as_i64().map(|n| n.to_string()));
            let value = &params["value"];

            match value["kind"].as_str() {
                Some("begin")
                    if value["title"]
                        .as_str()
                        .is_some_and(|t| t.starts_with("Loading workspace")) =>
                {
                    debug!(token = ?token, "Workspace loading started");
                    loading_token = token;
                }
                Some("end") if loading_token.is_some() && token == loading_token => {
                    debug!("Workspace loading completed");
                    return Ok(true);
                }
                _ => {}
            }
        }
    }

    /// Shut the server down with `shutdown` followed by `exit`.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the server fails.
    pub async fn shutdown(mut self) -> Result<()> {
        debug!("Shutting down language server");

        self.send_request::<Shutdown>(()).await?;
        self.send_notification::<Exit>(()).await?;

        if let Some(mut process) = self.process.take() {
            match process.wait().await {
                Ok(status) if !status.success() => {
                    warn!(exit_code = ?status.code(), "Language server exited with non-zero status");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to wait for language server exit"),
            }
        }

        Ok(())
    }
}

/// Remove one complete frame from the front of `buffer` and return its body.
///
/// Returns `Ok(None)` while the headers or the body are still incomplete.
fn take_frame(buffer: &mut Vec<u8>) -> Result<Option<Vec<u8>>> {
    let mut content_length = None;
    let mut cursor = 0;

    loop {
        let Some(offset) = buffer[cursor..].iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let line = &buffer[cursor..cursor + offset];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        cursor += offset + 1;

        if line.is_empty() {
            break;
        }

        let line = std::str::from_utf8(line)
            .map_err(|_| LspError::Framing("header is not UTF-8".to_string()))?;
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let parsed: usize = value.trim().parse().map_err(|_| {
                LspError::Framing(format!("invalid Content-Length: {}", value.trim()))
            })?;
            if parsed > MAX_CONTENT_LENGTH {
                return Err(LspError::Framing(format!(
                    "Content-Length {parsed} exceeds the {MAX_CONTENT_LENGTH} byte limit"
                )));
            }
            content_length = Some(parsed);
        }
    }

    let length = content_length
        .ok_or_else(|| LspError::Framing("missing Content-Length header".to_string()))?;
    if buffer.len() - cursor < length {
        return Ok(None);
    }

    let body = buffer[cursor..cursor + length].to_vec();
    buffer.drain(..cursor + length);
    Ok(Some(body))
}
