//! Newline-delimited JSON-RPC 2.0 framing, as spoken by MCP servers over stdio.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

use crate::knowledge::KnowledgeError;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    jsonrpc: &'static str,
    method: &'a str,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: Option<Value>,
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Result of an MCP `tools/call`.
#[derive(Debug, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

#[derive(Debug, Deserialize)]
struct ToolContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl CallToolResult {
    /// Concatenated text items. Tool errors and text-less results are failures.
    pub fn into_text(self) -> Result<String, KnowledgeError> {
        let text: Vec<String> = self
            .content
            .into_iter()
            .filter(|c| c.kind == "text")
            .filter_map(|c| c.text)
            .collect();
        if self.is_error {
            return Err(KnowledgeError::Tool(text.join(" ")));
        }
        if text.is_empty() {
            return Err(KnowledgeError::EmptyContent);
        }
        Ok(text.concat())
    }
}

/// A request/response channel over a byte stream pair.
///
/// Requests are answered in order of the caller's awaits; callers must not
/// interleave requests on one channel.
pub struct JsonRpcChannel<W, R> {
    writer: W,
    reader: Lines<R>,
    next_id: u64,
}

impl<W, R> JsonRpcChannel<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    pub fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            reader: reader.lines(),
            next_id: 1,
        }
    }

    /// Sends a request and waits for the response carrying the same id.
    /// Messages with other ids and server notifications are skipped.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value, KnowledgeError> {
        let id = self.next_id;
        self.next_id += 1;

        self.send(&Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        })
        .await?;

        loop {
            let line = self
                .reader
                .next_line()
                .await?
                .ok_or(KnowledgeError::ChannelClosed)?;
            if line.trim().is_empty() {
                continue;
            }

            let response: Response = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    debug!("Skipping non JSON-RPC line from MCP server: {e}");
                    continue;
                }
            };
            if response.id.as_ref().and_then(Value::as_u64) != Some(id) {
                continue;
            }

            if let Some(error) = response.error {
                return Err(KnowledgeError::Rpc {
                    code: error.code,
                    message: error.message,
                });
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }
    }

    pub async fn notify(&mut self, method: &str) -> Result<(), KnowledgeError> {
        self.send(&Notification {
            jsonrpc: JSONRPC_VERSION,
            method,
        })
        .await
    }

    /// Closes the write half so the server sees end-of-input.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.writer.shutdown().await
    }

    async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), KnowledgeError> {
        let mut frame = serde_json::to_vec(message)?;
        frame.push(b'\n');
        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
