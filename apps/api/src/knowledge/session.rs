//! A live MCP session with a subprocess resource provider.
//!
//! Acquired resources are kept on a stack and released in reverse order by one
//! teardown routine. A failed release is logged and the unwind continues.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use serde_json::json;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::knowledge::protocol::{CallToolResult, JsonRpcChannel, PROTOCOL_VERSION};
use crate::knowledge::KnowledgeError;

type StdioChannel = JsonRpcChannel<ChildStdin, BufReader<ChildStdout>>;

const READ_FILE_TOOL: &str = "read_file";

enum SessionResource {
    Process(Child),
    Channel(StdioChannel),
}

impl SessionResource {
    fn name(&self) -> &'static str {
        match self {
            SessionResource::Process(_) => "process",
            SessionResource::Channel(_) => "channel",
        }
    }

    async fn release(self) -> std::io::Result<()> {
        match self {
            SessionResource::Channel(mut channel) => channel.shutdown().await,
            SessionResource::Process(mut child) => {
                if child.try_wait()?.is_none() {
                    child.kill().await?;
                }
                Ok(())
            }
        }
    }
}

pub struct McpSession {
    resources: Vec<SessionResource>,
}

impl McpSession {
    /// Spawns the provider, opens the stdio channel, and performs the handshake.
    /// Anything acquired before a failure is released before the error returns.
    pub async fn connect(command: &str, args: &[String]) -> Result<Self, KnowledgeError> {
        let mut session = Self {
            resources: Vec::new(),
        };
        match session.establish(command, args).await {
            Ok(()) => {
                info!(command, "MCP session established");
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn establish(&mut self, command: &str, args: &[String]) -> Result<(), KnowledgeError> {
        debug!(command, ?args, "Spawning MCP server");
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| KnowledgeError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        self.resources.push(SessionResource::Process(child));

        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            return Err(KnowledgeError::ChannelClosed);
        };
        self.resources.push(SessionResource::Channel(JsonRpcChannel::new(
            stdin,
            BufReader::new(stdout),
        )));

        let channel = self.channel()?;
        let init = channel
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
            .await?;
        debug!(server = %init["serverInfo"], "MCP initialize acknowledged");
        channel.notify("notifications/initialized").await
    }

    fn channel(&mut self) -> Result<&mut StdioChannel, KnowledgeError> {
        self.resources
            .iter_mut()
            .rev()
            .find_map(|r| match r {
                SessionResource::Channel(channel) => Some(channel),
                SessionResource::Process(_) => None,
            })
            .ok_or(KnowledgeError::ChannelClosed)
    }

    /// Reads a file through the provider's `read_file` tool.
    pub async fn read_file(&mut self, path: &Path) -> Result<String, KnowledgeError> {
        let result = self
            .channel()?
            .request(
                "tools/call",
                json!({
                    "name": READ_FILE_TOOL,
                    "arguments": { "path": path.display().to_string() },
                }),
            )
            .await?;
        serde_json::from_value::<CallToolResult>(result)?.into_text()
    }

    /// Releases every resource, most recently acquired first.
    pub async fn close(self) {
        release_in_reverse(self.resources, |resource| async move {
            let name = resource.name();
            (name, resource.release().await)
        })
        .await;
    }
}

/// Pops and releases `resources` until the stack is empty. Returns how many
/// releases failed.
async fn release_in_reverse<T, F, Fut>(mut resources: Vec<T>, mut release: F) -> usize
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = (&'static str, std::io::Result<()>)>,
{
    let mut failures = 0;
    while let Some(resource) = resources.pop() {
        match release(resource).await {
            (name, Ok(())) => debug!(resource = name, "MCP session resource released"),
            (name, Err(e)) => {
                failures += 1;
                warn!(resource = name, "Ignoring MCP teardown error: {e}");
            }
        }
    }
    failures
}


#[cfg(all(test, unix))]
mod process_tests {
    use super::*;
    use std::time::Duration;

    // Records its pid, answers `initialize`, then echoes a text result per request.
    const ECHO_SERVER: &str = r#"echo $$ > "$1"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"ok"}]}}\n' "$id"
done
"#;

    // Records its pid, rejects `initialize`, then stays alive.
    const REJECTING_SERVER: &str = r#"echo $$ > "$1"
read -r line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"not ready"}}'
sleep 60
"#;

    fn server_args(dir: &tempfile::TempDir, script: &str) -> Vec<String> {
        let script_path = dir.path().join("server.sh");
        std::fs::write(&script_path, script).unwrap();
        vec![
            script_path.display().to_string(),
            dir.path().join("pid").display().to_string(),
        ]
    }

    async fn recorded_pid(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("pid");
        for _ in 0..50 {
            if let Ok(pid) = std::fs::read_to_string(&path) {
                if !pid.trim().is_empty() {
                    return pid.trim().to_string();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server never recorded its pid");
    }

    fn is_running(pid: &str) -> bool {
        std::process::Command::new("sh")
            .args(["-c", "kill -0 \"$1\" 2>/dev/null", "sh", pid])
            .status()
            .unwrap()
            .success()
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let err = McpSession::connect("cv-tailor-no-such-mcp-server", &[])
            .await
            .err()
            .unwrap();
        assert!(matches!(err, KnowledgeError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_handshake_failure_unwinds() {
        // exits without answering `initialize`
        let args = vec!["-c".to_string(), "exit 0".to_string()];
        let err = McpSession::connect("sh", &args).await.err().unwrap();
        assert!(matches!(
            err,
            KnowledgeError::ChannelClosed | KnowledgeError::Io(_)
        ));
    }

    #[tokio::test]
    async fn test_rejected_handshake_kills_server() {
        let dir = tempfile::tempdir().unwrap();
        let args = server_args(&dir, REJECTING_SERVER);

        let err = McpSession::connect("sh", &args).await.err().unwrap();
        assert!(matches!(err, KnowledgeError::Rpc { code: -32603, .. }));
        assert!(!is_running(&recorded_pid(&dir).await));
    }

    #[tokio::test]
    async fn test_close_stops_live_server() {
        let dir = tempfile::tempdir().unwrap();
        let args = server_args(&dir, ECHO_SERVER);

        let mut session = McpSession::connect("sh", &args).await.unwrap();
        assert_eq!(session.read_file(Path::new("/kb/ats_tips.md")).await.unwrap(), "ok");
        let pid = recorded_pid(&dir).await;
        assert!(is_running(&pid));

        session.close().await;
        assert!(!is_running(&pid));
    }
}
