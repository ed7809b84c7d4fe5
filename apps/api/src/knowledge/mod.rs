//! Knowledge Access Layer: named reference documents, read through a long-lived
//! MCP session when possible and straight from disk otherwise.
//!
//! The layer degrades once. The first session failure (spawn, handshake or
//! read) tears the session down and every later read goes to local storage for
//! the rest of the process lifetime.

pub mod protocol;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::knowledge::session::McpSession;

const FILESYSTEM_SCHEME: &str = "filesystem";
const DEFAULT_ROOT: &str = "kb";
const DEFAULT_SERVER_COMMAND: &str = "mcp-server-filesystem";

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Unsupported knowledge base scheme: {0}")]
    UnsupportedScheme(String),

    #[error("MCP command is empty")]
    EmptyCommand,

    #[error("Failed to spawn MCP server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MCP JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MCP server error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("MCP tool reported an error: {0}")]
    Tool(String),

    #[error("MCP tool returned no text content")]
    EmptyContent,

    #[error("MCP channel closed")]
    ChannelClosed,
}

/// Reference documents the pipeline consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KbTopic {
    AtsTips,
    CvBestPractices,
    BulletExamples,
}

impl KbTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            KbTopic::AtsTips => "ats_tips",
            KbTopic::CvBestPractices => "cv_best_practices",
            KbTopic::BulletExamples => "bullet_examples",
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            KbTopic::AtsTips => "ats_tips.md",
            KbTopic::CvBestPractices => "cv_best_practices.md",
            KbTopic::BulletExamples => "bullet_examples.md",
        }
    }
}

#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// `filesystem://<path>` or a bare path.
    pub server_uri: String,
    pub enabled: bool,
    /// Provider command line. Defaults to the filesystem server rooted at the
    /// knowledge base directory.
    pub command: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeMode {
    Enabled,
    SessionActive,
    DegradedToStorage,
}

enum LayerState {
    Enabled,
    SessionActive(McpSession),
    DegradedToStorage,
}

impl KnowledgeMode {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => KnowledgeMode::Enabled,
            1 => KnowledgeMode::SessionActive,
            _ => KnowledgeMode::DegradedToStorage,
        }
    }
}

impl LayerState {
    fn mode(&self) -> KnowledgeMode {
        match self {
            LayerState::Enabled => KnowledgeMode::Enabled,
            LayerState::SessionActive(_) => KnowledgeMode::SessionActive,
            LayerState::DegradedToStorage => KnowledgeMode::DegradedToStorage,
        }
    }
}

pub struct KnowledgeBase {
    root: PathBuf,
    command: String,
    args: Vec<String>,
    // Guards establishment and every session read: the stdio channel cannot
    // carry interleaved requests.
    state: Mutex<LayerState>,
    // Mirror of `state.mode()`, readable while a session call holds the lock.
    mode: AtomicU8,
}

impl KnowledgeBase {
    pub fn new(config: &KnowledgeConfig) -> Result<Self, KnowledgeError> {
        let root = resolve_root(&config.server_uri)?;

        let (command, args) = match config.command.as_deref() {
            Some(line) => {
                let mut parts = line.split_whitespace().map(str::to_string);
                let command = parts.next().ok_or(KnowledgeError::EmptyCommand)?;
                (command, parts.collect())
            }
            None => (
                DEFAULT_SERVER_COMMAND.to_string(),
                vec![root.display().to_string()],
            ),
        };

        let state = if config.enabled {
            LayerState::Enabled
        } else {
            info!("MCP disabled, reading knowledge base from disk");
            LayerState::DegradedToStorage
        };

        Ok(Self {
            root,
            command,
            args,
            mode: AtomicU8::new(state.mode() as u8),
            state: Mutex::new(state),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current mode. Never waits on an in-flight session call.
    pub fn mode(&self) -> KnowledgeMode {
        KnowledgeMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    fn publish(&self, state: &LayerState) {
        self.mode.store(state.mode() as u8, Ordering::Release);
    }

    /// Text of a reference document, or an empty string when the document
    /// does not exist. Never fails.
    pub async fn get_text(&self, topic: KbTopic) -> String {
        let path = self.root.join(topic.filename());
        if tokio::fs::metadata(&path).await.is_err() {
            debug!(topic = topic.as_str(), path = %path.display(), "Knowledge document not found");
            return String::new();
        }

        if let Some(text) = self.read_via_session(topic, &path).await {
            return text;
        }
        read_from_disk(topic, &path).await
    }

    async fn read_via_session(&self, topic: KbTopic, path: &Path) -> Option<String> {
        let mut state = self.state.lock().await;

        if let LayerState::Enabled = *state {
            match McpSession::connect(&self.command, &self.args).await {
                Ok(session) => {
                    *state = LayerState::SessionActive(session);
                    self.publish(&state);
                }
                Err(e) => {
                    warn!("MCP session unavailable, falling back to disk for good: {e}");
                    *state = LayerState::DegradedToStorage;
                    self.publish(&state);
                    return None;
                }
            }
        }

        let LayerState::SessionActive(session) = &mut *state else {
            return None;
        };
        let result = session.read_file(path).await;
        match result {
            Ok(text) => {
                debug!(topic = topic.as_str(), "Knowledge document read via MCP");
                Some(text)
            }
            Err(e) => {
                warn!(
                    topic = topic.as_str(),
                    "MCP read failed, falling back to disk for good: {e}"
                );
                degrade(&mut state).await;
                self.publish(&state);
                None
            }
        }
    }

    /// Tears down an active session. The layer stays enabled.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, LayerState::Enabled) {
            LayerState::SessionActive(session) => {
                session.close().await;
                info!("MCP session closed");
            }
            other => *state = other,
        }
        self.publish(&state);
    }
}

async fn degrade(state: &mut LayerState) {
    if let LayerState::SessionActive(session) =
        std::mem::replace(state, LayerState::DegradedToStorage)
    {
        session.close().await;
    }
}

async fn read_from_disk(topic: KbTopic, path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(topic = topic.as_str(), "Failed to read knowledge document: {e}");
            String::new()
        }
    }
}

/// Splits `scheme:rest` when the prefix is a URI scheme. Single letters are
/// left alone so `C:\kb` stays a path.
fn split_scheme(uri: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = uri.split_once(':')?;
    let mut chars = scheme.chars();
    let is_scheme = scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then_some((scheme, rest))
}

fn resolve_root(uri: &str) -> Result<PathBuf, KnowledgeError> {
    let uri = uri.trim();
    let location = match split_scheme(uri) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(FILESYSTEM_SCHEME) => {
            rest.strip_prefix("//").unwrap_or(rest)
        }
        Some((scheme, _)) => return Err(KnowledgeError::UnsupportedScheme(scheme.to_string())),
        None => uri,
    };
    let location = match location.trim() {
        "" => DEFAULT_ROOT,
        trimmed => trimmed,
    };

    let path = PathBuf::from(location);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn kb_with_tips(text: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ats_tips.md"), text).unwrap();
        dir
    }

    fn config(dir: &TempDir, enabled: bool, command: Option<String>) -> KnowledgeConfig {
        KnowledgeConfig {
            server_uri: format!("filesystem://{}", dir.path().display()),
            enabled,
            command,
        }
    }

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let dir = kb_with_tips("tips");
        let kb = KnowledgeBase::new(&config(&dir, true, Some("cv-tailor-no-such-mcp-server".into())))
            .unwrap();
        assert_eq!(kb.get_text(KbTopic::BulletExamples).await, "");
        // no session attempt for a missing document
        assert_eq!(kb.mode(), KnowledgeMode::Enabled);
    }

    #[tokio::test]
    async fn test_disabled_layer_reads_from_disk() {
        let dir = kb_with_tips("Use standard headings.");
        let kb = KnowledgeBase::new(&config(&dir, false, None)).unwrap();
        assert_eq!(kb.get_text(KbTopic::AtsTips).await, "Use standard headings.");
        assert_eq!(kb.mode(), KnowledgeMode::DegradedToStorage);
    }

    #[tokio::test]
    async fn test_spawn_failure_degrades_to_disk() {
        let dir = kb_with_tips("from disk");
        let kb = KnowledgeBase::new(&config(&dir, true, Some("cv-tailor-no-such-mcp-server".into())))
            .unwrap();
        assert_eq!(kb.get_text(KbTopic::AtsTips).await, "from disk");
        assert_eq!(kb.mode(), KnowledgeMode::DegradedToStorage);
        assert_eq!(kb.get_text(KbTopic::AtsTips).await, "from disk");
    }

    #[test]
    fn test_unsupported_scheme_is_rejected() {
        for (uri, scheme) in [
            ("s3://bucket/kb", "s3"),
            ("s3:bucket/kb", "s3"),
            ("http:kb", "http"),
            ("git+ssh://host/kb", "git+ssh"),
        ] {
            let cfg = KnowledgeConfig {
                server_uri: uri.into(),
                enabled: true,
                command: None,
            };
            assert!(
                matches!(
                    KnowledgeBase::new(&cfg),
                    Err(KnowledgeError::UnsupportedScheme(s)) if s == scheme
                ),
                "{uri}"
            );
        }
    }

    #[test]
    fn test_filesystem_scheme_and_plain_paths_are_accepted() {
        assert_eq!(resolve_root("filesystem:///srv/kb").unwrap(), Path::new("/srv/kb"));
        assert_eq!(resolve_root("FILESYSTEM:/srv/kb").unwrap(), Path::new("/srv/kb"));
        assert_eq!(resolve_root("/srv/kb").unwrap(), Path::new("/srv/kb"));
        assert!(resolve_root("C:/kb").unwrap().ends_with("C:/kb"));
    }

    #[tokio::test]
    async fn test_mode_is_readable_while_session_lock_is_held() {
        let dir = kb_with_tips("tips");
        let kb = KnowledgeBase::new(&config(&dir, true, Some("cv-tailor-no-such-mcp-server".into())))
            .unwrap();
        let _busy = kb.state.lock().await;
        assert_eq!(kb.mode(), KnowledgeMode::Enabled);
    }

    #[test]
    fn test_root_and_default_command() {
        let kb = KnowledgeBase::new(&KnowledgeConfig {
            server_uri: "/srv/kb".into(),
            enabled: true,
            command: None,
        })
        .unwrap();
        assert_eq!(kb.root(), Path::new("/srv/kb"));
        assert_eq!(kb.command, "mcp-server-filesystem");
        assert_eq!(kb.args, vec!["/srv/kb".to_string()]);

        let relative = resolve_root("filesystem://").unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("kb"));

        let blank = KnowledgeBase::new(&KnowledgeConfig {
            server_uri: "/srv/kb".into(),
            enabled: true,
            command: Some("   ".into()),
        });
        assert!(matches!(blank, Err(KnowledgeError::EmptyCommand)));
    }

    #[cfg(unix)]
    mod scripted_server {
        use super::*;

        // Answers every request with a fixed text result and counts its launches.
        const ECHO_SERVER: &str = r#"echo started >> "$1"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"from session"}]}}\n' "$id"
done
"#;

        // Completes the handshake but reports every tool call as failed.
        const DENYING_SERVER: &str = r#"echo started >> "$1"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"Access denied"}],"isError":true}}\n' "$id"
done
"#;

        const CRASHING_SERVER: &str = "echo started >> \"$1\"\nexit 1\n";

        fn scripted_kb(dir: &TempDir, script: &str) -> KnowledgeBase {
            let script_path = dir.path().join("server.sh");
            std::fs::write(&script_path, script).unwrap();
            let command = format!(
                "sh {} {}",
                script_path.display(),
                dir.path().join("launches").display()
            );
            KnowledgeBase::new(&config(dir, true, Some(command))).unwrap()
        }

        fn launches(dir: &TempDir) -> usize {
            std::fs::read_to_string(dir.path().join("launches"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        #[tokio::test]
        async fn test_session_serves_documents() {
            let dir = kb_with_tips("from disk");
            std::fs::write(dir.path().join("cv_best_practices.md"), "also disk").unwrap();
            let kb = scripted_kb(&dir, ECHO_SERVER);

            let (tips, practices) = tokio::join!(
                kb.get_text(KbTopic::AtsTips),
                kb.get_text(KbTopic::CvBestPractices)
            );
            assert_eq!(tips, "from session");
            assert_eq!(practices, "from session");
            assert_eq!(kb.mode(), KnowledgeMode::SessionActive);
            assert_eq!(launches(&dir), 1);

            kb.close().await;
            assert_eq!(kb.mode(), KnowledgeMode::Enabled);
        }

        #[tokio::test]
        async fn test_tool_error_degrades_once() {
            let dir = kb_with_tips("from disk");
            let kb = scripted_kb(&dir, DENYING_SERVER);

            assert_eq!(kb.get_text(KbTopic::AtsTips).await, "from disk");
            assert_eq!(kb.mode(), KnowledgeMode::DegradedToStorage);
            assert_eq!(kb.get_text(KbTopic::AtsTips).await, "from disk");
            assert_eq!(launches(&dir), 1);
        }

        #[tokio::test]
        async fn test_crashed_server_is_never_relaunched() {
            let dir = kb_with_tips("from disk");
            let kb = scripted_kb(&dir, CRASHING_SERVER);

            for _ in 0..3 {
                assert_eq!(kb.get_text(KbTopic::AtsTips).await, "from disk");
            }
            assert_eq!(kb.mode(), KnowledgeMode::DegradedToStorage);
            assert_eq!(launches(&dir), 1);
        }
    }
}
