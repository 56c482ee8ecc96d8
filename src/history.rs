//! File-backed chat history. Each session is one pretty-printed JSON file
//! under the sessions directory, named `session_<id>.json`. Writes go
//! through a temp file and rename so a crash never leaves a half-written
//! log behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MAX_SESSION_ID_LENGTH: usize = 128;
const SESSION_FILE_PREFIX: &str = "session_";
const SESSION_FILE_SUFFIX: &str = ".json";

/// Who spoke a chat turn. Serialized lowercase to match the shape AI chat
/// APIs expect, so stored turns can be replayed as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One chat turn. Per-session sequences are append-only and keep arrival
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatTurn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// On-disk shape of one session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionData {
    session_id: String,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    message_count: usize,
    messages: Vec<ChatTurn>,
}

/// Session metadata without the messages, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

/// Session ids become file names, so only a conservative character set is
/// accepted.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn validate_session_id(id: &str) -> Result<()> {
    if !is_valid_session_id(id) {
        bail!(
            "invalid session id (1-{MAX_SESSION_ID_LENGTH} chars, alphanumeric plus '-' and '_')"
        );
    }
    Ok(())
}

/// The chat log store rooted at one sessions directory.
#[derive(Debug, Clone)]
pub struct ChatStore {
    dir: PathBuf,
}

impl ChatStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create sessions directory: {}", dir.display()))?;
        debug!(dir = %dir.display(), "chat store ready");
        Ok(ChatStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{SESSION_FILE_PREFIX}{id}{SESSION_FILE_SUFFIX}"))
    }

    fn read_session(&self, id: &str) -> Result<Option<SessionData>> {
        let path = self.session_path(id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read session file: {}", path.display()))
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .with_context(|| format!("corrupted session file: {}", path.display()))
    }

    fn write_session(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path(&data.session_id);
        let tmp = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(data).context("failed to serialize session")?;
        fs::write(&tmp, text)
            .with_context(|| format!("failed to write session file: {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace session file: {}", path.display()))
    }

    /// Append one turn to a session, creating the session file on first
    /// use. `created_at` survives rewrites; an unreadable existing file is
    /// logged and replaced by a fresh log rather than blocking the chat.
    pub fn append(&self, id: &str, role: Role, content: &str) -> Result<()> {
        validate_session_id(id)?;
        let now = Utc::now();
        let mut data = match self.read_session(id) {
            Ok(Some(data)) => data,
            Ok(None) => new_session(id, now),
            Err(e) => {
                warn!(session_id = id, error = %e, "unreadable session file, starting a fresh log");
                new_session(id, now)
            }
        };
        data.messages.push(ChatTurn {
            role,
            content: content.to_string(),
            timestamp: now,
        });
        data.message_count = data.messages.len();
        data.last_updated = now;
        self.write_session(&data)
    }

    /// All turns of a session in arrival order; a session that has never
    /// spoken is just empty.
    pub fn load(&self, id: &str) -> Result<Vec<ChatTurn>> {
        validate_session_id(id)?;
        Ok(self
            .read_session(id)?
            .map(|data| data.messages)
            .unwrap_or_default())
    }

    pub fn session_info(&self, id: &str) -> Result<Option<SessionInfo>> {
        validate_session_id(id)?;
        Ok(self.read_session(id)?.map(|data| SessionInfo {
            session_id: data.session_id,
            created_at: data.created_at,
            last_updated: data.last_updated,
            message_count: data.message_count,
        }))
    }

    /// Delete a session's log. Returns whether a file existed.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        validate_session_id(id)?;
        let path = self.session_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("failed to delete session file: {}", path.display()))
            }
        }
    }

    /// Session metadata for every stored session, newest activity first.
    /// Unreadable files are skipped with a warning so one corrupt log never
    /// hides the rest.
    pub fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to list sessions directory: {}", self.dir.display())
                })
            }
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.context("failed to read sessions directory entry")?;
            let name = entry.file_name();
            let Some(id) = session_id_from_file_name(&name.to_string_lossy()) else {
                continue;
            };
            match self.session_info(&id) {
                Ok(Some(info)) => sessions.push(info),
                Ok(None) => {}
                Err(e) => warn!(session_id = %id, error = %e, "skipping unreadable session file"),
            }
        }
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(sessions)
    }

    /// Remove session files whose last modification is older than `days`
    /// days. Returns how many were removed.
    pub fn cleanup_older_than(&self, days: u64) -> Result<usize> {
        let cutoff = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to list sessions directory: {}", self.dir.display())
                })
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.context("failed to read sessions directory entry")?;
            let name = entry.file_name();
            if session_id_from_file_name(&name.to_string_lossy()).is_none() {
                continue;
            }
            let Ok(modified) = entry.metadata().and_then(|meta| meta.modified()) else {
                continue;
            };
            if modified < cutoff {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(file = %entry.path().display(), error = %e, "failed to remove stale session file")
                    }
                }
            }
        }
        Ok(removed)
    }
}

fn new_session(id: &str, now: DateTime<Utc>) -> SessionData {
    SessionData {
        session_id: id.to_string(),
        created_at: now,
        last_updated: now,
        message_count: 0,
        messages: Vec::new(),
    }
}

fn session_id_from_file_name(name: &str) -> Option<String> {
    name.strip_prefix(SESSION_FILE_PREFIX)?
        .strip_suffix(SESSION_FILE_SUFFIX)
        .map(str::to_string)
}
