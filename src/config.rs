//! Runtime configuration, merged from CLI flags and environment variables.
//! Flags win over the environment, the environment wins over defaults. A
//! missing API key is not an error; the server starts and serves local
//! answers, with a canned apology where the fallback would have run.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::fallback::{DEFAULT_API_URL, DEFAULT_MODEL};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";

const DEFAULT_REFERER: &str = "https://juniperhillschool.in";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Directory with `school_data.json` and `conclave_data.json`; `None`
    /// uses the bundled knowledge.
    pub data_dir: Option<PathBuf>,
    pub sessions_dir: PathBuf,
    pub log_file: Option<String>,
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub referer: String,
}

impl Config {
    pub fn resolve(
        port: Option<u16>,
        bind: Option<String>,
        data_dir: Option<PathBuf>,
        sessions_dir: Option<PathBuf>,
        log_file: Option<String>,
    ) -> Self {
        let port = port
            .or_else(|| env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT);
        let sessions_dir = sessions_dir
            .or_else(|| env::var_os("CHAT_SESSIONS_DIR").map(PathBuf::from))
            .unwrap_or_else(default_sessions_dir);

        Config {
            bind: bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port,
            data_dir,
            sessions_dir,
            log_file,
            api_url: env_or("OPENROUTER_API_URL", DEFAULT_API_URL),
            model: env_or("OPENROUTER_MODEL", DEFAULT_MODEL),
            api_key: env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            referer: DEFAULT_REFERER.to_string(),
        }
    }

    pub fn warn_if_unconfigured(&self) {
        if self.api_key.is_none() {
            warn!(
                "OPENROUTER_API_KEY is not set; queries outside the knowledge bases will get a canned apology"
            );
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Platform-appropriate default for stored chat sessions, e.g.
/// `~/.local/share/conclave-chat/sessions` on Linux.
pub fn default_sessions_dir() -> PathBuf {
    let mut dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("conclave-chat");
    dir.push("sessions");
    dir
}
