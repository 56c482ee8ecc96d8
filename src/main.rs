use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use conclave_chat_rs::config::Config;
use conclave_chat_rs::fallback::FallbackClient;
use conclave_chat_rs::history::ChatStore;
use conclave_chat_rs::knowledge::KnowledgeBases;
use conclave_chat_rs::logging::init_logging;
use conclave_chat_rs::resolver::Resolver;
use conclave_chat_rs::server::{router, AppState};

#[derive(Parser)]
#[command(name = "conclave-chat-rs", version, about = "School and conclave chatbot server")]
struct Cli {
    /// Port to listen on (falls back to the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory with school_data.json and conclave_data.json; bundled
    /// knowledge is used when omitted
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for chat session logs (falls back to CHAT_SESSIONS_DIR)
    #[arg(long)]
    sessions_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(short, long)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and manage stored chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List all sessions, newest activity first
    List,
    /// Print every turn of one session
    View { session_id: String },
    /// Delete one session's log
    Delete { session_id: String },
    /// Remove sessions older than the given number of days
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
    /// Aggregate statistics across all sessions
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.port, cli.bind, cli.data_dir, cli.sessions_dir, cli.log);
    init_logging(config.log_file.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    match cli.command {
        Some(Command::Sessions { action }) => run_sessions_command(action, &config),
        None => serve(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    config.warn_if_unconfigured();

    let knowledge = KnowledgeBases::load(config.data_dir.as_deref());
    info!(events = knowledge.events.len(), "knowledge bases loaded");

    let store = ChatStore::new(&config.sessions_dir).context("failed to open chat store")?;
    let fallback = FallbackClient::new(
        config.api_url.clone(),
        config.model.clone(),
        config.api_key.clone(),
        config.referer.clone(),
    )?;
    let resolver = Resolver::new(knowledge, store, fallback);
    let app = router(Arc::new(AppState { resolver }));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "conclave-chat listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn run_sessions_command(action: SessionsAction, config: &Config) -> Result<()> {
    let store = ChatStore::new(&config.sessions_dir).context("failed to open chat store")?;
    match action {
        SessionsAction::List => {
            let sessions = store.list_sessions()?;
            if sessions.is_empty() {
                println!("No chat sessions found.");
                return Ok(());
            }
            println!("Found {} session(s):\n", sessions.len());
            for info in sessions {
                println!(
                    "  {}  {} message(s), last active {}",
                    info.session_id,
                    info.message_count,
                    info.last_updated.format("%Y-%m-%d %H:%M:%S"),
                );
            }
        }
        SessionsAction::View { session_id } => {
            let turns = store.load(&session_id)?;
            if turns.is_empty() {
                println!("No messages found for session {session_id}.");
                return Ok(());
            }
            for turn in turns {
                println!(
                    "[{}] {}: {}",
                    turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    turn.role.as_str(),
                    turn.content,
                );
            }
        }
        SessionsAction::Delete { session_id } => {
            if store.delete_session(&session_id)? {
                println!("Deleted session {session_id}.");
            } else {
                println!("No session named {session_id}.");
            }
        }
        SessionsAction::Cleanup { days } => {
            let removed = store.cleanup_older_than(days)?;
            println!("Removed {removed} session(s) older than {days} day(s).");
        }
        SessionsAction::Stats => {
            let sessions = store.list_sessions()?;
            let messages: usize = sessions.iter().map(|s| s.message_count).sum();
            println!("Sessions: {}", sessions.len());
            println!("Messages: {messages}");
            if let Some(oldest) = sessions.iter().map(|s| s.created_at).min() {
                println!("Oldest session created: {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            }
            if let Some(latest) = sessions.iter().map(|s| s.last_updated).max() {
                println!("Most recent activity:   {}", latest.format("%Y-%m-%d %H:%M:%S"));
            }
        }
    }
    Ok(())
}
