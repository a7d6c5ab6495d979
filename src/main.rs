use agent_chat::config::Config;
use agent_chat::store::ConversationStore;
use agent_chat::tui;
use agent_chat::ui::conversation::ConversationManager;
use agent_chat::ChatClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agent-chat")]
#[command(version)]
#[command(about = "Chat with a streaming personal agent", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.agent-chat/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Endpoint URL for this run, overriding config and environment
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Ask { message: String },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_endpoint(cli.endpoint);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_file_logging(&config.log_file)?;
            run_chat(config).await
        }
        Commands::Ask { message } => {
            init_stderr_logging();
            ask(config, &message).await
        }
        Commands::Config { init } => {
            if init {
                let path = cli.config.unwrap_or_else(Config::default_path);
                config.save(&path)?;
                eprintln!("Wrote {}", path.display());
            }
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
            Ok(())
        }
    }
}

async fn run_chat(config: Config) -> Result<()> {
    tracing::info!(endpoint = %config.endpoint, "starting chat");
    let store = ConversationStore::new();
    let client = ChatClient::new(config.endpoint.clone());
    let mut manager = ConversationManager::new(store, client, config.ui.clone());

    let mut terminal = tui::init()?;
    let result = tui::run(&mut terminal, &mut manager).await;
    tui::restore()?;
    result
}

async fn ask(config: Config, message: &str) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("message must not be empty");
    }

    let store = ConversationStore::new();
    let client = ChatClient::new(config.endpoint);
    client.send_message(&store, message).await;

    if let Some(reply) = store.last_message() {
        println!("{}", reply.content);
    }
    Ok(())
}

/// `RUST_LOG` if set, `default` otherwise
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// The terminal belongs to the UI, so the interactive mode logs to a file
fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .init();
}
