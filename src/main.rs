//! Code Companion - workspace-aware AI chat for your editor

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use code_companion::cli::{self, Workspace};
use code_companion::config;
use code_companion::context::ContextMode;

/// Code Companion - chat with an AI about the code you are working on
#[derive(Parser)]
#[command(name = "companion")]
#[command(author = "Mustafa Saraç <mustafa@mustafasarac.com>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Workspace-aware AI chat for your code", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Workspace root (defaults to the current directory)
    #[arg(short, long, global = true)]
    workspace: Option<String>,

    /// File to treat as currently open in the editor
    #[arg(long, global = true)]
    current: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat
    Chat {
        /// Initial prompt
        prompt: Option<String>,
    },

    /// Ask a single question about your workspace
    Ask {
        /// The question to ask
        question: String,

        /// Context mode: current, selected, auto, whole
        #[arg(short, long)]
        mode: Option<ContextMode>,

        /// Files to include (implies selected mode)
        #[arg(short, long = "select", num_args = 1..)]
        select: Vec<String>,
    },

    /// List the files available as context
    Files {
        /// Rank the files against a query and show their scores
        #[arg(short, long)]
        rank: Option<String>,
    },

    /// Check that the configured model answers
    TestConnection,

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize configuration file
        #[arg(long)]
        init: bool,
    },

    /// Show version and system info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;
    config.verbose = cli.verbose;

    debug!("Code Companion v{}", env!("CARGO_PKG_VERSION"));

    let workspace = Workspace::resolve(cli.workspace.as_deref(), cli.current.as_deref());

    match cli.command {
        Some(Commands::Chat { prompt }) => {
            cli::chat::run(config, workspace, prompt).await?;
        }
        Some(Commands::Ask { question, mode, select }) => {
            cli::ask::run(config, workspace, &question, mode, select).await?;
        }
        Some(Commands::Files { rank }) => {
            cli::files::run(&config, &workspace, rank.as_deref())?;
        }
        Some(Commands::TestConnection) => {
            cli::connection::run(config, workspace).await?;
        }
        Some(Commands::Config { show, init }) => {
            if init {
                config::init_config()?;
            } else if show {
                config::show_config(&config)?;
            }
        }
        Some(Commands::Info) => {
            cli::info::run(&config)?;
        }
        None => {
            // Default: Start interactive chat
            cli::chat::run(config, workspace, None).await?;
        }
    }

    Ok(())
}
