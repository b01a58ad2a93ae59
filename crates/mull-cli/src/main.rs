//! Mull CLI - chat with a local reasoning model.

use clap::{Args, Parser, Subcommand};
use mull_chat::ChatConfig;
use mull_segments::ParseMode;
use std::path::PathBuf;

mod commands;
mod render;

/// Mull - see what the model thought, get the answer it meant
#[derive(Parser)]
#[command(name = "mull")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat {
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question
        prompt: String,
        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Split a saved response into thinking and final answer
    Parse {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
        /// Use <think> tags instead of section labels
        #[arg(long)]
        tags: bool,
    },

    /// Show configuration and check the backend
    Info {
        #[command(flatten)]
        backend: BackendArgs,
    },
}

/// Overrides on top of the `MULL_*` environment.
#[derive(Args, Clone, Default)]
pub(crate) struct BackendArgs {
    /// Generation service endpoint
    #[arg(long)]
    endpoint: Option<String>,
    /// Use <think> tags instead of section labels
    #[arg(long)]
    tags: bool,
    /// Do not ask the model to finish cut-off replies
    #[arg(long)]
    no_retry: bool,
    /// Do not summarize thinking when finishing fails
    #[arg(long)]
    no_summarize: bool,
    /// Number of finish attempts
    #[arg(long)]
    max_retries: Option<u32>,
}

impl BackendArgs {
    pub(crate) fn config(&self) -> miette::Result<ChatConfig> {
        let mut config = ChatConfig::from_env();
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.tags {
            config.parse_mode = ParseMode::Tags;
        }
        if self.no_retry {
            config.recovery.auto_retry = false;
        }
        if self.no_summarize {
            config.recovery.summarize = false;
        }
        if let Some(retries) = self.max_retries {
            config.recovery.max_retries = retries;
        }

        config
            .validate()
            .map_err(|e| miette::miette!("Invalid configuration: {}", e))?;
        Ok(config)
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let command = cli.command.unwrap_or(Commands::Chat {
        backend: BackendArgs::default(),
    });

    match command {
        Commands::Parse { file, tags } => commands::parse::run(file.as_deref(), tags),
        Commands::Chat { backend } => block_on(commands::chat::run(backend.config()?)),
        Commands::Ask { prompt, backend } => {
            block_on(commands::ask::run(&prompt, backend.config()?))
        }
        Commands::Info { backend } => block_on(commands::info::run(backend.config()?)),
    }
}

fn block_on<F>(future: F) -> miette::Result<()>
where
    F: std::future::Future<Output = miette::Result<()>>,
{
    tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start runtime: {}", e))?
        .block_on(future)
}
