use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "logminer")]
#[command(about = "Retrieves Graylog entries and stores them grouped by session", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve new log entries
    Retrieve {
        /// Delete stored sessions and the watermark, then retrieve everything again
        #[arg(long)]
        force: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a starter config
    Init {
        #[arg(long)]
        stdout: bool,
    },
    /// Load and validate the config
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logminer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = logminer::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Retrieve { force }) => {
            logminer::cli::run::retrieve(config_path, force).await?;
        }
        // Default behavior is a regular retrieval
        None => {
            logminer::cli::run::retrieve(config_path, false).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                logminer::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                logminer::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
