mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use poolside::PoolsideConfig;

#[derive(Parser)]
#[command(name = "poolside")]
#[command(version, about = "Poolside CLI - drive the client core from a terminal", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "poolside.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL through a request controller and print the JSON payload
    Fetch {
        /// Absolute URL, or a path resolved against request.base_url
        url: String,

        /// Maximum attempts (overrides retry.max_attempts)
        #[arg(short, long)]
        retries: Option<u32>,

        /// Delay between attempts in milliseconds (overrides retry.delay_ms)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Retry every failure, not only transport failures and 5xx
        #[arg(long)]
        retry_all: bool,
    },

    /// Inspect and edit stored values
    Store {
        #[command(subcommand)]
        command: StoreCommands,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// Print the stored value for a key
    Get {
        key: String,
    },

    /// Store a JSON value under a key
    Set {
        key: String,
        value: String,
    },

    /// Remove a key
    Remove {
        key: String,
    },

    /// List stored keys
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PoolsideConfig::load(&cli.config)?;

    match cli.command {
        Commands::Fetch {
            url,
            retries,
            delay_ms,
            retry_all,
        } => {
            commands::fetch::execute(&config, &url, retries, delay_ms, retry_all).await?;
        }
        Commands::Store { command } => {
            commands::store::execute(&config, command)?;
        }
    }

    Ok(())
}
