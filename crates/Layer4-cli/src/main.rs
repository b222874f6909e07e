//! aide CLI - Main entry point

mod cli;

use aide_foundation::AideConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// aide - call configured external services and manage the response cache
#[derive(Parser, Debug)]
#[command(name = "aide")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured services
    Services,

    /// Call an endpoint on a configured service and print the JSON response
    Request {
        /// Service name from services.json
        service: String,

        /// Endpoint path, relative to the service base URL
        endpoint: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// JSON request body
        #[arg(long)]
        data: Option<String>,

        /// Query parameter (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = cli::parse_pair)]
        params: Vec<(String, String)>,

        /// Extra header (repeatable)
        #[arg(long = "header", value_name = "KEY=VALUE", value_parser = cli::parse_pair)]
        headers: Vec<(String, String)>,

        /// Serve from / store into the cache for this many seconds
        #[arg(long, value_name = "SECS")]
        cache_ttl: Option<u64>,
    },

    /// Obtain a token for a service (printed masked)
    Token {
        service: String,
    },

    /// Inspect or modify the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print a cached value
    Get { key: String },

    /// Store a JSON value
    Set {
        key: String,
        /// JSON value
        value: String,
        /// TTL in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Remove a key from both tiers
    Delete { key: String },

    /// Remove every entry
    Clear,

    /// Drop expired and unreadable entries now
    Cleanup,

    /// Show entry counts and the cache directory
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AideConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        AideConfig::default()
    });

    // Initialize logging
    let log_level = if args.debug {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "warn".to_string())
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::debug!(command = ?args.command, cache_dir = %config.cache.dir.display(), "Starting");
    cli::run(args.command, &config).await
}
