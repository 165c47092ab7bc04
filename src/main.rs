use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use listomania_server::catalog::DiscogsClient;
use listomania_server::config::{AppConfig, CliConfig, FileConfig};
use listomania_server::list_store::SqliteListStore;
use listomania_server::server::run_server;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite database file for lists and albums.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// Discogs personal access token. Falls back to the DISCOGS_TOKEN
    /// environment variable.
    #[clap(long)]
    pub discogs_token: Option<String>,

    /// Path to an optional TOML config file. Values in the file
    /// override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let discogs_token = cli_args
        .discogs_token
        .or_else(|| std::env::var("DISCOGS_TOKEN").ok());

    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        port: cli_args.port,
        discogs_token,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening list database at {:?}", config.db_path);
    let store = SqliteListStore::new(&config.db_path)
        .with_context(|| format!("Failed to open list database at {:?}", config.db_path))?;

    let catalog = DiscogsClient::new(config.discogs_token.clone(), config.throttle_config())
        .context("Failed to build catalog client")?;

    run_server(Arc::new(store), Arc::new(catalog), config.port).await
}
