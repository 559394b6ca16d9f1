//! taskdeck server binary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use taskdeck::config::Config;
use taskdeck::db::Database;
use taskdeck::web::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Personal task manager with a web UI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Port for the HTTP server (overrides config)
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web server (default if no subcommand given)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskdeck={0},tower_http={0}", default_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(database) = cli.database {
        config.server.db_path = database;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!(db_path = %config.server.db_path.display(), "database ready");

    let purged = db.purge_expired_sessions()?;
    if purged > 0 {
        info!(purged, "purged expired sessions");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.bind_addr, config.server.port).parse()?;
    web::serve(AppState::new(db, Arc::new(config)), addr).await
}
