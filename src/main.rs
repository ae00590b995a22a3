mod api;
mod app;
mod auth;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod mutation;
mod pagination;
mod prefetch;
mod preferences;
mod query;
mod redirect;
mod routes;
mod session;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hoardview")]
#[command(about = "A terminal dashboard for your game account")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/hoardview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overriding the config file
  #[arg(long)]
  api_url: Option<String>,

  /// Screen to open first, e.g. /inventory
  #[arg(short, long, default_value = "/")]
  route: String,
}

/// Log to a daily file under the data directory; the TUI owns the terminal.
fn init_logging() -> Result<WorkerGuard> {
  let dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Could not determine a data directory for logs"))?
    .join("hoardview");
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
    dir,
    "hoardview.log",
  ));
  let filter = EnvFilter::try_from_env("HOARDVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override API URL if specified on command line
  if let Some(url) = args.api_url {
    config.api.url = url;
  }
  tracing::info!(api = %config.api.url, route = %args.route, "starting");

  // Initialize and run the app
  let mut app = app::App::new(config, &args.route).await?;
  app.run().await?;

  Ok(())
}
