//! `trek` — command-line front end for the Trek initiative board.
//!
//! # Usage
//!
//! ```text
//! trek add DEV "Launch billing" --status in_progress
//! trek mv 1712345678901 QA --index 0
//! trek board
//! trek export --output board.csv
//! trek --db ~/boards/team-a.db import board.csv
//! ```
//!
//! Settings come from `trek.toml` (or `--config`) and `TREK_*` environment
//! variables; see [`settings`].

mod commands;
mod render;
mod settings;

use std::{io, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trek_core::tracker::Tracker;
use trek_store_sqlite::SqliteStore;

use crate::{
  commands::Command,
  settings::{Settings, expand_tilde},
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "trek", version, about = "Track initiatives across release stages")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "trek.toml")]
  config: PathBuf,

  /// SQLite database holding the board; overrides `store_path`.
  #[arg(long, value_name = "PATH", env = "TREK_DB")]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so `trek export` output stays clean.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(db) = cli.db {
    settings.store_path = db;
  }
  let store_path = expand_tilde(&settings.store_path);

  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match store.updated_at(&settings.board_key).await {
    Ok(saved) => tracing::debug!(path = ?store_path, key = %settings.board_key, ?saved, "opened board store"),
    Err(e) => tracing::warn!(error = %e, "could not read board timestamp"),
  }

  let mut tracker = Tracker::open_with_key(store, settings.board_key).await;

  let stdout = io::stdout();
  let mut out = stdout.lock();
  commands::run(cli.command, &mut tracker, &mut out).await
}
