//! Layered configuration for the `trek` binary.
//!
//! Sources, lowest priority first: built-in defaults, the TOML file named by
//! `--config` (optional), then `TREK_`-prefixed environment variables
//! (`TREK_STORE_PATH`, `TREK_BOARD_KEY`). Command-line flags are applied on
//! top by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use trek_core::store::DEFAULT_BOARD_KEY;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  /// SQLite database file holding the board. `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Key the board snapshot is stored under.
  #[serde(default = "default_board_key")]
  pub board_key:  String,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/trek/trek.db") }

fn default_board_key() -> String { DEFAULT_BOARD_KEY.to_owned() }

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: default_store_path(),
      board_key:  default_board_key(),
    }
  }
}

impl Settings {
  /// Read `config_path` (if it exists) and the environment.
  pub fn load(config_path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(config_path).required(false))
      .add_source(config::Environment::with_prefix("TREK"))
      .build()
      .with_context(|| format!("failed to read config file {}", config_path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.board_key, DEFAULT_BOARD_KEY);
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trek.toml");
    std::fs::write(&path, "store_path = \"/srv/trek/board.db\"\nboard_key = \"team-a\"\n")
      .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.store_path, PathBuf::from("/srv/trek/board.db"));
    assert_eq!(settings.board_key, "team-a");
  }

  #[test]
  fn tilde_expansion_only_touches_home_prefix() {
    assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    assert_eq!(expand_tilde(Path::new("rel/~/x")), PathBuf::from("rel/~/x"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/trek.db")), PathBuf::from(home).join("trek.db"));
    }
  }
}
