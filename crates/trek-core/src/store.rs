//! The `BoardStore` trait and an in-memory implementation.
//!
//! A board store is a durable key-value byte store. The core never looks at
//! how bytes are kept; backends (e.g. `trek-store-sqlite`) implement this
//! trait and higher layers depend only on it.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::Future,
  sync::{Arc, Mutex},
};

/// Key the board snapshot is stored under unless configured otherwise.
pub const DEFAULT_BOARD_KEY: &str = "initiative-tracker-board";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a persistence backend for board snapshots.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait BoardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the bytes stored under `key`. Returns `None` if nothing is stored.
  fn load<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;

  /// Replace the bytes stored under `key`.
  fn save<'a>(
    &'a self,
    key: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// A store that keeps everything in process memory.
///
/// Cloning is cheap and clones share the same entries, so a test can keep a
/// handle to inspect what a [`crate::tracker::Tracker`] wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// A store pre-seeded with one entry.
  pub fn with_entry(key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    let store = Self::default();
    store.put(key.into(), bytes.into());
    store
  }

  /// Synchronous read, for inspection outside an async context.
  pub fn get(&self, key: &str) -> Option<Vec<u8>> {
    self.lock().get(key).cloned()
  }

  fn put(&self, key: String, bytes: Vec<u8>) { self.lock().insert(key, bytes); }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
    // A poisoned map is still a consistent map: every write is one insert.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl BoardStore for MemoryStore {
  type Error = Infallible;

  async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, Infallible> {
    Ok(self.get(key))
  }

  async fn save(&self, key: &str, bytes: Vec<u8>) -> Result<(), Infallible> {
    self.put(key.to_owned(), bytes);
    Ok(())
  }
}
