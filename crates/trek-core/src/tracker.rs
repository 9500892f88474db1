//! [`Tracker`] — the explicit holder of the live board.
//!
//! The tracker owns the current [`Board`] and a [`BoardStore`]. Every
//! mutation derives the next board from the current one, swaps it in,
//! notifies observers, and writes the snapshot through to the store.
//!
//! A failed write never rolls the board back: the in-memory board stays
//! authoritative and the tracker is marked dirty until a later write
//! succeeds.

use crate::{
  Board, Error, Result,
  initiative::{InitiativeId, InitiativePatch, NewInitiative},
  migrate,
  moves::{DragResult, Placement},
  stage::Stage,
  store::{BoardStore, DEFAULT_BOARD_KEY},
};

/// Callback invoked with the new board after every effective change.
pub type Observer = Box<dyn Fn(&Board) + Send + Sync>;

pub struct Tracker<S: BoardStore> {
  board:     Board,
  store:     S,
  key:       String,
  observers: Vec<Observer>,
  /// The last write-through failed; the store is behind `board`.
  dirty:     bool,
}

impl<S: BoardStore> Tracker<S> {
  /// Load the board stored under [`DEFAULT_BOARD_KEY`].
  pub async fn open(store: S) -> Self { Self::open_with_key(store, DEFAULT_BOARD_KEY).await }

  /// Load the board stored under `key`, migrating a legacy snapshot and
  /// persisting the result at once.
  ///
  /// Never fails: a missing, unreadable or undecodable snapshot yields an
  /// empty board.
  pub async fn open_with_key(store: S, key: impl Into<String>) -> Self {
    let key = key.into();
    let mut tracker = Self {
      board: Board::new(),
      store,
      key,
      observers: Vec::new(),
      dirty: false,
    };

    let loaded = match tracker.store.load(&tracker.key).await {
      Ok(Some(bytes)) => match migrate::decode(&bytes) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
          tracing::warn!(key = %tracker.key, error = %e, "stored board is unreadable; starting empty");
          None
        }
      },
      Ok(None) => {
        tracing::debug!(key = %tracker.key, "no stored board; starting empty");
        None
      }
      Err(e) => {
        tracing::warn!(key = %tracker.key, error = %e, "failed to load board; starting empty");
        None
      }
    };

    if let Some(loaded) = loaded {
      tracker.board = loaded.board;
      if loaded.migrated {
        tracing::info!(key = %tracker.key, "migrated legacy board snapshot");
        tracker.persist().await;
      }
    }
    tracker
  }

  // ── Reads ──────────────────────────────────────────────────────────────

  pub fn board(&self) -> &Board { &self.board }

  pub fn store(&self) -> &S { &self.store }

  pub fn key(&self) -> &str { &self.key }

  /// `true` if the store has not caught up with the in-memory board.
  pub fn is_dirty(&self) -> bool { self.dirty }

  /// Register a callback run after every change that alters the board.
  pub fn subscribe(&mut self, observer: impl Fn(&Board) + Send + Sync + 'static) {
    self.observers.push(Box::new(observer));
  }

  // ── Mutations ──────────────────────────────────────────────────────────

  /// See [`Board::create_initiative`].
  pub async fn create(&mut self, stage: Stage, fields: NewInitiative) -> Result<InitiativeId> {
    let (next, id) = self.board.create_initiative(stage, fields)?;
    self.commit(next).await;
    Ok(id)
  }

  /// See [`Board::update_initiative`].
  pub async fn update(&mut self, id: &str, patch: InitiativePatch) -> Result<()> {
    let next = self.board.update_initiative(id, patch)?;
    self.commit(next).await;
    Ok(())
  }

  /// See [`Board::delete_initiative`]. Returns `false` if `id` was absent.
  pub async fn delete(&mut self, id: &str) -> bool {
    let next = self.board.delete_initiative(id);
    self.commit(next).await
  }

  /// See [`Board::move_initiative`].
  pub async fn move_initiative(&mut self, id: &str, from: Placement, to: Placement) -> Result<()> {
    let next = self.board.move_initiative(id, from, to)?;
    self.commit(next).await;
    Ok(())
  }

  /// See [`Board::apply_drag`].
  pub async fn drop_card(&mut self, drag: &DragResult) -> Result<()> {
    let next = self.board.apply_drag(drag)?;
    self.commit(next).await;
    Ok(())
  }

  /// See [`Board::place_initiative`].
  pub async fn place(&mut self, id: &str, to: Placement) -> Result<()> {
    let next = self.board.place_initiative(id, to)?;
    self.commit(next).await;
    Ok(())
  }

  /// Swap in a whole new board, e.g. the result of a CSV import.
  pub async fn replace(&mut self, board: Board) { self.commit(board).await; }

  /// Write the current board to the store now, regardless of dirtiness.
  pub async fn save(&mut self) -> Result<()> {
    let result = self.write().await;
    self.dirty = result.is_err();
    result
  }

  // ── Internals ──────────────────────────────────────────────────────────

  /// Install `next` if it differs from the current board. Returns whether
  /// anything changed.
  async fn commit(&mut self, next: Board) -> bool {
    if next == self.board {
      return false;
    }
    self.board = next;
    for observer in &self.observers {
      observer(&self.board);
    }
    self.persist().await;
    true
  }

  async fn persist(&mut self) {
    match self.write().await {
      Ok(()) => self.dirty = false,
      Err(e) => {
        tracing::warn!(key = %self.key, error = %e, "failed to save board; keeping in-memory state");
        self.dirty = true;
      }
    }
  }

  async fn write(&self) -> Result<()> {
    let bytes = self.board.encode()?;
    self
      .store
      .save(&self.key, bytes)
      .await
      .map_err(|e| Error::Persistence(Box::new(e)))
  }
}
