//! Drag-and-drop reordering.
//!
//! A drop reports where a card was picked up and where it was released. The
//! move is a two-step splice (remove from the source column, insert into the
//! destination column) applied to a copy of the board, so observers only
//! ever see the board before or after it.
//!
//! Stage order is not enforced: a card may move backwards as freely as
//! forwards.

use crate::{Board, Error, Result, initiative::InitiativeId, stage::Stage};

/// A position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
  pub stage: Stage,
  pub index: usize,
}

impl Placement {
  pub fn new(stage: Stage, index: usize) -> Self { Self { stage, index } }
}

/// The outcome of a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragResult {
  pub initiative_id: InitiativeId,
  pub source:        Placement,
  /// `None` when the card was released outside any column.
  pub destination:   Option<Placement>,
}

impl Board {
  /// Where `id` currently sits, if it is placed at all.
  pub fn placement_of(&self, id: &str) -> Option<Placement> {
    self.columns().iter().find_map(|(stage, ids)| {
      ids
        .iter()
        .position(|i| i.as_str() == id)
        .map(|index| Placement::new(stage, index))
    })
  }

  /// Apply a finished drag. A cancelled drag (no destination) returns the
  /// board unchanged.
  pub fn apply_drag(&self, drag: &DragResult) -> Result<Board> {
    match drag.destination {
      Some(to) => self.move_initiative(drag.initiative_id.as_str(), drag.source, to),
      None => Ok(self.clone()),
    }
  }

  /// Move `id` from `from` to `to`.
  ///
  /// Dropping a card back where it started returns the board unchanged. The
  /// insertion index is clamped to the destination column's length after
  /// removal.
  ///
  /// Fails with [`Error::NotFound`] if `id` is not an initiative, or
  /// [`Error::Misplaced`] if the source position does not hold it (a stale
  /// gesture).
  pub fn move_initiative(
    &self,
    id: &str,
    from: Placement,
    to: Placement,
  ) -> Result<Board> {
    if from == to {
      return Ok(self.clone());
    }
    if !self.contains(id) {
      return Err(Error::NotFound(id.into()));
    }
    if self.column(from.stage).get(from.index).map(InitiativeId::as_str) != Some(id) {
      return Err(Error::Misplaced {
        id:    id.into(),
        stage: from.stage,
        index: from.index,
      });
    }

    let mut next = self.clone();
    let columns = next.columns_mut();
    let moved = columns.get_mut(from.stage).remove(from.index);
    let destination = columns.get_mut(to.stage);
    let index = to.index.min(destination.len());
    destination.insert(index, moved);
    Ok(next)
  }

  /// Put an initiative that sits in no column (an orphan) at `to`.
  ///
  /// Fails with [`Error::NotFound`] if `id` is not an initiative, or
  /// [`Error::AlreadyPlaced`] if it already has a column; use
  /// [`Board::move_initiative`] for those.
  pub fn place_initiative(&self, id: &str, to: Placement) -> Result<Board> {
    if !self.contains(id) {
      return Err(Error::NotFound(id.into()));
    }
    if let Some(stage) = self.stage_of(id) {
      return Err(Error::AlreadyPlaced {
        id: id.into(),
        stage,
      });
    }

    let mut next = self.clone();
    let destination = next.columns_mut().get_mut(to.stage);
    let index = to.index.min(destination.len());
    destination.insert(index, id.into());
    Ok(next)
  }
}
