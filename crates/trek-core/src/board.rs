//! The board: every initiative plus its per-stage ordered placement.
//!
//! A [`Board`] is an immutable value. Every operation borrows the current
//! board and returns a new one, so a failed operation can never leave a
//! half-applied change behind.
//!
//! Invariants held by every board produced here:
//!
//! 1. every id in a column is a key of the initiative map;
//! 2. every initiative sits in at most one column, at most once;
//! 3. every stage has a column (structural, see [`Columns`]).
//!
//! Dependencies are not covered: they may name ids that no longer exist.

use std::{
  collections::{BTreeMap, HashSet},
  sync::atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer, ser::SerializeMap};
use strum::EnumCount;

use crate::{
  Error, Result,
  initiative::{
    Initiative, InitiativeId, InitiativePatch, NewInitiative, validate_title,
  },
  stage::Stage,
};

/// Shown in place of a dependency whose initiative no longer exists.
pub const UNKNOWN_TITLE: &str = "Unknown";

// ─── Columns ─────────────────────────────────────────────────────────────────

/// One ordered id sequence per [`Stage`], indexed by [`Stage::index`].
///
/// Backed by a fixed-size array so a column can never be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns([Vec<InitiativeId>; Stage::COUNT]);

impl Columns {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self, stage: Stage) -> &[InitiativeId] { &self.0[stage.index()] }

  pub(crate) fn get_mut(&mut self, stage: Stage) -> &mut Vec<InitiativeId> {
    &mut self.0[stage.index()]
  }

  /// Append `id` to the tail of `stage`'s column.
  pub fn push(&mut self, stage: Stage, id: InitiativeId) {
    self.get_mut(stage).push(id);
  }

  /// Stages paired with their columns, in board order.
  pub fn iter(&self) -> impl Iterator<Item = (Stage, &[InitiativeId])> + '_ {
    Stage::ALL.into_iter().map(|stage| (stage, self.get(stage)))
  }

  /// The first stage whose column holds `id`.
  pub fn stage_of(&self, id: &str) -> Option<Stage> {
    self
      .iter()
      .find(|(_, ids)| ids.iter().any(|i| i.as_str() == id))
      .map(|(stage, _)| stage)
  }

  /// Total number of placements across all stages.
  pub fn placed(&self) -> usize { self.0.iter().map(Vec::len).sum() }

  pub(crate) fn remove_everywhere(&mut self, id: &str) {
    for column in &mut self.0 {
      column.retain(|i| i.as_str() != id);
    }
  }
}

impl Serialize for Columns {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(Stage::COUNT))?;
    for (stage, ids) in self.iter() {
      map.serialize_entry(stage.name(), ids)?;
    }
    map.end()
  }
}

// ─── Invariant checks ────────────────────────────────────────────────────────

/// A placement that breaks one of the board invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
  /// A column names an id with no initiative record.
  UnknownId { id: InitiativeId, stage: Stage },
  /// An id already placed earlier on the board appears again.
  DuplicatePlacement { id: InitiativeId, stage: Stage },
}

// ─── Id allocation ───────────────────────────────────────────────────────────

/// Last id handed out by this process, so two creations in the same
/// millisecond (or a create after a delete) never reuse an id.
static LAST_ISSUED: AtomicI64 = AtomicI64::new(i64::MIN);

fn next_timestamp_id(now: DateTime<Utc>) -> i64 {
  let now = now.timestamp_millis();
  let previous = LAST_ISSUED
    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
      Some(now.max(last.saturating_add(1)))
    })
    .unwrap_or(now);
  now.max(previous.saturating_add(1))
}

// ─── Board ───────────────────────────────────────────────────────────────────

/// The complete board state.
///
/// Serialises to the persisted snapshot shape:
/// `{"initiatives": {id: {...}}, "columns": {stage: [id, ...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
  initiatives: BTreeMap<InitiativeId, Initiative>,
  columns:     Columns,
}

impl Board {
  /// An empty board with every stage present.
  pub fn new() -> Self { Self::default() }

  /// Assemble a board from decoded parts.
  ///
  /// A later initiative with an already-seen id replaces the earlier one.
  /// Placements of unknown ids and repeat placements are dropped and logged.
  pub fn from_parts(
    initiatives: impl IntoIterator<Item = Initiative>,
    columns: Columns,
  ) -> Self {
    let initiatives = initiatives
      .into_iter()
      .map(|i| (i.id.clone(), i))
      .collect();
    let board = Self {
      initiatives,
      columns,
    };
    let (board, violations) = board.repaired();
    for violation in &violations {
      tracing::warn!(?violation, "dropped invalid board placement");
    }
    board
  }

  /// Encode as the JSON snapshot handed to a [`crate::store::BoardStore`].
  pub fn encode(&self) -> Result<Vec<u8>> { Ok(serde_json::to_vec(self)?) }

  // ── Reads ──────────────────────────────────────────────────────────────

  pub fn initiative(&self, id: &str) -> Option<&Initiative> {
    self.initiatives.get(id)
  }

  pub fn contains(&self, id: &str) -> bool { self.initiatives.contains_key(id) }

  /// All initiatives, ordered by id.
  pub fn initiatives(&self) -> impl Iterator<Item = &Initiative> + '_ {
    self.initiatives.values()
  }

  /// The ordered ids placed in `stage`.
  pub fn column(&self, stage: Stage) -> &[InitiativeId] { self.columns.get(stage) }

  pub fn columns(&self) -> &Columns { &self.columns }

  pub fn stage_of(&self, id: &str) -> Option<Stage> { self.columns.stage_of(id) }

  pub fn len(&self) -> usize { self.initiatives.len() }

  pub fn is_empty(&self) -> bool { self.initiatives.is_empty() }

  /// Titles of `id`'s dependencies in their stored order, with
  /// [`UNKNOWN_TITLE`] for ids that do not resolve. `None` if `id` itself is
  /// not on the board.
  pub fn dependency_titles(&self, id: &str) -> Option<Vec<&str>> {
    let initiative = self.initiatives.get(id)?;
    Some(
      initiative
        .dependencies
        .iter()
        .map(|dep| {
          self
            .initiatives
            .get(dep)
            .map_or(UNKNOWN_TITLE, |d| d.title.as_str())
        })
        .collect(),
    )
  }

  /// Initiatives that `editing` may depend on: everything except itself.
  /// Pass `None` when offering choices for an initiative not yet created.
  pub fn dependency_candidates(&self, editing: Option<&str>) -> Vec<&Initiative> {
    self
      .initiatives
      .values()
      .filter(|i| Some(i.id.as_str()) != editing)
      .collect()
  }

  /// Initiatives placed in no column (e.g. imported with an unknown stage).
  pub fn orphans(&self) -> Vec<&Initiative> {
    let placed: HashSet<&str> = self
      .columns
      .iter()
      .flat_map(|(_, ids)| ids.iter().map(InitiativeId::as_str))
      .collect();
    self
      .initiatives
      .values()
      .filter(|i| !placed.contains(i.id.as_str()))
      .collect()
  }

  /// Every unknown-id or repeat placement, in board order.
  pub fn check_invariants(&self) -> Vec<InvariantViolation> {
    self.clone().repaired().1
  }

  /// Drop offending placements, keeping the first placement of each id.
  pub(crate) fn repaired(mut self) -> (Self, Vec<InvariantViolation>) {
    let mut seen: HashSet<InitiativeId> = HashSet::new();
    let mut violations = Vec::new();
    for stage in Stage::ALL {
      let initiatives = &self.initiatives;
      self.columns.get_mut(stage).retain(|id| {
        if !initiatives.contains_key(id) {
          violations.push(InvariantViolation::UnknownId {
            id: id.clone(),
            stage,
          });
          false
        } else if !seen.insert(id.clone()) {
          violations.push(InvariantViolation::DuplicatePlacement {
            id: id.clone(),
            stage,
          });
          false
        } else {
          true
        }
      });
    }
    (self, violations)
  }

  // ── Mutations ──────────────────────────────────────────────────────────

  /// Create an initiative at the head of `stage`.
  ///
  /// Returns the new board and the allocated id. Fails with
  /// [`Error::EmptyTitle`] if the title is blank.
  pub fn create_initiative(
    &self,
    stage: Stage,
    fields: NewInitiative,
  ) -> Result<(Board, InitiativeId)> {
    validate_title(&fields.title)?;
    let id = self.allocate_id(Utc::now());

    let mut next = self.clone();
    next.columns.get_mut(stage).insert(0, id.clone());
    next
      .initiatives
      .insert(id.clone(), fields.into_initiative(id.clone()));
    Ok((next, id))
  }

  /// Merge `patch` over an existing initiative. Placement is untouched.
  pub fn update_initiative(
    &self,
    id: &str,
    patch: InitiativePatch,
  ) -> Result<Board> {
    let current = self
      .initiatives
      .get(id)
      .ok_or_else(|| Error::NotFound(id.into()))?;
    let updated = patch.apply(current)?;

    let mut next = self.clone();
    next.initiatives.insert(updated.id.clone(), updated);
    Ok(next)
  }

  /// Remove an initiative and every placement of it.
  ///
  /// Idempotent: deleting an absent id returns an identical board.
  /// Dependencies naming `id` elsewhere are left dangling.
  pub fn delete_initiative(&self, id: &str) -> Board {
    let mut next = self.clone();
    next.initiatives.remove(id);
    next.columns.remove_everywhere(id);
    next
  }

  fn allocate_id(&self, now: DateTime<Utc>) -> InitiativeId {
    let mut candidate = next_timestamp_id(now);
    while self.initiatives.contains_key(candidate.to_string().as_str()) {
      candidate = next_timestamp_id(now);
    }
    InitiativeId::from(candidate.to_string())
  }

  pub(crate) fn columns_mut(&mut self) -> &mut Columns { &mut self.columns }
}
