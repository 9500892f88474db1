//! Snapshot decoding and the legacy stage migration.
//!
//! Older snapshots used a different stage vocabulary (`Idea`, `Planning`,
//! `Development`, `Production`, ...). A snapshot whose `columns` object has
//! any key outside the current [`Stage`] set is remapped once at load time;
//! the caller persists the result so the remap never runs again for that
//! snapshot.

use std::{collections::BTreeMap, fmt};

use serde::{
  Deserialize, Deserializer,
  de::{MapAccess, Visitor},
};

use crate::{
  Board, Result,
  board::Columns,
  initiative::{Initiative, InitiativeId},
  stage::Stage,
};

/// Legacy stage names and the current stage each one collapses into.
pub const LEGACY_STAGES: &[(&str, Stage)] = &[
  ("Idea", Stage::Dev),
  ("Planning", Stage::Dev),
  ("Development", Stage::Dev),
  ("QA", Stage::Qa),
  ("Production", Stage::Prod),
];

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A persisted board exactly as decoded, before any remapping.
///
/// Column keys are kept as raw strings in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub initiatives: BTreeMap<InitiativeId, Initiative>,
  #[serde(default)]
  pub columns:     RawColumns,
}

/// Column entries as `(stage name, ids)` pairs, in the order they appear in
/// the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawColumns(pub Vec<(String, Vec<InitiativeId>)>);

impl<'de> Deserialize<'de> for RawColumns {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct RawColumnsVisitor;

    impl<'de> Visitor<'de> for RawColumnsVisitor {
      type Value = RawColumns;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of stage names to id arrays")
      }

      fn visit_unit<E>(self) -> Result<RawColumns, E> { Ok(RawColumns::default()) }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawColumns, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((stage, ids)) =
          map.next_entry::<String, Option<Vec<InitiativeId>>>()?
        {
          entries.push((stage, ids.unwrap_or_default()));
        }
        Ok(RawColumns(entries))
      }
    }

    deserializer.deserialize_any(RawColumnsVisitor)
  }
}

impl From<&Board> for Snapshot {
  fn from(board: &Board) -> Self {
    Self {
      initiatives: board.initiatives().map(|i| (i.id.clone(), i.clone())).collect(),
      columns:     RawColumns(
        board
          .columns()
          .iter()
          .map(|(stage, ids)| (stage.name().to_owned(), ids.to_vec()))
          .collect(),
      ),
    }
  }
}

impl Snapshot {
  /// `true` when any column key is outside the current stage set.
  pub fn needs_migration(&self) -> bool {
    self
      .columns
      .0
      .iter()
      .any(|(name, _)| Stage::from_name(name).is_none())
  }
}

// ─── Migration ───────────────────────────────────────────────────────────────

/// The current stage a column name lands in: itself if it is a current stage,
/// its legacy mapping if it has one, otherwise [`Stage::FIRST`].
pub fn target_stage(name: &str) -> Stage {
  LEGACY_STAGES
    .iter()
    .find(|(legacy, _)| *legacy == name)
    .map(|(_, stage)| *stage)
    .or_else(|| Stage::from_name(name))
    .unwrap_or(Stage::FIRST)
}

/// Rebuild `columns` over the current stage set.
///
/// Each source column, in document order, is appended whole to its target
/// stage. Initiatives are carried over untouched; only placement changes.
/// Every initiative takes its id from its key in the `initiatives` map.
pub fn migrate(snapshot: Snapshot) -> Board {
  let mut columns = Columns::new();
  for (name, ids) in snapshot.columns.0 {
    let stage = target_stage(&name);
    if Stage::from_name(&name).is_none() {
      tracing::info!(
        legacy = %name,
        %stage,
        count = ids.len(),
        "remapping legacy stage"
      );
    }
    for id in ids {
      columns.push(stage, id);
    }
  }
  let initiatives = snapshot.initiatives.into_iter().map(|(key, mut initiative)| {
    if initiative.id != key {
      if !initiative.id.as_str().is_empty() {
        tracing::warn!(%key, id = %initiative.id, "initiative id differs from its key; using key");
      }
      initiative.id = key;
    }
    initiative
  });
  Board::from_parts(initiatives, columns)
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
  pub board:    Board,
  /// The snapshot used a legacy stage vocabulary and was remapped; the caller
  /// should persist `board` straight away.
  pub migrated: bool,
}

/// Decode persisted bytes into a board, migrating legacy stages if needed.
///
/// A snapshot that needs no migration still gets every missing stage filled
/// in with an empty column.
pub fn decode(bytes: &[u8]) -> Result<Loaded> {
  let snapshot: Snapshot = serde_json::from_slice(bytes)?;
  let migrated = snapshot.needs_migration();
  Ok(Loaded {
    board: migrate(snapshot),
    migrated,
  })
}
