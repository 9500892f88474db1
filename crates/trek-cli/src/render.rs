//! Plain-text rendering of a board.

use std::io::{self, Write};

use trek_core::{Board, Initiative, Stage};

/// Print every stage in order with its cards, then any unplaced initiatives.
pub fn board(board: &Board, out: &mut dyn Write) -> io::Result<()> {
  for stage in Stage::ALL {
    let ids = board.column(stage);
    writeln!(out, "{stage} ({})", ids.len())?;
    if ids.is_empty() {
      writeln!(out, "  (empty)")?;
    }
    for initiative in ids.iter().filter_map(|id| board.initiative(id.as_str())) {
      card(board, initiative, out)?;
    }
  }

  let orphans = board.orphans();
  if !orphans.is_empty() {
    writeln!(out, "Unplaced ({})", orphans.len())?;
    for initiative in orphans {
      card(board, initiative, out)?;
    }
  }
  Ok(())
}

fn card(board: &Board, initiative: &Initiative, out: &mut dyn Write) -> io::Result<()> {
  writeln!(
    out,
    "  [{}] {} · {}",
    initiative.id,
    initiative.title,
    initiative.status.label()
  )?;
  if !initiative.description.is_empty() {
    for line in initiative.description.lines() {
      writeln!(out, "      {line}")?;
    }
  }
  let titles = board
    .dependency_titles(initiative.id.as_str())
    .unwrap_or_default();
  if !titles.is_empty() {
    writeln!(out, "      depends on: {}", titles.join(", "))?;
  }
  Ok(())
}

/// List the initiatives `editing` may depend on.
pub fn candidates(board: &Board, editing: Option<&str>, out: &mut dyn Write) -> io::Result<()> {
  for initiative in board.dependency_candidates(editing) {
    writeln!(out, "{}\t{}", initiative.id, initiative.title)?;
  }
  Ok(())
}
