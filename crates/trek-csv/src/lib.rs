//! CSV export and import for Trek boards.
//!
//! Converts between a [`trek_core::Board`] and a flat CSV table with one row
//! per initiative. Pure synchronous; no database or terminal dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use trek_core::Board;
//!
//! let csv = "id,title,description,status,stage,dependencies\r\n1,Foo,,,QA,\"2,3\"\r\n";
//! let board: Board = trek_csv::import(csv).unwrap();
//! assert_eq!(trek_csv::import(&trek_csv::export(&board)).unwrap(), board);
//! ```

pub mod error;
mod parse;
mod serialize;

use std::collections::HashMap;

pub use error::{Error, Result};
use trek_core::{Board, Columns, Initiative, InitiativeId, Stage};

/// Header row written by [`export`], in column order.
pub const COLUMNS: [&str; 6] = ["id", "title", "description", "status", "stage", "dependencies"];

/// Separator between ids inside the `dependencies` field.
pub const DEPENDENCY_DELIMITER: char = ',';

// ─── Export ──────────────────────────────────────────────────────────────────

/// Render `board` as CSV with CRLF record endings.
///
/// Rows follow board order: each stage's column top to bottom, then any
/// initiatives placed in no column with an empty `stage`.
pub fn export(board: &Board) -> String {
  let mut out = String::new();
  serialize::write_record(&mut out, COLUMNS);

  for (stage, ids) in board.columns().iter() {
    for initiative in ids.iter().filter_map(|id| board.initiative(id.as_str())) {
      write_row(&mut out, initiative, stage.name());
    }
  }
  for initiative in board.orphans() {
    write_row(&mut out, initiative, "");
  }
  out
}

fn write_row(out: &mut String, initiative: &Initiative, stage: &str) {
  let dependencies = initiative
    .dependencies
    .iter()
    .map(InitiativeId::as_str)
    .collect::<Vec<_>>()
    .join(&DEPENDENCY_DELIMITER.to_string());

  serialize::write_record(out, [
    initiative.id.as_str(),
    initiative.title.as_str(),
    initiative.description.as_str(),
    initiative.status.as_str(),
    stage,
    dependencies.as_str(),
  ]);
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Parse CSV text into a new board that replaces whatever was there.
///
/// Rows keep their file order within each stage. When an id appears on more
/// than one row the last row's fields and stage win, at the position of the
/// first row.
pub fn import(input: &str) -> Result<Board> {
  let mut records = parse::read_records(input)?.into_iter();
  let header = records.next().ok_or(Error::MissingHeader)?;
  let layout = parse::Layout::from_header(&header)?;

  let mut rows: Vec<(Initiative, Option<Stage>)> = Vec::new();
  let mut positions: HashMap<InitiativeId, usize> = HashMap::new();

  for record in records {
    let Some((initiative, stage)) = parse::row_to_initiative(&layout, &record)? else {
      continue;
    };
    match positions.get(&initiative.id) {
      Some(&i) => {
        tracing::warn!(line = record.line, id = %initiative.id, "repeated id; later row wins");
        rows[i] = (initiative, stage);
      }
      None => {
        positions.insert(initiative.id.clone(), rows.len());
        rows.push((initiative, stage));
      }
    }
  }

  let mut columns = Columns::new();
  for (initiative, stage) in &rows {
    if let Some(stage) = stage {
      columns.push(*stage, initiative.id.clone());
    }
  }

  let board = Board::from_parts(rows.into_iter().map(|(initiative, _)| initiative), columns);
  tracing::debug!(
    initiatives = board.len(),
    orphans = board.orphans().len(),
    "imported board from CSV"
  );
  Ok(board)
}

#[cfg(test)]
mod tests {
  use trek_core::{InitiativePatch, NewInitiative, Status, moves::Placement};

  use super::*;

  fn ids(board: &Board, stage: Stage) -> Vec<&str> {
    board.column(stage).iter().map(InitiativeId::as_str).collect()
  }

  fn header() -> String { format!("{}\r\n", COLUMNS.join(",")) }

  // ── scenarios ────────────────────────────────────────────────────────────

  #[test]
  fn row_with_quoted_dependencies() {
    let csv = format!("{}1,Foo,,,QA,\"2,3\"\r\n", header());
    let board = import(&csv).unwrap();

    let foo = board.initiative("1").unwrap();
    assert_eq!(foo.title, "Foo");
    assert_eq!(foo.status, Status::NotStarted);
    let deps: Vec<&str> = foo.dependencies.iter().map(InitiativeId::as_str).collect();
    assert_eq!(deps, ["2", "3"]);
    assert_eq!(ids(&board, Stage::Qa), ["1"]);
    assert_eq!(board.dependency_titles("1").unwrap(), ["Unknown", "Unknown"]);
  }

  #[test]
  fn rows_without_id_are_skipped() {
    let csv = format!("{},Nameless,,,DEV,\r\n2,Named,,,DEV,\r\n", header());
    let board = import(&csv).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(ids(&board, Stage::Dev), ["2"]);
  }

  #[test]
  fn unknown_stage_leaves_initiative_unplaced() {
    let csv = format!("{}7,Lost,,,Backlog,\r\n8,Blank,,,,\r\n", header());
    let board = import(&csv).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board.orphans().len(), 2);
    assert_eq!(board.columns().placed(), 0);
  }

  #[test]
  fn change_ticket_stage_name_is_recognised() {
    let csv = format!("{}4,Ticket,,,Change Ticket,\r\n", header());
    let board = import(&csv).unwrap();
    assert_eq!(ids(&board, Stage::ChangeTicket), ["4"]);
  }

  #[test]
  fn columns_in_any_order_and_extras_ignored() {
    let csv = "owner,stage,title,id\nalice,PROD,Shipped,42\n";
    let board = import(csv).unwrap();
    let shipped = board.initiative("42").unwrap();
    assert_eq!(shipped.title, "Shipped");
    assert_eq!(shipped.description, "");
    assert!(shipped.dependencies.is_empty());
    assert_eq!(ids(&board, Stage::Prod), ["42"]);
  }

  #[test]
  fn repeated_id_last_row_wins_once() {
    let csv = format!(
      "{}1,First,,,DEV,\r\n2,Other,,,DEV,\r\n1,Second,,done,QA,\r\n",
      header()
    );
    let board = import(&csv).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board.initiative("1").unwrap().title, "Second");
    assert_eq!(board.initiative("1").unwrap().status, Status::Done);
    assert_eq!(ids(&board, Stage::Dev), ["2"]);
    assert_eq!(ids(&board, Stage::Qa), ["1"]);
    assert!(board.check_invariants().is_empty());
  }

  #[test]
  fn header_only_gives_empty_board() {
    assert_eq!(import(&header()).unwrap(), Board::new());
  }

  // ── errors ───────────────────────────────────────────────────────────────

  #[test]
  fn empty_input_is_missing_header() {
    assert!(matches!(import(""), Err(Error::MissingHeader)));
    assert!(matches!(import("\r\n\r\n"), Err(Error::MissingHeader)));
  }

  #[test]
  fn header_without_id_column() {
    assert!(matches!(
      import("title,stage\nFoo,DEV\n"),
      Err(Error::MissingColumn("id"))
    ));
  }

  #[test]
  fn malformed_rows_report_line() {
    let open = format!("{}1,\"never closed,,,DEV,\r\n", header());
    assert!(matches!(import(&open), Err(Error::UnterminatedQuote { line: 2 })));

    let wide = format!("{}1,A,,,DEV,,extra\r\n", header());
    assert!(matches!(
      import(&wide),
      Err(Error::TooManyFields { line: 2, expected: 6, found: 7 })
    ));
  }

  // ── export ───────────────────────────────────────────────────────────────

  #[test]
  fn export_writes_header_and_crlf() {
    let csv = export(&Board::new());
    assert_eq!(csv, "id,title,description,status,stage,dependencies\r\n");
  }

  #[test]
  fn export_quotes_dependency_lists() {
    let board = import(&format!("{}1,Foo,,in_progress,QA,\"2,3\"\r\n", header())).unwrap();
    let csv = export(&board);
    assert!(csv.ends_with("1,Foo,,in_progress,QA,\"2,3\"\r\n"), "{csv}");
  }

  // ── round trip ───────────────────────────────────────────────────────────

  fn sample_board() -> Board {
    let board = Board::new();
    let (board, a) = board
      .create_initiative(Stage::Dev, NewInitiative {
        title:        "Billing, phase 1".into(),
        description:  "Line one\nLine \"two\"".into(),
        status:       Status::InProgress,
        dependencies: Vec::new(),
      })
      .unwrap();
    let (board, b) = board
      .create_initiative(Stage::Dev, NewInitiative::new("Second in DEV"))
      .unwrap();
    let (board, c) = board
      .create_initiative(Stage::Uat, NewInitiative {
        title:        "Depends".into(),
        description:  String::new(),
        status:       Status::Blocked,
        dependencies: vec![a.clone(), b.clone(), "missing".into(), a.clone()],
      })
      .unwrap();
    let board = board
      .move_initiative(
        b.as_str(),
        Placement::new(Stage::Dev, 0),
        Placement::new(Stage::Dev, 1),
      )
      .unwrap();
    board
      .update_initiative(c.as_str(), InitiativePatch {
        status: Some(Status::Done),
        ..Default::default()
      })
      .unwrap()
  }

  #[test]
  fn export_then_import_is_identity() {
    let board = sample_board();
    assert_eq!(ids(&board, Stage::Dev).len(), 2);
    assert_eq!(import(&export(&board)).unwrap(), board);
  }

  #[test]
  fn padded_dependency_ids_are_kept_verbatim() {
    let csv = format!("{}\" 5\",A,,,DEV,\r\n6,B,,,DEV,\" 5\"\r\n", header());
    let board = import(&csv).unwrap();

    let deps = &board.initiative("6").unwrap().dependencies;
    assert_eq!(deps, &vec![InitiativeId::from(" 5")]);
    assert_eq!(board.dependency_titles("6").unwrap(), ["A"]);
    assert_eq!(import(&export(&board)).unwrap(), board);
  }

  #[test]
  fn unplaced_initiatives_survive_round_trip() {
    let csv = format!("{}1,Placed,,,DEMO,\r\n2,Floating,,,,1\r\n", header());
    let board = import(&csv).unwrap();
    assert_eq!(import(&export(&board)).unwrap(), board);
    assert_eq!(board.orphans().len(), 1);
  }
}
