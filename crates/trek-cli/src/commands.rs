//! Subcommands of the `trek` binary and their execution against a
//! [`Tracker`].

use std::{io::Write, path::PathBuf};

use anyhow::{Context as _, bail};
use clap::Subcommand;
use trek_core::{
  InitiativeId, InitiativePatch, NewInitiative, Stage, Status,
  moves::{DragResult, Placement},
  store::BoardStore,
  tracker::Tracker,
};

use crate::render;

// ─── Arguments ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print every stage with its initiatives.
  Board,

  /// Create an initiative at the top of a stage.
  Add {
    /// Stage to create it in (DEV, QA, DEMO, UAT, "Change Ticket", PROD).
    #[arg(value_parser = parse_stage)]
    stage:       Stage,
    title:       String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, value_parser = parse_status, default_value = "not_started")]
    status:      Status,
    /// Id of an initiative this one depends on. Repeatable.
    #[arg(long = "depends-on", value_name = "ID")]
    depends_on:  Vec<String>,
  },

  /// Change fields of an existing initiative.
  Edit {
    id:                 String,
    #[arg(long)]
    title:              Option<String>,
    #[arg(long)]
    description:        Option<String>,
    #[arg(long, value_parser = parse_status)]
    status:             Option<Status>,
    /// Replace the dependency list. Repeatable.
    #[arg(long = "depends-on", value_name = "ID")]
    depends_on:         Vec<String>,
    /// Remove every dependency.
    #[arg(long, conflicts_with = "depends_on")]
    clear_dependencies: bool,
  },

  /// Delete an initiative.
  Rm { id: String },

  /// Move an initiative to a stage, at the bottom unless `--index` is given.
  Mv {
    id:    String,
    #[arg(value_parser = parse_stage)]
    stage: Stage,
    /// Zero-based position in the destination column.
    #[arg(long)]
    index: Option<usize>,
  },

  /// List initiatives that may be chosen as dependencies.
  Candidates {
    /// Exclude this initiative (the one being edited).
    id: Option<String>,
  },

  /// Write the board as CSV.
  Export {
    /// Output file; stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },

  /// Replace the board with the contents of a CSV file.
  Import {
    #[arg(value_name = "FILE")]
    file: PathBuf,
  },
}

/// Accept a stage wire name, ignoring ASCII case.
pub fn parse_stage(s: &str) -> Result<Stage, String> {
  Stage::from_name(s)
    .or_else(|| {
      Stage::ALL
        .into_iter()
        .find(|stage| stage.name().eq_ignore_ascii_case(s.trim()))
    })
    .ok_or_else(|| {
      let names: Vec<&str> = Stage::ALL.iter().map(|stage| stage.name()).collect();
      format!("unknown stage {s:?}; expected one of: {}", names.join(", "))
    })
}

pub fn parse_status(s: &str) -> Result<Status, String> {
  Status::parse_loose(s).ok_or_else(|| {
    let names: Vec<&str> = Status::ALL.iter().map(|status| status.as_str()).collect();
    format!("unknown status {s:?}; expected one of: {}", names.join(", "))
  })
}

fn ids(raw: Vec<String>) -> Vec<InitiativeId> { raw.into_iter().map(InitiativeId::from).collect() }

// ─── Execution ───────────────────────────────────────────────────────────────

/// Run `command`, writing user-facing output to `out`.
pub async fn run<S: BoardStore>(
  command: Command,
  tracker: &mut Tracker<S>,
  out: &mut dyn Write,
) -> anyhow::Result<()> {
  match command {
    Command::Board => render::board(tracker.board(), out)?,

    Command::Add {
      stage,
      title,
      description,
      status,
      depends_on,
    } => {
      let id = tracker
        .create(stage, NewInitiative {
          title,
          description,
          status,
          dependencies: ids(depends_on),
        })
        .await
        .context("failed to create initiative")?;
      writeln!(out, "{id}")?;
    }

    Command::Edit {
      id,
      title,
      description,
      status,
      depends_on,
      clear_dependencies,
    } => {
      let dependencies = if clear_dependencies {
        Some(Vec::new())
      } else if depends_on.is_empty() {
        None
      } else {
        Some(ids(depends_on))
      };
      let patch = InitiativePatch {
        title,
        description,
        status,
        dependencies,
      };
      if patch.is_empty() {
        bail!("nothing to change; pass at least one field to edit");
      }
      tracker
        .update(&id, patch)
        .await
        .with_context(|| format!("failed to edit initiative {id}"))?;
    }

    Command::Rm { id } => {
      if !tracker.delete(&id).await {
        tracing::info!(%id, "no such initiative; nothing deleted");
      }
    }

    Command::Mv { id, stage, index } => {
      let to = Placement::new(stage, index.unwrap_or(usize::MAX));
      // Unplaced initiatives have no source to drag from.
      let moved = match tracker.board().placement_of(&id) {
        Some(source) => {
          let drag = DragResult {
            initiative_id: InitiativeId::from(id.as_str()),
            source,
            destination: Some(to),
          };
          tracker.drop_card(&drag).await
        }
        None => tracker.place(&id, to).await,
      };
      moved.with_context(|| format!("failed to move initiative {id}"))?;
    }

    Command::Candidates { id } => render::candidates(tracker.board(), id.as_deref(), out)?,

    Command::Export { output } => {
      let csv = trek_csv::export(tracker.board());
      match output {
        Some(path) => tokio::fs::write(&path, csv)
          .await
          .with_context(|| format!("failed to write {}", path.display()))?,
        None => out.write_all(csv.as_bytes())?,
      }
    }

    Command::Import { file } => {
      let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
      let board = trek_csv::import(&text)
        .with_context(|| format!("failed to import {}", file.display()))?;
      let count = board.len();
      tracker.replace(board).await;
      writeln!(out, "imported {count} initiatives")?;
    }
  }

  if tracker.is_dirty() {
    tracker.save().await.context("board changed but could not be saved")?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use trek_core::store::{DEFAULT_BOARD_KEY, MemoryStore};

  use super::*;

  async fn tracker() -> Tracker<MemoryStore> { Tracker::open(MemoryStore::new()).await }

  async fn exec(tracker: &mut Tracker<MemoryStore>, command: Command) -> String {
    let mut out = Vec::new();
    run(command, tracker, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
  }

  async fn add(tracker: &mut Tracker<MemoryStore>, stage: Stage, title: &str) -> String {
    let out = exec(tracker, Command::Add {
      stage,
      title: title.into(),
      description: String::new(),
      status: Status::NotStarted,
      depends_on: Vec::new(),
    })
    .await;
    out.trim().to_owned()
  }

  #[test]
  fn stage_and_status_arguments() {
    assert_eq!(parse_stage("qa"), Ok(Stage::Qa));
    assert_eq!(parse_stage("change ticket"), Ok(Stage::ChangeTicket));
    assert_eq!(parse_stage("ChangeTicket"), Ok(Stage::ChangeTicket));
    assert!(parse_stage("Production").is_err());

    assert_eq!(parse_status("done"), Ok(Status::Done));
    assert_eq!(parse_status("In Progress"), Ok(Status::InProgress));
    assert!(parse_status("later").is_err());
  }

  #[tokio::test]
  async fn add_edit_move_remove() {
    let mut t = tracker().await;
    let id = add(&mut t, Stage::Dev, "Launch").await;
    assert_eq!(t.board().stage_of(&id), Some(Stage::Dev));

    exec(&mut t, Command::Edit {
      id:                 id.clone(),
      title:              None,
      description:        None,
      status:             Some(Status::Done),
      depends_on:         vec!["elsewhere".into()],
      clear_dependencies: false,
    })
    .await;
    let launch = t.board().initiative(&id).unwrap();
    assert_eq!(launch.status, Status::Done);
    assert_eq!(launch.dependencies, vec![InitiativeId::from("elsewhere")]);

    exec(&mut t, Command::Mv {
      id:    id.clone(),
      stage: Stage::Qa,
      index: Some(0),
    })
    .await;
    assert!(t.board().column(Stage::Dev).is_empty());
    assert_eq!(t.board().stage_of(&id), Some(Stage::Qa));

    exec(&mut t, Command::Rm { id: id.clone() }).await;
    assert!(t.board().is_empty());
    exec(&mut t, Command::Rm { id }).await;
  }

  #[tokio::test]
  async fn move_defaults_to_bottom_of_column() {
    let mut t = tracker().await;
    let a = add(&mut t, Stage::Dev, "A").await;
    let b = add(&mut t, Stage::Dev, "B").await;
    assert_eq!(t.board().placement_of(&b), Some(Placement::new(Stage::Dev, 0)));

    exec(&mut t, Command::Mv {
      id:    b.clone(),
      stage: Stage::Dev,
      index: None,
    })
    .await;
    assert_eq!(t.board().column(Stage::Dev), &[
      InitiativeId::from(a),
      InitiativeId::from(b)
    ]);
  }

  #[tokio::test]
  async fn empty_edit_is_rejected() {
    let mut t = tracker().await;
    let id = add(&mut t, Stage::Dev, "A").await;
    let mut out = Vec::new();
    let result = run(
      Command::Edit {
        id,
        title: None,
        description: None,
        status: None,
        depends_on: Vec::new(),
        clear_dependencies: false,
      },
      &mut t,
      &mut out,
    )
    .await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn unknown_id_errors_carry_context() {
    let mut t = tracker().await;
    let mut out = Vec::new();
    let err = run(
      Command::Mv {
        id:    "ghost".into(),
        stage: Stage::Qa,
        index: None,
      },
      &mut t,
      &mut out,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("ghost"));
  }

  #[tokio::test]
  async fn export_import_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.csv");

    let mut t = tracker().await;
    add(&mut t, Stage::Uat, "Sign-off, final").await;
    add(&mut t, Stage::Prod, "Live").await;
    let before = t.board().clone();

    exec(&mut t, Command::Export {
      output: Some(path.clone()),
    })
    .await;
    exec(&mut t, Command::Rm {
      id: before.column(Stage::Prod)[0].to_string(),
    })
    .await;
    assert_eq!(t.board().len(), 1);

    let out = exec(&mut t, Command::Import { file: path }).await;
    assert_eq!(out, "imported 2 initiatives\n");
    assert_eq!(t.board(), &before);
  }

  #[tokio::test]
  async fn export_to_stdout_and_board_listing() {
    let mut t = tracker().await;
    add(&mut t, Stage::Demo, "Show").await;

    let csv = exec(&mut t, Command::Export { output: None }).await;
    assert!(csv.starts_with("id,title,description,status,stage,dependencies\r\n"));
    assert!(csv.contains(",Show,,not_started,DEMO,\r\n"));

    let listing = exec(&mut t, Command::Board).await;
    assert!(listing.contains("DEMO (1)"));
    assert!(listing.contains("Show · Not Started"));
  }

  #[tokio::test]
  async fn malformed_import_leaves_board_and_store_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "id,title,stage\n1,\"never closed,DEV\n").unwrap();

    let store = MemoryStore::new();
    let mut t = Tracker::open(store.clone()).await;
    add(&mut t, Stage::Qa, "Keep me").await;
    let board_before = t.board().clone();
    let stored_before = store.get(DEFAULT_BOARD_KEY);

    let mut out = Vec::new();
    let result = run(Command::Import { file: path }, &mut t, &mut out).await;

    assert!(result.is_err());
    assert_eq!(t.board(), &board_before);
    assert_eq!(store.get(DEFAULT_BOARD_KEY), stored_before);
    assert!(out.is_empty());
  }

  #[tokio::test]
  async fn import_places_orphans_with_mv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("in.csv");
    std::fs::write(&path, "id,title,stage\n9,Floating,Backlog\n").unwrap();

    let mut t = tracker().await;
    exec(&mut t, Command::Import { file: path }).await;
    assert_eq!(t.board().orphans().len(), 1);

    exec(&mut t, Command::Mv {
      id:    "9".into(),
      stage: Stage::Demo,
      index: None,
    })
    .await;
    assert_eq!(t.board().stage_of("9"), Some(Stage::Demo));
  }
}
