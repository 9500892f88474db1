//! Initiatives: the work items tracked on a board.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque initiative identifier. Assigned once at creation, never changed.
///
/// Ids must not contain a comma: the CSV `dependencies` field joins ids with
/// one.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InitiativeId(String);

impl InitiativeId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for InitiativeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Borrow<str> for InitiativeId {
  fn borrow(&self) -> &str { &self.0 }
}

impl From<&str> for InitiativeId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for InitiativeId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Progress of an initiative, independent of the stage it sits in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
  #[default]
  NotStarted,
  InProgress,
  Blocked,
  Done,
}

impl Status {
  pub const ALL: [Status; 4] = [
    Status::NotStarted,
    Status::InProgress,
    Status::Blocked,
    Status::Done,
  ];

  /// Wire value, e.g. `"in_progress"`.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Human-readable label, e.g. `"In Progress"`.
  pub fn label(self) -> &'static str {
    match self {
      Self::NotStarted => "Not Started",
      Self::InProgress => "In Progress",
      Self::Blocked => "Blocked",
      Self::Done => "Done",
    }
  }

  /// Accept either the wire value or the label, ignoring ASCII case and
  /// surrounding whitespace.
  pub fn parse_loose(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::ALL.into_iter().find(|status| {
      status.as_str().eq_ignore_ascii_case(s)
        || status.label().eq_ignore_ascii_case(s)
    })
  }
}

/// Snapshots written by older versions may carry `null` or an unknown string
/// here; both read back as the default rather than failing the whole load.
fn lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  Ok(match raw.as_deref() {
    None | Some("") => Status::default(),
    Some(s) => Status::parse_loose(s).unwrap_or_else(|| {
      tracing::warn!(status = s, "unknown initiative status; using default");
      Status::default()
    }),
  })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Initiative ──────────────────────────────────────────────────────────────

/// A trackable work item.
///
/// `dependencies` is semantically a set but kept as written: duplicates and
/// self references are accepted, and ids that no longer resolve are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
  /// Inside a snapshot the map key is authoritative; see
  /// [`crate::migrate::migrate`].
  #[serde(default)]
  pub id:           InitiativeId,
  #[serde(default, deserialize_with = "null_as_default")]
  pub title:        String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description:  String,
  #[serde(default, deserialize_with = "lenient_status")]
  pub status:       Status,
  #[serde(default, deserialize_with = "null_as_default")]
  pub dependencies: Vec<InitiativeId>,
}

/// Reject titles that are empty once surrounding whitespace is trimmed.
pub(crate) fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::EmptyTitle);
  }
  Ok(())
}

// ─── NewInitiative ───────────────────────────────────────────────────────────

/// Input to [`crate::Board::create_initiative`]. The id is always allocated
/// by the board; it is not accepted from callers.
#[derive(Debug, Clone, Default)]
pub struct NewInitiative {
  pub title:        String,
  pub description:  String,
  pub status:       Status,
  pub dependencies: Vec<InitiativeId>,
}

impl NewInitiative {
  /// Convenience constructor with every other field at its default.
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      ..Self::default()
    }
  }

  pub(crate) fn into_initiative(self, id: InitiativeId) -> Initiative {
    Initiative {
      id,
      title: self.title,
      description: self.description,
      status: self.status,
      dependencies: self.dependencies,
    }
  }
}

// ─── InitiativePatch ─────────────────────────────────────────────────────────

/// Partial update for [`crate::Board::update_initiative`]. `None` leaves the
/// field as it is.
#[derive(Debug, Clone, Default)]
pub struct InitiativePatch {
  pub title:        Option<String>,
  pub description:  Option<String>,
  pub status:       Option<Status>,
  pub dependencies: Option<Vec<InitiativeId>>,
}

impl InitiativePatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.status.is_none()
      && self.dependencies.is_none()
  }

  /// Merge this patch over `initiative`, returning the updated copy.
  pub(crate) fn apply(self, initiative: &Initiative) -> Result<Initiative> {
    let mut next = initiative.clone();
    if let Some(title) = self.title {
      next.title = title;
    }
    validate_title(&next.title)?;
    if let Some(description) = self.description {
      next.description = description;
    }
    if let Some(status) = self.status {
      next.status = status;
    }
    if let Some(dependencies) = self.dependencies {
      next.dependencies = dependencies;
    }
    Ok(next)
  }
}
