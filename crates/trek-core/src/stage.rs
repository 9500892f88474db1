//! The closed, ordered set of lifecycle stages a board is divided into.
//!
//! Stages are not data. Every board has exactly one column per variant, in
//! the order of [`Stage::ALL`].

use strum::{Display, EnumCount, EnumString, IntoStaticStr};

/// A lifecycle stage; rendered as one board column.
///
/// The strum names are the wire names used in persisted snapshots and in the
/// CSV `stage` field.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumCount,
  EnumString,
  IntoStaticStr,
)]
pub enum Stage {
  #[strum(serialize = "DEV")]
  Dev,
  #[strum(serialize = "QA")]
  Qa,
  #[strum(serialize = "DEMO")]
  Demo,
  #[strum(serialize = "UAT")]
  Uat,
  #[strum(to_string = "Change Ticket", serialize = "ChangeTicket")]
  ChangeTicket,
  #[strum(serialize = "PROD")]
  Prod,
}

impl Stage {
  /// Every stage, in board order.
  pub const ALL: [Stage; Stage::COUNT] = [
    Stage::Dev,
    Stage::Qa,
    Stage::Demo,
    Stage::Uat,
    Stage::ChangeTicket,
    Stage::Prod,
  ];

  /// Catch-all stage for initiatives whose column cannot be resolved.
  pub const FIRST: Stage = Stage::Dev;

  /// Column position of this stage on the board.
  pub fn index(self) -> usize { self as usize }

  /// The canonical wire name, e.g. `"Change Ticket"`.
  pub fn name(self) -> &'static str { self.into() }

  /// Resolve a wire name. Returns `None` for names outside the current set
  /// (legacy stages included).
  pub fn from_name(name: &str) -> Option<Self> { name.parse().ok() }
}
