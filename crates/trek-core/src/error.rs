//! Error types for `trek-core`.

use thiserror::Error;

use crate::{initiative::InitiativeId, stage::Stage};

#[derive(Debug, Error)]
pub enum Error {
  #[error("initiative title must not be empty")]
  EmptyTitle,

  #[error("initiative not found: {0}")]
  NotFound(InitiativeId),

  /// A move named a source position that does not hold the initiative.
  #[error("initiative {id} is not at position {index} of stage {stage}")]
  Misplaced {
    id:    InitiativeId,
    stage: Stage,
    index: usize,
  },

  #[error("initiative {id} is already placed in stage {stage}")]
  AlreadyPlaced { id: InitiativeId, stage: Stage },

  #[error("board snapshot error: {0}")]
  Snapshot(#[from] serde_json::Error),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
