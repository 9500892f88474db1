//! Error types for the trek-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("CSV input has no header row")]
  MissingHeader,

  #[error("CSV header has no {0:?} column")]
  MissingColumn(&'static str),

  #[error("line {line}: quoted field is never closed")]
  UnterminatedQuote { line: usize },

  #[error("line {line}: {found} fields, header has {expected}")]
  TooManyFields {
    line:     usize,
    expected: usize,
    found:    usize,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
