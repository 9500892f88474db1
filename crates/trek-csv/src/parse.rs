//! RFC 4180 record reader.
//!
//! Pipeline:
//!   raw &str
//!     └─ read_records()     → Vec<Record>   (quote-aware field split)
//!          └─ Layout        → header name → field index
//!               └─ row_to_initiative() → Initiative + optional Stage

use std::collections::HashMap;

use trek_core::{Initiative, InitiativeId, Stage, Status};

use crate::error::{Error, Result};

// ─── Records ─────────────────────────────────────────────────────────────────

/// One logical CSV record. `line` is the 1-based line it starts on.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Record {
  pub line:   usize,
  pub fields: Vec<String>,
}

impl Record {
  /// A line with nothing on it.
  fn is_blank(&self) -> bool { self.fields.len() == 1 && self.fields[0].is_empty() }
}

/// Split `input` into records.
///
/// Accepts CRLF, LF or bare CR line endings and a leading byte-order mark.
/// Quoted fields may contain commas, doubled quotes and line breaks. A quote
/// in the middle of an unquoted field is kept literally. Blank lines are
/// dropped.
pub(crate) fn read_records(input: &str) -> Result<Vec<Record>> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);

  let mut records = Vec::new();
  let mut fields: Vec<String> = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  // Set once a quoted section opened, so `""` is still a (present) field.
  let mut quoted = false;
  let mut line = 1;
  let mut record_line = 1;

  let mut chars = input.chars().peekable();
  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push(c);
        }
        '\r' => {
          if chars.peek() != Some(&'\n') {
            line += 1;
          }
          field.push(c);
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' if field.is_empty() && !quoted => {
        in_quotes = true;
        quoted = true;
      }
      ',' => {
        fields.push(std::mem::take(&mut field));
        quoted = false;
      }
      '\r' if chars.peek() == Some(&'\n') => {}
      '\r' | '\n' => {
        fields.push(std::mem::take(&mut field));
        quoted = false;
        push_record(&mut records, record_line, std::mem::take(&mut fields));
        line += 1;
        record_line = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote { line: record_line });
  }
  if !field.is_empty() || !fields.is_empty() || quoted {
    fields.push(field);
    push_record(&mut records, record_line, fields);
  }
  Ok(records)
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>) {
  let record = Record { line, fields };
  if !record.is_blank() {
    records.push(record);
  }
}

// ─── Header layout ───────────────────────────────────────────────────────────

/// Where each known column sits in a row. Column order in the file is free;
/// unrecognised columns are ignored.
pub(crate) struct Layout {
  width:   usize,
  columns: HashMap<String, usize>,
}

impl Layout {
  pub(crate) fn from_header(header: &Record) -> Result<Self> {
    let mut columns = HashMap::new();
    for (i, name) in header.fields.iter().enumerate() {
      columns.entry(name.trim().to_owned()).or_insert(i);
    }
    if !columns.contains_key("id") {
      return Err(Error::MissingColumn("id"));
    }
    Ok(Self {
      width: header.fields.len(),
      columns,
    })
  }

  /// The value of column `name` in `record`; empty when the column or the
  /// trailing field is absent.
  fn get<'r>(&self, record: &'r Record, name: &str) -> &'r str {
    self
      .columns
      .get(name)
      .and_then(|&i| record.fields.get(i))
      .map_or("", String::as_str)
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Decode one data row. Returns `Ok(None)` for rows without an id.
pub(crate) fn row_to_initiative(
  layout: &Layout,
  record: &Record,
) -> Result<Option<(Initiative, Option<Stage>)>> {
  if record.fields.len() > layout.width {
    return Err(Error::TooManyFields {
      line:     record.line,
      expected: layout.width,
      found:    record.fields.len(),
    });
  }

  let id = layout.get(record, "id");
  if id.is_empty() {
    tracing::debug!(line = record.line, "skipping CSV row without id");
    return Ok(None);
  }

  let initiative = Initiative {
    id:           InitiativeId::from(id),
    title:        layout.get(record, "title").to_owned(),
    description:  layout.get(record, "description").to_owned(),
    status:       parse_status(layout.get(record, "status"), record.line),
    dependencies: parse_dependencies(layout.get(record, "dependencies")),
  };

  // Stage names are a closed vocabulary, so padding is noise. Ids and
  // dependency tokens are kept byte for byte.
  let stage_name = layout.get(record, "stage").trim();
  let stage = Stage::from_name(stage_name);
  if stage.is_none() && !stage_name.is_empty() {
    tracing::warn!(
      line = record.line,
      id,
      stage = stage_name,
      "unknown stage; initiative imported without a column"
    );
  }

  Ok(Some((initiative, stage)))
}

fn parse_status(raw: &str, line: usize) -> Status {
  if raw.trim().is_empty() {
    return Status::default();
  }
  Status::parse_loose(raw).unwrap_or_else(|| {
    tracing::warn!(line, status = raw, "unknown status; using default");
    Status::default()
  })
}

/// Split a comma-joined id list, dropping empty tokens. Tokens are not
/// trimmed: ` 5` and `5` are different ids.
pub(crate) fn parse_dependencies(raw: &str) -> Vec<InitiativeId> {
  raw
    .split(crate::DEPENDENCY_DELIMITER)
    .filter(|token| !token.is_empty())
    .map(InitiativeId::from)
    .collect()
}
