//! RFC 4180 record writer.
//!
//! Produces CRLF record endings. Only fields that need it are quoted.

// ─── Field quoting ───────────────────────────────────────────────────────────

/// `true` if `field` must be wrapped in quotes to survive a read.
fn needs_quotes(field: &str) -> bool { field.contains([',', '"', '\r', '\n']) }

fn write_field(out: &mut String, field: &str) {
  if needs_quotes(field) {
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
  } else {
    out.push_str(field);
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Append one record, terminated by CRLF.
pub(crate) fn write_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
  for (i, field) in fields.into_iter().enumerate() {
    if i > 0 {
      out.push(',');
    }
    write_field(out, field);
  }
  out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(fields: &[&str]) -> String {
    let mut out = String::new();
    write_record(&mut out, fields.iter().copied());
    out
  }

  #[test]
  fn plain_fields_are_bare() {
    assert_eq!(record(&["1", "Foo", "", "done"]), "1,Foo,,done\r\n");
  }

  #[test]
  fn separators_and_quotes_are_quoted() {
    assert_eq!(record(&["2,3"]), "\"2,3\"\r\n");
    assert_eq!(record(&["say \"hi\""]), "\"say \"\"hi\"\"\"\r\n");
    assert_eq!(record(&["a\nb", "c\r\nd"]), "\"a\nb\",\"c\r\nd\"\r\n");
  }

  #[test]
  fn spaces_alone_do_not_force_quotes() {
    assert_eq!(record(&[" padded "]), " padded \r\n");
  }
}
