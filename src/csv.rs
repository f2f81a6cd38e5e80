// src/csv.rs
use std::io::{self, Write};
use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Minimal CSV/TSV parser (quotes + CRLF tolerant).
/// Every line is a row, blank ones included (as `[""]`); rows keep whatever
/// width they had on disk. Only the empty fragment after a final newline is dropped.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.strip_prefix('\u{feff}').unwrap_or(text).chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                rows.push(take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    // Flush any trailing field/row even if quotes were unterminated.
    if !row.is_empty() || !field.is_empty() || in_quotes {
        row.push(field);
        rows.push(row);
    }

    rows
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV/TSV row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first { write!(w, "{}", sep)?; } else { first = false; }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

pub fn rows_to_string(rows: &[Vec<String>], sep: char) -> String {
    let mut buf: Vec<u8> = Vec::new();
    for r in rows {
        let _ = write_row(&mut buf, r, sep);
    }

    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quotes_crlf_and_trailing_newline() {
        let text = "a,\"b, c\",\"say \"\"hi\"\"\"\r\n\r\n,,x\n";
        let rows = parse_rows(text, ',');
        assert_eq!(rows, vec![
            vec![s!("a"), s!("b, c"), s!("say \"hi\"")],
            vec![s!("")],
            vec![s!(""), s!(""), s!("x")],
        ]);
    }

    #[test]
    fn blank_lines_stay_rows() {
        assert_eq!(parse_rows("a\n\n\nb", ','), vec![vec![s!("a")], vec![s!("")], vec![s!("")], vec![s!("b")]]);
        assert!(parse_rows("", ',').is_empty());
        assert_eq!(parse_rows("\n", ','), vec![vec![s!("")]]);
    }

    #[test]
    fn writes_what_it_reads() {
        let rows = vec![
            vec![s!("Tintin"), s!("Hergé, Studios"), s!("")],
            vec![s!("multi\nline"), s!("\"q\""), s!("z")],
        ];
        let text = rows_to_string(&rows, ',');
        assert_eq!(parse_rows(&text, ','), rows);

        let tsv = rows_to_string(&rows[..1], '\t');
        assert_eq!(tsv, "Tintin\tHergé, Studios\t\n");
    }
}
