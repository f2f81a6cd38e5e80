// src/audit.rs
//
// Append-only audit log: one line per processed row, never rewritten.
//   YYYYMMDD,HHMMSS,Row,<n>,<title>,<prior link|empty>,<outcome>,<search url|empty>,<cover|empty>
// Fields are quoted with the table's CSV rules when they contain commas or quotes.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};

use crate::csv::write_row;
use crate::resolver::Outcome;

const EMPTY: &str = "empty";

#[derive(Clone, Debug)]
pub struct AuditEntry<'a> {
    pub at: DateTime<Local>,
    /// 1-based, as the operator sees it in the spreadsheet.
    pub row_number: usize,
    pub title: &'a str,
    pub prior_link: &'a str,
    pub outcome: Outcome,
    pub search_url: Option<&'a str>,
    pub cover: &'a str,
}

impl AuditEntry<'_> {
    pub fn fields(&self) -> Vec<String> {
        let or_empty = |s: &str| {
            let t = s.trim();
            if t.is_empty() { s!(EMPTY) } else { t.to_string() }
        };
        vec![
            self.at.format("%Y%m%d").to_string(),
            self.at.format("%H%M%S").to_string(),
            s!("Row"),
            self.row_number.to_string(),
            self.title.trim().to_string(),
            or_empty(self.prior_link),
            s!(self.outcome.tag()),
            or_empty(self.search_url.unwrap_or_default()),
            or_empty(self.cover),
        ]
    }
}

pub struct AuditLog {
    out: Box<dyn Write>,
    lines: usize,
}

impl AuditLog {
    /// Opens (or creates) `path` for appending; earlier runs' lines stay.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                crate::file::ensure_directory(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(w: impl Write + 'static) -> Self {
        Self { out: Box::new(w), lines: 0 }
    }

    /// Write one line and flush, so the log survives a crash on the next row.
    pub fn append(&mut self, entry: &AuditEntry<'_>) -> io::Result<()> {
        write_row(&mut self.out, &entry.fields(), ',')?;
        self.out.flush()?;
        self.lines += 1;
        Ok(())
    }

    /// Lines written by this process.
    pub fn lines(&self) -> usize { self.lines }
}
