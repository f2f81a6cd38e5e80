// src/table.rs
//
// Positional spreadsheet table. Rows are padded to one width on load, mutated in
// place by the driver, and written back whole after every processed row.
// Sources: CSV/TSV text, or one named sheet of an .xls/.xlsx/.ods workbook.
//
// - Record: owned snapshot of the cells the resolver cares about.
// - Update: one field write; never carries an empty value, so nothing gets cleared.

use std::{fs, io, path::{Path, PathBuf}};

use calamine::{Data, Range, Reader, open_workbook_auto};
use log::debug;
use thiserror::Error;

use crate::config::options::ColumnLayout;
use crate::config::consts::ERROR_CELL_PREFIX;
use crate::core::sanitize::is_empty_cell;
use crate::csv::{parse_rows, rows_to_string};
use crate::file::write_replace;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{} is not tabular data: {1}", .0.display())]
    NotTabular(PathBuf, &'static str),

    #[error("cannot open workbook {}: {msg}", path.display())]
    Workbook { path: PathBuf, msg: String },

    #[error("workbook {} has no sheet '{sheet}' (sheets: {})", path.display(), available.join(", "))]
    MissingSheet { path: PathBuf, sheet: String, available: Vec<String> },

    #[error("table has {found} columns, the column layout needs {needed}")]
    TooNarrow { needed: usize, found: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Link,
    Cover,
    PrimaryGenre,
    SecondaryGenre,
}

impl Field {
    pub fn column(self, layout: &ColumnLayout) -> Option<usize> {
        match self {
            Field::Link => Some(layout.link),
            Field::Cover => Some(layout.cover),
            Field::PrimaryGenre => layout.genres.map(|g| g.primary),
            Field::SecondaryGenre => layout.genres.map(|g| g.secondary),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub field: Field,
    pub value: String,
}

impl Update {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self { field, value: value.into() }
    }
}

/// Snapshot of one row's relevant cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub link: String,
    pub cover: String,
}

impl Record {
    pub fn has_link(&self) -> bool {
        !is_empty_cell(&self.link)
    }

    /// Plausible image URL: `http` prefix and at least `min_len` characters.
    /// Not a URL validator; it only screens out junk cells.
    pub fn has_valid_cover(&self, min_len: usize) -> bool {
        let c = self.cover.trim();
        !is_empty_cell(c) && c.starts_with("http") && c.chars().count() >= min_len
    }
}

#[derive(Clone, Debug)]
pub struct Table {
    rows: Vec<Vec<String>>,
    layout: ColumnLayout,
}

impl Table {
    pub fn load(path: &Path, sep: char, layout: ColumnLayout) -> Result<Self, TableError> {
        let bytes = fs::read(path).map_err(|source| TableError::Io { path: path.to_path_buf(), source })?;
        let text = String::from_utf8(bytes).map_err(|_| TableError::NotTabular(path.to_path_buf(), "not UTF-8 text"))?;
        let rows = parse_rows(&text, sep);
        if rows.is_empty() {
            return Err(TableError::NotTabular(path.to_path_buf(), "no rows"));
        }
        debug!("Loaded {} rows from {}", rows.len(), path.display());
        Self::from_rows(rows, layout)
    }

    /// Read sheet `sheet` of a workbook. Cells keep their sheet positions
    /// even when the used range does not start at A1.
    pub fn load_workbook(path: &Path, sheet: &str, layout: ColumnLayout) -> Result<Self, TableError> {
        let mut wb = open_workbook_auto(path)
            .map_err(|e| TableError::Workbook { path: path.to_path_buf(), msg: e.to_string() })?;
        let available = wb.sheet_names();
        if !available.iter().any(|n| n == sheet) {
            return Err(TableError::MissingSheet { path: path.to_path_buf(), sheet: s!(sheet), available });
        }
        let range = wb
            .worksheet_range(sheet)
            .map_err(|e| TableError::Workbook { path: path.to_path_buf(), msg: e.to_string() })?;
        let rows = range_rows(&range);
        if rows.is_empty() {
            return Err(TableError::NotTabular(path.to_path_buf(), "sheet is empty"));
        }
        debug!("Loaded {} rows from {} [{sheet}]", rows.len(), path.display());
        Self::from_rows(rows, layout)
    }

    /// Pads every row to the widest one; rejects tables narrower than the layout.
    pub fn from_rows(mut rows: Vec<Vec<String>>, layout: ColumnLayout) -> Result<Self, TableError> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let needed = layout.required_width();
        if width < needed {
            return Err(TableError::TooNarrow { needed, found: width });
        }
        for row in &mut rows {
            row.resize(width, s!());
        }
        Ok(Self { rows, layout })
    }

    pub fn len(&self) -> usize { self.rows.len() }
    pub fn width(&self) -> usize { self.rows.first().map_or(0, Vec::len) }
    pub fn rows(&self) -> &[Vec<String>] { &self.rows }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows.get(row).and_then(|r| r.get(col)).map_or("", String::as_str)
    }

    pub fn title(&self, row: usize) -> &str {
        self.cell(row, self.layout.title)
    }

    pub fn record(&self, row: usize) -> Record {
        Record {
            title: self.title(row).to_string(),
            link: self.cell(row, self.layout.link).to_string(),
            cover: self.cell(row, self.layout.cover).to_string(),
        }
    }

    /// First row with a title; the row after it when that title is the header.
    /// The keyword is only ever checked on this one row.
    pub fn data_start(&self, header_keyword: &str) -> usize {
        for i in 0..self.rows.len() {
            let title = self.title(i);
            if is_empty_cell(title) { continue; }
            return if is_header(title, header_keyword) { i + 1 } else { i };
        }
        self.rows.len()
    }

    pub fn is_eligible(&self, row: usize, data_start: usize) -> bool {
        row >= data_start && !is_empty_cell(self.title(row))
    }

    /// Write non-empty values that differ from the current cell.
    /// Returns the number of cells changed.
    pub fn apply(&mut self, row: usize, updates: &[Update]) -> usize {
        let mut changed = 0;
        for u in updates {
            if u.value.trim().is_empty() { continue; }
            let Some(col) = u.field.column(&self.layout) else { continue };
            let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) else { continue };
            if *cell != u.value {
                *cell = u.value.clone();
                changed += 1;
            }
        }
        changed
    }

    /// Full overwrite of `path` with the current rows.
    pub fn persist(&self, path: &Path, sep: char) -> io::Result<()> {
        write_replace(path, rows_to_string(&self.rows, sep).as_bytes())
    }
}

fn is_header(title: &str, keyword: &str) -> bool {
    !keyword.is_empty() && title.to_lowercase().contains(keyword)
}

/// Sheet cells as strings, re-anchored at A1.
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((top, left)) = range.start() else { return Vec::new() };
    let mut rows = vec![Vec::new(); top as usize];
    for r in range.rows() {
        let mut row = vec![s!(); left as usize];
        row.extend(r.iter().map(cell_text));
        rows.push(row);
    }
    rows
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => s!(),
        Data::String(v) => v.clone(),
        Data::Error(e) => format!("{ERROR_CELL_PREFIX}{e:?}"),
        other => other.to_string(),
    }
}
