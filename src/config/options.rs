// src/config/options.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::consts::*;

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AppOptions {
    pub layout: ColumnLayout,
    pub site: SiteOptions,
    pub fetch: FetchOptions,
    pub run: RunOptions,
}

/// Fixed positions of the columns the resolver reads and writes.
/// The source sheet has no header names for these, so positions are the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    pub title: usize,
    pub link: usize,
    pub cover: usize,
    pub genres: Option<GenreColumns>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenreColumns {
    pub primary: usize,
    pub secondary: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            title: TITLE_COL,
            link: LINK_COL,
            cover: COVER_COL,
            genres: None,
        }
    }
}

impl ColumnLayout {
    /// Layout of the first spreadsheet revision (genres in H and L).
    pub fn with_genres(mut self) -> Self {
        self.genres = Some(GenreColumns {
            primary: PRIMARY_GENRE_COL,
            secondary: SECONDARY_GENRE_COL,
        });
        self
    }

    /// Minimum number of columns a table must have for this layout.
    pub fn required_width(&self) -> usize {
        let mut max = self.title.max(self.link).max(self.cover);
        if let Some(g) = self.genres {
            max = max.max(g.primary).max(g.secondary);
        }
        max + 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteOptions {
    pub base_url: String,
    pub search_path: String,
    pub login_url: String,
    pub min_cover_len: usize,
    pub header_keyword: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            search_path: s!(SEARCH_PATH),
            login_url: s!(LOGIN_URL),
            min_cover_len: MIN_COVER_LEN,
            header_keyword: s!(HEADER_KEYWORD),
        }
    }
}

impl SiteOptions {
    pub fn search_url(&self, title: &str) -> String {
        let query = urlencoding::encode(title.trim());
        join!(self.base_url.trim_end_matches('/'), &self.search_path, &query)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_attempts: u32,
    pub retry_base: Duration,
    pub block_backoff: Duration,
    pub request_pause: Duration,
    pub jitter_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            max_attempts: MAX_ATTEMPTS,
            retry_base: Duration::from_millis(RETRY_BASE_MS),
            block_backoff: Duration::from_secs(BLOCK_BACKOFF_SECS),
            request_pause: Duration::from_millis(REQUEST_PAUSE_MS),
            jitter_ms: JITTER_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    pub fn delim(&self) -> char {
        match self { TableFormat::Csv => ',', TableFormat::Tsv => '\t' }
    }

    /// `.tsv` / `.tab` → TSV, anything else → CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "tsv" || ext == "tab" => TableFormat::Tsv,
            _ => TableFormat::Csv,
        }
    }
}

/// Spreadsheet workbook (read through calamine) rather than delimited text.
pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Sheet to read when `input` is a workbook.
    pub sheet: String,
    pub output: Option<PathBuf>,
    pub audit_log: PathBuf,
    pub format: Option<TableFormat>,
    pub interactive: bool,
    pub row_delay: Duration,
    pub login: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            sheet: s!(SHEET_NAME),
            output: None,
            audit_log: PathBuf::from(DEFAULT_AUDIT_LOG),
            format: None,
            interactive: false,
            row_delay: Duration::from_millis(ROW_DELAY_MS),
            login: false,
        }
    }
}

impl RunOptions {
    /// Explicit output, or `<input stem>_out.<ext>` next to the input.
    /// Workbooks are written back as `<input stem>_out.csv`.
    pub fn output_path(&self) -> PathBuf {
        if let Some(out) = &self.output {
            return out.clone();
        }
        let stem = self.input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let ext = if is_workbook(&self.input) {
            Some(s!("csv"))
        } else {
            self.input.extension().map(|s| s.to_string_lossy().into_owned())
        };
        let name = match ext {
            Some(ext) => join!(&stem, DEFAULT_OUT_SUFFIX, ".", &ext),
            None => join!(&stem, DEFAULT_OUT_SUFFIX),
        };
        self.input.with_file_name(name)
    }

    pub fn input_format(&self) -> TableFormat {
        self.format.unwrap_or_else(|| TableFormat::from_path(&self.input))
    }

    pub fn output_format(&self) -> TableFormat {
        self.format.unwrap_or_else(|| TableFormat::from_path(&self.output_path()))
    }
}
