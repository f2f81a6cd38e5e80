// src/driver.rs
//
// Batch driver: walks the table in order and, for each eligible row,
//   resolve → (operator override) → apply → audit → persist → report → prompt/pace.
//
// The run mode is passed into every row call and handed back out; it only ever
// moves Interactive → NonInteractive.

use std::{
    collections::BTreeMap,
    io::{self, BufRead, StdinLock, Stdout, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use chrono::Local;
use log::{debug, info};
use thiserror::Error;

use crate::audit::{AuditEntry, AuditLog};
use crate::config::consts::AUTO_SENTINEL;
use crate::core::net::Fetch;
use crate::progress::Progress;
use crate::resolver::{Outcome, Resolution, Resolver};
use crate::table::Table;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot write output {}: {source}", path.display())]
    Persist { path: PathBuf, source: io::Error },

    #[error("cannot append to audit log: {0}")]
    Audit(#[source] io::Error),

    #[error("cannot read operator input: {0}")]
    Operator(#[source] io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Pause for the operator after every row that changed something.
    Interactive,
    /// No prompts; a fixed delay between rows that hit the network.
    NonInteractive,
}

/// What the operator typed at a prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Continue,
    /// The sentinel: stop asking for the rest of the run.
    Auto,
    /// A series URL to use for a row the search could not match.
    Link(String),
}

pub fn parse_reply(line: &str) -> Reply {
    let t = line.trim();
    if t.eq_ignore_ascii_case(AUTO_SENTINEL) {
        Reply::Auto
    } else if t.starts_with("http://") || t.starts_with("https://") {
        Reply::Link(t.to_string())
    } else {
        Reply::Continue
    }
}

pub trait Operator {
    fn ask(&mut self, prompt: &str) -> io::Result<Reply>;
}

/// Writes the prompt to `output`, reads one line from `input`.
/// End of input reads as `auto`.
pub struct LineOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LineOperator<StdinLock<'static>, Stdout> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Operator for LineOperator<R, W> {
    fn ask(&mut self, prompt: &str) -> io::Result<Reply> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = s!();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Reply::Auto);
        }
        Ok(parse_reply(&line))
    }
}

pub struct DriverOptions {
    pub output: PathBuf,
    pub sep: char,
    pub row_delay: Duration,
    pub header_keyword: String,
}

/// The collaborators a run talks to.
pub struct RunIo<'a> {
    pub fetch: &'a mut dyn Fetch,
    pub audit: &'a mut AuditLog,
    pub operator: &'a mut dyn Operator,
    pub progress: &'a mut dyn Progress,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowReport {
    /// 0-based table index.
    pub index: usize,
    pub title: String,
    pub outcome: Outcome,
    pub changed: usize,
    pub fetches: usize,
    pub cover_strategy: Option<&'static str>,
    pub failures: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub mutated_rows: usize,
    pub changed_cells: usize,
    pub fetches: usize,
    pub outcomes: BTreeMap<Outcome, usize>,
    pub final_mode: Option<Mode>,
}

impl RunSummary {
    fn record(&mut self, report: &RowReport) {
        self.processed += 1;
        self.changed_cells += report.changed;
        self.fetches += report.fetches;
        if report.changed > 0 {
            self.mutated_rows += 1;
        }
        *self.outcomes.entry(report.outcome).or_default() += 1;
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }
}

/// Process every eligible row, persisting after each one and once at the end.
pub fn run(
    table: &mut Table,
    resolver: &Resolver,
    io: &mut RunIo<'_>,
    opts: &DriverOptions,
    mode: Mode,
) -> Result<RunSummary, RunError> {
    let start = table.data_start(&opts.header_keyword);
    let eligible: Vec<usize> = (0..table.len())
        .filter(|&i| table.is_eligible(i, start))
        .collect();

    info!(
        "{} rows, data starts at row {}, {} to process ({:?})",
        table.len(), start + 1, eligible.len(), mode
    );
    io.progress.begin(eligible.len());

    let mut mode = mode;
    let mut summary = RunSummary::default();
    for idx in eligible {
        let (report, next) = process_row(table, idx, resolver, io, opts, mode)?;
        if next != mode {
            io.progress.log("Switched to non-interactive mode for the remaining rows.");
        }
        mode = next;
        summary.record(&report);
    }

    persist(table, opts)?;
    summary.final_mode = Some(mode);
    io.progress.finish(&summary);
    Ok(summary)
}

/// One row, start to finish. Returns the report and the mode for the next row.
pub fn process_row(
    table: &mut Table,
    idx: usize,
    resolver: &Resolver,
    io: &mut RunIo<'_>,
    opts: &DriverOptions,
    mode: Mode,
) -> Result<(RowReport, Mode), RunError> {
    let mut mode = mode;
    let record = table.record(idx);
    let row_number = idx + 1;
    debug!("Row {row_number}: '{}'", record.title.trim());

    let mut res = resolver.resolve(&record, io.fetch);

    let mut prompted = false;
    if mode == Mode::Interactive && res.outcome == Outcome::NotFound {
        prompted = true;
        let prompt = format!(
            "Row {row_number}: no exact match for '{}'. Paste a series URL, Enter to skip, '{AUTO_SENTINEL}' to stop asking: ",
            record.title.trim()
        );
        match io.operator.ask(&prompt).map_err(RunError::Operator)? {
            Reply::Link(url) => res = with_override(res, resolver.resolve_override(&record, &url, io.fetch)),
            Reply::Auto => mode = Mode::NonInteractive,
            Reply::Continue => {}
        }
    }

    let changed = table.apply(idx, &res.updates);
    let cover_after = table.record(idx).cover;

    io.audit
        .append(&AuditEntry {
            at: Local::now(),
            row_number,
            title: &record.title,
            prior_link: &record.link,
            outcome: res.outcome,
            search_url: res.search_url.as_deref(),
            cover: &cover_after,
        })
        .map_err(RunError::Audit)?;

    persist(table, opts)?;

    let report = RowReport {
        index: idx,
        title: record.title.trim().to_string(),
        outcome: res.outcome,
        changed,
        fetches: res.fetches,
        cover_strategy: res.cover_strategy,
        failures: res.failures,
    };
    io.progress.row_done(&report);

    match mode {
        Mode::Interactive if changed > 0 && !prompted => {
            let prompt = format!("Enter to continue, '{AUTO_SENTINEL}' to stop asking: ");
            if io.operator.ask(&prompt).map_err(RunError::Operator)? == Reply::Auto {
                mode = Mode::NonInteractive;
            }
        }
        Mode::NonInteractive if report.fetches > 0 && !opts.row_delay.is_zero() => {
            thread::sleep(opts.row_delay);
        }
        _ => {}
    }

    Ok((report, mode))
}

/// The override replaces the outcome; the search trail and its failures stay.
fn with_override(searched: Resolution, mut over: Resolution) -> Resolution {
    over.search_url = searched.search_url;
    over.fetches += searched.fetches;
    let mut failures = searched.failures;
    failures.append(&mut over.failures);
    over.failures = failures;
    over
}

fn persist(table: &Table, opts: &DriverOptions) -> Result<(), RunError> {
    table
        .persist(&opts.output, opts.sep)
        .map_err(|source| RunError::Persist { path: opts.output.clone(), source })
}
