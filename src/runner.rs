// src/runner.rs
use color_eyre::eyre::{Result, WrapErr};
use log::info;

use crate::{
    audit::AuditLog,
    config::options::{AppOptions, is_workbook},
    core::net::{Fetch, HttpFetcher},
    driver::{self, DriverOptions, Mode, Operator, RowReport, RunIo, RunSummary},
    progress::Progress,
    resolver::{Outcome, Resolver},
    specs::login::{self, Credentials},
    table::Table,
};

/// Prints one status line per row on stdout.
#[derive(Default)]
pub struct CliProgress {
    total: usize,
    done: usize,
}

impl Progress for CliProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        println!("{total} rows to process");
    }

    fn log(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn row_done(&mut self, r: &RowReport) {
        self.done += 1;
        let mut line = format!("[{}/{}] row {} '{}': {}", self.done, self.total, r.index + 1, r.title, r.outcome);
        if r.changed > 0 {
            line.push_str(&format!(", {} cell(s) updated", r.changed));
        }
        if let Some(strategy) = r.cover_strategy {
            line.push_str(&format!(" (cover via {strategy})"));
        }
        println!("{line}");
        for f in &r.failures {
            println!("    failed: {f}");
        }
    }

    fn finish(&mut self, s: &RunSummary) {
        println!(
            "Done: {} rows, {} updated, {} cells changed, {} fetches",
            s.processed, s.mutated_rows, s.changed_cells, s.fetches
        );
        for (outcome, n) in &s.outcomes {
            println!("    {outcome}: {n}");
        }
    }
}

/// Full run against the live site.
pub fn run(opts: &AppOptions, operator: &mut dyn Operator, progress: &mut dyn Progress) -> Result<RunSummary> {
    // Structural problems surface before the first request.
    let table = load_table(opts)?;

    let mut fetcher = HttpFetcher::new(opts.fetch.clone());
    if opts.run.login {
        let creds = Credentials::from_env()?;
        login::login(&mut fetcher, &opts.site.login_url, &creds).wrap_err("Login failed")?;
    }

    let summary = reconcile(opts, table, &mut fetcher, operator, progress)?;
    info!("{} HTTP requests", fetcher.requests());
    Ok(summary)
}

pub fn load_table(opts: &AppOptions) -> Result<Table> {
    let path = &opts.run.input;
    let loaded = if is_workbook(path) {
        Table::load_workbook(path, &opts.run.sheet, opts.layout.clone())
    } else {
        Table::load(path, opts.run.input_format().delim(), opts.layout.clone())
    };
    loaded.wrap_err_with(|| format!("Cannot use {} as input", path.display()))
}

/// Drive an already loaded table through `fetch`.
pub fn reconcile(
    opts: &AppOptions,
    mut table: Table,
    fetch: &mut dyn Fetch,
    operator: &mut dyn Operator,
    progress: &mut dyn Progress,
) -> Result<RunSummary> {
    let mut audit = AuditLog::open(&opts.run.audit_log)
        .wrap_err_with(|| format!("Cannot open audit log {}", opts.run.audit_log.display()))?;
    let resolver = Resolver::new(opts.site.clone(), &opts.layout);
    let dopts = DriverOptions {
        output: opts.run.output_path(),
        sep: opts.run.output_format().delim(),
        row_delay: opts.run.row_delay,
        header_keyword: opts.site.header_keyword.clone(),
    };
    let mode = if opts.run.interactive { Mode::Interactive } else { Mode::NonInteractive };

    info!("Writing {} (audit: {})", dopts.output.display(), opts.run.audit_log.display());
    let mut io = RunIo { fetch, audit: &mut audit, operator, progress };
    let summary = driver::run(&mut table, &resolver, &mut io, &dopts, mode)?;

    info!(
        "{} processed, {} not found, {} audit lines",
        summary.processed,
        summary.count(Outcome::NotFound),
        audit.lines()
    );
    Ok(summary)
}

/// Print every form on the login page.
pub fn inspect_login(opts: &AppOptions) -> Result<()> {
    let url = &opts.site.login_url;
    let mut fetcher = HttpFetcher::new(opts.fetch.clone());
    let page = fetcher.get_raw(url).wrap_err_with(|| format!("Cannot fetch {url}"))?;

    let forms = login::inspect_forms(&page);
    if forms.is_empty() {
        println!("No forms on {url}");
    }
    for (i, form) in forms.iter().enumerate() {
        println!("=== Form {} ===", i + 1);
        print!("{form}");
    }
    Ok(())
}
