// src/cli.rs
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::Result;
use log::{LevelFilter, debug};

use crate::config::{consts::CONFIG_FILE, file, options::{AppOptions, TableFormat}};
use crate::driver::LineOperator;
use crate::runner::{self, CliProgress};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Format {
    Csv,
    Tsv,
}

impl From<Format> for TableFormat {
    fn from(f: Format) -> Self {
        match f { Format::Csv => TableFormat::Csv, Format::Tsv => TableFormat::Tsv }
    }
}

/// Fill series links and cover URLs into a comic-book spreadsheet.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Spreadsheet to reconcile (CSV, TSV, or an .xls/.xlsx/.ods workbook)
    #[arg(required_unless_present = "inspect_login")]
    pub input: Option<PathBuf>,

    /// Sheet to read from an .xls/.xlsx/.ods input [default: bd]
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output table [default: <input>_out.<ext>, .csv for workbooks]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Audit log, appended to
    #[arg(long = "log", value_name = "FILE")]
    pub audit_log: Option<PathBuf>,

    /// Pause after each updated row; paste links for unmatched titles
    #[arg(short, long)]
    pub interactive: bool,

    /// key = value overrides
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Delay between rows in non-interactive mode
    #[arg(long, value_name = "N")]
    pub delay_ms: Option<u64>,

    /// Table format [default: from the file extension]
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Also fill the genre columns (H and L)
    #[arg(long)]
    pub genres: bool,

    /// Log in to the authenticated site first (BDGEST_USER / BDGEST_PASSWORD)
    #[arg(long)]
    pub login: bool,

    /// Print the forms on the login page and exit
    #[arg(long)]
    pub inspect_login: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Layer the flags over `opts` (defaults, then config file).
    pub fn apply(&self, opts: &mut AppOptions) {
        if let Some(input) = &self.input {
            opts.run.input = input.clone();
        }
        if let Some(sheet) = &self.sheet {
            opts.run.sheet = sheet.clone();
        }
        if self.output.is_some() {
            opts.run.output = self.output.clone();
        }
        if let Some(log) = &self.audit_log {
            opts.run.audit_log = log.clone();
        }
        if self.interactive {
            opts.run.interactive = true;
        }
        if let Some(ms) = self.delay_ms {
            opts.run.row_delay = Duration::from_millis(ms);
        }
        if let Some(f) = self.format {
            opts.run.format = Some(f.into());
        }
        if self.genres && opts.layout.genres.is_none() {
            opts.layout = opts.layout.clone().with_genres();
        }
        if self.login {
            opts.run.login = true;
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, if args.verbose { LevelFilter::Debug } else { LevelFilter::Info });
    clog.init();

    let mut opts = AppOptions::default();
    let config = args.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    file::load(&config, &mut opts);
    args.apply(&mut opts);
    debug!("{opts:?}");

    if args.inspect_login {
        return runner::inspect_login(&opts);
    }
    runner::run(&opts, &mut LineOperator::stdin(), &mut CliProgress::default()).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "bd_catalog", "bd.csv", "--sheet", "Feuil1", "-o", "out.tsv", "--log", "a.log", "-i", "--delay-ms", "0", "--genres",
        ]);
        let mut opts = AppOptions::default();
        args.apply(&mut opts);

        assert_eq!(opts.run.input, PathBuf::from("bd.csv"));
        assert_eq!(opts.run.sheet, "Feuil1");
        assert_eq!(opts.run.output, Some(PathBuf::from("out.tsv")));
        assert_eq!(opts.run.audit_log, PathBuf::from("a.log"));
        assert!(opts.run.interactive);
        assert!(opts.run.row_delay.is_zero());
        assert!(opts.layout.genres.is_some());
        assert_eq!(opts.run.output_format(), TableFormat::Tsv);
    }

    #[test]
    fn input_is_optional_only_for_inspection() {
        assert!(Args::try_parse_from(["bd_catalog"]).is_err());
        assert!(Args::try_parse_from(["bd_catalog", "--inspect-login"]).is_ok());
    }
}
