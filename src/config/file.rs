// src/config/file.rs
//
// Optional `key = value` overrides for AppOptions.
// Unknown keys and bad values are reported and ignored; a missing file means defaults.

use std::{fs, path::Path, time::Duration};

use log::{debug, warn};

use super::options::{AppOptions, GenreColumns};

pub fn load(path: &Path, opts: &mut AppOptions) {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return;
    }
    match fs::read_to_string(path) {
        Ok(text) => apply(&text, opts),
        Err(e) => warn!("Could not read config {}: {e}", path.display()),
    }
}

pub fn apply(text: &str, opts: &mut AppOptions) {
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        let Some(eq) = line.find('=') else {
            warn!("config line {}: expected key = value", n + 1);
            continue;
        };
        let key = line[..eq].trim();
        let val = line[eq + 1..].trim();
        if let Err(msg) = apply_one(key, val, opts) {
            warn!("config line {}: {msg}", n + 1);
        }
    }
}

fn apply_one(key: &str, val: &str, opts: &mut AppOptions) -> Result<(), String> {
    match key {
        "title_col" => opts.layout.title = column(val)?,
        "link_col" => opts.layout.link = column(val)?,
        "cover_col" => opts.layout.cover = column(val)?,
        "genre_cols" => {
            opts.layout.genres = if val.eq_ignore_ascii_case("off") || val.is_empty() {
                None
            } else {
                let mut parts = val.split(',');
                let primary = column(parts.next().unwrap_or_default())?;
                let secondary = column(parts.next().ok_or("genre_cols needs two columns")?)?;
                Some(GenreColumns { primary, secondary })
            };
        }
        "base_url" => opts.site.base_url = val.to_string(),
        "search_path" => opts.site.search_path = val.to_string(),
        "login_url" => opts.site.login_url = val.to_string(),
        "header_keyword" => opts.site.header_keyword = val.to_lowercase(),
        "min_cover_len" => opts.site.min_cover_len = number(val)? as usize,
        "connect_timeout_secs" => opts.fetch.connect_timeout = Duration::from_secs(number(val)?),
        "read_timeout_secs" => opts.fetch.read_timeout = Duration::from_secs(number(val)?),
        "max_attempts" => opts.fetch.max_attempts = (number(val)? as u32).max(1),
        "block_backoff_secs" => opts.fetch.block_backoff = Duration::from_secs(number(val)?),
        "request_pause_ms" => opts.fetch.request_pause = Duration::from_millis(number(val)?),
        "jitter_ms" => opts.fetch.jitter_ms = number(val)?,
        "row_delay_ms" => opts.run.row_delay = Duration::from_millis(number(val)?),
        "audit_log" => opts.run.audit_log = val.into(),
        "sheet" => opts.run.sheet = val.to_string(),
        "interactive" => opts.run.interactive = flag(val),
        other => return Err(format!("unknown key '{other}'")),
    }
    Ok(())
}

/// Accepts a 0-based index or a spreadsheet letter (`G`, `AA`).
fn column(val: &str) -> Result<usize, String> {
    let val = val.trim();
    if let Ok(n) = val.parse::<usize>() {
        return Ok(n);
    }
    if !val.is_empty() && val.chars().all(|c| c.is_ascii_alphabetic()) {
        let n = val
            .to_ascii_uppercase()
            .bytes()
            .try_fold(0usize, |acc, b| acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize))
            .ok_or_else(|| format!("invalid column '{val}'"))?;
        return Ok(n - 1);
    }
    Err(format!("invalid column '{val}'"))
}

fn number(val: &str) -> Result<u64, String> {
    val.parse::<u64>().map_err(|_| format!("invalid number '{val}'"))
}

fn flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true") || val.eq_ignore_ascii_case("yes")
}
