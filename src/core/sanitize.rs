// src/core/sanitize.rs
use crate::config::consts::ERROR_CELL_PREFIX;

/// Collapse whitespace runs to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Comparison key for titles: trimmed, lowercased. No other folding.
pub fn title_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Blank cells and spreadsheet error values (`Err:502`) count as empty.
pub fn is_empty_cell(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.starts_with(ERROR_CELL_PREFIX)
}
