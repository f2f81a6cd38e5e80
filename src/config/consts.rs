// src/config/consts.rs

// Site
pub const BASE_URL: &str = "https://www.bedetheque.com";
pub const SEARCH_PATH: &str = "/search/albums/?keywords=";
pub const LOGIN_URL: &str = "https://online.bdgest.com/login";

// Credentials for the authenticated site come from the environment
pub const ENV_LOGIN_USER: &str = "BDGEST_USER";
pub const ENV_LOGIN_PASSWORD: &str = "BDGEST_PASSWORD";

// Column layout (0-based; G, K, M)
pub const TITLE_COL: usize = 6;
pub const LINK_COL: usize = 10;
pub const COVER_COL: usize = 12;
// Earliest layout carried genres in H and L
pub const PRIMARY_GENRE_COL: usize = 7;
pub const SECONDARY_GENRE_COL: usize = 11;

// Workbook input: sheet read from .xls/.xlsx/.ods files
pub const SHEET_NAME: &str = "bd";
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];

// Rows
pub const HEADER_KEYWORD: &str = "titre";
pub const ERROR_CELL_PREFIX: &str = "Err:";
pub const MIN_COVER_LEN: usize = 15;

// Output
pub const DEFAULT_OUT_SUFFIX: &str = "_out";
pub const DEFAULT_AUDIT_LOG: &str = "bd_catalog_audit.log";
pub const CONFIG_FILE: &str = "bd_catalog.cfg";

// Net
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
pub const READ_TIMEOUT_SECS: u64 = 30;
pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_MS: u64 = 750;
pub const BLOCK_BACKOFF_SECS: u64 = 60;
pub const REQUEST_PAUSE_MS: u64 = 1_000; // be polite
pub const JITTER_MS: u64 = 500; // extra 0..500 ms
pub const ROW_DELAY_MS: u64 = 2_000;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

// Lowercase substrings that mark an anti-bot page served with a 200
pub const BLOCK_MARKERS: &[&str] = &[
    "g-recaptcha",
    "cf-browser-verification",
    "trop de requêtes",
    "access denied",
];

// Operator
pub const AUTO_SENTINEL: &str = "auto";
