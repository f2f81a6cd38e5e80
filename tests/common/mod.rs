// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use bd_catalog::config::options::{AppOptions, ColumnLayout, SiteOptions};
use bd_catalog::core::net::{Fetch, FetchError};
use bd_catalog::driver::{Operator, Reply};

pub const TINTIN: &str = "https://www.bedetheque.com/serie-5-BD-Tintin.html";
pub const SPIROU: &str = "https://www.bedetheque.com/serie-2-BD-Spirou-et-Fantasio.html";
pub const GASTON: &str = "https://www.bedetheque.com/serie-3-BD-Gaston.html";

/// Canned bodies by URL; anything else is a 404. Every call is recorded.
#[derive(Default)]
pub struct FakeFetch {
    pub bodies: HashMap<String, String>,
    pub calls: Vec<String>,
}

impl FakeFetch {
    pub fn with(mut self, url: &str, body: String) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }
}

impl Fetch for FakeFetch {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        self.calls.push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status { status: 404, url: url.to_string() })
    }
}

/// Replies in order; `Continue` once the script runs out.
#[derive(Default)]
pub struct ScriptedOperator {
    pub replies: VecDeque<Reply>,
    pub prompts: Vec<String>,
}

impl ScriptedOperator {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self { replies: replies.into_iter().collect(), prompts: Vec::new() }
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self, prompt: &str) -> io::Result<Reply> {
        self.prompts.push(prompt.to_string());
        Ok(self.replies.pop_front().unwrap_or(Reply::Continue))
    }
}

pub fn cover_of(name: &str) -> String {
    format!("https://www.bedetheque.com/media/Couvertures/{name}.jpg")
}

pub fn serie_page(name: &str) -> String {
    format!(
        r#"<html><head><meta property="og:image" content="{}"></head>
           <body><ul><li><label>Genre :</label><span class="style-serie">Aventure</span></li></ul></body></html>"#,
        cover_of(name)
    )
}

pub fn search_page(hits: &[(&str, &str)]) -> String {
    let links: String = hits
        .iter()
        .map(|(text, url)| format!(r#"<li><a href="{url}">{text}</a></li>"#))
        .collect();
    format!(r#"<html><body><div class="liste-series"><ul>{links}</ul></div></body></html>"#)
}

pub fn search_url(title: &str) -> String {
    SiteOptions::default().search_url(title)
}

/// Three-column layout (title, link, cover) reading `dir/bd.csv`, no row delay.
pub fn options(dir: &Path) -> AppOptions {
    let mut opts = AppOptions::default();
    opts.layout = ColumnLayout { title: 0, link: 1, cover: 2, genres: None };
    opts.run.input = dir.join("bd.csv");
    opts.run.audit_log = dir.join("audit.log");
    opts.run.row_delay = Duration::ZERO;
    opts
}

pub fn write_input(opts: &AppOptions, text: &str) {
    fs::write(&opts.run.input, text).unwrap();
}

pub fn read_output(opts: &AppOptions) -> Vec<Vec<String>> {
    let text = fs::read_to_string(opts.run.output_path()).unwrap();
    bd_catalog::csv::parse_rows(&text, ',')
}

pub fn audit_lines(opts: &AppOptions) -> Vec<Vec<String>> {
    match fs::read_to_string(&opts.run.audit_log) {
        Ok(text) => text.lines().map(|l| bd_catalog::csv::parse_rows(l, ',').remove(0)).collect(),
        Err(_) => Vec::new(),
    }
}
