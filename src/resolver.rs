// src/resolver.rs
//
// Per-row decision procedure. Ordered, first match wins:
//
//   link present, cover valid      → skip_complete     (no fetch)
//   link present, cover not valid  → fetch_cover_only  (one fetch: the link)
//   link absent                    → search_and_fetch  (search, then the matched page)
//   link absent, no exact match    → not_found
//
// Fetch failures are recorded on the Resolution and read as "no result".
// Nothing here returns an error or touches the table.

use std::fmt;

use log::{debug, warn};

use crate::config::options::{ColumnLayout, SiteOptions};
use crate::core::net::Fetch;
use crate::specs::{search, serie};
use crate::table::{Field, Record, Update};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    SkipComplete,
    FetchCoverOnly,
    SearchAndFetch,
    NotFound,
    /// Operator pasted the series URL after the search found nothing.
    OperatorOverride,
}

impl Outcome {
    pub fn tag(self) -> &'static str {
        match self {
            Outcome::SkipComplete => "skip_complete",
            Outcome::FetchCoverOnly => "fetch_cover_only",
            Outcome::SearchAndFetch => "search_and_fetch",
            Outcome::NotFound => "not_found",
            Outcome::OperatorOverride => "operator_override",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub updates: Vec<Update>,
    pub search_url: Option<String>,
    pub cover_strategy: Option<&'static str>,
    /// One line per failed fetch, for the status line.
    pub failures: Vec<String>,
    /// Fetch calls made for this row.
    pub fetches: usize,
}

impl Resolution {
    fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            updates: Vec::new(),
            search_url: None,
            cover_strategy: None,
            failures: Vec::new(),
            fetches: 0,
        }
    }

    pub fn update(&self, field: Field) -> Option<&str> {
        self.updates.iter().rev().find(|u| u.field == field).map(|u| u.value.as_str())
    }
}

pub struct Resolver {
    site: SiteOptions,
    genres: bool,
}

impl Resolver {
    pub fn new(site: SiteOptions, layout: &ColumnLayout) -> Self {
        Self { site, genres: layout.genres.is_some() }
    }

    pub fn resolve(&self, record: &Record, fetch: &mut dyn Fetch) -> Resolution {
        if record.has_link() {
            if record.has_valid_cover(self.site.min_cover_len) {
                return Resolution::new(Outcome::SkipComplete);
            }
            let mut res = Resolution::new(Outcome::FetchCoverOnly);
            self.lookup_serie(record.link.trim(), false, &mut res, fetch);
            return res;
        }
        self.search_and_fetch(record, fetch)
    }

    /// Use an operator-supplied series URL instead of a search hit.
    pub fn resolve_override(&self, record: &Record, url: &str, fetch: &mut dyn Fetch) -> Resolution {
        let mut res = Resolution::new(Outcome::OperatorOverride);
        let url = url.trim();
        debug!("'{}': operator override {url}", record.title.trim());
        res.updates.push(Update::new(Field::Link, url));
        self.lookup_serie(url, self.genres, &mut res, fetch);
        res
    }

    fn search_and_fetch(&self, record: &Record, fetch: &mut dyn Fetch) -> Resolution {
        let mut res = Resolution::new(Outcome::SearchAndFetch);
        let search_url = self.site.search_url(&record.title);
        res.search_url = Some(search_url.clone());

        let Some(body) = fetch_logged(fetch, &search_url, &mut res) else {
            res.outcome = Outcome::NotFound;
            return res;
        };
        let candidates = search::parse_candidates(&body, &search_url);
        let Some(hit) = search::exact_match(&candidates, &record.title) else {
            debug!("'{}': {} candidates, no exact match", record.title.trim(), candidates.len());
            res.outcome = Outcome::NotFound;
            return res;
        };

        let url = hit.url.clone();
        res.updates.push(Update::new(Field::Link, url.as_str()));
        self.lookup_serie(&url, self.genres, &mut res, fetch);
        res
    }

    /// Cover (and optionally genres) from the series page at `url`.
    fn lookup_serie(&self, url: &str, with_genres: bool, res: &mut Resolution, fetch: &mut dyn Fetch) {
        let Some(body) = fetch_logged(fetch, url, res) else { return };
        let page = serie::parse(&body, url);

        match page.cover {
            Some(hit) => {
                res.cover_strategy = Some(hit.strategy);
                res.updates.push(Update::new(Field::Cover, hit.url));
            }
            None => debug!("{url}: no cover found"),
        }
        if with_genres {
            if let Some(g) = page.genres.primary {
                res.updates.push(Update::new(Field::PrimaryGenre, g));
            }
            if let Some(g) = page.genres.secondary {
                res.updates.push(Update::new(Field::SecondaryGenre, g));
            }
        }
    }
}

fn fetch_logged(fetch: &mut dyn Fetch, url: &str, res: &mut Resolution) -> Option<String> {
    res.fetches += 1;
    match fetch.fetch(url) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!("{url}: {e}");
            res.failures.push(format!("{url}: {e}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::options::GenreColumns;
    use crate::core::net::FetchError;

    #[derive(Default)]
    struct Pages {
        bodies: HashMap<String, String>,
        calls: Vec<String>,
    }

    impl Pages {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl Fetch for Pages {
        fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
            self.calls.push(url.to_string());
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status { status: 404, url: url.to_string() })
        }
    }

    const SERIE: &str = "https://www.bedetheque.com/serie-5-BD-Tintin.html";
    const COVER: &str = "https://www.bedetheque.com/media/Couvertures/tintin.jpg";

    fn resolver() -> Resolver {
        Resolver::new(SiteOptions::default(), &ColumnLayout::default())
    }

    fn serie_page() -> String {
        format!(r#"<html><head><meta property="og:image" content="{COVER}"></head>
            <body><ul><li><label>Genre :</label><span class="style-serie">Aventure, Humour</span></li></ul></body></html>"#)
    }

    fn search_page() -> String {
        format!(r#"<div class="liste-series">
            <a href="/serie-15-BD-Tintin-Integrale.html">Tintin (intégrale)</a>
            <a href="{SERIE}">Tintin</a></div>"#)
    }

    fn record(title: &str, link: &str, cover: &str) -> Record {
        Record { title: title.into(), link: link.into(), cover: cover.into() }
    }

    #[test]
    fn complete_rows_are_skipped_without_fetching() {
        let mut pages = Pages::default();
        let res = resolver().resolve(&record("Tintin", SERIE, COVER), &mut pages);
        assert_eq!(res.outcome, Outcome::SkipComplete);
        assert!(res.updates.is_empty());
        assert!(pages.calls.is_empty());
    }

    #[test]
    fn invalid_cover_fetches_the_existing_link_once() {
        for bad in ["", "Err:502", "www.x.com/c.jpg", "http://a"] {
            let mut pages = Pages::default().with(SERIE, &serie_page());
            let res = resolver().resolve(&record("Tintin", SERIE, bad), &mut pages);
            assert_eq!(res.outcome, Outcome::FetchCoverOnly);
            assert_eq!(pages.calls, vec![SERIE.to_string()]);
            assert_eq!(res.updates, vec![Update::new(Field::Cover, COVER)]);
            assert_eq!(res.cover_strategy, Some("og-image"));
        }
    }

    #[test]
    fn missing_link_searches_once_and_takes_exact_match() {
        let site = SiteOptions::default();
        let search_url = site.search_url(" tintin ");
        let mut pages = Pages::default().with(&search_url, &search_page()).with(SERIE, &serie_page());

        let res = resolver().resolve(&record(" tintin ", "", ""), &mut pages);
        assert_eq!(res.outcome, Outcome::SearchAndFetch);
        assert_eq!(pages.calls, vec![search_url.clone(), SERIE.to_string()]);
        assert_eq!(res.update(Field::Link), Some(SERIE));
        assert_eq!(res.update(Field::Cover), Some(COVER));
        assert_eq!(res.search_url.as_deref(), Some(search_url.as_str()));
        // genre columns are not in the default layout
        assert_eq!(res.update(Field::PrimaryGenre), None);
    }

    #[test]
    fn no_exact_match_is_not_found() {
        let site = SiteOptions::default();
        let search_url = site.search_url("Tintin au Tibet");
        let mut pages = Pages::default().with(&search_url, &search_page());

        let res = resolver().resolve(&record("Tintin au Tibet", "", ""), &mut pages);
        assert_eq!(res.outcome, Outcome::NotFound);
        assert!(res.updates.is_empty());
        assert_eq!(pages.calls.len(), 1);
    }

    #[test]
    fn failed_search_is_not_found_with_reason() {
        let mut pages = Pages::default();
        let res = resolver().resolve(&record("Spirou", "", ""), &mut pages);
        assert_eq!(res.outcome, Outcome::NotFound);
        assert_eq!(res.failures.len(), 1);
        assert!(res.failures[0].contains("HTTP 404"));
    }

    #[test]
    fn failed_cover_lookup_keeps_the_link() {
        let site = SiteOptions::default();
        let search_url = site.search_url("Tintin");
        let mut pages = Pages::default().with(&search_url, &search_page());

        let res = resolver().resolve(&record("Tintin", "", ""), &mut pages);
        assert_eq!(res.outcome, Outcome::SearchAndFetch);
        assert_eq!(res.updates, vec![Update::new(Field::Link, SERIE)]);
        assert_eq!(res.fetches, 2);
        assert_eq!(res.failures.len(), 1);
    }

    #[test]
    fn genre_layout_fills_genres_on_search_and_override() {
        let layout = ColumnLayout { genres: Some(GenreColumns { primary: 7, secondary: 11 }), ..ColumnLayout::default() };
        let resolver = Resolver::new(SiteOptions::default(), &layout);
        let mut pages = Pages::default().with(SERIE, &serie_page());

        let res = resolver.resolve_override(&record("Tintin !", "", ""), SERIE, &mut pages);
        assert_eq!(res.outcome, Outcome::OperatorOverride);
        assert_eq!(res.update(Field::Link), Some(SERIE));
        assert_eq!(res.update(Field::PrimaryGenre), Some("Aventure"));
        assert_eq!(res.update(Field::SecondaryGenre), Some("Humour"));
    }
}
