// src/specs/search.rs
//! Search results page.
//!
//! Series hits are the anchors inside `div.liste-series` blocks, in document
//! order. Each anchor's visible text, trimmed and otherwise untouched, is the
//! display title the resolver compares against the spreadsheet title.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::absolutize;
use crate::core::sanitize::title_key;

static SERIES_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.liste-series a[href]").expect("static selector"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub url: String,
}

impl Candidate {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), url: url.into() }
    }
}

/// All series anchors on the page, `page_url` used to absolutize hrefs.
pub fn parse_candidates(doc: &str, page_url: &str) -> Vec<Candidate> {
    let html = Html::parse_document(doc);
    html.select(&SERIES_LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let url = absolutize(href, page_url)?;
            let text = a.text().collect::<String>().trim().to_string();
            if text.is_empty() { return None; }
            Some(Candidate { text, url })
        })
        .collect()
}

/// First candidate whose text equals `title` after trimming and lowercasing.
/// No fuzzy matching: "Tintin (intégrale)" never stands in for "Tintin".
pub fn exact_match<'a>(candidates: &'a [Candidate], title: &str) -> Option<&'a Candidate> {
    let want = title_key(title);
    candidates.iter().find(|c| title_key(&c.text) == want)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="widget-line-title">Séries</div>
          <div class="liste-series">
            <ul>
              <li><a href="/serie-15-BD-Tintin-Les-aventures-de.html">Tintin (intégrale)</a></li>
              <li><a href="/serie-5-BD-Tintin.html">
                    Tintin
                  </a></li>
              <li><a href="https://www.bedetheque.com/serie-9-BD-Tintin.html">TINTIN</a></li>
            </ul>
          </div>
          <div class="liste-albums"><a href="/BD-Tintin-1.html">Tintin</a></div>
        </body></html>
    "#;

    #[test]
    fn candidates_come_from_series_blocks_in_order() {
        let found = parse_candidates(PAGE, "https://www.bedetheque.com/search/albums/?keywords=tintin");
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].text, "Tintin (intégrale)");
        assert_eq!(found[1], Candidate::new("Tintin", "https://www.bedetheque.com/serie-5-BD-Tintin.html"));
    }

    #[test]
    fn exact_match_takes_first_trimmed_case_insensitive_hit() {
        let candidates = vec![
            Candidate::new("Tintin", "url1"),
            Candidate::new("Tintin (intégrale)", "url2"),
        ];
        assert_eq!(exact_match(&candidates, " tintin ").map(|c| c.url.as_str()), Some("url1"));
        assert_eq!(exact_match(&candidates, "Tintin (Intégrale)").map(|c| c.url.as_str()), Some("url2"));
        assert!(exact_match(&candidates, "Tintin au Tibet").is_none());
    }

    #[test]
    fn inner_whitespace_is_part_of_the_title() {
        let page = r#"<div class="liste-series"><a href="/serie-7-BD-Schtroumpfs.html"> Les  Schtroumpfs </a></div>"#;
        let found = parse_candidates(page, "https://www.bedetheque.com/search/albums/?keywords=x");
        assert_eq!(found[0].text, "Les  Schtroumpfs");
        assert!(exact_match(&found, "les  schtroumpfs ").is_some());
        assert!(exact_match(&found, "Les Schtroumpfs").is_none());
    }

    #[test]
    fn page_without_series_block_yields_nothing() {
        assert!(parse_candidates("<html><body><p>Aucun résultat</p></body></html>", "https://x.test/").is_empty());
    }
}
