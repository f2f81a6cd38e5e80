// src/specs/serie.rs
//! Series detail page: cover image and genres.
//!
//! Cover precedence (first non-empty wins, order is the contract):
//! 1. `og-image` – `<meta property="og:image" content="…">`, the site's own pick.
//! 2. `cover-element` – an `<img>` carrying or wrapped in a cover class
//!    (`couverture` on the French site, `cover` elsewhere).
//! 3. `content-image` – first image in the main content area.
//!
//! Genres live in the info list: `<li><label>Genre :</label><span class="style-serie">A, B</span></li>`.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::absolutize;
use crate::core::sanitize::normalize_ws;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static OG_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"meta[property="og:image"], meta[name="og:image"]"#));
static COVER_IMG: LazyLock<Selector> = LazyLock::new(|| {
    selector(".couverture img, img.couverture, .cover img, img.cover, img[itemprop=\"image\"]")
});
static CONTENT_IMG: LazyLock<Selector> =
    LazyLock::new(|| selector("#content img, .content img, main img, article img"));
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static GENRE_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span.style-serie"));

pub struct CoverStrategy {
    pub name: &'static str,
    extract: fn(&Html) -> Option<String>,
}

pub const COVER_STRATEGIES: &[CoverStrategy] = &[
    CoverStrategy { name: "og-image", extract: og_image },
    CoverStrategy { name: "cover-element", extract: cover_element },
    CoverStrategy { name: "content-image", extract: content_image },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverHit {
    pub strategy: &'static str,
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Genres {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

/// Everything the resolver wants from one detail page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeriePage {
    pub cover: Option<CoverHit>,
    pub genres: Genres,
}

pub fn parse(doc: &str, page_url: &str) -> SeriePage {
    let html = Html::parse_document(doc);
    SeriePage {
        cover: cover_from(&html, page_url),
        genres: genres_from(&html),
    }
}

pub fn extract_cover(doc: &str, page_url: &str) -> Option<CoverHit> {
    cover_from(&Html::parse_document(doc), page_url)
}

fn cover_from(html: &Html, page_url: &str) -> Option<CoverHit> {
    COVER_STRATEGIES.iter().find_map(|s| {
        let raw = (s.extract)(html)?;
        let url = absolutize(&raw, page_url)?;
        Some(CoverHit { strategy: s.name, url })
    })
}

fn og_image(html: &Html) -> Option<String> {
    html.select(&OG_IMAGE)
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn cover_element(html: &Html) -> Option<String> {
    html.select(&COVER_IMG).find_map(img_source)
}

fn content_image(html: &Html) -> Option<String> {
    html.select(&CONTENT_IMG).find_map(img_source)
}

/// `src`, or the lazy-loading `data-src` some pages use instead.
fn img_source(img: ElementRef<'_>) -> Option<String> {
    ["src", "data-src"]
        .iter()
        .filter_map(|a| img.value().attr(a))
        .map(str::trim)
        .find(|v| !v.is_empty() && !v.starts_with("data:"))
        .map(str::to_string)
}

fn genres_from(html: &Html) -> Genres {
    for li in html.select(&LIST_ITEM) {
        let text = normalize_ws(&li.text().collect::<String>());
        if !is_genre_label(&text) { continue; }
        let Some(span) = li.select(&GENRE_SPAN).next() else { return Genres::default() };
        let list: Vec<String> = span
            .text()
            .collect::<String>()
            .split(',')
            .map(normalize_ws)
            .filter(|g| !g.is_empty())
            .collect();
        return split_genres(list);
    }
    Genres::default()
}

/// "Genre :" / "Genre:" at the start of the item.
fn is_genre_label(text: &str) -> bool {
    text.strip_prefix("Genre")
        .map(|rest| rest.trim_start().starts_with(':'))
        .unwrap_or(false)
}

/// One or two genres fill the two columns; more than two go joined into primary.
pub fn split_genres(list: Vec<String>) -> Genres {
    match list.len() {
        0 => Genres::default(),
        1 | 2 => {
            let mut it = list.into_iter();
            Genres { primary: it.next(), secondary: it.next() }
        }
        _ => Genres { primary: Some(list.join(", ")), secondary: None },
    }
}
