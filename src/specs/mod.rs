//! # Page specs
//!
//! Each spec reads exactly one kind of remote page and knows *where the ground
//! truth lives in its HTML*:
//!
//! - `search` – series links on the catalogue's search results page.
//! - `serie` – cover image and genres on a series detail page.
//! - `login` – form structure of the authenticated site's login page, and the
//!   form post that logs the shared agent in.
//!
//! ## Conventions
//! - Specs are pure over a fetched body (`&str`), so they are testable offline
//!   against captured or synthetic pages. `login` is the exception: it drives
//!   `core::net` itself because the form post depends on what it just read.
//! - Missing markers mean "no result" (`None` / empty `Vec`), never an error.
//! - Where several markers could answer the same question, the order of the
//!   attempts is fixed (see `serie::COVER_STRATEGIES`).
//! - Links are returned absolute, resolved against the page they came from.
//!
//! Deciding *when* to fetch which page lives in `resolver`; writing results into
//! the table lives in `driver`.

use url::Url;

pub mod login;
pub mod search;
pub mod serie;

/// Make `href` absolute against `base`. Absolute http(s) links pass through untouched.
pub fn absolutize(href: &str, base: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_variants() {
        let base = "https://www.bedetheque.com/search/albums/?keywords=x";
        assert_eq!(absolutize("/serie-1-BD-Tintin.html", base).as_deref(), Some("https://www.bedetheque.com/serie-1-BD-Tintin.html"));
        assert_eq!(absolutize("//cdn.example.com/c.jpg", base).as_deref(), Some("https://cdn.example.com/c.jpg"));
        assert_eq!(absolutize(" https://example.com/cover.jpg ", base).as_deref(), Some("https://example.com/cover.jpg"));
        assert_eq!(absolutize("", base), None);
    }
}
