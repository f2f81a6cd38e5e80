// src/specs/login.rs
//! Login page of the authenticated catalogue.
//!
//! - `inspect_forms` lists every form with its inputs and buttons (what
//!   `--inspect-login` prints).
//! - `login` picks the first form holding a password input, keeps its hidden
//!   fields (CSRF tokens and the like), fills the credentials and posts it through
//!   the shared agent, so later fetches carry the session cookie.

use std::{env, fmt, sync::LazyLock};

use log::{debug, info};
use scraper::{Html, Selector};
use thiserror::Error;

use super::absolutize;
use crate::config::consts::{ENV_LOGIN_PASSWORD, ENV_LOGIN_USER};
use crate::core::net::{FetchError, HttpFetcher};
use crate::core::sanitize::normalize_ws;

static FORM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("form").expect("static selector"));
static INPUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").expect("static selector"));
static BUTTON: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").expect("static selector"));

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("environment variable {0} is not set")]
    MissingCredentials(&'static str),

    #[error("no login form (password input) on {0}")]
    NoForm(String),

    #[error("login request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("credentials rejected: the response still asks for a password")]
    Rejected,
}

pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, LoginError> {
        let user = env::var(ENV_LOGIN_USER).map_err(|_| LoginError::MissingCredentials(ENV_LOGIN_USER))?;
        let password = env::var(ENV_LOGIN_PASSWORD).map_err(|_| LoginError::MissingCredentials(ENV_LOGIN_PASSWORD))?;
        Ok(Self { user, password })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputInfo {
    pub name: Option<String>,
    pub kind: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonInfo {
    pub kind: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormInfo {
    pub action: Option<String>,
    pub method: Option<String>,
    pub id: Option<String>,
    pub class: Option<String>,
    pub inputs: Vec<InputInfo>,
    pub buttons: Vec<ButtonInfo>,
}

impl FormInfo {
    pub fn has_password(&self) -> bool {
        self.inputs.iter().any(|i| i.kind == "password")
    }

    /// Fields to post: hidden/prefilled inputs as they are, credentials in the
    /// password input and the first text-like input.
    pub fn fill(&self, creds: &Credentials) -> Vec<(String, String)> {
        let mut user_done = false;
        let mut out = Vec::new();
        for input in &self.inputs {
            let Some(name) = &input.name else { continue };
            match input.kind.as_str() {
                "password" => out.push((name.clone(), creds.password.clone())),
                "text" | "email" if !user_done => {
                    out.push((name.clone(), creds.user.clone()));
                    user_done = true;
                }
                "submit" | "button" | "image" | "reset" => {}
                "checkbox" | "radio" if input.value.is_empty() => {}
                _ => out.push((name.clone(), input.value.clone())),
            }
        }
        out
    }
}

impl fmt::Display for FormInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| s!("N/A"));
        writeln!(f, "Action: {}", na(&self.action))?;
        writeln!(f, "Method: {}", na(&self.method))?;
        writeln!(f, "ID: {}", na(&self.id))?;
        writeln!(f, "Class: {}", na(&self.class))?;
        writeln!(f, "Input fields ({}):", self.inputs.len())?;
        for i in &self.inputs {
            let name = i.name.as_deref().unwrap_or("No name");
            writeln!(f, "  - Name: '{}', Type: '{}', Value: '{}'", name, i.kind, i.value)?;
        }
        writeln!(f, "Buttons ({}):", self.buttons.len())?;
        for b in &self.buttons {
            writeln!(f, "  - Type: '{}', Text: '{}'", b.kind, b.text)?;
        }
        Ok(())
    }
}

pub fn inspect_forms(doc: &str) -> Vec<FormInfo> {
    let html = Html::parse_document(doc);
    html.select(&FORM)
        .map(|form| {
            let attr = |n: &str| form.value().attr(n).map(str::to_string);
            let inputs = form
                .select(&INPUT)
                .map(|i| InputInfo {
                    name: i.value().attr("name").map(str::to_string),
                    kind: i.value().attr("type").unwrap_or("text").to_ascii_lowercase(),
                    value: i.value().attr("value").unwrap_or_default().to_string(),
                })
                .collect();
            let buttons = form
                .select(&BUTTON)
                .map(|b| ButtonInfo {
                    kind: b.value().attr("type").unwrap_or("button").to_string(),
                    text: normalize_ws(&b.text().collect::<String>()),
                })
                .collect();
            FormInfo {
                action: attr("action"),
                method: attr("method"),
                id: attr("id"),
                class: attr("class"),
                inputs,
                buttons,
            }
        })
        .collect()
}

/// Log the shared agent in. Cookies set by the response stay in the agent.
pub fn login(fetcher: &mut HttpFetcher, login_url: &str, creds: &Credentials) -> Result<(), LoginError> {
    let page = fetcher.get_raw(login_url)?;
    let form = inspect_forms(&page)
        .into_iter()
        .find(FormInfo::has_password)
        .ok_or_else(|| LoginError::NoForm(login_url.to_string()))?;

    let action = form
        .action
        .as_deref()
        .and_then(|a| absolutize(a, login_url))
        .unwrap_or_else(|| login_url.to_string());
    let fields = form.fill(creds);
    debug!("Login form posts {} fields to {action}", fields.len());

    let answer = fetcher.post_form(&action, &fields)?;
    if inspect_forms(&answer).iter().any(FormInfo::has_password) {
        return Err(LoginError::Rejected);
    }
    info!("Logged in as {}", creds.user);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <form action="/search" method="get" class="search"><input name="q"></form>
          <form action="/login_check" method="post" id="login-form" class="form-signin">
            <input type="hidden" name="_csrf_token" value="abc123">
            <input type="text" name="_username" value="">
            <input type="password" name="_password">
            <input type="checkbox" name="_remember_me">
            <button type="submit"> Connexion </button>
          </form>
        </body></html>
    "#;

    #[test]
    fn inspect_lists_every_form() {
        let forms = inspect_forms(PAGE);
        assert_eq!(forms.len(), 2);
        assert!(!forms[0].has_password());
        let login = &forms[1];
        assert_eq!(login.id.as_deref(), Some("login-form"));
        assert_eq!(login.inputs.len(), 4);
        assert_eq!(login.buttons, vec![ButtonInfo { kind: s!("submit"), text: s!("Connexion") }]);

        let printed = login.to_string();
        assert!(printed.contains("Action: /login_check"));
        assert!(printed.contains("  - Name: '_csrf_token', Type: 'hidden', Value: 'abc123'"));
    }

    #[test]
    fn fill_keeps_hidden_fields_and_places_credentials() {
        let form = inspect_forms(PAGE).into_iter().find(FormInfo::has_password).unwrap();
        let creds = Credentials { user: s!("reader"), password: s!("secret") };
        assert_eq!(
            form.fill(&creds),
            vec![
                (s!("_csrf_token"), s!("abc123")),
                (s!("_username"), s!("reader")),
                (s!("_password"), s!("secret")),
            ]
        );
    }
}
