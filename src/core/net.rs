// src/core/net.rs
//
// Blocking HTTP over a single ureq agent (keeps cookies between calls).
// One request in flight at a time; requests are paced and retried here so the
// resolver only ever sees "a body" or "no result".

use std::{thread, time::{Duration, Instant}};

use log::{debug, warn};
use thiserror::Error;

use crate::config::consts::{BLOCK_MARKERS, USER_AGENTS};
use crate::config::options::FetchOptions;

/// The one capability the resolver needs: turn a URL into a document body.
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("blocked by remote ({0})")]
    Blocked(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unreadable body: {0}")]
    Body(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, 5xx, dropped connections. Worth another try.
    Transient,
    /// Explicit anti-bot answer. Retry only after the long backoff.
    Blocked,
    /// 404 and friends. Retrying won't help.
    Hard,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout(_) | FetchError::Transport(_) | FetchError::Body(_) => FailureKind::Transient,
            FetchError::Blocked(_) => FailureKind::Blocked,
            FetchError::Status { status, .. } => match status {
                403 | 429 => FailureKind::Blocked,
                408 | 500..=599 => FailureKind::Transient,
                _ => FailureKind::Hard,
            },
        }
    }
}

pub struct HttpFetcher {
    agent: ureq::Agent,
    opts: FetchOptions,
    requests: u64,
    last_request: Option<Instant>,
    cooldown_until: Option<Instant>,
}

impl HttpFetcher {
    pub fn new(opts: FetchOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(opts.connect_timeout)
            .timeout_read(opts.read_timeout)
            .timeout_write(opts.read_timeout)
            .redirects(5)
            .build();
        Self { agent, opts, requests: 0, last_request: None, cooldown_until: None }
    }

    /// Requests sent so far (retries included).
    pub fn requests(&self) -> u64 { self.requests }

    /// GET without the block-marker screen (login pages legitimately embed captchas).
    pub fn get_raw(&mut self, url: &str) -> Result<String, FetchError> {
        self.with_retries(url, |me| me.get_once(url, false))
    }

    /// POST an urlencoded form and return the response body.
    pub fn post_form(&mut self, url: &str, fields: &[(String, String)]) -> Result<String, FetchError> {
        let pairs: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        self.pace();
        debug!("POST {url} ({} fields)", pairs.len());
        let res = self
            .agent
            .post(url)
            .set("User-Agent", self.user_agent())
            .send_form(&pairs);
        self.read_response(url, res, false)
    }

    fn with_retries<F>(&mut self, url: &str, mut op: F) -> Result<String, FetchError>
    where
        F: FnMut(&mut Self) -> Result<String, FetchError>,
    {
        let mut attempt = 1u32;
        loop {
            let err = match op(self) {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };
            let kind = err.kind();
            if kind == FailureKind::Blocked {
                // Applies to whatever request comes next, this row or the next one.
                self.cooldown_until = Some(Instant::now() + self.opts.block_backoff);
            }
            if kind == FailureKind::Hard || attempt >= self.opts.max_attempts {
                return Err(err);
            }
            warn!("{url}: attempt {attempt} failed ({err}), retrying");
            if kind == FailureKind::Transient {
                thread::sleep(backoff_delay(self.opts.retry_base, attempt));
            }
            attempt += 1;
        }
    }

    fn get_once(&mut self, url: &str, screen: bool) -> Result<String, FetchError> {
        self.pace();
        debug!("GET {url}");
        let res = self.agent.get(url).set("User-Agent", self.user_agent()).call();
        self.read_response(url, res, screen)
    }

    fn read_response(
        &mut self,
        url: &str,
        res: Result<ureq::Response, ureq::Error>,
        screen: bool,
    ) -> Result<String, FetchError> {
        self.requests += 1;
        self.last_request = Some(Instant::now());

        let resp = res.map_err(|e| classify_ureq_failure(url, e))?;
        let body = resp.into_string().map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                FetchError::Timeout(format!("reading {url}: {e}"))
            } else {
                FetchError::Body(format!("{url}: {e}"))
            }
        })?;
        if screen {
            if let Some(marker) = block_marker(&body) {
                return Err(FetchError::Blocked(format!("'{marker}' in {url}")));
            }
        }
        Ok(body)
    }

    /// Sleep until the polite interval (and any block cooldown) has passed.
    fn pace(&mut self) {
        let now = Instant::now();
        let mut wait = Duration::ZERO;
        if let Some(last) = self.last_request {
            let jitter = if self.opts.jitter_ms == 0 { 0 } else { (self.requests * 7919) % self.opts.jitter_ms };
            let interval = self.opts.request_pause + Duration::from_millis(jitter);
            wait = interval.saturating_sub(now.duration_since(last));
        }
        if let Some(until) = self.cooldown_until.take() {
            let cooldown = until.saturating_duration_since(now);
            if cooldown > wait {
                warn!("Remote blocked us earlier, cooling down for {:?}", cooldown);
                wait = cooldown;
            }
        }
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }

    /// Rotate through the configured browser identities.
    fn user_agent(&self) -> &'static str {
        USER_AGENTS[(self.requests as usize) % USER_AGENTS.len()]
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        self.with_retries(url, |me| me.get_once(url, true))
    }
}

fn classify_ureq_failure(url: &str, error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::Status(status, _) => FetchError::Status { status, url: url.to_string() },
        ureq::Error::Transport(transport) => {
            let msg = transport.to_string();
            let lowered = msg.to_ascii_lowercase();
            if lowered.contains("timed out") || lowered.contains("timeout") {
                FetchError::Timeout(msg)
            } else {
                FetchError::Transport(msg)
            }
        }
    }
}

/// Exponential: base, 2×base, 4×base … capped at 30 s.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    base.checked_mul(1u32 << exponent)
        .unwrap_or(Duration::from_secs(30))
        .min(Duration::from_secs(30))
}

pub fn block_marker(body: &str) -> Option<&'static str> {
    let lc = body.to_lowercase();
    BLOCK_MARKERS.iter().copied().find(|m| lc.contains(m))
}
