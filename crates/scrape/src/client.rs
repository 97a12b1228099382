use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Clone, Debug)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ScrapeError {
    Http(reqwest::Error),
    Status(u16),
    Url(String),
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::Http(err) => write!(f, "http error: {}", err),
            ScrapeError::Status(status) => write!(f, "http {}", status),
            ScrapeError::Url(value) => write!(f, "bad url: {}", value),
        }
    }
}

impl std::error::Error for ScrapeError {}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Http(err)
    }
}

/// Blocking HTTP client shared by all sources of one aggregator. Every
/// request carries the configured timeout and browser-like headers.
#[derive(Clone)]
pub struct ScrapeClient {
    http: Client,
}

impl ScrapeClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        let language = HeaderValue::from_str(settings.accept_language.trim())
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));
        headers.insert(ACCEPT_LANGUAGE, language);

        let user_agent = if settings.user_agent.trim().is_empty() {
            DEFAULT_USER_AGENT
        } else {
            settings.user_agent.trim()
        };
        let timeout = if settings.timeout.is_zero() {
            Duration::from_secs(10)
        } else {
            settings.timeout
        };
        let http = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// GETs `url` and returns the body. Any non-200 status is an error.
    pub fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.http.get(url).send()?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ScrapeError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

pub fn url_escape(input: &str) -> String {
    let mut out = String::new();
    for byte in input.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char)
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::url_escape;

    #[test]
    fn escapes_reserved_bytes() {
        assert_eq!(url_escape("EBVR-018"), "EBVR-018");
        assert_eq!(url_escape("a b&c"), "a%20b%26c");
    }
}
