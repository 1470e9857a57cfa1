use super::{Fetch, Page};
use crate::error::{Result, ScanError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const CONTINUATION_HEADER: &str = "x-ms-continuationtoken";

/// Blocking HTTP transport authenticating with a personal access token.
pub struct HttpTransport {
    client: Client,
    auth: HeaderValue,
    rate_delay: Duration,
}

impl HttpTransport {
    pub fn new(pat: &str, timeout: Duration, rate_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("langtally/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let encoded = STANDARD.encode(format!(":{pat}"));
        let mut auth = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| ScanError::MissingConfig("credential contains invalid characters".into()))?;
        auth.set_sensitive(true);
        Ok(Self {
            client,
            auth,
            rate_delay,
        })
    }
}

impl Fetch for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Page> {
        debug!("HTTP GET: {}", url);
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth.clone())
            .header(ACCEPT, "application/json")
            .send()?;

        if !self.rate_delay.is_zero() {
            std::thread::sleep(self.rate_delay);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let continuation = response
            .headers()
            .get(CONTINUATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let body: Value = response.json()?;

        Ok(Page { body, continuation })
    }
}
