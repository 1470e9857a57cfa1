pub mod client;
pub mod paginate;
pub mod transport;

pub use client::{DevOpsClient, COMMIT_PAGE_SIZE, DEFAULT_API_VERSION};
pub use paginate::{ContinuationPages, OffsetPages};
pub use transport::HttpTransport;

use crate::error::Result;
use serde_json::Value;

/// One decoded response plus the continuation token that came with it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub body: Value,
    pub continuation: Option<String>,
}

impl Page {
    pub fn new(body: Value) -> Self {
        Self { body, continuation: None }
    }

    pub fn with_continuation(mut self, token: impl Into<String>) -> Self {
        self.continuation = Some(token.into());
        self
    }

    /// Items of the `value` array; missing or non-array `value` reads as empty.
    pub fn items(&self) -> Vec<Value> {
        match self.body.get("value") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Token from the response header, falling back to a `continuationToken` body field.
    pub fn next_token(&self) -> Option<String> {
        self.continuation
            .clone()
            .or_else(|| {
                self.body
                    .get("continuationToken")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|t| !t.is_empty())
    }
}

/// Fetch JSON for a URL with the credential attached.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Page>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &str) -> Result<Page> {
        (**self).fetch(url)
    }
}

/// Appends `key=value` to `url`, percent-encoding the value.
pub fn with_query(url: &str, key: &str, value: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{key}={}", urlencoding::encode(value))
}
