//! Lazy iteration over paged listing endpoints.
//!
//! Both iterators fetch a page only when their buffer runs dry, yield a fetch
//! failure once as `Err`, and are exhausted afterwards.

use super::{with_query, Fetch};
use crate::error::Result;
use serde_json::Value;
use std::collections::VecDeque;

/// Pages chained by an opaque continuation token.
pub struct ContinuationPages<F> {
    fetch: F,
    url: String,
    token: Option<String>,
    buffer: VecDeque<Value>,
    done: bool,
}

impl<F: Fetch> ContinuationPages<F> {
    pub fn new(fetch: F, url: impl Into<String>) -> Self {
        Self {
            fetch,
            url: url.into(),
            token: None,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    fn next_url(&self) -> String {
        match &self.token {
            Some(token) => with_query(&self.url, "continuationToken", token),
            None => self.url.clone(),
        }
    }
}

impl<F: Fetch> Iterator for ContinuationPages<F> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            let page = match self.fetch.fetch(&self.next_url()) {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            self.token = page.next_token();
            self.done = self.token.is_none();
            self.buffer.extend(page.items());
        }
    }
}

/// `$top`/`$skip` paging; a short page marks the end.
pub struct OffsetPages<F> {
    fetch: F,
    url: String,
    page_size: usize,
    skip: usize,
    buffer: VecDeque<Value>,
    done: bool,
}

impl<F: Fetch> OffsetPages<F> {
    pub fn new(fetch: F, url: impl Into<String>, page_size: usize) -> Self {
        Self {
            fetch,
            url: url.into(),
            page_size: page_size.max(1),
            skip: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    fn next_url(&self) -> String {
        let url = with_query(&self.url, "$top", &self.page_size.to_string());
        with_query(&url, "$skip", &self.skip.to_string())
    }
}

impl<F: Fetch> Iterator for OffsetPages<F> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.buffer.pop_front() {
            return Some(Ok(item));
        }
        if self.done {
            return None;
        }
        let page = match self.fetch.fetch(&self.next_url()) {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let items = page.items();
        if items.len() < self.page_size {
            self.done = true;
        } else {
            self.skip += self.page_size;
        }
        self.buffer.extend(items);
        self.buffer.pop_front().map(Ok)
    }
}
