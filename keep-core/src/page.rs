//! Cursor pagination over identifier order.
//!
//! A page token is the identifier of the last record of the previous page.
//! Tokens only make sense against ascending identifier order.

use serde::{Deserialize, Serialize};

/// Which page to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Start strictly after this identifier.
    pub token: Option<String>,
    /// Maximum number of items; `0` means unlimited.
    pub size: usize,
}

impl PageRequest {
    /// Everything, in one page.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// The first page of `size` items.
    pub fn first(size: usize) -> Self {
        Self { token: None, size }
    }

    /// The page after `token`. An empty token means the first page.
    pub fn after<S: Into<String>>(token: S, size: usize) -> Self {
        let token = token.into();
        Self {
            token: if token.is_empty() { None } else { Some(token) },
            size,
        }
    }

    pub fn is_limited(&self) -> bool {
        self.size > 0
    }

    /// The request for the page following `page`, if it advertised one.
    pub fn next<T>(&self, page: &Page<T>) -> Option<PageRequest> {
        page.next_token
            .as_ref()
            .map(|token| PageRequest::after(token.clone(), self.size))
    }

    /// Builds the page for `items`, already limited to `self.size`.
    ///
    /// A continuation token is handed out whenever the page came back full.
    /// When the collection size is an exact multiple of the page size the
    /// last real page still carries a token and the following read is empty.
    pub fn finish<T, F>(&self, items: Vec<T>, id_of: F) -> Page<T>
    where
        F: Fn(&T) -> &str,
    {
        let next_token = if self.is_limited() && items.len() == self.size {
            items.last().map(|item| id_of(item).to_string())
        } else {
            None
        };
        Page { items, next_token }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_token: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_token.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_token: self.next_token,
        }
    }
}
