//! Document backend subsystem.
//!
//! # Data Flow
//! ```text
//! (method, url, body)
//!     → Method::from_str (GET | POST | PUT | DELETE, "" = GET)
//!     → CachingBackend (GET only: cache hit short-circuits, 2xx pages stored)
//!     → HttpBackend (reqwest call, status + body text)
//!     → Document::parse (lenient, never fails)
//! ```
//!
//! # Design Decisions
//! - Backends return a `Page`; parsing into a `Document` happens last so
//!   the network layer stays `Send`
//! - Network errors propagate as-is, no retries
//! - Non-2xx statuses are logged, not turned into errors; they only keep a
//!   page out of the response cache

pub mod cached;
pub mod http;

use std::fmt;
use std::str::FromStr;

use futures_util::future::{BoxFuture, LocalBoxFuture};
use thiserror::Error;

use crate::dom::Document;

pub use cached::CachingBackend;
pub use http::HttpBackend;

/// Request verb accepted by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(FetchError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A response body with the status it arrived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    /// A `200` page.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can turn a request into a document.
pub trait Backend: Send + Sync {
    /// Perform the request and return the response page.
    fn fetch_page<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Option<String>,
    ) -> BoxFuture<'a, Result<Page, FetchError>>;

    /// Perform the request and parse the response body.
    fn fetch<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Option<String>,
    ) -> LocalBoxFuture<'a, Result<Document, FetchError>> {
        Box::pin(async move {
            let page = self.fetch_page(method, url, body).await?;
            Ok(Document::parse(&page.body))
        })
    }
}
