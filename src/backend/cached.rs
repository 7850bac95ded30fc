//! Response caching in front of another backend.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::backend::{Backend, FetchError, Method, Page};
use crate::cache::{Cache, CacheError};

/// Serves `GET` bodies from a cache, filling it on a miss.
///
/// Only success pages are stored. Cache failures are logged and fall
/// through to the inner backend. Store calls may block on disk, so they run
/// on Tokio's blocking pool.
pub struct CachingBackend<B> {
    inner: B,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl<B: Backend> CachingBackend<B> {
    pub fn new(inner: B, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn cache_key(method: Method, url: &str) -> String {
        format!("{method} {url}")
    }

    async fn cached_fetch(&self, method: Method, url: &str, body: Option<String>) -> Result<Page, FetchError> {
        if method != Method::Get {
            return self.inner.fetch_page(method, url, body).await;
        }

        let key = Self::cache_key(method, url);
        let cache = self.cache.clone();
        let lookup = key.clone();
        match blocking(move || cache.get(&lookup)).await {
            Ok(bytes) => {
                tracing::debug!(url = %url, "Serving cached document");
                return Ok(Page::ok(String::from_utf8_lossy(&bytes)));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => tracing::warn!(url = %url, error = %e, "Cache read failed"),
        }

        let page = self.inner.fetch_page(method, url, body).await?;
        if !page.is_success() {
            tracing::debug!(url = %url, status = page.status, "Not caching non-success page");
            return Ok(page);
        }

        let cache = self.cache.clone();
        let value = page.body.clone().into_bytes();
        let ttl = self.ttl;
        if let Err(e) = blocking(move || cache.set(&key, &value, ttl)).await {
            tracing::warn!(url = %url, error = %e, "Cache write failed");
        }
        Ok(page)
    }
}

/// Run a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, CacheError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| Err(CacheError::Io(std::io::Error::other(e))))
}

impl<B: Backend> Backend for CachingBackend<B> {
    fn fetch_page<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Option<String>,
    ) -> BoxFuture<'a, Result<Page, FetchError>> {
        Box::pin(self.cached_fetch(method, url, body))
    }
}
