//! HTTP backend over reqwest.

use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use url::Url;

use crate::backend::{Backend, FetchError, Method, Page};
use crate::config::HttpSettings;
use crate::observability::metrics;

/// Fetches documents over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a client with the configured user agent and timeouts.
    pub fn new(settings: &HttpSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn request(&self, method: Method, url: &str, body: Option<String>) -> Result<Page, FetchError> {
        let target = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut request = self.client.request(method.into(), target);
        if let Some(body) = body {
            request = request.body(body);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                "Backend returned non-success status"
            );
        }

        let text = response.text().await?;
        metrics::record_fetch(method.as_str(), start);
        tracing::debug!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            bytes = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(Page {
            status: status.as_u16(),
            body: text,
        })
    }
}

impl Backend for HttpBackend {
    fn fetch_page<'a>(
        &'a self,
        method: Method,
        url: &'a str,
        body: Option<String>,
    ) -> BoxFuture<'a, Result<Page, FetchError>> {
        Box::pin(self.request(method, url, body))
    }
}
