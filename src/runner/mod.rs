//! Work-item runner.
//!
//! # Data Flow
//! ```text
//! WorkItem { url, timestamp }   (from the caller's crawl queue)
//!     → resolve url against runner.base_url
//!     → make_state(item): None skips the item, Some(state) starts a chain
//!     → fetch url (+ each tab), union the roots
//!     → Dispatcher::dispatch(url, ctx, combined)
//!     → finish(item, state, result): caller commits or rolls back
//!     → pause every `pause_every` attempted items
//! ```
//!
//! # Design Decisions
//! - One item failing never stops the run; failures are collected
//! - No retries; a failed item is reported and left to the caller
//! - Cancellation stops the run between items and aborts in-flight fetches
//! - Every item runs inside a span carrying a fresh run id

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::backend::{FetchError, Method};
use crate::config::RunnerSettings;
use crate::dispatch::{Cancellation, Ctx, DispatchError, Dispatcher};
use crate::dom::{Document, Selection};

/// One crawl-queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub url: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl WorkItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timestamp: None,
        }
    }
}

/// An item that did not complete.
#[derive(Debug)]
pub struct ItemFailure {
    pub url: String,
    pub error: DispatchError,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failures: Vec<ItemFailure>,
    /// The run stopped early on cancellation.
    pub cancelled: bool,
}

/// Drains work items into a dispatcher.
pub struct Runner {
    settings: RunnerSettings,
    cancel: Cancellation,
}

impl Runner {
    pub fn new(settings: RunnerSettings) -> Self {
        Self {
            settings,
            cancel: Cancellation::new(),
        }
    }

    /// Signal shared by every item context; cancel it to stop the run.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    /// Absolute URL for `item`, resolved against the configured base.
    pub fn resolve(&self, item: &WorkItem) -> Result<String, FetchError> {
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: item.url.clone(),
            reason,
        };

        match &self.settings.base_url {
            Some(base) => {
                let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
                let joined = base.join(&item.url).map_err(|e| invalid(e.to_string()))?;
                Ok(joined.to_string())
            }
            None => Url::parse(&item.url)
                .map(|_| item.url.clone())
                .map_err(|e| invalid(e.to_string())),
        }
    }

    /// Process `items` in order.
    ///
    /// `make_state` builds the per-item state, or returns `None` to skip the
    /// item (e.g. already stored). `finish` receives the state back together
    /// with the chain's result, which is where a transaction is committed or
    /// rolled back.
    pub async fn run<S, I, M, F>(
        &self,
        dispatcher: &Dispatcher<S>,
        items: I,
        mut make_state: M,
        mut finish: F,
    ) -> RunReport
    where
        S: 'static,
        I: IntoIterator<Item = WorkItem>,
        M: FnMut(&WorkItem) -> Option<S>,
        F: FnMut(&WorkItem, S, &Result<(), DispatchError>),
    {
        let mut report = RunReport::default();

        for item in items {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let Some(state) = make_state(&item) else {
                tracing::debug!(url = %item.url, "Skipping item");
                report.skipped += 1;
                continue;
            };

            if self.should_pause(report.attempted) && !self.pause().await {
                report.cancelled = true;
                break;
            }
            report.attempted += 1;

            let run_id = Uuid::new_v4();
            let span = tracing::info_span!("item", run_id = %run_id, url = %item.url);
            let mut ctx = Ctx::with_cancellation(state, self.cancel.clone());

            let result = self.process(dispatcher, &item, &mut ctx).instrument(span).await;
            finish(&item, ctx.into_state(), &result);

            match result {
                Ok(()) => report.succeeded += 1,
                Err(error) => {
                    tracing::warn!(run_id = %run_id, url = %item.url, error = %error, "Item failed");
                    if error.is_cancelled() {
                        report.cancelled = true;
                    }
                    report.failures.push(ItemFailure {
                        url: item.url.clone(),
                        error,
                    });
                    if report.cancelled {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failures.len(),
            cancelled = report.cancelled,
            "Run finished"
        );
        report
    }

    async fn process<S: 'static>(
        &self,
        dispatcher: &Dispatcher<S>,
        item: &WorkItem,
        ctx: &mut Ctx<S>,
    ) -> Result<(), DispatchError> {
        let url = self.resolve(item)?;
        tracing::debug!(url = %url, "Scraping item");

        if self.settings.tabs.is_empty() {
            return dispatcher.get(&url, ctx, None).await;
        }

        let mut docs: Vec<Document> = Vec::with_capacity(self.settings.tabs.len());
        for tab in &self.settings.tabs {
            let tab_url = format!("{url}{tab}");
            docs.push(dispatcher.fetch_document(Method::Get, &tab_url, ctx, None).await?);
        }

        let combined = docs
            .iter()
            .fold(Selection::empty(), |acc, doc| acc.union(doc.root()));
        dispatcher.dispatch(&url, ctx, combined).await
    }

    fn should_pause(&self, attempted: usize) -> bool {
        self.settings.pause_every > 0 && attempted > 0 && attempted % self.settings.pause_every == 0
    }

    /// Sleep for the configured pause; `false` when cancelled meanwhile.
    async fn pause(&self) -> bool {
        let pause = Duration::from_secs(self.settings.pause_secs);
        tracing::debug!(pause_secs = self.settings.pause_secs, "Pausing between items");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(pause) => true,
        }
    }
}
