//! The dispatcher: route table plus shared backend and cache handles.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use tracing::Instrument;

use crate::backend::{Backend, CachingBackend, HttpBackend, Method};
use crate::cache::{Cache, SqliteCache};
use crate::config::PipelineConfig;
use crate::dispatch::context::Ctx;
use crate::dispatch::error::DispatchError;
use crate::dispatch::router::{Router, Stage};
use crate::dom::{Document, Selection};
use crate::observability::metrics;

/// Future returned by a handler.
pub type HandlerFuture<'a> = LocalBoxFuture<'a, Result<(), DispatchError>>;

/// A registered stage: `(dispatcher, ctx, node) -> future`.
///
/// Closures take the form `|d, ctx, node| Box::pin(async move { .. })`.
pub type Handler<S> =
    Arc<dyn for<'a> Fn(&'a Dispatcher<S>, &'a mut Ctx<S>, Selection<'a>) -> HandlerFuture<'a> + Send + Sync>;

/// Routes identifiers to handlers and lets handlers re-dispatch.
pub struct Dispatcher<S> {
    router: RwLock<Router<Handler<S>>>,
    backend: Arc<dyn Backend>,
    cache: Arc<dyn Cache>,
}

impl<S: 'static> Dispatcher<S> {
    pub fn new(backend: Arc<dyn Backend>, cache: Arc<dyn Cache>) -> Self {
        Self {
            router: RwLock::new(Router::new()),
            backend,
            cache,
        }
    }

    /// HTTP backend and SQLite cache as configured.
    ///
    /// With caching enabled, `GET` responses are served through the cache.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, DispatchError> {
        let cache: Arc<dyn Cache> = Arc::new(SqliteCache::open_validated(&config.cache.path)?);
        let http = HttpBackend::new(&config.http)?;

        let backend: Arc<dyn Backend> = if config.cache.enabled {
            Arc::new(CachingBackend::new(
                http,
                cache.clone(),
                Duration::from_secs(config.cache.ttl_secs),
            ))
        } else {
            Arc::new(http)
        };

        tracing::info!(
            cache_path = %config.cache.path.display(),
            response_caching = config.cache.enabled,
            "Dispatcher ready"
        );
        Ok(Self::new(backend, cache))
    }

    /// Register `handler` for identifiers matching `pattern` in full.
    ///
    /// Earlier registrations take precedence. Registering the same pattern
    /// again replaces its handler and keeps its position.
    pub fn handle<F>(&self, pattern: &str, handler: F) -> Result<Stage, DispatchError>
    where
        F: for<'a> Fn(&'a Dispatcher<S>, &'a mut Ctx<S>, Selection<'a>) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        let handler: Handler<S> = Arc::new(handler);
        let mut router = self.router.write().unwrap_or_else(PoisonError::into_inner);

        let (stage, replaced) = router
            .insert(pattern, handler)
            .map_err(|e| DispatchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(pattern = %pattern, stage = stage.index(), replaced, "Registered route");
        Ok(stage)
    }

    /// Run the first handler whose pattern matches `id`.
    pub async fn dispatch(&self, id: &str, ctx: &mut Ctx<S>, node: Selection<'_>) -> Result<(), DispatchError> {
        let resolved = {
            let router = self.router.read().unwrap_or_else(PoisonError::into_inner);
            router
                .resolve(id)
                .map(|(stage, pattern, handler)| (stage, pattern.to_string(), handler))
        };

        let Some((stage, pattern, handler)) = resolved else {
            tracing::debug!(id = %id, "No route matched");
            metrics::record_dispatch("none", "unmatched");
            return Err(DispatchError::NoRouteMatched(id.to_string()));
        };

        let span = tracing::debug_span!("dispatch", id = %id, route = %pattern, stage = stage.index());
        let result = handler(self, ctx, node).instrument(span).await;
        metrics::record_dispatch(&pattern, outcome(&result));
        result
    }

    /// Run a stage directly, without matching an identifier.
    pub async fn invoke(&self, stage: Stage, ctx: &mut Ctx<S>, node: Selection<'_>) -> Result<(), DispatchError> {
        let resolved = {
            let router = self.router.read().unwrap_or_else(PoisonError::into_inner);
            router.get(stage).map(|(pattern, handler)| (pattern.to_string(), handler))
        };
        let (pattern, handler) = resolved.ok_or(DispatchError::UnknownStage(stage.index()))?;

        let span = tracing::debug_span!("invoke", route = %pattern, stage = stage.index());
        let result = handler(self, ctx, node).instrument(span).await;
        metrics::record_dispatch(&pattern, outcome(&result));
        result
    }

    pub async fn get(&self, url: &str, ctx: &mut Ctx<S>, body: Option<String>) -> Result<(), DispatchError> {
        self.fetch_and_dispatch(Method::Get, url, ctx, body).await
    }

    pub async fn post(&self, url: &str, ctx: &mut Ctx<S>, body: Option<String>) -> Result<(), DispatchError> {
        self.fetch_and_dispatch(Method::Post, url, ctx, body).await
    }

    pub async fn put(&self, url: &str, ctx: &mut Ctx<S>, body: Option<String>) -> Result<(), DispatchError> {
        self.fetch_and_dispatch(Method::Put, url, ctx, body).await
    }

    pub async fn delete(&self, url: &str, ctx: &mut Ctx<S>, body: Option<String>) -> Result<(), DispatchError> {
        self.fetch_and_dispatch(Method::Delete, url, ctx, body).await
    }

    /// Fetch `url`, aborting if `ctx` is cancelled first, then dispatch it with the document root.
    pub async fn fetch_and_dispatch(
        &self,
        method: Method,
        url: &str,
        ctx: &mut Ctx<S>,
        body: Option<String>,
    ) -> Result<(), DispatchError> {
        let doc = self.fetch_document(method, url, ctx, body).await?;
        self.dispatch(url, ctx, doc.root()).await
    }

    /// Fetch and parse `url` without dispatching it.
    ///
    /// Returns [`DispatchError::Cancelled`] if `ctx` is cancelled before or
    /// during the request.
    pub async fn fetch_document(
        &self,
        method: Method,
        url: &str,
        ctx: &Ctx<S>,
        body: Option<String>,
    ) -> Result<Document, DispatchError> {
        if ctx.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        let cancel = ctx.cancellation().clone();
        let fetch = self
            .backend
            .fetch(method, url, body)
            .instrument(tracing::debug_span!("fetch", method = %method, url = %url));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(url = %url, "Fetch cancelled");
                Err(DispatchError::Cancelled)
            }
            res = fetch => Ok(res?),
        }
    }

    /// Shared cache handle for handlers.
    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Shared backend handle for handlers.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Registered patterns in precedence order.
    pub fn patterns(&self) -> Vec<String> {
        let router = self.router.read().unwrap_or_else(PoisonError::into_inner);
        router.patterns().map(str::to_string).collect()
    }
}

fn outcome(result: &Result<(), DispatchError>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(e) if e.is_cancelled() => "cancelled",
        Err(_) => "error",
    }
}
