//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every API handler
//! - Wire up middleware (request id, tracing, timeout, body limit, metrics)
//! - Place the response cache in front of the handlers
//! - Apply hot-reloaded response cache settings
//! - Serve until the shutdown broadcast fires
//!
//! # Layer Order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → Timeout → BodyLimit
//!     → track_requests → response cache → handler
//! ```

use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::cache::{
    response_cache_middleware, CacheAnnotator, MemoryStore, ProxyStore, ResponseCache,
};
use crate::config::AppConfig;
use crate::domain::Catalog;
use crate::http::response::vary_header;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub annotator: CacheAnnotator,
    pub page_size: usize,
    /// `Vary` sent with every cacheable response.
    pub vary: Option<HeaderValue>,
}

/// HTTP server for the catalog API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    catalog: Arc<Catalog>,
    response_cache: Arc<ResponseCache>,
}

impl HttpServer {
    /// Create a new HTTP server with an in-memory response store.
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new(config.response_cache.max_entries));
        Self::with_response_store(config, store)
    }

    /// Create a server whose response cache uses `store`.
    pub fn with_response_store(config: AppConfig, store: Arc<dyn ProxyStore>) -> Self {
        let catalog = Arc::new(Catalog::new());
        let response_cache = Arc::new(ResponseCache::new(config.response_cache.clone(), store));

        let state = AppState {
            catalog: catalog.clone(),
            annotator: CacheAnnotator::new(config.http_cache.max_age_secs),
            page_size: config.pagination.page_size,
            vary: vary_header(&config.response_cache.vary_headers),
        };

        let router = Self::build_router(&config, state, response_cache.clone());
        Self {
            router,
            config,
            catalog,
            response_cache,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, cache: Arc<ResponseCache>) -> Router {
        api::routes()
            .with_state(state)
            .layer(middleware::from_fn_with_state(cache, response_cache_middleware))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn response_cache(&self) -> &Arc<ResponseCache> {
        &self.response_cache
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Config updates arriving on `config_updates` are applied while serving.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            response_cache = self.response_cache.is_enabled(),
            "HTTP server starting"
        );

        let cache = self.response_cache.clone();
        let mut current = self.config.clone();
        let reloads = tokio::spawn(async move {
            while let Some(update) = config_updates.recv().await {
                apply_update(&cache, &current, &update);
                current = update;
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        reloads.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Apply the live-reloadable part of `update`.
fn apply_update(cache: &ResponseCache, current: &AppConfig, update: &AppConfig) {
    if update.response_cache != current.response_cache {
        if update.response_cache.max_entries != current.response_cache.max_entries {
            tracing::warn!("response_cache.max_entries takes effect on restart");
        }
        cache.reload(update.response_cache.clone());
    }

    let mut rest = update.clone();
    rest.response_cache = current.response_cache.clone();
    if rest != *current {
        tracing::warn!("Config changed outside [response_cache]; restart to apply");
    }
}
