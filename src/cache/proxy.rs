//! Whole-response caching middleware.
//!
//! # Responsibilities
//! - Derive a request key from method, path and the configured varying headers
//! - Replay a live stored response without running the inner pipeline
//! - Store cacheable GET responses for the TTL their `Cache-Control` announces
//! - Answer matching conditional GETs on a hit with 304
//!
//! # Design Decisions
//! - Enabled by an explicit flag; settings are hot-swappable through `ArcSwap`
//! - Only `GET` touches the store; every other method passes straight through
//! - Fails open: a store error is logged and the request runs uncached

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::annotator::ConditionalHeaders;
use crate::cache::store::{ProxyCacheEntry, ProxyStore, StoredResponse};
use crate::config::ResponseCacheConfig;
use crate::http::request::RequestIdExt;
use crate::observability::metrics::{self, CacheOutcome};

/// Header telling clients whether the proxy served the response.
pub const X_CACHE: &str = "x-cache";

/// Shared state of the caching proxy.
pub struct ResponseCache {
    settings: ArcSwap<ResponseCacheConfig>,
    store: Arc<dyn ProxyStore>,
}

impl ResponseCache {
    pub fn new(settings: ResponseCacheConfig, store: Arc<dyn ProxyStore>) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            store,
        }
    }

    /// Swap in new settings. Stored entries are kept.
    pub fn reload(&self, settings: ResponseCacheConfig) {
        tracing::info!(
            enabled = settings.enabled,
            vary_headers = ?settings.vary_headers,
            "Response cache settings reloaded"
        );
        self.settings.store(Arc::new(settings));
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.load().enabled
    }

    pub fn settings(&self) -> Arc<ResponseCacheConfig> {
        self.settings.load_full()
    }

    pub fn store(&self) -> &Arc<dyn ProxyStore> {
        &self.store
    }
}

/// Middleware placing the response cache in front of the rest of the pipeline.
pub async fn response_cache_middleware(
    State(cache): State<Arc<ResponseCache>>,
    request: Request,
    next: Next,
) -> Response {
    let settings = cache.settings();
    if !settings.enabled || request.method() != Method::GET {
        metrics::record_cache_lookup(CacheOutcome::Bypass);
        return next.run(request).await;
    }

    let request_id = request.request_id().unwrap_or("unknown").to_string();
    let key = request_key(
        request.method(),
        request.uri(),
        request.headers(),
        &settings.vary_headers,
    );
    let conditional = ConditionalHeaders::from_headers(request.headers());

    match cache.store.get(&key) {
        Ok(Some(entry)) => {
            metrics::record_cache_lookup(CacheOutcome::Hit);
            tracing::debug!(
                request_id = %request_id,
                cache_key = %key,
                "Serving stored response"
            );
            return replay(&entry, &conditional, Instant::now());
        }
        Ok(None) => {
            metrics::record_cache_lookup(CacheOutcome::Miss);
        }
        Err(e) => {
            metrics::record_cache_lookup(CacheOutcome::Error);
            tracing::warn!(
                request_id = %request_id,
                cache_key = %key,
                error = %e,
                "Response store read failed, continuing uncached"
            );
        }
    }

    let response = next.run(request).await;

    let Some(ttl) = cacheable_ttl(&response) else {
        return response;
    };
    match response.body().size_hint().exact() {
        Some(len) if len <= settings.max_body_bytes as u64 => {}
        _ => return response,
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, settings.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // The body is gone; hand the client the same failure it would
            // have seen without the cache in front.
            metrics::record_cache_lookup(CacheOutcome::Error);
            tracing::warn!(
                request_id = %request_id,
                cache_key = %key,
                error = %e,
                "Failed to buffer response body, not storing"
            );
            let failed = futures_util::stream::once(async move { Err::<Bytes, _>(e) });
            return Response::from_parts(parts, Body::from_stream(failed));
        }
    };

    let mut headers = parts.headers.clone();
    headers.remove(crate::http::X_REQUEST_ID);
    let stored = StoredResponse {
        status: parts.status,
        headers,
        body: bytes.clone(),
    };

    if let Err(e) = cache.store.put(ProxyCacheEntry::new(key.clone(), stored, ttl)) {
        metrics::record_cache_lookup(CacheOutcome::Error);
        tracing::warn!(
            request_id = %request_id,
            cache_key = %key,
            error = %e,
            "Response store write failed"
        );
    } else {
        tracing::debug!(
            request_id = %request_id,
            cache_key = %key,
            ttl_secs = ttl.as_secs(),
            "Stored response"
        );
    }

    let mut response = Response::from_parts(parts, Body::from(bytes));
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static("MISS"));
    response
}

/// Identity of a request for the store.
///
/// Varying header values are hashed so credentials never appear in keys.
pub fn request_key(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    vary_headers: &[String],
) -> String {
    let mut hasher = Sha256::new();
    for name in vary_headers {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        for value in headers.get_all(name.as_str()) {
            hasher.update(value.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\n");
    }
    let digest = hasher.finalize();

    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{} {} {}", method, target, hex::encode(&digest[..8]))
}

/// TTL a response may be stored for, or `None` when it is not cacheable.
///
/// Requires a 200 with a public `max-age` and no cookies.
pub fn cacheable_ttl(response: &Response) -> Option<Duration> {
    if response.status() != StatusCode::OK || response.headers().contains_key(header::SET_COOKIE) {
        return None;
    }

    let mut max_age = None;
    for value in response.headers().get_all(header::CACHE_CONTROL) {
        let Ok(value) = value.to_str() else {
            return None;
        };
        for directive in value.split(',').map(str::trim) {
            let lower = directive.to_ascii_lowercase();
            if lower == "no-store" || lower == "private" || lower == "no-cache" {
                return None;
            }
            if let Some(secs) = lower.strip_prefix("max-age=") {
                max_age = secs.parse::<u64>().ok();
            }
        }
    }

    max_age.filter(|secs| *secs > 0).map(Duration::from_secs)
}

/// Rebuild a response from a stored entry.
fn replay(entry: &ProxyCacheEntry, conditional: &ConditionalHeaders, now: Instant) -> Response {
    let stored = &entry.response;
    let age = HeaderValue::from(entry.age_secs(now));

    let etag = stored
        .headers
        .get(header::ETAG)
        .and_then(|v| v.to_str().ok());
    if let Some(etag) = etag {
        if conditional.matches(etag) {
            metrics::record_conditional(true);
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            let headers = response.headers_mut();
            for name in [header::ETAG, header::CACHE_CONTROL] {
                if let Some(value) = stored.headers.get(&name) {
                    headers.insert(name, value.clone());
                }
            }
            headers.insert(header::AGE, age);
            headers.insert(X_CACHE, HeaderValue::from_static("HIT"));
            return response;
        }
    }

    let mut response = Response::new(Body::from(stored.body.clone()));
    *response.status_mut() = stored.status;
    *response.headers_mut() = stored.headers.clone();
    response.headers_mut().insert(header::AGE, age);
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static("HIT"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::annotator::CacheAnnotator;
    use crate::cache::store::{MemoryStore, StoreError};
    use axum::{middleware, routing::get, Router};
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};
    use tower::ServiceExt;

    struct UnavailableStore;

    impl ProxyStore for UnavailableStore {
        fn get(&self, _key: &str) -> Result<Option<Arc<ProxyCacheEntry>>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn put(&self, _entry: ProxyCacheEntry) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn len(&self) -> usize {
            0
        }
    }

    /// Store that counts every access.
    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl ProxyStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<Arc<ProxyCacheEntry>>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn put(&self, entry: ProxyCacheEntry) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.put(entry)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    fn settings(enabled: bool) -> ResponseCacheConfig {
        ResponseCacheConfig {
            enabled,
            ..ResponseCacheConfig::default()
        }
    }

    fn app(cache: Arc<ResponseCache>, calls: Arc<AtomicUsize>) -> Router {
        let handler = move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                (
                    [
                        (header::ETAG, "\"v1\""),
                        (header::CACHE_CONTROL, "public, max-age=60, must-revalidate"),
                    ],
                    format!("call {n}"),
                )
            }
        };
        Router::new()
            .route("/items", get(handler.clone()).post(handler.clone()))
            .route("/private", get(|| async { ([(header::CACHE_CONTROL, "no-store")], "secret") }))
            .layer(middleware::from_fn_with_state(cache, response_cache_middleware))
    }

    fn req(method: &str, uri: &str) -> Request {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ResponseCache::new(settings(true), Arc::new(MemoryStore::new(16))));
        let app = app(cache.clone(), calls.clone());

        let first = app.clone().oneshot(req("GET", "/items")).await.unwrap();
        assert_eq!(first.headers()[X_CACHE], "MISS");
        assert_eq!(body_text(first).await, "call 0");

        let second = app.clone().oneshot(req("GET", "/items")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()[X_CACHE], "HIT");
        assert_eq!(second.headers()[header::ETAG], "\"v1\"");
        assert!(second.headers().contains_key(header::AGE));
        assert_eq!(body_text(second).await, "call 0");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.store().len(), 1);
    }

    #[tokio::test]
    async fn test_hit_answers_conditional_get() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ResponseCache::new(settings(true), Arc::new(MemoryStore::new(16))));
        let app = app(cache, calls.clone());

        app.clone().oneshot(req("GET", "/items")).await.unwrap();

        let conditional = Request::builder()
            .uri("/items")
            .header(header::IF_NONE_MATCH, "\"v1\"")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(conditional).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], "\"v1\"");
        assert!(body_text(response).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_writes_never_touch_store() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(16),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        });
        let cache = Arc::new(ResponseCache::new(settings(true), store.clone()));
        let app = app(cache, calls.clone());

        for _ in 0..3 {
            let response = app.clone().oneshot(req("POST", "/items")).await.unwrap();
            assert!(!response.headers().contains_key(X_CACHE));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ResponseCache::new(settings(false), Arc::new(MemoryStore::new(16))));
        let app = app(cache.clone(), calls.clone());

        app.clone().oneshot(req("GET", "/items")).await.unwrap();
        app.clone().oneshot(req("GET", "/items")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.store().is_empty());

        cache.reload(settings(true));
        app.clone().oneshot(req("GET", "/items")).await.unwrap();
        app.clone().oneshot(req("GET", "/items")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_open() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(ResponseCache::new(settings(true), Arc::new(UnavailableStore)));
        let app = app(cache, calls.clone());

        let response = app.clone().oneshot(req("GET", "/items")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], "\"v1\"");
        assert_eq!(body_text(response).await, "call 0");

        let response = app.oneshot(req("GET", "/items")).await.unwrap();
        assert_eq!(body_text(response).await, "call 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_still_answers_conditional_get() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = Arc::new(ResponseCache::new(settings(true), Arc::new(UnavailableStore)));
        let handler = move |headers: HeaderMap| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                CacheAnnotator::default().annotate(
                    Bytes::from_static(b"{\"id\":1}"),
                    &ConditionalHeaders::from_headers(&headers),
                )
            }
        };
        let app = Router::new()
            .route("/items/1", get(handler))
            .layer(middleware::from_fn_with_state(cache, response_cache_middleware));

        let first = app.clone().oneshot(req("GET", "/items/1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let etag = first.headers()[header::ETAG].clone();

        let conditional = Request::builder()
            .uri("/items/1")
            .header(header::IF_NONE_MATCH, etag.clone())
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(conditional).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()[header::ETAG], etag);
        assert!(!response.headers().contains_key(X_CACHE));
        assert!(body_text(response).await.is_empty());

        // Nothing could be served from the store, so both requests ran the handler.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Body that advertises a length and then fails.
    struct BrokenBody;

    impl HttpBody for BrokenBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<http_body::Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }

        fn size_hint(&self) -> http_body::SizeHint {
            http_body::SizeHint::with_exact(4)
        }
    }

    #[tokio::test]
    async fn test_body_error_passes_through_unstored() {
        let store = Arc::new(MemoryStore::new(16));
        let cache = Arc::new(ResponseCache::new(settings(true), store.clone()));
        let app = Router::new()
            .route(
                "/broken",
                get(|| async {
                    (
                        [(header::CACHE_CONTROL, "public, max-age=60")],
                        Body::new(BrokenBody),
                    )
                }),
            )
            .layer(middleware::from_fn_with_state(cache, response_cache_middleware));

        let response = app.oneshot(req("GET", "/broken")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(X_CACHE));
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_uncacheable_response_not_stored() {
        let cache = Arc::new(ResponseCache::new(settings(true), Arc::new(MemoryStore::new(16))));
        let app = app(cache.clone(), Arc::new(AtomicUsize::new(0)));

        let response = app.oneshot(req("GET", "/private")).await.unwrap();
        assert!(!response.headers().contains_key(X_CACHE));
        assert!(cache.store().is_empty());
    }

    #[test]
    fn test_request_key_varies_on_configured_headers() {
        let vary = vec!["authorization".to_string()];
        let uri: Uri = "/api/products/showAll/1".parse().unwrap();
        let mut alice = HeaderMap::new();
        alice.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer alice"));
        let mut bob = HeaderMap::new();
        bob.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer bob"));
        let mut alice_other = alice.clone();
        alice_other.insert(header::USER_AGENT, HeaderValue::from_static("curl"));

        let a = request_key(&Method::GET, &uri, &alice, &vary);
        let b = request_key(&Method::GET, &uri, &bob, &vary);
        let a2 = request_key(&Method::GET, &uri, &alice_other, &vary);

        assert_ne!(a, b);
        assert_eq!(a, a2, "headers outside the vary list do not split entries");
        assert!(a.starts_with("GET /api/products/showAll/1 "));
        assert!(!a.contains("alice"));
    }

    #[test]
    fn test_cacheable_ttl() {
        let ok = |cc: &'static str| {
            let mut r = Response::new(Body::empty());
            r.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static(cc));
            r
        };
        assert_eq!(
            cacheable_ttl(&ok("public, max-age=3600, must-revalidate")),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(cacheable_ttl(&ok("no-store")), None);
        assert_eq!(cacheable_ttl(&ok("private, max-age=60")), None);
        assert_eq!(cacheable_ttl(&ok("public, max-age=0")), None);
        assert_eq!(cacheable_ttl(&Response::new(Body::empty())), None);

        let mut not_found = ok("public, max-age=60");
        *not_found.status_mut() = StatusCode::NOT_FOUND;
        assert_eq!(cacheable_ttl(&not_found), None);
    }
}
