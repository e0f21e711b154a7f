//! CRUD endpoints.
//!
//! # Data Flow
//! ```text
//! GET  → repository → paginate (lists) → envelope (visibility group)
//!      → annotator (ETag / 304) → response
//! POST / PUT / DELETE → repository → envelope → `no-store` response
//! ```
//!
//! Handlers stay thin: the caching and projection rules live in `hateoas`
//! and `cache`.

pub mod clients;
pub mod products;
pub mod users;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};

use crate::cache::annotator::ConditionalHeaders;
use crate::hateoas::{build, Hypermedia, VisibilityGroup};
use crate::http::error::ApiError;
use crate::http::request::header_request_id;
use crate::http::response::no_store;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Every API route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products/showAll/{page}", get(products::show_all))
        .route("/api/products/{id}/show", get(products::show))
        .route("/api/products/post", post(products::create))
        .route("/api/products/{id}/put", put(products::update))
        .route("/api/products/{id}/delete", delete(products::remove))
        .route("/api/clients/showAll/{page}", get(clients::show_all))
        .route("/api/clients/{id}/show", get(clients::show))
        .route("/api/clients/post", post(clients::create))
        .route("/api/clients/{id}/put", put(clients::update))
        .route("/api/clients/{id}/delete", delete(clients::remove))
        .route("/api/register", post(users::register))
        .route("/api/users/showAll/{page}", get(users::show_all))
        .route("/api/users/showClients/{page}", get(users::show_clients))
        .route("/api/users/{id}/show", get(users::show))
        .route("/api/users/{id}/put", put(users::update))
        .route("/api/users/{id}/delete", delete(users::remove))
}

/// Cacheable GET response: envelope, ETag, and 304 when the client is current.
pub(crate) fn respond<H: Hypermedia + ?Sized>(
    state: &AppState,
    headers: &HeaderMap,
    input: &H,
    group: &VisibilityGroup,
) -> Result<Response, ApiError> {
    let body = build(input, group).to_bytes()?;
    let decision = state
        .annotator
        .annotate(body, &ConditionalHeaders::from_headers(headers));

    metrics::record_conditional(decision.is_not_modified());
    tracing::debug!(
        request_id = header_request_id(headers).unwrap_or("unknown"),
        group = %group,
        etag = decision.etag(),
        not_modified = decision.is_not_modified(),
        "Annotated response"
    );

    let mut response = decision.into_response();
    if let Some(vary) = &state.vary {
        response.headers_mut().insert(header::VARY, vary.clone());
    }
    Ok(response)
}

/// Write response carrying the envelope of the affected record.
pub(crate) fn written<H: Hypermedia + ?Sized>(
    status: StatusCode,
    input: &H,
    group: &VisibilityGroup,
) -> Result<Response, ApiError> {
    Ok(no_store(status, Some(build(input, group).to_bytes()?)))
}

pub(crate) fn deleted() -> Response {
    no_store(StatusCode::NO_CONTENT, None)
}

pub(crate) fn blank(field: &str) -> ApiError {
    ApiError::InvalidRequest(format!("'{field}' must not be blank"))
}
