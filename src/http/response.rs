//! Response rendering.
//!
//! # Responsibilities
//! - Turn a [`CacheDecision`] into a 200 or 304 with its validators
//! - Render write responses that must never be stored
//! - Build the `Vary` value for representations selected by request headers
//!
//! # Design Decisions
//! - A 304 carries the same `ETag` and `Cache-Control` as the 200 it stands for
//! - Every JSON body is `application/json`

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::cache::annotator::{cache_control_value, CacheDecision};
use crate::http::request::X_USER_ID;

impl IntoResponse for CacheDecision {
    fn into_response(self) -> Response {
        match self {
            CacheDecision::NotModified { etag, max_age_secs } => {
                let mut response = StatusCode::NOT_MODIFIED.into_response();
                insert_validators(
                    response.headers_mut(),
                    &etag,
                    &cache_control_value(max_age_secs, true),
                );
                response
            }
            CacheDecision::Fresh {
                etag,
                max_age_secs,
                must_revalidate,
                body,
            } => {
                let mut response = json_response(StatusCode::OK, body);
                insert_validators(
                    response.headers_mut(),
                    &etag,
                    &cache_control_value(max_age_secs, must_revalidate),
                );
                response
            }
        }
    }
}

/// Response marked `no-store`, with an optional JSON body.
pub fn no_store(status: StatusCode, body: Option<Bytes>) -> Response {
    let mut response = match body {
        Some(body) => json_response(status, body),
        None => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            response
        }
    };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// `Vary` value for cacheable responses.
///
/// Lists the configured varying headers. `x-user-id` is always present since
/// caller-scoped lists are selected by it.
pub fn vary_header(names: &[String]) -> Option<HeaderValue> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    if !names.iter().any(|name| name.eq_ignore_ascii_case(X_USER_ID)) {
        names.push(X_USER_ID);
    }
    HeaderValue::from_str(&names.join(", ")).ok()
}

fn json_response(status: StatusCode, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn insert_validators(headers: &mut HeaderMap, etag: &str, cache_control: &str) {
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
    if let Ok(value) = HeaderValue::from_str(cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }
}
