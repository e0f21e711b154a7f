//! Request-side helpers.
//!
//! # Responsibilities
//! - Expose the request id set by the outer `SetRequestIdLayer`
//! - Parse page numbers and record ids from path segments
//! - Extract the caller identity (`X-User-Id`)
//!
//! # Design Decisions
//! - Path segments are taken as strings and parsed here so every parse
//!   failure renders as the same JSON 400
//! - Caller identity stands in for an authentication layer; a missing
//!   header is not an error, a malformed one is

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Request},
};
use tower_http::request_id::RequestId;

use crate::http::error::ApiError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Header naming the calling user.
pub const X_USER_ID: &str = "x-user-id";

/// Access to the id assigned to a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .or_else(|| header_request_id(self.headers()))
    }
}

/// Request id carried in `headers`, if any.
pub fn header_request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Parse a page number path segment.
///
/// Any integer is accepted; values below 1 are clamped by the paginator.
pub fn parse_page_number(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidRequest(format!("invalid page number '{raw}'")))
}

pub fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ApiError::InvalidRequest(format!("invalid id '{raw}'")))
}

/// The calling user, from `X-User-Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Option<u64>);

impl CurrentUser {
    /// The caller id, or 401 when the request is anonymous.
    pub fn require(self) -> Result<u64, ApiError> {
        self.0
            .ok_or_else(|| ApiError::Unauthorized("X-User-Id header required".into()))
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(X_USER_ID) else {
            return Ok(CurrentUser(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|id| CurrentUser(Some(id)))
            .ok_or_else(|| ApiError::InvalidRequest("X-User-Id must be a numeric user id".into()))
    }
}
