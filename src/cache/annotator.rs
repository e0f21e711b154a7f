//! Conditional-GET annotation.
//!
//! # Responsibilities
//! - Derive an ETag from the exact bytes of a response body
//! - Attach the Cache-Control policy of cacheable GET responses
//! - Short-circuit to "not modified" when `If-None-Match` already names the body
//!
//! # Design Decisions
//! - Pure transform: no clock, no shared state, safe to call from any request
//! - ETag is a truncated SHA-256 of the body, quoted as a strong validator

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use sha2::{Digest, Sha256};

/// Default freshness lifetime of cacheable responses (one hour).
pub const DEFAULT_MAX_AGE_SECS: u64 = 3600;

/// Conditional headers of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    pub if_none_match: Option<String>,
}

impl ConditionalHeaders {
    /// Collect the conditional headers from a request header map.
    ///
    /// Repeated `If-None-Match` headers are joined into one list.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let values: Vec<&str> = headers
            .get_all(header::IF_NONE_MATCH)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        Self {
            if_none_match: if values.is_empty() {
                None
            } else {
                Some(values.join(", "))
            },
        }
    }

    pub fn if_none_match(etag: impl Into<String>) -> Self {
        Self {
            if_none_match: Some(etag.into()),
        }
    }

    /// Whether `If-None-Match` names `etag`.
    ///
    /// Each list entry is compared exactly; `*` matches anything and a weak
    /// `W/` prefix on the client side is ignored.
    pub fn matches(&self, etag: &str) -> bool {
        let Some(list) = &self.if_none_match else {
            return false;
        };
        list.split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .any(|candidate| {
                candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
            })
    }
}

/// Outcome of annotating one response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// The client already holds this body; send headers only.
    NotModified { etag: String, max_age_secs: u64 },
    /// Send the body with its validators.
    Fresh {
        etag: String,
        max_age_secs: u64,
        must_revalidate: bool,
        body: Bytes,
    },
}

impl CacheDecision {
    pub fn etag(&self) -> &str {
        match self {
            CacheDecision::NotModified { etag, .. } | CacheDecision::Fresh { etag, .. } => etag,
        }
    }

    pub fn is_not_modified(&self) -> bool {
        matches!(self, CacheDecision::NotModified { .. })
    }
}

/// Attaches ETag and Cache-Control metadata to serialized bodies.
#[derive(Debug, Clone, Copy)]
pub struct CacheAnnotator {
    max_age_secs: u64,
}

impl CacheAnnotator {
    pub fn new(max_age_secs: u64) -> Self {
        Self { max_age_secs }
    }

    pub fn max_age_secs(&self) -> u64 {
        self.max_age_secs
    }

    /// Decide between a full response and a 304 for `body`.
    pub fn annotate(&self, body: Bytes, conditional: &ConditionalHeaders) -> CacheDecision {
        let etag = compute_etag(&body);

        if conditional.matches(&etag) {
            return CacheDecision::NotModified {
                etag,
                max_age_secs: self.max_age_secs,
            };
        }

        CacheDecision::Fresh {
            etag,
            max_age_secs: self.max_age_secs,
            must_revalidate: true,
            body,
        }
    }
}

impl Default for CacheAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE_SECS)
    }
}

/// Strong ETag for a body: first 16 bytes of its SHA-256, hex-encoded and quoted.
pub fn compute_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", hex::encode(&digest[..16]))
}

/// `Cache-Control` value for a cacheable response.
pub fn cache_control_value(max_age_secs: u64, must_revalidate: bool) -> String {
    if must_revalidate {
        format!("public, max-age={max_age_secs}, must-revalidate")
    } else {
        format!("public, max-age={max_age_secs}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const BODY: &[u8] = br#"{"id":1,"model":"X"}"#;

    #[test]
    fn test_etag_is_deterministic() {
        assert_eq!(compute_etag(BODY), compute_etag(BODY));
        let etag = compute_etag(BODY);
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag.len(), 34);
    }

    #[test]
    fn test_etag_changes_with_body() {
        assert_ne!(compute_etag(BODY), compute_etag(br#"{"id":1,"model":"Y"}"#));
    }

    #[test]
    fn test_fresh_without_conditional() {
        let decision = CacheAnnotator::default()
            .annotate(Bytes::from_static(BODY), &ConditionalHeaders::default());
        match decision {
            CacheDecision::Fresh { etag, max_age_secs, must_revalidate, body } => {
                assert_eq!(etag, compute_etag(BODY));
                assert_eq!(max_age_secs, 3600);
                assert!(must_revalidate);
                assert_eq!(&body[..], BODY);
            }
            other => panic!("expected fresh response, got {:?}", other),
        }
    }

    #[test]
    fn test_not_modified_on_matching_etag() {
        let conditional = ConditionalHeaders::if_none_match(compute_etag(BODY));
        let decision = CacheAnnotator::default().annotate(Bytes::from_static(BODY), &conditional);
        assert!(decision.is_not_modified());
        assert_eq!(decision.etag(), compute_etag(BODY));
    }

    #[test]
    fn test_fresh_on_stale_etag() {
        let conditional = ConditionalHeaders::if_none_match("\"0000\"");
        let decision = CacheAnnotator::default().annotate(Bytes::from_static(BODY), &conditional);
        assert!(!decision.is_not_modified());
    }

    #[test]
    fn test_match_list_wildcard_and_weak() {
        let etag = compute_etag(BODY);
        assert!(ConditionalHeaders::if_none_match(format!("\"a\", {etag}")).matches(&etag));
        assert!(ConditionalHeaders::if_none_match("*").matches(&etag));
        assert!(ConditionalHeaders::if_none_match(format!("W/{etag}")).matches(&etag));
        // Unquoted opaque value is a different validator.
        assert!(!ConditionalHeaders::if_none_match(etag.trim_matches('"')).matches(&etag));
    }

    #[test]
    fn test_from_headers_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        assert_eq!(ConditionalHeaders::from_headers(&headers), ConditionalHeaders::default());

        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("\"a\""));
        headers.append(header::IF_NONE_MATCH, HeaderValue::from_static("\"b\""));
        let conditional = ConditionalHeaders::from_headers(&headers);
        assert!(conditional.matches("\"a\""));
        assert!(conditional.matches("\"b\""));
    }

    #[test]
    fn test_cache_control_value() {
        assert_eq!(cache_control_value(3600, true), "public, max-age=3600, must-revalidate");
        assert_eq!(cache_control_value(60, false), "public, max-age=60");
    }
}
