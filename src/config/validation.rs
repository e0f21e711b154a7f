//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, page size > 0)
//! - Check addresses and header names parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderName;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("response_cache.vary_headers: '{0}' is not a lowercase header name")]
    InvalidHeaderName(String),

    #[error("observability.log_format: unknown format '{0}' (expected pretty or json)")]
    UnknownLogFormat(String),
}

/// Check `config` and report every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    for (field, value) in [
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
        ("http_cache.max_age_secs", config.http_cache.max_age_secs as usize),
        ("pagination.page_size", config.pagination.page_size),
        ("security.max_body_size", config.security.max_body_size),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.response_cache.enabled {
        if config.response_cache.max_entries == 0 {
            errors.push(ValidationError::Zero {
                field: "response_cache.max_entries",
            });
        }
        if config.response_cache.max_body_bytes == 0 {
            errors.push(ValidationError::Zero {
                field: "response_cache.max_body_bytes",
            });
        }
    }

    for name in &config.response_cache.vary_headers {
        let lowercase = name.chars().all(|c| !c.is_ascii_uppercase());
        if !lowercase || HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::UnknownLogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.pagination.page_size = 0;
        config.response_cache.vary_headers.push("X-Tenant".into());
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero { field: "pagination.page_size" }));
        assert!(errors.contains(&ValidationError::InvalidHeaderName("X-Tenant".into())));
    }

    #[test]
    fn test_cache_limits_only_checked_when_enabled() {
        let mut config = AppConfig::default();
        config.response_cache.max_entries = 0;
        assert!(validate_config(&config).is_ok());

        config.response_cache.enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::Zero { field: "response_cache.max_entries" }])
        );
    }
}
