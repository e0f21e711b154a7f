//! Catalog REST API library.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod hateoas;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
