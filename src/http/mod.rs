//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id, path parsing, caller identity)
//!     → api handlers
//!     → response.rs (validators, no-store writes) / error.rs
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::{CurrentUser, RequestIdExt, X_REQUEST_ID, X_USER_ID};
pub use server::{AppState, HttpServer};
