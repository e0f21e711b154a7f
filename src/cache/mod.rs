//! HTTP caching subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound GET
//!     → proxy.rs (whole-response store, optional)
//!         hit  → replay stored response (or 304)
//!         miss → inner pipeline
//!     → handler builds envelope, serializes body
//!     → annotator.rs (ETag, Cache-Control, 304 short-circuit)
//!     → proxy.rs stores the cacheable result
//! ```
//!
//! # Design Decisions
//! - The annotator is pure and runs on every cacheable GET
//! - The proxy is the only shared mutable state (store.rs)
//! - Writes never reach the store

pub mod annotator;
pub mod proxy;
pub mod store;

pub use annotator::{CacheAnnotator, CacheDecision, ConditionalHeaders};
pub use proxy::{response_cache_middleware, ResponseCache};
pub use store::{MemoryStore, ProxyCacheEntry, ProxyStore, StoreError, StoredResponse};
