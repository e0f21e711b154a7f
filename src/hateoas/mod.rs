//! Hypermedia shaping subsystem.
//!
//! # Data Flow
//! ```text
//! Ordered records (from a repository)
//!     → paginator.rs (slice one page, keep the total)
//!     → envelope.rs (project fields + links for a visibility group)
//!     → serialized JSON body
//!     → cache::annotator (ETag, Cache-Control)
//! ```
//!
//! # Design Decisions
//! - Visibility is a static table per record type (visibility.rs), no reflection
//! - Field and link order follow declaration order so bodies are byte-stable
//! - Unknown groups degrade to an empty projection instead of failing the request
//! - Pagination metadata is never filtered by group

pub mod envelope;
pub mod paginator;
pub mod visibility;

pub use envelope::{build, Envelope, Hypermedia, Link};
pub use paginator::{paginate, Page};
pub use visibility::{FieldRule, Record, RelationRule, Schema, VisibilityGroup};
