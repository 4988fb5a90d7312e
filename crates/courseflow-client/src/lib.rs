//! Courseflow HTTP Client
//!
//! Backend collaborators for the session engine: the REST API client, the
//! debounced watch-position reporter, and a read-through resource cache.

pub mod api;
pub mod cache;
pub mod reporter;

pub use api::{ApiClient, ApiPositionSink};
pub use cache::ResourceCache;
pub use reporter::{PositionReporter, PositionSink};
