//! Core types and traits for the Hoplink URL shortener.
//!
//! This crate provides the shared data model and the collaborator
//! contracts (durable store, TTL cache, clock) used by both the
//! shortener service and the redirector service.

pub mod cache;
pub mod clock;
pub mod error;
pub mod repository;
pub mod shortcode;

pub use cache::{cache_ttl, CacheTtl, UrlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CoreError, StorageError};
pub use repository::{ReadRepository, Repository, UrlRecord};
pub use shortcode::ShortCode;
