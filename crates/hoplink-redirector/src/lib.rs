//! Short URL resolution service.
//!
//! This crate implements the read side of Hoplink: a cache-aside lookup
//! that falls back to the durable store, enforces expiry in both tiers,
//! and repopulates the cache best-effort. Cache unavailability never
//! fails a resolve; it only removes the fast path.

pub mod error;
pub mod redirector;
pub mod service;

pub use error::RedirectError;
pub use redirector::{Redirector, Resolution};
pub use service::RedirectService;
