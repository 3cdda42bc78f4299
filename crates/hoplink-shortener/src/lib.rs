//! Short URL creation service.
//!
//! This crate implements the write side of Hoplink: validating requests,
//! assigning a short code (custom alias or hash-generated with bounded
//! collision retry), persisting to the durable store with duplicate-key
//! race recovery, and best-effort cache warm-up.

pub mod error;
pub mod service;
pub mod shortener;

pub use error::ShortenError;
pub use service::ShortenService;
pub use shortener::{CreatedUrl, ExpirationPolicy, ShortenParams, Shortener};
