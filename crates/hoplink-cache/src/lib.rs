//! Cache implementations for Hoplink.
//!
//! Both implementations satisfy the [`UrlCache`] contract from
//! `hoplink-core`: Redis for shared deployments, Moka for single-node
//! use and tests.
//!
//! [`UrlCache`]: hoplink_core::UrlCache

pub mod moka;
pub mod redis;

pub use moka::{CacheConfig, MokaUrlCache};
pub use redis::RedisUrlCache;
