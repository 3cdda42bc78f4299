//! Deterministic short code generation for Hoplink.
//!
//! This crate derives collision-resistant short codes from a URL and an
//! attempt counter. Generation is pure: the same `(url, attempt)` pair
//! always yields the same code, and bumping the attempt yields an
//! unrelated code so callers can escape collisions.

pub mod hash;

pub use hash::HashGenerator;

use hoplink_core::ShortCode;

/// Trait for deriving short codes.
///
/// Implementations are pure functions of the input: they never interact
/// with storage and never fail. Uniqueness is not guaranteed here; the
/// durable store's uniqueness constraint is the arbiter, and `attempt`
/// exists solely so callers can retry past a collision.
pub trait Generator: Send + Sync + 'static {
    /// Derives the short code for the given URL and attempt counter.
    fn generate(&self, long_url: &str, attempt: u32) -> ShortCode;
}
