//! Cache module for holding API responses in memory
//!
//! This module provides a response cache shared by every call site in the process.
//! Each entry carries its own TTL; expired entries are treated as absent by normal
//! reads but stay available through `get_stale`, allowing callers to fall back to
//! old data when the API is unavailable.

mod store;

pub use store::{cache_key, CachedData, ResponseCache};
