//! fpfetch library
//!
//! Resilient cached fetch for the fingerprint analysis API: an in-memory response
//! cache, a linear-backoff retry policy and the orchestrator that combines them.

pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
