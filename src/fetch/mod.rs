//! Resilient fetch layer
//!
//! This module contains the request types, the transport seam, the retry policy
//! and the `ResilientClient` orchestrator that ties them to the response cache.

pub mod batch;
pub mod client;
pub mod error;
pub mod request;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{fetch_all, prefetch, PrefetchReport};
pub use client::{CacheOptions, ResilientClient, DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};
pub use error::{FetchError, TransportError};
pub use request::{AbortController, AbortSignal, Method, Request};
pub use retry::{RetryPolicy, StatusRetry};
pub use transport::{HttpTransport, Transport, TransportResponse};
