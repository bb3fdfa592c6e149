//! Resilient fetch orchestrator
//!
//! `ResilientClient` resolves one logical request to a value: cache-first for reads,
//! then an attempt loop with linear backoff under a single shared deadline.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{FetchError, Request, RetryPolicy, Transport};
use crate::cache::ResponseCache;

/// Deadline shared by every attempt and backoff sleep of one call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default freshness window for cached reads
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Per-call cache behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Whether reads consult and populate the cache
    pub use_cache: bool,
    /// Key to store under; defaults to the request URL
    pub cache_key: Option<String>,
    /// How long a stored response stays fresh
    pub ttl: Duration,
    /// Serve an expired entry instead of failing a read
    pub stale_on_error: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_key: None,
            ttl: DEFAULT_CACHE_TTL,
            stale_on_error: false,
        }
    }
}

impl CacheOptions {
    /// Options that skip the cache entirely
    pub fn bypass() -> Self {
        Self {
            use_cache: false,
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key_for<'a>(&'a self, request: &'a Request) -> &'a str {
        self.cache_key.as_deref().unwrap_or(request.url.as_str())
    }
}

/// Fetch client combining a transport, the shared response cache and a deadline
#[derive(Debug)]
pub struct ResilientClient<T> {
    transport: Arc<T>,
    cache: ResponseCache,
    timeout: Duration,
}

impl<T> Clone for ResilientClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: self.cache.clone(),
            timeout: self.timeout,
        }
    }
}

impl<T: Transport> ResilientClient<T> {
    /// Creates a client over `transport` that reads and writes `cache`
    pub fn new(transport: T, cache: ResponseCache) -> Self {
        Self {
            transport: Arc::new(transport),
            cache,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the shared per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Removes cached entries after a mutation; see `ResponseCache::invalidate`
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        self.cache.invalidate(pattern)
    }

    /// Resolves `request` to a value of type `V`
    ///
    /// # Behavior
    /// - GET with caching enabled returns a fresh cached value without touching the network
    /// - Otherwise attempts up to `retry.attempts()` times, waiting `base_delay * n`
    ///   after the n-th failure
    /// - The deadline and the request's abort signal cut the whole call short
    /// - Successful GETs are cached under the cache key once they decode as `V`
    pub async fn fetch<V: DeserializeOwned>(
        &self,
        request: &Request,
        cache_options: &CacheOptions,
        retry: &RetryPolicy,
    ) -> Result<V, FetchError> {
        self.resolve(request, cache_options, retry, |value| {
            <V as serde::Deserialize>::deserialize(value)
        })
        .await
    }

    /// Same as `fetch` but returns the raw JSON body
    pub async fn fetch_value(
        &self,
        request: &Request,
        cache_options: &CacheOptions,
        retry: &RetryPolicy,
    ) -> Result<Value, FetchError> {
        self.resolve(request, cache_options, retry, |value| Ok(value.clone()))
            .await
    }

    // A body is only cached once `decode` accepts it.
    async fn resolve<V, D>(
        &self,
        request: &Request,
        cache_options: &CacheOptions,
        retry: &RetryPolicy,
        decode: D,
    ) -> Result<V, FetchError>
    where
        D: Fn(&Value) -> Result<V, serde_json::Error>,
    {
        let cacheable = request.is_read() && cache_options.use_cache;
        let key = cache_options.key_for(request);

        if cacheable {
            if let Some(value) = self.cache.get(key) {
                debug!(key, "cache hit");
                return Ok(decode(&value)?);
            }
            debug!(key, "cache miss");
        }

        match self.run_attempts(request, retry).await {
            Ok(value) => {
                let decoded = decode(&value)?;
                if cacheable {
                    self.cache.set(key, value, cache_options.ttl);
                    debug!(key, ttl = ?cache_options.ttl, "cached response");
                }
                Ok(decoded)
            }
            Err(err) => {
                if cacheable && cache_options.stale_on_error {
                    if let Some(stale) = self.cache.get_stale(key) {
                        warn!(key, error = %err, cached_at = %stale.cached_at, "serving stale response");
                        return Ok(decode(&stale.data)?);
                    }
                }
                Err(err)
            }
        }
    }

    async fn run_attempts(&self, request: &Request, retry: &RetryPolicy) -> Result<Value, FetchError> {
        // `None` when the timeout is too large to represent; the call then never times out.
        let deadline = Instant::now().checked_add(self.timeout);
        let attempts = retry.attempts();

        let mut attempt = 1;

        loop {
            let outcome = self.guarded(request, deadline, self.transport.issue(request)).await?;

            let err = match outcome {
                Ok(response) if response.is_success() => return Ok(response.body),
                Ok(response) => FetchError::HttpStatus {
                    status: response.status,
                    url: request.url.clone(),
                },
                Err(err) => FetchError::Network(err),
            };

            if attempt >= attempts || !retry.should_retry(&err) {
                return Err(err);
            }

            let delay = retry.delay_for(attempt);
            warn!(
                method = %request.method,
                url = %request.url,
                attempt,
                max_attempts = attempts,
                ?delay,
                error = %err,
                "request failed, retrying"
            );
            self.guarded(request, deadline, tokio::time::sleep(delay)).await?;
            attempt += 1;
        }
    }

    /// Runs `fut` unless the deadline passes or the request is aborted first
    ///
    /// The deadline is checked before `fut` is polled, so work that would start
    /// at or after the deadline never runs.
    async fn guarded<F: Future>(
        &self,
        request: &Request,
        deadline: Option<Instant>,
        fut: F,
    ) -> Result<F::Output, FetchError> {
        let aborted = async {
            match &request.signal {
                Some(signal) => signal.aborted().await,
                None => futures::future::pending().await,
            }
        };
        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => futures::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = aborted => Err(FetchError::Aborted { url: request.url.clone() }),
            _ = expired => Err(FetchError::Timeout {
                url: request.url.clone(),
                timeout: self.timeout,
            }),
            output = fut => Ok(output),
        }
    }
}
