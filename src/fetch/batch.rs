//! Concurrent batch fetching and cache prefetch
//!
//! Every request runs on its own tokio task so that a failing request never
//! cancels its siblings; they finish on their own and keep any cache entries
//! they write.

use futures::future::{join_all, try_join_all};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CacheOptions, FetchError, Request, ResilientClient, RetryPolicy, Transport};

/// Outcome of a prefetch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Fetches every request concurrently, failing fast
///
/// # Returns
/// * `Ok(Vec<V>)` - Values in the same order as `requests`
/// * `Err(FetchError)` - The first failure to complete; other results are discarded
pub async fn fetch_all<T, V>(
    client: &ResilientClient<T>,
    requests: Vec<Request>,
    cache_options: &CacheOptions,
    retry: &RetryPolicy,
) -> Result<Vec<V>, FetchError>
where
    T: Transport,
    V: DeserializeOwned + Send + 'static,
{
    let handles = requests.into_iter().map(|request| {
        let client = client.clone();
        let cache_options = cache_options.clone();
        let retry = retry.clone();
        tokio::spawn(async move { client.fetch::<V>(&request, &cache_options, &retry).await })
    });

    // Dropping the remaining handles on error detaches their tasks, it does not abort them.
    try_join_all(handles.map(|handle| async move {
        handle.await.unwrap_or_else(|err| Err(FetchError::from(err)))
    }))
    .await
}

/// Warms the cache with GETs for `urls`
///
/// Failures are logged and counted, never returned.
pub async fn prefetch<T: Transport>(
    client: &ResilientClient<T>,
    urls: &[String],
    ttl: Duration,
    retry: &RetryPolicy,
) -> PrefetchReport {
    let cache_options = CacheOptions::default().with_ttl(ttl);

    let fetches = urls.iter().map(|url| {
        let client = client.clone();
        let cache_options = cache_options.clone();
        let retry = retry.clone();
        let request = Request::get(url.clone());
        tokio::spawn(async move {
            client
                .fetch_value(&request, &cache_options, &retry)
                .await
                .map_err(|err| {
                    warn!(url = %request.url, error = %err, "prefetch failed");
                })
        })
    });

    let mut report = PrefetchReport::default();
    for outcome in join_all(fetches).await {
        match outcome {
            Ok(Ok(_)) => report.succeeded += 1,
            Ok(Err(())) => report.failed += 1,
            Err(err) => {
                warn!(error = %err, "prefetch task failed");
                report.failed += 1;
            }
        }
    }

    debug!(succeeded = report.succeeded, failed = report.failed, "prefetch finished");
    report
}
