//! fpfetch - resilient cached client for the fingerprint analysis API
//!
//! Issues requests through the cache and retry layer and prints JSON responses
//! to stdout. Logs go to stderr.

use clap::Parser;
use serde_json::Value;

use fpfetch::cache::ResponseCache;
use fpfetch::cli::{build_send_request, read_cache_options, Cli, Command};
use fpfetch::config::FetchConfig;
use fpfetch::fetch::{fetch_all, CacheOptions, HttpTransport, Request, ResilientClient};

/// Initializes tracing to stderr so stdout stays clean for JSON output
fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Builds the client from config; one cache for the whole process
fn build_client(config: &FetchConfig) -> ResilientClient<HttpTransport> {
    let transport = match &config.base_url {
        Some(base_url) => HttpTransport::new().with_base_url(base_url.clone()),
        None => HttpTransport::new(),
    };
    ResilientClient::new(transport, ResponseCache::new()).with_timeout(config.timeout())
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = FetchConfig::load(cli.config.as_deref())?;
    let client = build_client(&config);

    match cli.command {
        Command::Get { url, retry } => {
            let value = client
                .fetch_value(
                    &Request::get(url),
                    &read_cache_options(&config),
                    &retry.policy(&config),
                )
                .await?;
            print_json(&value)?;
        }
        Command::Send {
            method,
            url,
            data,
            headers,
            retry,
        } => {
            let request = build_send_request(&method, &url, data.as_deref(), &headers)?;
            let value = client
                .fetch_value(&request, &CacheOptions::bypass(), &retry.policy(&config))
                .await?;
            print_json(&value)?;
        }
        Command::Batch { urls, retry } => {
            let requests = urls.into_iter().map(Request::get).collect();
            let values: Vec<Value> = fetch_all(
                &client,
                requests,
                &read_cache_options(&config),
                &retry.policy(&config),
            )
            .await?;
            print_json(&Value::Array(values))?;
        }
    }

    Ok(())
}
