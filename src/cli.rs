//! Command-line interface parsing for fpfetch
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! requests, cache options and retry policies on top of the loaded config.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::FetchConfig;
use crate::fetch::{CacheOptions, Method, Request, RetryPolicy};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The HTTP method is not supported
    #[error("Invalid method: '{0}'. Valid methods: GET, POST, PUT, PATCH, DELETE")]
    InvalidMethod(String),

    /// A header argument is not of the form NAME:VALUE
    #[error("Invalid header: '{0}'. Expected NAME:VALUE")]
    InvalidHeader(String),

    /// The request body is not valid JSON
    #[error("Invalid JSON data: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// fpfetch - resilient cached client for the fingerprint analysis API
#[derive(Parser, Debug)]
#[command(name = "fpfetch")]
#[command(about = "Resilient cached HTTP client for the fingerprint analysis API")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON config file (defaults to the XDG config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log retries and cache activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Retry overrides shared by every subcommand
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RetryArgs {
    /// Total attempts including the first
    #[arg(long, value_name = "N")]
    pub attempts: Option<u32>,

    /// Delay before the first retry in milliseconds
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,
}

impl RetryArgs {
    /// Applies the overrides to the configured policy
    pub fn policy(&self, config: &FetchConfig) -> RetryPolicy {
        let mut policy = config.retry_policy();
        if let Some(attempts) = self.attempts {
            policy.max_attempts = attempts;
        }
        if let Some(ms) = self.base_delay_ms {
            policy.base_delay = Duration::from_millis(ms);
        }
        policy
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a resource with GET
    Get {
        /// Resource URL or path
        url: String,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Send a non-read request; never cached
    Send {
        /// HTTP method (POST, PUT, PATCH, DELETE)
        method: String,

        /// Resource URL or path
        url: String,

        /// JSON request body
        #[arg(long, value_name = "JSON")]
        data: Option<String>,

        /// Extra request header, repeatable
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Fetch several resources concurrently, failing on the first error
    ///
    /// The response cache lives for a single run, so repeated URLs in one batch
    /// are still fetched independently.
    Batch {
        /// Resource URLs or paths
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        retry: RetryArgs,
    },
}

/// Parses an HTTP method argument
pub fn parse_method(s: &str) -> Result<Method, CliError> {
    s.parse().map_err(CliError::InvalidMethod)
}

/// Parses a `NAME:VALUE` header argument
pub fn parse_header(s: &str) -> Result<(String, String), CliError> {
    match s.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(CliError::InvalidHeader(s.to_string())),
    }
}

/// Builds the request for `fpfetch send`
pub fn build_send_request(
    method: &str,
    url: &str,
    data: Option<&str>,
    headers: &[String],
) -> Result<Request, CliError> {
    let mut request = Request::new(parse_method(method)?, url);
    for header in headers {
        let (name, value) = parse_header(header)?;
        request = request.header(name, value);
    }
    if let Some(data) = data {
        let body: Value = serde_json::from_str(data)?;
        request = request.json(body);
    }
    Ok(request)
}

/// Cache options for reads, with the configured TTL
pub fn read_cache_options(config: &FetchConfig) -> CacheOptions {
    CacheOptions::default().with_ttl(config.cache_ttl())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method_valid_and_invalid() {
        assert_eq!(parse_method("post").unwrap(), Method::Post);
        let err = parse_method("TRACE").unwrap_err();
        assert!(err.to_string().contains("Invalid method"));
        assert!(err.to_string().contains("TRACE"));
    }

    #[test]
    fn test_parse_header_trims_whitespace() {
        assert_eq!(
            parse_header("Authorization: Bearer abc").unwrap(),
            ("Authorization".to_string(), "Bearer abc".to_string())
        );
    }

    #[test]
    fn test_parse_header_rejects_missing_colon_or_name() {
        assert!(parse_header("Authorization").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_build_send_request_with_body_and_headers() {
        let request = build_send_request(
            "PUT",
            "/api/uploads/3",
            Some(r#"{"label":"left thumb"}"#),
            &["X-Trace: 1".to_string()],
        )
        .unwrap();

        assert_eq!(request.method, Method::Put);
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.body, Some(serde_json::json!({ "label": "left thumb" })));
    }

    #[test]
    fn test_build_send_request_invalid_json() {
        let result = build_send_request("POST", "/api/uploads", Some("{oops"), &[]);
        assert!(matches!(result, Err(CliError::InvalidData(_))));
    }

    #[test]
    fn test_read_cache_options_use_config_ttl() {
        let config = FetchConfig {
            cache_ttl_secs: 30,
            ..Default::default()
        };
        let options = read_cache_options(&config);

        assert!(options.use_cache);
        assert!(options.cache_key.is_none());
        assert_eq!(options.ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_retry_args_override_config() {
        let config = FetchConfig::default();
        let args = RetryArgs {
            attempts: Some(2),
            base_delay_ms: Some(50),
        };

        let policy = args.policy(&config);

        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(50));
        assert_eq!(RetryArgs::default().policy(&config), RetryPolicy::default());
    }

    #[test]
    fn test_cli_parse_get() {
        let cli = Cli::parse_from(["fpfetch", "get", "/api/history", "--attempts", "1"]);
        match cli.command {
            Command::Get { url, retry } => {
                assert_eq!(url, "/api/history");
                assert_eq!(retry.attempts, Some(1));
            }
            other => panic!("Expected get, got {:?}", other),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_send_with_headers() {
        let cli = Cli::parse_from([
            "fpfetch", "send", "POST", "/api/uploads", "-H", "A: 1", "-H", "B: 2", "--verbose",
        ]);
        match cli.command {
            Command::Send { method, headers, .. } => {
                assert_eq!(method, "POST");
                assert_eq!(headers, vec!["A: 1", "B: 2"]);
            }
            other => panic!("Expected send, got {:?}", other),
        }
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_batch_requires_urls() {
        assert!(Cli::try_parse_from(["fpfetch", "batch"]).is_err());
    }
}
