//! Integration tests for CLI argument handling
//!
//! Runs the binary for help and invalid-input cases and exercises the
//! argument helpers through the library crate.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_fpfetch"))
        .args(args)
        .output()
        .expect("Failed to execute fpfetch")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fpfetch"), "Help should mention fpfetch");
    assert!(stdout.contains("get"), "Help should mention the get command");
    assert!(stdout.contains("batch"), "Help should mention the batch command");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_method_prints_error_and_exits() {
    let output = run_cli(&["send", "TRACE", "/api/uploads"]);
    assert!(!output.status.success(), "Expected invalid method to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("InvalidMethod") && stderr.contains("TRACE"),
        "Should print error message about invalid method: {}",
        stderr
    );
}

#[test]
fn test_invalid_config_file_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "not json").expect("Should write config");

    let output = run_cli(&[
        "--config",
        path.to_str().expect("Temp path should be UTF-8"),
        "get",
        "/api/history",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Parse") && stderr.contains("config.json"),
        "Should report the unparseable config file: {}",
        stderr
    );
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use fpfetch::cli::{build_send_request, parse_header, Cli, Command};
    use fpfetch::fetch::Method;

    #[test]
    fn test_cli_get_takes_no_cache_flags() {
        assert!(Cli::try_parse_from(["fpfetch", "get", "/api/history", "--no-cache"]).is_err());
        assert!(Cli::try_parse_from(["fpfetch", "get", "/api/history", "--ttl-secs", "5"]).is_err());
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let cli = Cli::parse_from(["fpfetch", "get", "/api/history", "--config", "/tmp/c.json"]);
        assert_eq!(
            cli.config.as_deref().and_then(|p| p.to_str()),
            Some("/tmp/c.json")
        );
    }

    #[test]
    fn test_cli_retry_overrides() {
        let cli = Cli::parse_from([
            "fpfetch",
            "batch",
            "/a",
            "/b",
            "--attempts",
            "2",
            "--base-delay-ms",
            "10",
        ]);
        match cli.command {
            Command::Batch { urls, retry } => {
                assert_eq!(urls, vec!["/a", "/b"]);
                assert_eq!(retry.attempts, Some(2));
                assert_eq!(retry.base_delay_ms, Some(10));
            }
            other => panic!("Expected batch, got {:?}", other),
        }
    }

    #[test]
    fn test_build_send_request_is_not_a_read() {
        let request = build_send_request("delete", "/api/uploads/9", None, &[]).unwrap();
        assert_eq!(request.method, Method::Delete);
        assert!(!request.is_read());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_parse_header_keeps_colons_in_value() {
        let (name, value) = parse_header("X-Url: https://example.com").unwrap();
        assert_eq!(name, "X-Url");
        assert_eq!(value, "https://example.com");
    }
}
