//! Integration tests for CLI argument handling
//!
//! Runs the binary with `--explain`, which prints the planned sources without
//! touching the network, and checks argument validation.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    let cache_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    Command::new(env!("CARGO_BIN_EXE_marketdash"))
        .args(args)
        .env("MARKETDASH_CACHE_DIR", cache_dir.path())
        .env_remove("MARKETDASH_MAX_AGE")
        .env_remove("MARKETDASH_TIMEOUT")
        .env_remove("ETHERSCAN_API_KEY")
        .output()
        .expect("Failed to execute marketdash")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("marketdash"), "Help should mention marketdash");
    assert!(stdout.contains("price"), "Help should list the price command");
    assert!(stdout.contains("--max-age"), "Help should mention --max-age");
}

#[test]
fn test_explain_price_lists_sources_in_order() {
    let output = run_cli(&["price", "ethereum", "--explain"]);
    assert!(output.status.success());

    let plan: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("explain output should be JSON");
    let sources = plan[0].as_array().expect("one query with sources");
    let providers: Vec<&str> = sources
        .iter()
        .map(|s| s["provider"].as_str().unwrap())
        .collect();
    assert_eq!(providers, vec!["coingecko", "coincap", "coinpaprika"]);
    assert_eq!(sources[0]["shape"], "simple_price");
    assert_eq!(sources[1]["cache_key"], "price_ethereum_coincap");
}

#[test]
fn test_explain_value_plans_one_query_per_holding() {
    let output = run_cli(&["value", "ethereum=1", "unknown-token=3", "--explain"]);
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plan = plan.as_array().unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].as_array().unwrap().len(), 3);
    assert_eq!(plan[1].as_array().unwrap().len(), 2, "no paprika id for unknown tokens");
}

#[test]
fn test_explain_gas_uses_etherscan_oracle() {
    let output = run_cli(&["gas", "--explain"]);
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let source = &plan[0][0];
    assert_eq!(source["provider"], "etherscan");
    assert_eq!(source["shape"], "gas");
    assert_eq!(source["cache_key"], "gas_etherscan");
}

#[test]
fn test_invalid_holding_prints_error_and_exits() {
    let output = run_cli(&["value", "ethereum"]);
    assert!(!output.status.success(), "Expected invalid holding to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid holding"),
        "Should print error message about invalid holding: {}",
        stderr
    );
}

#[test]
fn test_invalid_limit_exits_with_usage_code() {
    let output = run_cli(&["coins", "--limit", "1000"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid limit"), "{}", stderr);
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use marketdash::cli::{parse_holding_arg, Cli, Command, Settings};

    #[test]
    fn test_cli_coins_default_limit() {
        let cli = Cli::parse_from(["marketdash", "coins"]);
        assert_eq!(cli.command, Command::Coins { limit: 10 });
    }

    #[test]
    fn test_cli_watch_interval() {
        let cli = Cli::parse_from(["marketdash", "watch", "ethereum", "--interval", "15"]);
        assert_eq!(
            cli.command,
            Command::Watch {
                id: "ethereum".into(),
                interval: 15
            }
        );
    }

    #[test]
    fn test_parse_holding_arg_lowercases_id() {
        assert_eq!(
            parse_holding_arg("ETHEREUM=0.5").unwrap(),
            ("ethereum".to_string(), 0.5)
        );
    }

    #[test]
    fn test_settings_explain_flag() {
        let cli = Cli::parse_from(["marketdash", "global", "--explain"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert!(settings.explain);
    }
}
