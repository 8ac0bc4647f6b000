//! Command-line interface parsing for marketdash
//!
//! This module handles parsing of CLI arguments using clap. Cache and network
//! settings are global flags, each of which can also come from the environment.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{FetchOptions, DEFAULT_MAX_AGE_SECS};

/// Largest page CoinGecko serves from `/coins/markets`
pub const MAX_COIN_LIMIT: usize = 250;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A holding argument is not of the form `id=amount`
    #[error("Invalid holding: '{0}'. Expected <coin-id>=<amount>, e.g. ethereum=1.5")]
    InvalidHolding(String),

    /// The coin limit is outside 1..=250
    #[error("Invalid limit: {0}. Must be between 1 and 250")]
    InvalidLimit(usize),

    /// The request timeout is zero
    #[error("Timeout must be at least one second")]
    InvalidTimeout,
}

/// marketdash - Crypto market data with caching and provider fallback
#[derive(Parser, Debug)]
#[command(name = "marketdash")]
#[command(about = "Cached crypto market data with multi-provider fallback")]
#[command(version)]
pub struct Cli {
    /// Seconds a cached response stays fresh
    #[arg(
        long,
        global = true,
        env = "MARKETDASH_MAX_AGE",
        value_name = "SECONDS",
        default_value_t = DEFAULT_MAX_AGE_SECS
    )]
    pub max_age: u64,

    /// Ignore cached responses and fetch everything live
    #[arg(long, global = true)]
    pub force_refresh: bool,

    /// Directory for cached responses (defaults to the XDG cache dir)
    #[arg(long, global = true, env = "MARKETDASH_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "MARKETDASH_TIMEOUT",
        value_name = "SECONDS",
        default_value_t = 30
    )]
    pub timeout: u64,

    /// Etherscan API key for the gas oracle
    #[arg(
        long,
        global = true,
        env = "ETHERSCAN_API_KEY",
        value_name = "KEY",
        hide_env_values = true
    )]
    pub etherscan_key: Option<String>,

    /// Print the sources that would be queried instead of fetching
    #[arg(long, global = true)]
    pub explain: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Market data requests
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Top coins by market cap
    Coins {
        /// Number of coins to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Current USD price of one or more coins
    Price {
        /// CoinGecko coin ids, e.g. ethereum bitcoin
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,
    },
    /// Daily price history, optionally with a trend line
    Chart {
        /// CoinGecko coin id
        id: String,
        /// Days of history
        #[arg(long, default_value_t = 7)]
        days: u32,
        /// Print a linear trend summary instead of the raw series
        #[arg(long)]
        trend: bool,
    },
    /// Global market statistics
    Global,
    /// Ethereum gas prices (low, average, fast) in gwei
    Gas,
    /// USD value of token holdings
    ///
    /// Examples:
    ///   marketdash value ethereum=1.5 tether=200
    Value {
        #[arg(required = true, value_name = "ID=AMOUNT", value_parser = parse_holding_arg)]
        holdings: Vec<(String, f64)>,
    },
    /// Re-fetch a coin's price on an interval until interrupted
    Watch {
        /// CoinGecko coin id
        id: String,
        /// Seconds between refreshes
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

/// Settings derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fetch: FetchOptions,
    pub cache_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub etherscan_key: Option<String>,
    pub explain: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            cache_dir: None,
            timeout: crate::transport::DEFAULT_TIMEOUT,
            etherscan_key: None,
            explain: false,
        }
    }
}

/// Parses a holding argument of the form `id=amount`.
///
/// # Returns
/// * `Ok((id, amount))` for a non-empty id and a finite, non-negative amount
/// * `Err(CliError::InvalidHolding)` otherwise
pub fn parse_holding_arg(s: &str) -> Result<(String, f64), CliError> {
    let invalid = || CliError::InvalidHolding(s.to_string());
    let (id, amount) = s.split_once('=').ok_or_else(invalid)?;
    let id = id.trim();
    let amount: f64 = amount.trim().parse().map_err(|_| invalid())?;
    if id.is_empty() || !amount.is_finite() || amount < 0.0 {
        return Err(invalid());
    }
    Ok((id.to_lowercase(), amount))
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with the fetch options and transport settings
    /// * `Err(CliError)` if a value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if let Command::Coins { limit } = cli.command {
            if limit == 0 || limit > MAX_COIN_LIMIT {
                return Err(CliError::InvalidLimit(limit));
            }
        }
        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }

        Ok(Settings {
            fetch: FetchOptions {
                max_age_secs: cli.max_age,
                force_refresh: cli.force_refresh,
            },
            cache_dir: cli.cache_dir.clone(),
            timeout: Duration::from_secs(cli.timeout),
            etherscan_key: cli.etherscan_key.clone(),
            explain: cli.explain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_holding_arg_valid() {
        assert_eq!(
            parse_holding_arg("ethereum=1.5").unwrap(),
            ("ethereum".to_string(), 1.5)
        );
        assert_eq!(
            parse_holding_arg(" Tether = 200 ").unwrap(),
            ("tether".to_string(), 200.0)
        );
    }

    #[test]
    fn test_parse_holding_arg_invalid() {
        for bad in ["ethereum", "=1", "ethereum=", "ethereum=abc", "ethereum=-1", "x=NaN"] {
            let err = parse_holding_arg(bad).unwrap_err();
            assert!(err.to_string().contains("Invalid holding"), "{bad}");
            assert!(err.to_string().contains(bad), "{bad}");
        }
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["marketdash", "global"]);
        assert_eq!(cli.command, Command::Global);
        assert_eq!(cli.max_age, 600);
        assert!(!cli.force_refresh);
        assert!(!cli.explain);
        assert_eq!(cli.timeout, 30);
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "marketdash",
            "chart",
            "bitcoin",
            "--days",
            "30",
            "--trend",
            "--max-age",
            "60",
            "--force-refresh",
        ]);
        assert_eq!(
            cli.command,
            Command::Chart {
                id: "bitcoin".into(),
                days: 30,
                trend: true
            }
        );
        assert_eq!(cli.max_age, 60);
        assert!(cli.force_refresh);
    }

    #[test]
    fn test_cli_parse_value_holdings() {
        let cli = Cli::parse_from(["marketdash", "value", "ethereum=2", "bitcoin=0.1"]);
        assert_eq!(
            cli.command,
            Command::Value {
                holdings: vec![("ethereum".into(), 2.0), ("bitcoin".into(), 0.1)]
            }
        );
    }

    #[test]
    fn test_cli_rejects_bad_holding() {
        let result = Cli::try_parse_from(["marketdash", "value", "ethereum"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_price_requires_ids() {
        assert!(Cli::try_parse_from(["marketdash", "price"]).is_err());
    }

    #[test]
    fn test_settings_from_cli() {
        let cli = Cli::parse_from([
            "marketdash",
            "--max-age",
            "120",
            "--force-refresh",
            "--cache-dir",
            "/tmp/md",
            "--timeout",
            "5",
            "coins",
        ]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.fetch.max_age_secs, 120);
        assert!(settings.fetch.force_refresh);
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/tmp/md")));
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_settings_rejects_out_of_range_limit() {
        let cli = Cli::parse_from(["marketdash", "coins", "--limit", "0"]);
        assert!(matches!(Settings::from_cli(&cli), Err(CliError::InvalidLimit(0))));

        let cli = Cli::parse_from(["marketdash", "coins", "--limit", "251"]);
        assert!(Settings::from_cli(&cli).is_err());
    }

    #[test]
    fn test_settings_rejects_zero_timeout() {
        let cli = Cli::parse_from(["marketdash", "--timeout", "0", "global"]);
        assert!(matches!(Settings::from_cli(&cli), Err(CliError::InvalidTimeout)));
    }

    #[test]
    fn test_cli_parse_gas_with_key() {
        let cli = Cli::parse_from(["marketdash", "gas", "--etherscan-key", "ABC123"]);
        assert_eq!(cli.command, Command::Gas);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.etherscan_key.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.fetch, FetchOptions::default());
        assert!(settings.cache_dir.is_none());
        assert!(!settings.explain);
    }
}
