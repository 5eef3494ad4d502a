//! Coinloop CLI
//!
//! Command-line interface over the coin economy service.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use coinloop_economics::{Clock, ManualClock, SystemClock, UsagePattern};
use coinloop_service::{CoinloopConfig, CompletionEvent, EconomyService, LoggingConfig};
use coinloop_storage::FileStateStore;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "coinloop")]
#[command(version)]
#[command(about = "Coinloop - habit coin economy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "coinloop.toml", env = "COINLOOP_CONFIG")]
    config: PathBuf,

    /// State file (overrides storage.state_path)
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's and this week's totals
    Status,

    /// Record a completed habit or task
    Complete {
        /// easy, medium, hard or extreme
        #[arg(short, long)]
        difficulty: Option<String>,

        /// Streak after this completion
        #[arg(long, default_value = "0")]
        streak: i64,
    },

    /// Apply a penalty to a balance
    Penalty {
        /// miss_habit, break_streak, snooze_task or fail_deep_work
        penalty_type: String,

        /// Balance before the penalty
        #[arg(short, long)]
        balance: u64,
    },

    /// Run the weekly calibration now
    Calibrate,

    /// Estimate coins for a day of completions
    Estimate {
        #[arg(long, default_value = "0")]
        easy: u32,
        #[arg(long, default_value = "0")]
        medium: u32,
        #[arg(long, default_value = "0")]
        hard: u32,
        #[arg(long, default_value = "0")]
        extreme: u32,
        /// Average streak
        #[arg(long, default_value = "0")]
        streak: i64,
    },

    /// Print the effective configuration
    Config,
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries command output
    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn expand_path(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix('~') {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest.trim_start_matches('/'));
            }
        }
    }
    path.to_path_buf()
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run<C: Clock>(
    command: Commands,
    config: &CoinloopConfig,
    store: FileStateStore,
    clock: C,
) -> anyhow::Result<()> {
    let service = EconomyService::new(config, store, clock)?;

    match command {
        Commands::Status => {
            let status = service.status()?;
            print_json(&json!({ "status": status, "config": service.config() }))?;
        }

        Commands::Complete { difficulty, streak } => {
            let receipt = service.complete(&CompletionEvent { difficulty, streak })?;
            print_json(&receipt)?;
        }

        Commands::Penalty {
            penalty_type,
            balance,
        } => {
            let outcome = service.apply_penalty(&penalty_type, balance)?;
            print_json(&outcome)?;
        }

        Commands::Calibrate => {
            let result = service.force_calibration()?;
            print_json(&result)?;
        }

        Commands::Estimate {
            easy,
            medium,
            hard,
            extreme,
            streak,
        } => {
            let pattern = UsagePattern {
                easy_count: easy,
                medium_count: medium,
                hard_count: hard,
                extreme_count: extreme,
                average_streak: streak,
            };
            let coins = service.estimate_daily_coins(&pattern);
            print_json(&json!({ "pattern": pattern, "estimated_daily_coins": coins }))?;
        }

        Commands::Config => print!("{}", config.to_toml_string()?),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CoinloopConfig::load(&expand_path(&cli.config))?;
    init_logging(&config.logging, cli.verbose);

    let state_path = match &cli.state {
        Some(path) => expand_path(path),
        None => expand_path(Path::new(&config.storage.state_path)),
    };
    tracing::debug!(state = %state_path.display(), "Opening state file");
    let store = FileStateStore::new(state_path);

    match cli.now {
        Some(now) => run(cli.command, &config, store, ManualClock::new(now)),
        None => run(cli.command, &config, store, SystemClock),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_instant_normalizes_to_utc() {
        let now = parse_instant("2026-03-02T09:00:00+02:00").unwrap();
        assert_eq!(now, Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap());
        assert!(parse_instant("next tuesday").is_err());
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path(Path::new("state.json")), PathBuf::from("state.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_path(Path::new("~/.coinloop/economy.json")),
                home.join(".coinloop/economy.json")
            );
        }
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "coinloop",
            "--now",
            "2026-03-02T09:00:00Z",
            "complete",
            "--difficulty",
            "hard",
            "--streak",
            "4",
        ])
        .unwrap();
        assert!(cli.now.is_some());
        assert!(matches!(
            cli.command,
            Commands::Complete { ref difficulty, streak: 4 }
                if difficulty.as_deref() == Some("hard")
        ));

        let cli =
            Cli::try_parse_from(["coinloop", "penalty", "miss_habit", "--balance", "12"]).unwrap();
        assert!(matches!(cli.command, Commands::Penalty { balance: 12, .. }));
    }
}
