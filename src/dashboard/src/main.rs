//! BTC/USD Analysis Dashboard
//!
//! CLI boundary over the analysis core: runs a cooldown-gated snapshot
//! fetch, shows cooldown status, resets the persisted record, and prints
//! the CoinGecko movers board.

mod report;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::time::sleep;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use common::{
    unix_now, AnalysisService, CoinGeckoClient, Config, CooldownGate, RunOutcome, StrategyKind,
    TradingViewClient,
};

/// BTC/USD technical-analysis dashboard
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Cooldown-gated BTC/USD technical analysis")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an analysis, honoring the cooldown window
    Run {
        /// Wait out an active cooldown instead of exiting
        #[arg(long)]
        wait: bool,

        /// Also evaluate a strategy template against the snapshot
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
    /// Show cooldown status and the last-analysis timestamp
    Status,
    /// Delete the persisted cooldown record
    Reset,
    /// Show top gainers and losers from the top 500 coins
    Movers {
        /// Number of coins per side
        #[arg(long, default_value = "10")]
        count: usize,
    },
}

/// CLI-facing names for the strategy templates.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    TrendFollowing,
    MeanReversion,
    Breakout,
    Momentum,
}

impl From<Strategy> for StrategyKind {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::TrendFollowing => StrategyKind::TrendFollowing,
            Strategy::MeanReversion => StrategyKind::MeanReversion,
            Strategy::Breakout => StrategyKind::Breakout,
            Strategy::Momentum => StrategyKind::Momentum,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder().with_max_level(Level::INFO).init();

    let args = Args::parse();
    let config = Config::from_env()?;

    match args.command {
        Command::Run { wait, strategy } => {
            run_analysis(&config, wait, strategy.map(StrategyKind::from)).await
        }
        Command::Status => show_status(&config),
        Command::Reset => reset(&config),
        Command::Movers { count } => show_movers(&config, count).await,
    }
}

async fn run_analysis(
    config: &Config,
    wait: bool,
    strategy: Option<StrategyKind>,
) -> Result<()> {
    let provider = TradingViewClient::new(config);
    let mut service = AnalysisService::new(config, provider)?;

    loop {
        match service.run_analysis(unix_now()).await? {
            RunOutcome::Completed(snapshot) => {
                info!("Analysis completed successfully");
                report::print_snapshot(&snapshot);
                if let Some(kind) = strategy {
                    let evaluated =
                        common::strategies::evaluate(kind, &snapshot.indicators, &snapshot.levels);
                    report::print_strategy(&evaluated, &snapshot);
                }
                return Ok(());
            }
            RunOutcome::Failed { error, retry_after } => {
                warn!("Analysis failed: {}", error);
                println!("Analysis failed: {error}");
                println!(
                    "The cooldown window was still consumed; next attempt in {}s.",
                    retry_after.as_secs()
                );
                std::process::exit(1);
            }
            RunOutcome::CoolingDown { remaining, cached } => {
                if let Some(entry) = &cached {
                    report::print_cached(entry);
                }
                if !wait {
                    println!(
                        "Rate limit active - next analysis available in {}s.",
                        remaining.as_secs()
                    );
                    return Ok(());
                }
                countdown(&service, remaining).await;
                // Window elapsed; loop around and acquire for real.
            }
        }
    }
}

/// Poll the gate roughly once a second until the window elapses.
async fn countdown<P: common::AnalysisProvider>(
    service: &AnalysisService<P>,
    initial: Duration,
) {
    let mut remaining = initial;
    while !remaining.is_zero() {
        print!("\rNext analysis available in {:>3}s", remaining.as_secs());
        use std::io::Write;
        let _ = std::io::stdout().flush();

        sleep(Duration::from_secs(1)).await;
        remaining = service.remaining(unix_now());
    }
    println!();
}

fn show_status(config: &Config) -> Result<()> {
    let gate = CooldownGate::new(&config.state_file, config.cooldown_secs)?;
    let now = unix_now();

    match gate.last_acquired() {
        Some(ts) => {
            let when = chrono::DateTime::from_timestamp(ts as i64, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| format!("{ts}"));
            println!("Last analysis: {when}");

            let remaining = gate.remaining(now);
            if remaining.is_zero() {
                println!("Ready for new analysis");
            } else {
                println!("Next available in: {}s", remaining.as_secs());
            }
        }
        None => println!("No analysis run yet"),
    }

    println!("Cooldown window: {}s", config.cooldown_secs);
    Ok(())
}

fn reset(config: &Config) -> Result<()> {
    let gate = CooldownGate::new(&config.state_file, config.cooldown_secs)?;
    gate.reset()?;
    info!("Cooldown record deleted");
    println!("Cooldown reset - next analysis may run immediately.");
    Ok(())
}

async fn show_movers(config: &Config, count: usize) -> Result<()> {
    let client = CoinGeckoClient::new(config);
    let board = client.fetch_top_movers(count).await?;
    report::print_movers(&board);
    Ok(())
}
