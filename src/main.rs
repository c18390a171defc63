//! Trading Journal Analytics CLI
//!
//! Offline driver for the journal engine: plays the loader role against a
//! JSON fixture of raw records instead of a live gateway.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trade_journal::{
    config::AppConfig,
    error::{JournalError, Result as JournalResult},
    grader,
    loader::{self, TradeGateway, TradeLoader, TradePage},
    normalizer,
    simulator::{MonteCarlo, SimulationParams},
    store::{keys, Store},
    types::RawRecord,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "trade-journal")]
#[command(about = "Trading journal analytics and Monte Carlo risk engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "journal")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a journal export and print statistics
    Analyze {
        /// JSON file with raw records
        file: PathBuf,
        /// Records per simulated gateway page
        #[arg(long, default_value = "100")]
        page_size: usize,
    },
    /// Project account risk from summary statistics
    Simulate {
        /// Win rate, percent
        #[arg(long)]
        win_rate: Decimal,
        /// Average winning R
        #[arg(long)]
        avg_win: Decimal,
        /// Average losing R magnitude
        #[arg(long)]
        avg_loss: Decimal,
        /// Trades per run
        #[arg(long)]
        trades: usize,
        /// Number of runs (config default when omitted)
        #[arg(long)]
        runs: Option<usize>,
    },
    /// Explain the grade of one record in a journal export
    Grade {
        /// JSON file with raw records
        file: PathBuf,
        /// Zero-based record index
        #[arg(long, default_value = "0")]
        index: usize,
    },
}

/// Serves a fixture file as a paginated gateway
struct FixtureGateway {
    records: Vec<RawRecord>,
    page_size: usize,
}

impl FixtureGateway {
    fn from_file(path: &Path, page_size: usize) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<RawRecord> = serde_json::from_str(&raw)?;
        Ok(Self { records, page_size })
    }
}

#[async_trait]
impl TradeGateway for FixtureGateway {
    async fn fetch_page(&self, cursor: Option<String>) -> JournalResult<TradePage> {
        let offset: usize = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| JournalError::Gateway(format!("bad cursor '{}'", c)))?,
            None => 0,
        };
        let offset = offset.min(self.records.len());
        let end = (offset + self.page_size.max(1)).min(self.records.len());
        let next_cursor = (end < self.records.len()).then(|| end.to_string());
        Ok(TradePage {
            records: self.records[offset..end].to_vec(),
            next_cursor,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Analyze { file, page_size } => analyze(config, &file, page_size).await,
        Commands::Simulate {
            win_rate,
            avg_win,
            avg_loss,
            trades,
            runs,
        } => simulate(config, win_rate, avg_win, avg_loss, trades, runs),
        Commands::Grade { file, index } => grade(&file, index),
    }
}

async fn analyze(config: AppConfig, file: &Path, page_size: usize) -> anyhow::Result<()> {
    let simulator = MonteCarlo::new(config.simulator.clone());
    let gateway = FixtureGateway::from_file(file, page_size)?;
    let store = Arc::new(Store::new());
    let loader = TradeLoader::new(store.clone(), config.loader, config.cache);

    let stats = loader
        .load(&gateway, |count| {
            tracing::debug!("absorbed {} records", count)
        })
        .await?
        .ok_or_else(|| anyhow::anyhow!("fresh store reported a cache hit"))?;

    println!("Trades:    {}", stats.trades.len());
    println!(
        "W/L/BE:    {}/{}/{}",
        stats.wins, stats.losses, stats.breakevens
    );
    println!("Win rate:  {}%", stats.win_rate);
    println!("Avg win:   +{}R", stats.avg_win);
    println!("Avg loss:  -{}R", stats.avg_loss);
    println!("EV:        {}R per trade", stats.ev);
    println!("Total:     {}R (peak {}R)", stats.cur_r, stats.peak_r);
    println!("Drawdown:  {}%", stats.drawdown);

    if !stats.monthly.is_empty() {
        println!("\nMonthly:");
        for (month, m) in &stats.monthly {
            let sign = if m.r >= Decimal::ZERO { "+" } else { "" };
            println!(
                "  {}  {:>3} trades  {:>3}% WR  {}{}R",
                month, m.total, m.win_rate, sign, m.r
            );
        }
    }
    if !stats.sessions.is_empty() {
        println!("\nSessions:");
        for (session, b) in &stats.sessions {
            println!("  {:<12} {}/{}", session, b.wins, b.total);
        }
    }

    if !stats.trades.is_empty() {
        let projection = loader::project_risk(&store, &simulator, None)?;
        println!("\nProjection over {} trades:", projection.trade_count);
        for (label, value) in &projection.percentile_values {
            let sign = if *value >= Decimal::ZERO { "+" } else { "" };
            println!("  {:<4} {}{}R", label, sign, value);
        }
        println!("Ruin probability: {}%", projection.ruin_pct);
    }

    // The store now holds everything a UI would read
    tracing::debug!(
        "store populated: trades={}, stats={}, monteCarlo={}",
        store.get(keys::TRADES).is_array(),
        store.get(keys::JOURNAL_STATS).is_object(),
        store.get(keys::MONTE_CARLO).is_object()
    );
    Ok(())
}

fn simulate(
    config: AppConfig,
    win_rate: Decimal,
    avg_win: Decimal,
    avg_loss: Decimal,
    trades: usize,
    runs: Option<usize>,
) -> anyhow::Result<()> {
    let simulator = MonteCarlo::new(config.simulator);
    let result = simulator.simulate(&SimulationParams {
        win_rate_pct: win_rate,
        avg_win,
        avg_loss,
        trade_count: trades,
        runs,
    })?;

    println!(
        "{} runs of {} trades  (EV {}R per trade)",
        result.run_count, result.trade_count, result.ev
    );
    for (label, value) in &result.percentile_values {
        let sign = if *value >= Decimal::ZERO { "+" } else { "" };
        println!("  {:<4} {}{}R", label, sign, value);
    }
    println!("Ruin probability: {}%", result.ruin_pct);
    Ok(())
}

fn grade(file: &Path, index: usize) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let records: Vec<RawRecord> = serde_json::from_str(&raw)?;
    let record = records
        .get(index)
        .ok_or_else(|| anyhow::anyhow!("no record at index {}", index))?;

    let trade = normalizer::normalize(record);
    let explanation = grader::explain(&trade);

    println!("Record {}  ({})", index, trade.id);
    println!(
        "Grade: {}{}",
        explanation.grade,
        if explanation.explicit { " (explicit)" } else { "" }
    );
    println!("Confluences: {}", explanation.confluence_count);
    if !explanation.strong.is_empty() {
        println!("  setup terms:      {}", explanation.strong.join(", "));
    }
    if !explanation.quality.is_empty() {
        println!("  discipline terms: {}", explanation.quality.join(", "));
    }
    if !explanation.weak.is_empty() {
        println!("  warning terms:    {}", explanation.weak.join(", "));
    }
    Ok(())
}
