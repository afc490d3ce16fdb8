//! Movers CLI: rank an equity universe by trailing percent growth.
//!
//! Commands:
//! - `run`: fetch the universe, load or fetch each symbol, write the top-N report
//! - `universe`: fetch the universe and write the ticker list only

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use movers_core::data::{Universe, WikipediaUniverse, YahooProvider};
use movers_core::{MoversConfig, PipelineResult};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "movers",
    about = "Movers CLI: top trailing-return movers of an equity universe"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the ranked report for the trailing window ending today.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Trailing window length in calendar days. Defaults to 90.
        #[arg(long)]
        window_days: Option<u32>,

        /// Number of rows to keep in the report. Defaults to 50.
        #[arg(long)]
        top_n: Option<usize>,

        /// Cache directory. Defaults to ./data.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Report output path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch the symbol universe and write the ticker list.
    Universe {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ticker list output path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("movers_core=info,movers=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            window_days,
            top_n,
            cache_dir,
            output,
        } => {
            let mut config = load_config(config)?;
            if let Some(days) = window_days {
                config.window_days = days;
            }
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(dir) = cache_dir {
                config.cache_dir = dir;
            }
            if let Some(path) = output {
                config.report_path = path;
            }
            config.validate()?;
            run_report(&config)
        }
        Commands::Universe { config, output } => {
            let mut config = load_config(config)?;
            if let Some(path) = output {
                config.ticker_list_path = path;
            }
            run_universe(&config)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<MoversConfig> {
    match path {
        Some(path) => MoversConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(MoversConfig::default()),
    }
}

fn run_report(config: &MoversConfig) -> Result<()> {
    let source = WikipediaUniverse::new(&config.universe_url, config.http_timeout())?;
    let provider = YahooProvider::new(config.http_timeout())?;
    let today = chrono::Local::now().date_naive();

    let result = movers_core::run(config, &source, &provider, today)
        .context("run aborted")?;

    print_summary(&result);
    println!("Report saved to: {}", config.report_path.display());
    Ok(())
}

fn run_universe(config: &MoversConfig) -> Result<()> {
    let source = WikipediaUniverse::new(&config.universe_url, config.http_timeout())?;
    let universe = Universe::load(&source)
        .with_context(|| format!("failed to load universe from {}", source.url()))?;
    universe.save_ticker_list(&config.ticker_list_path)?;
    println!(
        "{} symbols saved to: {}",
        universe.len(),
        config.ticker_list_path.display()
    );
    Ok(())
}

fn print_summary(result: &PipelineResult) {
    println!();
    println!("=== Trailing Return Report ===");
    println!(
        "Window:         {} to {} ({} days)",
        result.window.start(),
        result.window.end(),
        result.window.day_count()
    );
    println!("Universe:       {}", result.universe_size);
    println!("Accepted:       {}", result.accepted);
    println!("  from cache:   {}", result.cache_hits);
    println!("  fetched:      {}", result.accepted - result.cache_hits);
    println!("Fetch errors:   {}", result.fetch_failures());
    println!("Rejected data:  {}", result.data_rejections());
    println!();
    println!("{:<4} {:<8} {:<40} {:>12}", "#", "Symbol", "Company", "Growth");
    println!("{}", "-".repeat(67));
    for (i, row) in result.rows.iter().enumerate() {
        println!(
            "{:<4} {:<8} {:<40} {:>11.2}%",
            i + 1,
            row.symbol,
            truncate(&row.name, 40),
            row.growth
        );
    }
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}
