//! RangeLab CLI: run and sweep commands.
//!
//! Commands:
//! - `run`: simulate one position over a CSV series or a synthetic one
//! - `sweep`: simulate a grid of widths and cooldowns, print a leaderboard

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rangelab_core::domain::WidthSpec;
use rangelab_runner::{
    generate_series, load_series, run_simulation, LoadedSeries, ParamSweep, SimulationConfig,
    SimulationResult, SweepGrid, SyntheticSpec,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "rangelab",
    about = "RangeLab CLI — concentrated-liquidity position simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one position from a TOML config.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV market series, one row per period.
        #[arg(long)]
        series: Option<PathBuf>,

        /// Generate this many synthetic periods instead of reading a series.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Write the full result JSON here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Simulate every width/cooldown combination against one series.
    Sweep {
        /// Path to a TOML config file providing the base parameters.
        #[arg(long)]
        config: PathBuf,

        /// CSV market series, one row per period.
        #[arg(long)]
        series: Option<PathBuf>,

        /// Generate this many synthetic periods instead of reading a series.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Comma-separated widths, e.g. "full,5,10%".
        #[arg(long, default_value = "full,5,10")]
        widths: String,

        /// Comma-separated cooldowns in periods.
        #[arg(long, default_value = "1,24")]
        cooldowns: String,

        /// Run grid cells one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Write the leaderboard JSON here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            series,
            synthetic,
            seed,
            output,
        } => run_cmd(&config, series.as_deref(), synthetic, seed, output.as_deref()),
        Commands::Sweep {
            config,
            series,
            synthetic,
            seed,
            widths,
            cooldowns,
            sequential,
            output,
        } => sweep_cmd(
            &config,
            series.as_deref(),
            synthetic,
            seed,
            &widths,
            &cooldowns,
            sequential,
            output.as_deref(),
        ),
    }
}

fn load_input(
    config: &SimulationConfig,
    series: Option<&Path>,
    synthetic: Option<usize>,
    seed: u64,
) -> Result<LoadedSeries> {
    match (series, synthetic) {
        (Some(_), Some(_)) => bail!("--series and --synthetic are mutually exclusive"),
        (None, None) => bail!("one of --series or --synthetic is required"),
        (Some(path), None) => load_series(path)
            .with_context(|| format!("failed to load series {}", path.display())),
        (None, Some(periods)) => {
            let spec = SyntheticSpec::new(periods, seed, config.pair());
            let points = generate_series(&spec)?;
            Ok(LoadedSeries::new(points, true)?)
        }
    }
}

fn run_cmd(
    config_path: &Path,
    series: Option<&Path>,
    synthetic: Option<usize>,
    seed: u64,
    output: Option<&Path>,
) -> Result<()> {
    let config = SimulationConfig::from_file(config_path)?;
    let data = load_input(&config, series, synthetic, seed)?;
    let result = run_simulation(&config, &data)?;

    print_summary(&result);

    let json = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Result saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn sweep_cmd(
    config_path: &Path,
    series: Option<&Path>,
    synthetic: Option<usize>,
    seed: u64,
    widths: &str,
    cooldowns: &str,
    sequential: bool,
    output: Option<&Path>,
) -> Result<()> {
    let base = SimulationConfig::from_file(config_path)?;
    let data = load_input(&base, series, synthetic, seed)?;
    let grid = SweepGrid::new(parse_widths(widths)?, parse_cooldowns(cooldowns)?);
    if grid.size() == 0 {
        bail!("sweep grid is empty");
    }

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&grid, &base, &data)?;
    let summaries = results.summaries();

    println!(
        "{:<10} {:>8} {:>10} {:>10} {:>10} {:>6} {:>8}",
        "width", "cooldown", "apr%", "fees$", "gas$", "rebal", "in-rng%"
    );
    for row in &summaries {
        println!(
            "{:<10} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>6} {:>8.1}",
            row.width.to_string(),
            row.cooldown_periods,
            row.apr_pct,
            row.fees_usd,
            row.gas_usd,
            row.rebalance_count,
            row.time_in_range_pct
        );
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&summaries)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Leaderboard saved to: {}", path.display());
    }
    Ok(())
}

fn parse_widths(list: &str) -> Result<Vec<WidthSpec>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<WidthSpec>()
                .with_context(|| format!("invalid width '{s}'"))
        })
        .collect()
}

fn parse_cooldowns(list: &str) -> Result<Vec<u64>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .with_context(|| format!("invalid cooldown '{s}'"))
        })
        .collect()
}

fn print_summary(result: &SimulationResult) {
    let status = &result.status;
    let metrics = &status.metrics;
    eprintln!("Run {}", &result.run_id[..12.min(result.run_id.len())]);
    eprintln!(
        "  periods: {}  in range: {:.1}%  degraded: {}",
        result.periods.len(),
        metrics.time_in_range_pct,
        status.degraded_periods
    );
    eprintln!(
        "  value: ${:.2}  pnl: ${:.2}  return: {:.2}%  apr: {:.2}%",
        status.total_value_usd, status.pnl_usd, status.return_pct, status.apr_pct
    );
    eprintln!(
        "  fees: ${:.2}  gas: ${:.2}  rebalances: {}  max drawdown: {:.2}%",
        metrics.cumulative_fees_usd,
        metrics.total_gas_cost_usd,
        metrics.rebalance_count,
        metrics.max_drawdown_pct
    );
    eprintln!(
        "  vs hold: ${:.2}  impermanent loss: {:.2}%",
        status.net_gain_vs_hold_usd, metrics.impermanent_loss_pct
    );
}
